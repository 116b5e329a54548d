//! Horizons ephemeris download with an on-disk cache.

use std::fs;
use std::path::{Path, PathBuf};

use porkchop_ephem::horizons::{HORIZONS_API_URL, HorizonsQuery};
use porkchop_ephem::{self as ephem, EphemerisError, StateSample};
use reqwest::Url;
use reqwest::blocking::{Client, Request};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Horizons returned unusable data for `{command}`: {source}")]
    Ephemeris {
        command: String,
        #[source]
        source: EphemerisError,
    },
}

/// Where the samples for a query came from.
#[derive(Debug)]
pub enum FetchStatus {
    Downloaded(PathBuf),
    Cached(PathBuf),
}

impl FetchStatus {
    pub fn path(&self) -> &Path {
        match self {
            Self::Downloaded(path) | Self::Cached(path) => path,
        }
    }
}

/// Fetch one query, reusing `cache_dir` when `reuse_cache` is set and the file exists.
pub fn fetch(
    query: &HorizonsQuery,
    cache_dir: &Path,
    reuse_cache: bool,
) -> Result<(FetchStatus, Vec<StateSample>), ImportError> {
    let client = Client::builder().build()?;
    fetch_with_client(&client, query, cache_dir, reuse_cache)
}

/// Encoded Horizons URL for `query`, without sending anything.
pub fn request_url(query: &HorizonsQuery) -> Result<Url, ImportError> {
    let client = Client::builder().build()?;
    Ok(build_request(&client, query)?.url().clone())
}

fn build_request(client: &Client, query: &HorizonsQuery) -> Result<Request, reqwest::Error> {
    client.get(HORIZONS_API_URL).query(&query.params()).build()
}

/// Fetch several queries over a shared HTTP client.
pub fn fetch_all(
    queries: &[HorizonsQuery],
    cache_dir: &Path,
    reuse_cache: bool,
) -> Result<Vec<(FetchStatus, Vec<StateSample>)>, ImportError> {
    let client = Client::builder().build()?;
    queries
        .iter()
        .map(|query| fetch_with_client(&client, query, cache_dir, reuse_cache))
        .collect()
}

fn fetch_with_client(
    client: &Client,
    query: &HorizonsQuery,
    cache_dir: &Path,
    reuse_cache: bool,
) -> Result<(FetchStatus, Vec<StateSample>), ImportError> {
    let dest = query.cache_path(cache_dir);
    let parse = |text: &str| {
        ephem::parse_horizons(text).map_err(|source| ImportError::Ephemeris {
            command: query.command.clone(),
            source,
        })
    };

    if reuse_cache && dest.exists() {
        let samples = parse(&fs::read_to_string(&dest)?)?;
        info!(path = %dest.display(), command = %query.command, "using cached ephemeris");
        return Ok((FetchStatus::Cached(dest), samples));
    }

    let request = build_request(client, query)?;
    debug!(url = %request.url(), "requesting ephemeris");
    let body = client.execute(request)?.error_for_status()?.text()?;
    // Only parseable responses are cached.
    let samples = parse(&body)?;
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&dest, body)?;
    info!(
        path = %dest.display(),
        command = %query.command,
        samples = samples.len(),
        "downloaded ephemeris"
    );
    Ok((FetchStatus::Downloaded(dest), samples))
}
