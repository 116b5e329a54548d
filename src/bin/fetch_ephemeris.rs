//! Download Horizons vector tables into the ephemeris cache.
//!
//! Without `--body` the departure and arrival tables of the campaign are fetched,
//! which lets later `porkchop` runs work from the cache alone.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use porkchop_planner::config::{self, BodyCatalog, CampaignConfig};
use porkchop_planner::ephemeris::horizons::HorizonsQuery;
use porkchop_planner::ephemeris::julian;
use porkchop_planner::importer::{self, FetchStatus};
use porkchop_planner::transfer;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch and cache JPL Horizons state vectors")]
struct Cli {
    /// Campaign file (TOML or YAML) whose windows are fetched
    #[arg(long)]
    config: Option<PathBuf>,

    /// Body catalog file (TOML or YAML); defaults to the built-in catalog
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Fetch a single body (name or Horizons id) instead of the campaign legs
    #[arg(long, requires_all = ["start", "stop"])]
    body: Option<String>,

    /// Window start for `--body` (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Window stop for `--body` (YYYY-MM-DD)
    #[arg(long)]
    stop: Option<String>,

    /// Step in days for `--body`
    #[arg(long, default_value_t = 1.0)]
    step_days: f64,

    /// Directory for cached Horizons responses
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Download even when a cached copy exists
    #[arg(long, default_value_t = false)]
    refresh: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = match &cli.catalog {
        Some(path) => config::load_catalog(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => BodyCatalog::builtin(),
    };
    let mut campaign = match &cli.config {
        Some(path) => config::load_campaign(path)
            .with_context(|| format!("loading campaign {}", path.display()))?,
        None => CampaignConfig::default(),
    };
    if let Some(dir) = &cli.cache_dir {
        campaign.cache_dir = dir.clone();
    }

    let queries = match (&cli.body, &cli.start, &cli.stop) {
        (Some(body), Some(start), Some(stop)) => {
            julian::parse_date(start)?;
            julian::parse_date(stop)?;
            let constants = catalog.require(body)?;
            let mut query = HorizonsQuery::new(&constants.horizons_id, start, stop, cli.step_days);
            query.center = campaign.horizons.center.clone();
            query.ref_plane = campaign.horizons.ref_plane.clone();
            query.ref_system = campaign.horizons.ref_system.clone();
            vec![query]
        }
        _ => {
            let (departure, arrival) = transfer::horizons_queries(&campaign, &catalog)?;
            vec![departure, arrival]
        }
    };

    let reuse = campaign.reuse_cache && !cli.refresh;
    let fetched = importer::fetch_all(&queries, &campaign.cache_dir, reuse)?;
    for (query, (status, samples)) in queries.iter().zip(&fetched) {
        let tag = match status {
            FetchStatus::Downloaded(_) => "downloaded",
            FetchStatus::Cached(_) => "cached",
        };
        let span = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => format!(
                "{} .. {}",
                julian::format_date(first.epoch_jd),
                julian::format_date(last.epoch_jd)
            ),
            _ => "empty".to_string(),
        };
        println!(
            "[{tag}] {:<6} {:>5} rows  {}  {}",
            query.command,
            samples.len(),
            span,
            status.path().display()
        );
    }

    Ok(())
}
