//! Configuration models and loaders for the Porkchop Planner.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

pub mod catalog;

pub use catalog::{BodyCatalog, BodyConstants, load_catalog};

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("body `{0}` not found in catalog")]
    UnknownBody(String),
    #[error("body `{0}` appears more than once in the catalog")]
    DuplicateBody(String),
    #[error("body `{name}`: {reason}")]
    InvalidBody { name: String, reason: String },
    #[error("{field}: `{value}` is not a YYYY-MM-DD date")]
    InvalidDate { field: &'static str, value: String },
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Inclusive calendar window, `YYYY-MM-DD` on both ends.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DateWindow {
    pub start: String,
    pub end: String,
}

impl DateWindow {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Parse both ends, requiring `end > start`.
    pub fn dates(&self, field: &'static str) -> Result<(NaiveDate, NaiveDate), ConfigError> {
        let parse = |value: &str| {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                ConfigError::InvalidDate {
                    field,
                    value: value.to_string(),
                }
            })
        };
        let start = parse(&self.start)?;
        let end = parse(&self.end)?;
        if end <= start {
            return Err(ConfigError::Invalid {
                field,
                reason: format!("end {end} must be after start {start}"),
            });
        }
        Ok((start, end))
    }
}

/// Newton-Raphson controls for the Lambert solver.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 500,
        }
    }
}

/// Horizons observing site and reference frame.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HorizonsConfig {
    pub center: String,
    pub ref_plane: String,
    pub ref_system: String,
}

impl Default for HorizonsConfig {
    fn default() -> Self {
        Self {
            center: "500@0".to_string(),
            ref_plane: "ECLIPTIC".to_string(),
            ref_system: "J2000".to_string(),
        }
    }
}

/// A porkchop campaign between two bodies.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CampaignConfig {
    pub departure_body: String,
    pub arrival_body: String,
    #[serde(default = "default_central_body")]
    pub central_body: String,
    /// Overrides the central body's catalog μ when set.
    #[serde(default)]
    pub mu_km3_s2: Option<f64>,
    pub departure_window: DateWindow,
    pub arrival_window: DateWindow,
    #[serde(default = "default_step_days")]
    pub step_days: f64,
    #[serde(default = "default_vinf_cutoff")]
    pub vinf_cutoff_km_s: f64,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default)]
    pub horizons: HorizonsConfig,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_true")]
    pub reuse_cache: bool,
}

fn default_central_body() -> String {
    "Sun".to_string()
}

fn default_step_days() -> f64 {
    5.0
}

fn default_vinf_cutoff() -> f64 {
    20.0
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/ephemeris")
}

impl Default for CampaignConfig {
    /// The 2020 Earth→Mars opportunity.
    fn default() -> Self {
        Self {
            departure_body: "Earth".to_string(),
            arrival_body: "Mars".to_string(),
            central_body: default_central_body(),
            mu_km3_s2: None,
            departure_window: DateWindow::new("2020-07-01", "2020-09-01"),
            arrival_window: DateWindow::new("2020-11-01", "2022-01-24"),
            step_days: default_step_days(),
            vinf_cutoff_km_s: default_vinf_cutoff(),
            solver: SolverConfig::default(),
            parallel: true,
            horizons: HorizonsConfig::default(),
            cache_dir: default_cache_dir(),
            reuse_cache: true,
        }
    }
}

impl CampaignConfig {
    /// Gravitational parameter of the central body, honouring the override.
    pub fn central_mu(&self, catalog: &BodyCatalog) -> Result<f64, ConfigError> {
        let mu = match self.mu_km3_s2 {
            Some(mu) => mu,
            None => catalog.require(&self.central_body)?.mu_km3_s2,
        };
        if !(mu.is_finite() && mu > 0.0) {
            return Err(ConfigError::Invalid {
                field: "mu_km3_s2",
                reason: format!("must be positive, got {mu}"),
            });
        }
        Ok(mu)
    }

    /// C3 ceiling derived from the v∞ cutoff.
    pub fn c3_cutoff_km2_s2(&self) -> f64 {
        self.vinf_cutoff_km_s * self.vinf_cutoff_km_s
    }

    /// Check every recognised option against the catalog.
    pub fn validate(&self, catalog: &BodyCatalog) -> Result<(), ConfigError> {
        catalog.require(&self.departure_body)?;
        catalog.require(&self.arrival_body)?;
        self.central_mu(catalog)?;
        self.departure_window.dates("departure_window")?;
        self.arrival_window.dates("arrival_window")?;
        positive("step_days", self.step_days)?;
        positive("vinf_cutoff_km_s", self.vinf_cutoff_km_s)?;
        positive("solver.tolerance", self.solver.tolerance)?;
        if self.solver.max_iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "solver.max_iterations",
                reason: "must be at least one".to_string(),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

/// Load a campaign from a TOML (`.toml`) or YAML file.
pub fn load_campaign<P: AsRef<Path>>(path: P) -> Result<CampaignConfig, ConfigError> {
    load_record(path)
}

fn load_record<T, P>(path: P) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

pub(crate) fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}
