//! Descriptor for a JPL Horizons vector-table request.

use std::path::{Path, PathBuf};

/// Base endpoint of the Horizons HTTP API (plain-text responses).
pub const HORIZONS_API_URL: &str = "https://ssd.jpl.nasa.gov/api/horizons.api";

/// Solar-system barycentre, the default observing site.
pub const DEFAULT_CENTER: &str = "500@0";
pub const DEFAULT_REF_PLANE: &str = "ECLIPTIC";
pub const DEFAULT_REF_SYSTEM: &str = "J2000";

/// One body's state-vector table over a date window.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonsQuery {
    /// Horizons COMMAND, e.g. `399` for Earth.
    pub command: String,
    /// Window start, `YYYY-MM-DD`.
    pub start: String,
    /// Window stop, `YYYY-MM-DD`.
    pub stop: String,
    pub step_days: f64,
    pub center: String,
    pub ref_plane: String,
    pub ref_system: String,
}

impl HorizonsQuery {
    /// Query with the default barycentric ecliptic J2000 frame.
    pub fn new(command: impl Into<String>, start: &str, stop: &str, step_days: f64) -> Self {
        Self {
            command: command.into(),
            start: start.to_string(),
            stop: stop.to_string(),
            step_days,
            center: DEFAULT_CENTER.to_string(),
            ref_plane: DEFAULT_REF_PLANE.to_string(),
            ref_system: DEFAULT_REF_SYSTEM.to_string(),
        }
    }

    /// Horizons STEP_SIZE: whole days as `Nd`, anything else in minutes.
    pub fn step_size(&self) -> String {
        if self.step_days.fract() == 0.0 {
            format!("{}d", self.step_days as u64)
        } else {
            format!("{}m", (self.step_days * 1_440.0).round() as u64)
        }
    }

    /// Request parameters, unencoded; the HTTP client escapes them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("format", "text".to_string()),
            ("COMMAND", quoted(&self.command)),
            ("OBJ_DATA", quoted("NO")),
            ("MAKE_EPHEM", quoted("YES")),
            ("EPHEM_TYPE", quoted("VECTORS")),
            ("REF_PLANE", quoted(&self.ref_plane)),
            ("REF_SYSTEM", quoted(&self.ref_system)),
            ("VEC_TABLE", quoted("2")),
            ("CSV_FORMAT", quoted("YES")),
            ("CENTER", quoted(&self.center)),
            ("START_TIME", quoted(&self.start)),
            ("STOP_TIME", quoted(&self.stop)),
            ("STEP_SIZE", quoted(&self.step_size())),
            ("QUANTITIES", quoted("2")),
        ]
    }

    /// Stable file name for caching this query's response.
    pub fn cache_file_name(&self) -> String {
        let raw = format!(
            "{}_{}_{}_{}_{}.txt",
            self.command,
            self.start,
            self.stop,
            self.step_size(),
            self.center
        );
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    }

    pub fn cache_path(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(self.cache_file_name())
    }
}

fn quoted(value: &str) -> String {
    format!("'{value}'")
}

