//! Ephemeris samples read from JPL Horizons vector tables.
//!
//! Horizons returns a free-form text header followed by a CSV block delimited by
//! `$$SOE` / `$$EOE` lines. Each data row is
//! `JDTDB, calendar date, X, Y, Z, VX, VY, VZ,` in km and km/s.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use porkchop_core::vector::{self, Vector3};
use thiserror::Error;

pub mod horizons;
pub mod julian;

/// Heliocentric (or barycentric) state of a body at one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateSample {
    /// Julian date (TDB).
    pub epoch_jd: f64,
    pub position_km: Vector3,
    pub velocity_km_s: Vector3,
}

impl StateSample {
    /// Build a sample from a flat `[x, y, z, vx, vy, vz]` row.
    pub fn from_state(epoch_jd: f64, state: [f64; 6]) -> Self {
        Self {
            epoch_jd,
            position_km: [state[0], state[1], state[2]],
            velocity_km_s: [state[3], state[4], state[5]],
        }
    }
}

/// Errors surfaced while reading or validating ephemeris data.
#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("ephemeris text has no `$$SOE` marker")]
    MissingStartMarker,
    #[error("ephemeris text has no `$$EOE` marker after `$$SOE` (line {start_line})")]
    MissingEndMarker { start_line: usize },
    #[error("line {line}: expected at least 8 fields, found {found}")]
    ShortRow { line: usize, found: usize },
    #[error("line {line}: field {field} `{value}` is not a number")]
    InvalidNumber {
        line: usize,
        field: usize,
        value: String,
    },
    #[error("line {line}: malformed CSV row: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },
    #[error("ephemeris contains no samples")]
    Empty,
    #[error("{epochs} epochs but {states} state rows")]
    LengthMismatch { epochs: usize, states: usize },
    #[error("sample {index}: {quantity} is not finite")]
    NonFinite { index: usize, quantity: &'static str },
    #[error("sample {index}: epoch {epoch} precedes the previous epoch {previous}")]
    DecreasingEpoch {
        index: usize,
        epoch: f64,
        previous: f64,
    },
    #[error("invalid calendar date `{0}` (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("failed to read ephemeris file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

const START_MARKER: &str = "SOE";
const END_MARKER: &str = "EOE";

fn is_marker(line: &str, marker: &str) -> bool {
    let trimmed = line.trim();
    trimmed.trim_start_matches('$') == marker
}

/// Parse the `$$SOE` … `$$EOE` block of a Horizons vector table.
pub fn parse_horizons(text: &str) -> Result<Vec<StateSample>, EphemerisError> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines
        .iter()
        .position(|line| is_marker(line, START_MARKER))
        .ok_or(EphemerisError::MissingStartMarker)?;
    let end = lines[start + 1..]
        .iter()
        .position(|line| is_marker(line, END_MARKER))
        .map(|offset| start + 1 + offset)
        .ok_or(EphemerisError::MissingEndMarker {
            start_line: start + 1,
        })?;

    let block = lines[start + 1..end].join("\n");
    // 1-based line number of the first data row.
    let first_line = start + 2;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(block.as_bytes());

    let mut samples = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| EphemerisError::Csv {
            line: first_line + row_idx,
            source,
        })?;
        let line = record
            .position()
            .map(|pos| first_line + pos.line() as usize - 1)
            .unwrap_or(first_line + row_idx);
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() < 8 {
            return Err(EphemerisError::ShortRow {
                line,
                found: record.len(),
            });
        }

        let parse = |field: usize| -> Result<f64, EphemerisError> {
            let raw = record.get(field).unwrap_or_default();
            raw.parse::<f64>()
                .map_err(|_| EphemerisError::InvalidNumber {
                    line,
                    field: field + 1,
                    value: raw.to_string(),
                })
        };

        let epoch_jd = parse(0)?;
        let mut state = [0.0; 6];
        for (slot, field) in state.iter_mut().zip(2..8) {
            *slot = parse(field)?;
        }
        samples.push(StateSample::from_state(epoch_jd, state));
    }

    Ok(samples)
}

/// Read and parse a cached Horizons response from disk.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<StateSample>, EphemerisError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| EphemerisError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_horizons(&text)
}

/// Zip separate epoch and state columns into samples.
pub fn samples_from_columns(
    epochs_jd: &[f64],
    states: &[[f64; 6]],
) -> Result<Vec<StateSample>, EphemerisError> {
    if epochs_jd.len() != states.len() {
        return Err(EphemerisError::LengthMismatch {
            epochs: epochs_jd.len(),
            states: states.len(),
        });
    }
    Ok(epochs_jd
        .iter()
        .zip(states)
        .map(|(&epoch, state)| StateSample::from_state(epoch, *state))
        .collect())
}

/// Check that a sequence is non-empty, finite, and ordered by epoch.
pub fn validate_samples(samples: &[StateSample]) -> Result<(), EphemerisError> {
    if samples.is_empty() {
        return Err(EphemerisError::Empty);
    }
    let mut previous: Option<f64> = None;
    for (index, sample) in samples.iter().enumerate() {
        if !sample.epoch_jd.is_finite() {
            return Err(EphemerisError::NonFinite {
                index,
                quantity: "epoch",
            });
        }
        if !vector::is_finite(&sample.position_km) {
            return Err(EphemerisError::NonFinite {
                index,
                quantity: "position",
            });
        }
        if !vector::is_finite(&sample.velocity_km_s) {
            return Err(EphemerisError::NonFinite {
                index,
                quantity: "velocity",
            });
        }
        if let Some(prev) = previous {
            if sample.epoch_jd < prev {
                return Err(EphemerisError::DecreasingEpoch {
                    index,
                    epoch: sample.epoch_jd,
                    previous: prev,
                });
            }
        }
        previous = Some(sample.epoch_jd);
    }
    Ok(())
}

/// Epoch column of a sample sequence.
pub fn epochs(samples: &[StateSample]) -> Vec<f64> {
    samples.iter().map(|s| s.epoch_jd).collect()
}
