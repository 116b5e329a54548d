//! Porkchop grid sweep: two Lambert solves per (arrival, departure) pair.

use porkchop_core::time;
use porkchop_core::vector::{self, Vector3};
use porkchop_ephem::{self as ephem, EphemerisError, StateSample};
use porkchop_impulsive::lambert::{
    self, LambertError, LambertOutcome, SolverSettings, TransferDirection,
};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::grid::{Matrix, ResultGrid};

/// Velocity substituted for a transfer that did not converge (km/s per component).
pub const SENTINEL_VELOCITY_KM_S: Vector3 = [1_000.0, 1_000.0, 1_000.0];

/// Which body a sample sequence belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Departure,
    Arrival,
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Departure => "departure",
            Self::Arrival => "arrival",
        })
    }
}

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("{leg} ephemeris rejected: {source}")]
    Ephemeris {
        leg: Leg,
        #[source]
        source: EphemerisError,
    },
    #[error("solver contract violated: {0}")]
    Lambert(#[from] LambertError),
    #[error("v-infinity cutoff must be positive and finite (got {0})")]
    InvalidCutoff(f64),
    #[error("configuration error: {0}")]
    Config(#[from] porkchop_config::ConfigError),
}

/// Numerical inputs of a campaign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CampaignSettings {
    pub mu_km3_s2: f64,
    pub vinf_cutoff_km_s: f64,
    pub solver: SolverSettings,
    /// Sweep arrival rows on the rayon pool.
    pub parallel: bool,
}

impl CampaignSettings {
    pub fn new(mu_km3_s2: f64, vinf_cutoff_km_s: f64) -> Self {
        Self {
            mu_km3_s2,
            vinf_cutoff_km_s,
            solver: SolverSettings::default(),
            parallel: true,
        }
    }

    pub fn c3_cutoff_km2_s2(&self) -> f64 {
        self.vinf_cutoff_km_s * self.vinf_cutoff_km_s
    }

    pub fn validate(&self) -> Result<(), CampaignError> {
        self.solver.validate()?;
        if !(self.mu_km3_s2.is_finite() && self.mu_km3_s2 > 0.0) {
            return Err(LambertError::InvalidGravitationalParameter(self.mu_km3_s2).into());
        }
        if !(self.vinf_cutoff_km_s.is_finite() && self.vinf_cutoff_km_s > 0.0) {
            return Err(CampaignError::InvalidCutoff(self.vinf_cutoff_km_s));
        }
        Ok(())
    }
}

/// Location and value of a matrix minimum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridMinimum {
    pub value: f64,
    pub arrival_index: usize,
    pub departure_index: usize,
    pub departure_jd: f64,
    pub arrival_jd: f64,
    pub tof_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignSummary {
    pub min_c3_short: Option<GridMinimum>,
    pub min_vinf_short: Option<GridMinimum>,
    pub min_c3_long: Option<GridMinimum>,
    pub min_vinf_long: Option<GridMinimum>,
    pub cell_count: usize,
    pub evaluated_cells: usize,
    /// Cells skipped because arrival does not follow departure.
    pub invalid_cells: usize,
    /// Individual solves replaced by the sentinel velocity.
    pub failed_solves: usize,
    pub solver_calls: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignResult {
    pub grid: ResultGrid,
    pub summary: CampaignSummary,
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    c3_short: f64,
    c3_long: f64,
    vinf_short: f64,
    vinf_long: f64,
    tof_days: f64,
    evaluated: bool,
    failures: u8,
}

impl Cell {
    const INVALID: Cell = Cell {
        c3_short: f64::NAN,
        c3_long: f64::NAN,
        vinf_short: f64::NAN,
        vinf_long: f64::NAN,
        tof_days: f64::NAN,
        evaluated: false,
        failures: 0,
    };
}

/// Sweep every (arrival, departure) pair.
///
/// Inputs are checked up front; afterwards a cell whose transfer does not
/// converge is filled from the sentinel velocity and the sweep continues.
pub fn run(
    departures: &[StateSample],
    arrivals: &[StateSample],
    settings: &CampaignSettings,
) -> Result<CampaignResult, CampaignError> {
    settings.validate()?;
    ephem::validate_samples(departures).map_err(|source| CampaignError::Ephemeris {
        leg: Leg::Departure,
        source,
    })?;
    ephem::validate_samples(arrivals).map_err(|source| CampaignError::Ephemeris {
        leg: Leg::Arrival,
        source,
    })?;

    let rows = arrivals.len();
    let cols = departures.len();
    info!(
        arrivals = rows,
        departures = cols,
        parallel = settings.parallel,
        "starting porkchop sweep"
    );

    let mut cells = vec![Cell::INVALID; rows * cols];
    let sweep_row = |(arrival_index, row): (usize, &mut [Cell])| -> Result<(), LambertError> {
        let arrival = &arrivals[arrival_index];
        for (departure_index, cell) in row.iter_mut().enumerate() {
            *cell = evaluate_cell(
                &departures[departure_index],
                arrival,
                settings,
                (arrival_index, departure_index),
            )?;
        }
        Ok(())
    };
    if settings.parallel {
        cells
            .par_chunks_mut(cols)
            .enumerate()
            .try_for_each(&sweep_row)?;
    } else {
        cells.chunks_mut(cols).enumerate().try_for_each(&sweep_row)?;
    }

    let matrix = |pick: fn(&Cell) -> f64| {
        Matrix::from_fn(rows, cols, |row, col| pick(&cells[row * cols + col]))
    };
    let c3_short = matrix(|c| c.c3_short);
    let c3_long = matrix(|c| c.c3_long);
    let vinf_short = matrix(|c| c.vinf_short);
    let vinf_long = matrix(|c| c.vinf_long);
    let tof_days = matrix(|c| c.tof_days);
    let dv_short = matrix(|c| c.vinf_short + c.c3_short.sqrt());
    let dv_long = matrix(|c| c.vinf_long + c.c3_long.sqrt());

    let grid = ResultGrid {
        departure_epochs_jd: ephem::epochs(departures),
        arrival_epochs_jd: ephem::epochs(arrivals),
        c3_short,
        c3_long,
        vinf_short,
        vinf_long,
        tof_days,
        dv_short,
        dv_long,
    };

    let cell_count = grid.cell_count();
    let evaluated_cells = cells.iter().filter(|c| c.evaluated).count();
    let failed_solves = cells.iter().map(|c| usize::from(c.failures)).sum();
    let summary = CampaignSummary {
        min_c3_short: minimum(&grid, &grid.c3_short),
        min_vinf_short: minimum(&grid, &grid.vinf_short),
        min_c3_long: minimum(&grid, &grid.c3_long),
        min_vinf_long: minimum(&grid, &grid.vinf_long),
        cell_count,
        evaluated_cells,
        invalid_cells: cell_count - evaluated_cells,
        failed_solves,
        solver_calls: 2 * evaluated_cells,
    };
    info!(
        evaluated = summary.evaluated_cells,
        invalid = summary.invalid_cells,
        failed_solves = summary.failed_solves,
        "porkchop sweep finished"
    );

    Ok(CampaignResult { grid, summary })
}

fn evaluate_cell(
    departure: &StateSample,
    arrival: &StateSample,
    settings: &CampaignSettings,
    (arrival_index, departure_index): (usize, usize),
) -> Result<Cell, LambertError> {
    let tof_days = arrival.epoch_jd - departure.epoch_jd;
    if tof_days <= 0.0 {
        return Ok(Cell::INVALID);
    }

    let mut cell = Cell {
        tof_days,
        evaluated: true,
        ..Cell::INVALID
    };
    let c3_cutoff = settings.c3_cutoff_km2_s2();
    for direction in TransferDirection::BOTH {
        let outcome = lambert::solve(
            departure.position_km,
            arrival.position_km,
            time::days_to_seconds(tof_days),
            settings.mu_km3_s2,
            direction,
            &settings.solver,
        )?;
        let (v1, v2) = match outcome {
            LambertOutcome::Solved(solution) => (solution.v1_km_s, solution.v2_km_s),
            LambertOutcome::NotConverged(reason) => {
                warn!(
                    arrival_index,
                    departure_index,
                    direction = %direction,
                    reason = %reason,
                    "lambert solve did not converge; substituting sentinel velocity"
                );
                cell.failures += 1;
                (SENTINEL_VELOCITY_KM_S, SENTINEL_VELOCITY_KM_S)
            }
        };

        let c3 = vector::norm_squared(&vector::sub(&v1, &departure.velocity_km_s)).min(c3_cutoff);
        let vinf = vector::norm(&vector::sub(&v2, &arrival.velocity_km_s))
            .min(settings.vinf_cutoff_km_s);
        match direction {
            TransferDirection::Prograde => {
                cell.c3_short = c3;
                cell.vinf_short = vinf;
            }
            TransferDirection::Retrograde => {
                cell.c3_long = c3;
                cell.vinf_long = vinf;
            }
        }
    }
    Ok(cell)
}

fn minimum(grid: &ResultGrid, matrix: &Matrix) -> Option<GridMinimum> {
    let (value, arrival_index, departure_index) = matrix.min_finite()?;
    Some(GridMinimum {
        value,
        arrival_index,
        departure_index,
        departure_jd: grid.departure_epochs_jd[departure_index],
        arrival_jd: grid.arrival_epochs_jd[arrival_index],
        tof_days: grid.tof_days[(arrival_index, departure_index)],
    })
}
