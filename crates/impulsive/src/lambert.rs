//! Single-revolution Lambert solver in the universal-variable formulation.
//!
//! Follows the classic Curtis algorithm: the transfer angle is disambiguated
//! with the z-component of `r1 × r2`, a sign change of the time equation F(z)
//! is bracketed by stepping z upward, and Newton-Raphson refines the root.
//!
//! Two tiers of failure are kept apart. Contract violations (bad settings,
//! non-finite inputs, non-positive μ or time of flight) are `LambertError`s.
//! Numerically hard transfers are not errors: they come back as
//! [`LambertOutcome::NotConverged`] so a grid sweep can record them and move on.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use porkchop_core::vector::{self, Vector3};
use thiserror::Error;
use tracing::trace;

use crate::newton::{self, RootFindError};
use crate::stumpff;

/// First z probed by the bracketing search.
const Z_SEARCH_START: f64 = 0.1;
/// Increment of the bracketing search.
const Z_SEARCH_STEP: f64 = 0.1;
/// C(z) vanishes at z = 4π²; past it the time equation describes multi-revolution orbits.
pub const Z_SEARCH_CEILING: f64 = 4.0 * PI * PI;
/// Below this value of `1 - cos Δθ` the transfer plane is undefined.
const DEGENERATE_ANGLE_EPS: f64 = 1e-12;
/// dF/dz takes its z = 0 limit inside this band.
const PARABOLIC_DERIVATIVE_BAND: f64 = 1e-6;

/// Transfer sense relative to the reference-plane normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferDirection {
    /// Counter-clockwise about +z; the short way for bodies orbiting prograde.
    Prograde,
    /// Clockwise about +z; the long way for bodies orbiting prograde.
    Retrograde,
}

impl TransferDirection {
    pub const BOTH: [TransferDirection; 2] =
        [TransferDirection::Prograde, TransferDirection::Retrograde];

    pub fn label(self) -> &'static str {
        match self {
            Self::Prograde => "prograde",
            Self::Retrograde => "retrograde",
        }
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransferDirection {
    type Err = LambertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pro" | "prograde" | "short" => Ok(Self::Prograde),
            "retro" | "retrograde" | "long" => Ok(Self::Retrograde),
            _ => Err(LambertError::InvalidDirection(s.to_string())),
        }
    }
}

/// Convergence controls forwarded to the Newton-Raphson stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Absolute tolerance on successive z iterates.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 500,
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), LambertError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(LambertError::InvalidTolerance(self.tolerance));
        }
        if self.max_iterations == 0 {
            return Err(LambertError::InvalidIterationCap);
        }
        Ok(())
    }
}

/// Boundary-value problem for one transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferRequest {
    pub r1_km: Vector3,
    pub r2_km: Vector3,
    pub time_of_flight_s: f64,
    pub mu_km3_s2: f64,
    pub direction: TransferDirection,
}

/// Terminal velocities of a converged transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSolution {
    pub v1_km_s: Vector3,
    pub v2_km_s: Vector3,
    /// Universal variable at convergence (positive: elliptic, negative: hyperbolic).
    pub z: f64,
    pub iterations: usize,
}

/// Why a well-formed request produced no transfer.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NonConvergence {
    #[error("degenerate geometry: transfer angle is zero or a position vector has zero length")]
    Degenerate,
    #[error("no sign change of the time equation below z = {ceiling:.3}")]
    SearchExhausted { ceiling: f64 },
    #[error("root finder failed: {0}")]
    RootFinder(RootFindError),
    #[error("terminal velocities are not finite")]
    NonFiniteVelocity,
}

/// Result of a solve whose inputs satisfied the solver contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LambertOutcome {
    Solved(TransferSolution),
    NotConverged(NonConvergence),
}

impl LambertOutcome {
    pub fn solution(&self) -> Option<&TransferSolution> {
        match self {
            Self::Solved(solution) => Some(solution),
            Self::NotConverged(_) => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved(_))
    }
}

/// Contract violations detected at the solver boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LambertError {
    #[error("unrecognized transfer direction `{0}` (expected prograde or retrograde)")]
    InvalidDirection(String),
    #[error("tolerance must be a positive finite number (got {0})")]
    InvalidTolerance(f64),
    #[error("iteration cap must be at least one")]
    InvalidIterationCap,
    #[error("gravitational parameter must be positive and finite (got {0})")]
    InvalidGravitationalParameter(f64),
    #[error("time of flight must be positive and finite (got {0} s)")]
    InvalidTimeOfFlight(f64),
    #[error("position vectors must have finite components")]
    NonFinitePosition,
}

/// Solve Lambert's problem for a single revolution.
pub fn solve(
    r1_km: Vector3,
    r2_km: Vector3,
    time_of_flight_s: f64,
    mu_km3_s2: f64,
    direction: TransferDirection,
    settings: &SolverSettings,
) -> Result<LambertOutcome, LambertError> {
    solve_request(
        &TransferRequest {
            r1_km,
            r2_km,
            time_of_flight_s,
            mu_km3_s2,
            direction,
        },
        settings,
    )
}

/// Solve a prepared [`TransferRequest`].
pub fn solve_request(
    request: &TransferRequest,
    settings: &SolverSettings,
) -> Result<LambertOutcome, LambertError> {
    settings.validate()?;
    let mu = request.mu_km3_s2;
    let dt = request.time_of_flight_s;
    if !(mu.is_finite() && mu > 0.0) {
        return Err(LambertError::InvalidGravitationalParameter(mu));
    }
    if !(dt.is_finite() && dt > 0.0) {
        return Err(LambertError::InvalidTimeOfFlight(dt));
    }
    let r1_vec = &request.r1_km;
    let r2_vec = &request.r2_km;
    if !(vector::is_finite(r1_vec) && vector::is_finite(r2_vec)) {
        return Err(LambertError::NonFinitePosition);
    }

    let r1 = vector::norm(r1_vec);
    let r2 = vector::norm(r2_vec);
    if r1 == 0.0 || r2 == 0.0 {
        return Ok(LambertOutcome::NotConverged(NonConvergence::Degenerate));
    }

    let dtheta = transfer_angle(r1_vec, r2_vec, r1, r2, request.direction);
    let one_minus_cos = 1.0 - dtheta.cos();
    if one_minus_cos < DEGENERATE_ANGLE_EPS {
        return Ok(LambertOutcome::NotConverged(NonConvergence::Degenerate));
    }

    let equation = TimeEquation {
        r1,
        r2,
        a: dtheta.sin() * (r1 * r2 / one_minus_cos).sqrt(),
        sqrt_mu_dt: mu.sqrt() * dt,
    };

    let z0 = match equation.bracket() {
        Some(z) => z,
        None => {
            return Ok(LambertOutcome::NotConverged(
                NonConvergence::SearchExhausted {
                    ceiling: Z_SEARCH_CEILING,
                },
            ));
        }
    };

    let root = match newton::solve(
        |z| equation.f(z),
        |z| equation.dfdz(z),
        z0,
        settings.tolerance,
        settings.max_iterations,
    ) {
        Ok(root) => root,
        Err(err) => {
            return Ok(LambertOutcome::NotConverged(NonConvergence::RootFinder(
                err,
            )));
        }
    };
    trace!(
        z = root.value,
        iterations = root.iterations,
        direction = %request.direction,
        "lambert time equation converged"
    );

    let z = root.value;
    let y = equation.y(z);
    let f = 1.0 - y / r1;
    let g = equation.a * (y / mu).sqrt();
    let g_dot = 1.0 - y / r2;

    let v1 = vector::scale(&vector::sub(r2_vec, &vector::scale(r1_vec, f)), 1.0 / g);
    let v2 = vector::scale(&vector::sub(&vector::scale(r2_vec, g_dot), r1_vec), 1.0 / g);
    if !(vector::is_finite(&v1) && vector::is_finite(&v2)) {
        return Ok(LambertOutcome::NotConverged(
            NonConvergence::NonFiniteVelocity,
        ));
    }

    Ok(LambertOutcome::Solved(TransferSolution {
        v1_km_s: v1,
        v2_km_s: v2,
        z,
        iterations: root.iterations,
    }))
}

/// Transfer angle Δθ in [0, 2π) for the requested direction.
pub fn transfer_angle(
    r1_vec: &Vector3,
    r2_vec: &Vector3,
    r1: f64,
    r2: f64,
    direction: TransferDirection,
) -> f64 {
    let cos_dtheta = (vector::dot(r1_vec, r2_vec) / (r1 * r2)).clamp(-1.0, 1.0);
    let dtheta = cos_dtheta.acos();
    let normal_z = vector::cross(r1_vec, r2_vec)[2];
    let flip = match direction {
        TransferDirection::Prograde => normal_z < 0.0,
        TransferDirection::Retrograde => normal_z >= 0.0,
    };
    if flip { 2.0 * PI - dtheta } else { dtheta }
}

/// Universal-variable time equation F(z) = 0 and its derivative.
struct TimeEquation {
    r1: f64,
    r2: f64,
    a: f64,
    sqrt_mu_dt: f64,
}

impl TimeEquation {
    fn y(&self, z: f64) -> f64 {
        self.r1 + self.r2 + self.a * (z * stumpff::s(z) - 1.0) / stumpff::c(z).sqrt()
    }

    /// NaN where y(z) < 0, i.e. where no real transfer exists.
    fn f(&self, z: f64) -> f64 {
        let y = self.y(z);
        if y < 0.0 {
            return f64::NAN;
        }
        let c = stumpff::c(z);
        (y / c).powf(1.5) * stumpff::s(z) + self.a * y.sqrt() - self.sqrt_mu_dt
    }

    fn dfdz(&self, z: f64) -> f64 {
        let a = self.a;
        if z.abs() < PARABOLIC_DERIVATIVE_BAND {
            let y0 = self.y(0.0);
            return 2f64.sqrt() / 40.0 * y0.powf(1.5)
                + a / 8.0 * (y0.sqrt() + a * (1.0 / (2.0 * y0)).sqrt());
        }
        let y = self.y(z);
        let c = stumpff::c(z);
        let s = stumpff::s(z);
        (y / c).powf(1.5) * (1.0 / (2.0 * z) * (c - 3.0 * s / (2.0 * c)) + 3.0 * s * s / (4.0 * c))
            + a / 8.0 * (3.0 * s / c * y.sqrt() + a * (c / y).sqrt())
    }

    /// First sampled z at which F(z) is defined and non-negative.
    fn bracket(&self) -> Option<f64> {
        let mut step = 0u32;
        loop {
            let z = Z_SEARCH_START + Z_SEARCH_STEP * f64::from(step);
            if z > Z_SEARCH_CEILING {
                return None;
            }
            let value = self.f(z);
            if value.is_finite() && value >= 0.0 {
                return Some(z);
            }
            step += 1;
        }
    }
}
