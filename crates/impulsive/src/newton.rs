//! Scalar Newton-Raphson root finder with an explicit derivative.
//!
//! Convergence is declared when the absolute step `|z_new - z|` drops below the
//! tolerance. Every iterate is checked for finiteness so a vanishing derivative
//! or an overflowing function value is reported instead of leaking NaN/∞.

use thiserror::Error;

/// Reasons a Newton-Raphson solve can fail.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RootFindError {
    #[error("tolerance must be a positive finite number (got {0})")]
    InvalidTolerance(f64),
    #[error("iteration cap must be at least one")]
    InvalidIterationCap,
    #[error("initial guess {0} is not finite")]
    NonFiniteGuess(f64),
    #[error("derivative vanished at z = {z}")]
    ZeroDerivative { z: f64 },
    #[error("iterate became non-finite after {iterations} iterations")]
    NonFinite { iterations: usize },
    #[error("no convergence after {iterations} iterations (last step {last_step:e})")]
    NotConverged { iterations: usize, last_step: f64 },
}

/// Converged root along with the number of iterations used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    pub value: f64,
    pub iterations: usize,
}

/// Find a root of `f` starting from `initial_guess`.
pub fn solve<F, D>(
    f: F,
    dfdz: D,
    initial_guess: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<Root, RootFindError>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(RootFindError::InvalidTolerance(tolerance));
    }
    if max_iterations == 0 {
        return Err(RootFindError::InvalidIterationCap);
    }
    if !initial_guess.is_finite() {
        return Err(RootFindError::NonFiniteGuess(initial_guess));
    }

    let mut z = initial_guess;
    let mut last_step = f64::INFINITY;
    for iteration in 1..=max_iterations {
        let slope = dfdz(z);
        if slope == 0.0 {
            return Err(RootFindError::ZeroDerivative { z });
        }
        let z_new = z - f(z) / slope;
        if !z_new.is_finite() {
            return Err(RootFindError::NonFinite {
                iterations: iteration,
            });
        }
        last_step = (z_new - z).abs();
        if last_step < tolerance {
            return Ok(Root {
                value: z_new,
                iterations: iteration,
            });
        }
        z = z_new;
    }

    Err(RootFindError::NotConverged {
        iterations: max_iterations,
        last_step,
    })
}
