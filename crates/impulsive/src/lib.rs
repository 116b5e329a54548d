//! Impulsive transfer utilities: Stumpff functions, Newton-Raphson, and the Lambert solver.

pub mod lambert;
pub mod newton;
pub mod stumpff;

pub use lambert::{
    LambertError, LambertOutcome, NonConvergence, SolverSettings, TransferDirection,
    TransferRequest, TransferSolution,
};
pub use newton::RootFindError;
