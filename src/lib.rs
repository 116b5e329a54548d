//! Porkchop Planner: Lambert-based launch-window analysis between two bodies.
//!
//! The workspace crates are re-exported here so front-ends (the `porkchop`
//! CLI, the plotting binary, tests) depend on a single library.

pub use porkchop_config as config;
pub use porkchop_core as primitives;
pub use porkchop_ephem as ephemeris;
pub use porkchop_export as export;
pub use porkchop_importer as importer;
pub use porkchop_impulsive as impulsive;
pub use porkchop_transfer as transfer;

/// Returns the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
