//! Porkchop campaign crate: grid sweep, result matrices and configuration glue.

pub mod grid;
pub mod porkchop;

pub use facade::*;
pub use grid::{Matrix, Metric, ResultGrid};
pub use porkchop::{
    CampaignError, CampaignResult, CampaignSettings, CampaignSummary, GridMinimum, Leg,
    SENTINEL_VELOCITY_KM_S, run,
};
pub use porkchop_impulsive as impulsive;

mod facade;
