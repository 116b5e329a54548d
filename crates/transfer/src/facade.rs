//! Glue from a [`CampaignConfig`] to campaign settings and Horizons queries.

use porkchop_config::{BodyCatalog, CampaignConfig};
use porkchop_ephem::horizons::HorizonsQuery;
use porkchop_impulsive::SolverSettings;

use crate::porkchop::{CampaignError, CampaignSettings};

/// Resolve μ and solver controls for a validated configuration.
pub fn settings_from_config(
    config: &CampaignConfig,
    catalog: &BodyCatalog,
) -> Result<CampaignSettings, CampaignError> {
    config.validate(catalog)?;
    Ok(CampaignSettings {
        mu_km3_s2: config.central_mu(catalog)?,
        vinf_cutoff_km_s: config.vinf_cutoff_km_s,
        solver: SolverSettings {
            tolerance: config.solver.tolerance,
            max_iterations: config.solver.max_iterations,
        },
        parallel: config.parallel,
    })
}

/// Departure and arrival Horizons requests for the configured windows.
pub fn horizons_queries(
    config: &CampaignConfig,
    catalog: &BodyCatalog,
) -> Result<(HorizonsQuery, HorizonsQuery), CampaignError> {
    let query = |body: &str, start: &str, stop: &str| -> Result<HorizonsQuery, CampaignError> {
        let constants = catalog.require(body)?;
        let mut query =
            HorizonsQuery::new(&constants.horizons_id, start, stop, config.step_days);
        query.center = config.horizons.center.clone();
        query.ref_plane = config.horizons.ref_plane.clone();
        query.ref_system = config.horizons.ref_system.clone();
        Ok(query)
    };
    let departure = query(
        &config.departure_body,
        &config.departure_window.start,
        &config.departure_window.end,
    )?;
    let arrival = query(
        &config.arrival_body,
        &config.arrival_window.start,
        &config.arrival_window.end,
    )?;
    Ok((departure, arrival))
}
