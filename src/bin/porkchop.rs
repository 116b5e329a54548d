use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use porkchop_planner::config::{self, BodyCatalog, CampaignConfig};
use porkchop_planner::ephemeris::horizons::HorizonsQuery;
use porkchop_planner::ephemeris::{self, StateSample, julian};
use porkchop_planner::export::{self, porkchop as export_porkchop, summary as export_summary};
use porkchop_planner::importer;
use porkchop_planner::transfer::{self, CampaignSummary, GridMinimum};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sweep departure and arrival dates with a Lambert solver and export porkchop matrices.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Porkchop grid generator (two-body Lambert, short and long way)"
)]
struct Cli {
    /// Campaign file (TOML or YAML); defaults to the 2020 Earth→Mars window
    #[arg(long)]
    config: Option<PathBuf>,

    /// Body catalog file (TOML or YAML); defaults to the built-in catalog
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Departure body name or Horizons id
    #[arg(long)]
    from: Option<String>,

    /// Arrival body name or Horizons id
    #[arg(long)]
    to: Option<String>,

    /// Departure window start (YYYY-MM-DD)
    #[arg(long)]
    depart_start: Option<String>,

    /// Departure window end (YYYY-MM-DD)
    #[arg(long)]
    depart_end: Option<String>,

    /// Arrival window start (YYYY-MM-DD)
    #[arg(long)]
    arrive_start: Option<String>,

    /// Arrival window end (YYYY-MM-DD)
    #[arg(long)]
    arrive_end: Option<String>,

    /// Grid step in days
    #[arg(long)]
    step_days: Option<f64>,

    /// v-infinity cutoff in km/s (C3 cutoff is its square)
    #[arg(long)]
    vinf_cutoff: Option<f64>,

    /// Central-body gravitational parameter override (km^3/s^2)
    #[arg(long)]
    mu: Option<f64>,

    /// Newton-Raphson absolute tolerance on z
    #[arg(long)]
    tolerance: Option<f64>,

    /// Newton-Raphson iteration cap
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Sweep the grid on a single thread
    #[arg(long, default_value_t = false)]
    serial: bool,

    /// Directory for cached Horizons responses
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Ignore cached Horizons responses and download again
    #[arg(long, default_value_t = false)]
    refresh: bool,

    /// Read departure states from a saved Horizons vector table instead of downloading
    #[arg(long)]
    departure_ephemeris: Option<PathBuf>,

    /// Read arrival states from a saved Horizons vector table instead of downloading
    #[arg(long)]
    arrival_ephemeris: Option<PathBuf>,

    /// Output CSV file (use '-' for stdout)
    #[arg(long, default_value = "artifacts/porkchop.csv")]
    output: PathBuf,

    /// Summary JSON path (defaults to `<output stem>_summary.json`)
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut CampaignConfig) {
        if let Some(from) = &self.from {
            config.departure_body = from.clone();
        }
        if let Some(to) = &self.to {
            config.arrival_body = to.clone();
        }
        if let Some(start) = &self.depart_start {
            config.departure_window.start = start.clone();
        }
        if let Some(end) = &self.depart_end {
            config.departure_window.end = end.clone();
        }
        if let Some(start) = &self.arrive_start {
            config.arrival_window.start = start.clone();
        }
        if let Some(end) = &self.arrive_end {
            config.arrival_window.end = end.clone();
        }
        if let Some(step) = self.step_days {
            config.step_days = step;
        }
        if let Some(cutoff) = self.vinf_cutoff {
            config.vinf_cutoff_km_s = cutoff;
        }
        if let Some(mu) = self.mu {
            config.mu_km3_s2 = Some(mu);
        }
        if let Some(tolerance) = self.tolerance {
            config.solver.tolerance = tolerance;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.solver.max_iterations = max_iterations;
        }
        if self.serial {
            config.parallel = false;
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if self.refresh {
            config.reuse_cache = false;
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = match &cli.catalog {
        Some(path) => config::load_catalog(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => BodyCatalog::builtin(),
    };
    let mut campaign = match &cli.config {
        Some(path) => config::load_campaign(path)
            .with_context(|| format!("loading campaign {}", path.display()))?,
        None => CampaignConfig::default(),
    };
    cli.apply_overrides(&mut campaign);

    let settings = transfer::settings_from_config(&campaign, &catalog)?;
    let (departures, arrivals) = load_states(&cli, &campaign, &catalog)?;
    info!(
        from = %campaign.departure_body,
        to = %campaign.arrival_body,
        departures = departures.len(),
        arrivals = arrivals.len(),
        "ephemerides ready"
    );

    let result = transfer::run(&departures, &arrivals, &settings)?;

    let mut writer = export::writer_for_path(&cli.output)?;
    export_porkchop::write_grid(writer.as_mut(), &result.grid)?;
    drop(writer);

    let to_stdout = cli.output == Path::new("-");
    let summary_path = match (&cli.summary, to_stdout) {
        (Some(path), _) => Some(path.clone()),
        (None, false) => Some(export_summary::sidecar_path(&cli.output)),
        (None, true) => None,
    };
    if let Some(path) = &summary_path {
        let meta = export_summary::Metadata {
            departure_body: &campaign.departure_body,
            arrival_body: &campaign.arrival_body,
            central_body: &campaign.central_body,
            mu_km3_s2: settings.mu_km3_s2,
            step_days: campaign.step_days,
            vinf_cutoff_km_s: settings.vinf_cutoff_km_s,
        };
        export_summary::write_summary(path, &meta, &result.summary)
            .with_context(|| format!("writing summary {}", path.display()))?;
    }

    if !to_stdout {
        print_summary(&campaign, &result.summary);
        println!("grid written to {}", cli.output.display());
        if let Some(path) = summary_path {
            println!("summary written to {}", path.display());
        }
    }

    Ok(())
}

fn load_states(
    cli: &Cli,
    campaign: &CampaignConfig,
    catalog: &BodyCatalog,
) -> anyhow::Result<(Vec<StateSample>, Vec<StateSample>)> {
    let (departure_query, arrival_query) = transfer::horizons_queries(campaign, catalog)?;
    let departures = load_leg(cli.departure_ephemeris.as_deref(), &departure_query, campaign)?;
    let arrivals = load_leg(cli.arrival_ephemeris.as_deref(), &arrival_query, campaign)?;
    Ok((departures, arrivals))
}

fn load_leg(
    file: Option<&Path>,
    query: &HorizonsQuery,
    campaign: &CampaignConfig,
) -> anyhow::Result<Vec<StateSample>> {
    match file {
        Some(path) => ephemeris::load_file(path)
            .with_context(|| format!("reading ephemeris {}", path.display())),
        None => {
            let (status, samples) =
                importer::fetch(query, &campaign.cache_dir, campaign.reuse_cache)
                    .with_context(|| format!("fetching Horizons body {}", query.command))?;
            info!(path = %status.path().display(), "ephemeris source");
            Ok(samples)
        }
    }
}

fn print_summary(campaign: &CampaignConfig, summary: &CampaignSummary) {
    println!(
        "{} -> {}: {} cells ({} evaluated, {} invalid), {} solver calls, {} non-converged",
        campaign.departure_body,
        campaign.arrival_body,
        summary.cell_count,
        summary.evaluated_cells,
        summary.invalid_cells,
        summary.solver_calls,
        summary.failed_solves,
    );
    print_minimum("min C3 (short)", "km^2/s^2", summary.min_c3_short.as_ref());
    print_minimum("min v_inf (short)", "km/s", summary.min_vinf_short.as_ref());
    print_minimum("min C3 (long)", "km^2/s^2", summary.min_c3_long.as_ref());
    print_minimum("min v_inf (long)", "km/s", summary.min_vinf_long.as_ref());
}

fn print_minimum(label: &str, unit: &str, minimum: Option<&GridMinimum>) {
    match minimum {
        Some(min) => println!(
            "  {:<18} {:>10.4} {:<9} depart {}  arrive {}  tof {:.1} d",
            label,
            min.value,
            unit,
            julian::format_date(min.departure_jd),
            julian::format_date(min.arrival_jd),
            min.tof_days
        ),
        None => println!("  {:<18} n/a (no valid cells)", label),
    }
}
