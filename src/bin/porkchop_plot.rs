//! Render a porkchop heatmap from a grid CSV written by `porkchop`.

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use porkchop_planner::ephemeris::julian;
use porkchop_planner::export::porkchop::{self as grid_csv, GridTable};
use porkchop_planner::transfer::{Matrix, Metric};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Render a porkchop heatmap from the grid CSV"
)]
struct Cli {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "artifacts/porkchop.png")]
    output: PathBuf,
    /// c3_short, c3_long, vinf_short, vinf_long, tof_days, dv_short or dv_long
    #[arg(long, default_value = "c3_short")]
    metric: Metric,
    #[arg(long, default_value_t = 1200)]
    width: u32,
    #[arg(long, default_value_t = 900)]
    height: u32,
    /// Colours saturate at this multiple of the minimum
    #[arg(long, default_value_t = 4.0)]
    high_clip_factor: f64,
    /// Number of contour levels of the metric
    #[arg(long, default_value_t = 30)]
    levels: usize,
    /// Overlay this many time-of-flight contours (0 disables)
    #[arg(long, default_value_t = 0)]
    tof_levels: usize,
    #[arg(long, default_value = "Porkchop Plot")]
    title: String,
}

type Chart<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const FONT: &str = "sans-serif";
const LEGEND_WIDTH: i32 = 140;
const LEGEND_STEPS: usize = 120;

/// Viridis anchor colours, low to high.
const RAMP: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Maps metric values onto the colour ramp, saturating above `hi`.
struct ColorScale {
    lo: f64,
    hi: f64,
}

impl ColorScale {
    fn for_values(values: &Matrix, clip_factor: f64) -> Option<Self> {
        let (lo, _, _) = values.min_finite()?;
        let max = values
            .as_slice()
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(lo, f64::max);
        let mut hi = (lo * clip_factor).min(max);
        if !(hi > lo) {
            hi = if max > lo {
                max
            } else {
                lo + lo.abs().max(1.0) * 1e-3
            };
        }
        Some(Self { lo, hi })
    }

    fn fraction(&self, value: f64) -> f64 {
        ((value - self.lo) / (self.hi - self.lo)).clamp(0.0, 1.0)
    }

    fn color(&self, value: f64) -> RGBColor {
        ramp(self.fraction(value))
    }

    /// `count` evenly spaced values from `lo` to `hi`.
    fn levels(&self, count: usize) -> Vec<f64> {
        spaced(self.lo, self.hi, count)
    }
}

fn ramp(t: f64) -> RGBColor {
    let x = t.clamp(0.0, 1.0) * (RAMP.len() - 1) as f64;
    let i = (x.floor() as usize).min(RAMP.len() - 2);
    let f = x - i as f64;
    let (a, b) = (RAMP[i], RAMP[i + 1]);
    let mix = |p: u8, q: u8| (f64::from(p) + f * (f64::from(q) - f64::from(p))).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn spaced(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    let count = count.max(2);
    (0..count)
        .map(|k| lo + (hi - lo) * k as f64 / (count - 1) as f64)
        .collect()
}

/// Day offsets of each epoch from the first one.
fn offsets(epochs_jd: &[f64]) -> Vec<f64> {
    let origin = epochs_jd.first().copied().unwrap_or(0.0);
    epochs_jd.iter().map(|jd| jd - origin).collect()
}

/// Cell boundaries halfway between neighbouring centres; `n` centres give `n + 1` edges.
fn cell_edges(centres: &[f64]) -> Vec<f64> {
    let n = centres.len();
    match centres {
        [] => Vec::new(),
        [only] => vec![only - 0.5, only + 0.5],
        [first, second, ..] => {
            let (before_last, last) = (centres[n - 2], centres[n - 1]);
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(first - 0.5 * (second - first));
            edges.extend(centres.windows(2).map(|w| 0.5 * (w[0] + w[1])));
            edges.push(last + 0.5 * (last - before_last));
            edges
        }
    }
}

/// Iso-lines of `values` at `level`.
///
/// Each grid square is split along its diagonal; a triangle whose corners
/// straddle the level contributes exactly one segment.
fn contour_segments(
    values: &Matrix,
    xs: &[f64],
    ys: &[f64],
    level: f64,
) -> Vec<[(f64, f64); 2]> {
    let mut segments = Vec::new();
    for i in 1..values.rows() {
        for j in 1..values.cols() {
            let corner = |row: usize, col: usize| (xs[col], ys[row], values[(row, col)]);
            let (a, b, c, d) = (
                corner(i - 1, j - 1),
                corner(i - 1, j),
                corner(i, j),
                corner(i, j - 1),
            );
            for triangle in [[a, b, c], [a, c, d]] {
                if triangle.iter().all(|p| p.2.is_finite()) {
                    segments.extend(triangle_crossing(triangle, level));
                }
            }
        }
    }
    segments
}

fn triangle_crossing(corners: [(f64, f64, f64); 3], level: f64) -> Option<[(f64, f64); 2]> {
    let mut hits = corners.iter().zip(corners.iter().cycle().skip(1)).filter_map(|(p, q)| {
        ((p.2 < level) != (q.2 < level)).then(|| {
            let t = (level - p.2) / (q.2 - p.2);
            (p.0 + t * (q.0 - p.0), p.1 + t * (q.1 - p.1))
        })
    });
    Some([hits.next()?, hits.next()?])
}

fn draw_contours(
    chart: &mut Chart<'_, '_>,
    values: &Matrix,
    xs: &[f64],
    ys: &[f64],
    levels: &[f64],
    style: impl Fn(f64) -> ShapeStyle,
) -> anyhow::Result<()> {
    for &level in levels {
        let line = style(level);
        chart.draw_series(
            contour_segments(values, xs, ys, level)
                .into_iter()
                .map(|[p, q]| PathElement::new(vec![p, q], line)),
        )?;
    }
    Ok(())
}

fn draw_heatmap(
    chart: &mut Chart<'_, '_>,
    table: &GridTable,
    scale: &ColorScale,
    x_edges: &[f64],
    y_edges: &[f64],
) -> anyhow::Result<()> {
    let values = &table.values;
    let cells = (0..values.rows()).flat_map(|i| (0..values.cols()).map(move |j| (i, j)));
    chart.draw_series(cells.filter_map(|(i, j)| {
        let value = values[(i, j)];
        value.is_finite().then(|| {
            Rectangle::new(
                [(x_edges[j], y_edges[i]), (x_edges[j + 1], y_edges[i + 1])],
                scale.color(value).filled(),
            )
        })
    }))?;
    Ok(())
}

fn draw_legend(
    area: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    scale: &ColorScale,
    metric: Metric,
) -> anyhow::Result<()> {
    let mut chart = ChartBuilder::on(area)
        .margin(24)
        .x_label_area_size(0)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, scale.lo..scale.hi)?;
    let bands = spaced(scale.lo, scale.hi, LEGEND_STEPS + 1);
    chart.draw_series(bands.windows(2).map(|w| {
        Rectangle::new([(0.0, w[0]), (1.0, w[1])], scale.color(w[0]).filled())
    }))?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(0)
        .y_labels(6)
        .y_desc(format!("{metric} ({})", metric.unit()))
        .label_style((FONT, 16))
        .axis_desc_style((FONT, 16))
        .y_label_formatter(&|v| format!("{v:.2}"))
        .draw()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let metric = cli.metric;
    let file = File::open(&cli.input)
        .with_context(|| format!("opening grid {}", cli.input.display()))?;
    let table = grid_csv::read_table(file, metric)
        .with_context(|| format!("reading grid {}", cli.input.display()))?;
    let scale = ColorScale::for_values(&table.values, cli.high_clip_factor)
        .ok_or_else(|| anyhow!("no valid cells in {}", cli.input.display()))?;
    let (min_value, min_row, min_col) = table
        .values
        .min_finite()
        .ok_or_else(|| anyhow!("no valid cells in {}", cli.input.display()))?;

    let xs = offsets(&table.departure_epochs_jd);
    let ys = offsets(&table.arrival_epochs_jd);
    let x_edges = cell_edges(&xs);
    let y_edges = cell_edges(&ys);
    let (x_lo, x_hi) = (x_edges[0], x_edges[x_edges.len() - 1]);
    let (y_lo, y_hi) = (y_edges[0], y_edges[y_edges.len() - 1]);
    let depart_origin = table.departure_epochs_jd[0];
    let arrive_origin = table.arrival_epochs_jd[0];

    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let root = BitMapBackend::new(&cli.output, (cli.width, cli.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let split = (cli.width as i32 - LEGEND_WIDTH).max(200);
    let (plot_area, legend_area) = root.split_horizontally(split);

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(20)
        .caption(format!("{} ({metric})", cli.title), (FONT, 24))
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
    chart
        .configure_mesh()
        .x_desc("Departure Date")
        .y_desc("Arrival Date")
        .label_style((FONT, 16))
        .x_labels(6)
        .y_labels(6)
        .x_label_formatter(&|d| julian::format_date(depart_origin + d))
        .y_label_formatter(&|d| julian::format_date(arrive_origin + d))
        .draw()?;

    draw_heatmap(&mut chart, &table, &scale, &x_edges, &y_edges)?;
    draw_contours(
        &mut chart,
        &table.values,
        &xs,
        &ys,
        &scale.levels(cli.levels),
        |level| ShapeStyle::from(&ramp(scale.fraction(level)).mix(0.9)).stroke_width(1),
    )?;

    if cli.tof_levels > 0 {
        let (tof_lo, tof_hi) = table
            .tof_days
            .as_slice()
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if tof_hi > tof_lo {
            // Interior levels only; the extremes touch a single corner.
            let levels = spaced(tof_lo, tof_hi, cli.tof_levels + 2);
            draw_contours(
                &mut chart,
                &table.tof_days,
                &xs,
                &ys,
                &levels[1..levels.len() - 1],
                |_| ShapeStyle::from(&BLACK.mix(0.6)).stroke_width(1),
            )?;
        }
    }

    let best = (xs[min_col], ys[min_row]);
    let marker = RGBColor(210, 60, 20);
    chart.draw_series(std::iter::once(Circle::new(
        best,
        7,
        ShapeStyle::from(&marker).stroke_width(3),
    )))?;
    chart.draw_series(std::iter::once(Text::new(
        format!(
            "min {metric} = {min_value:.2} {} ({} -> {})",
            metric.unit(),
            julian::format_date(table.departure_epochs_jd[min_col]),
            julian::format_date(table.arrival_epochs_jd[min_row]),
        ),
        (best.0 + 0.02 * (x_hi - x_lo), best.1 + 0.02 * (y_hi - y_lo)),
        (FONT, 16).into_font().color(&marker),
    )))?;

    draw_legend(&legend_area, &scale, metric)?;
    root.present()?;
    Ok(())
}
