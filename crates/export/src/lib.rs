//! Export helpers for CSV grids and JSON summaries.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    create_parent(path)?;
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

fn create_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub mod porkchop {
    use std::io::{self, Read, Write};

    use csv::ReaderBuilder;
    use porkchop_ephem::julian;
    use porkchop_transfer::{Matrix, Metric, ResultGrid};
    use thiserror::Error;

    pub const HEADER: &str = "depart_jd,arrive_jd,depart_date,arrive_date,tof_days,c3_short,c3_long,vinf_short,vinf_long,dv_short,dv_long,valid";

    /// Write the standard porkchop CSV header.
    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// CSV row emitted by the porkchop exporter.
    #[derive(Debug, Clone)]
    pub struct Record<'a> {
        pub depart_jd: f64,
        pub arrive_jd: f64,
        pub depart_date: &'a str,
        pub arrive_date: &'a str,
        pub tof_days: f64,
        pub c3_short: f64,
        pub c3_long: f64,
        pub vinf_short: f64,
        pub vinf_long: f64,
        pub dv_short: f64,
        pub dv_long: f64,
        pub valid: bool,
    }

    impl<'a> Record<'a> {
        /// Serialize the record to CSV, matching the standard header ordering.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            writeln!(
                writer,
                "{:.6},{:.6},{},{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{}",
                self.depart_jd,
                self.arrive_jd,
                self.depart_date,
                self.arrive_date,
                self.tof_days,
                self.c3_short,
                self.c3_long,
                self.vinf_short,
                self.vinf_long,
                self.dv_short,
                self.dv_long,
                if self.valid { "true" } else { "false" },
            )
        }
    }

    /// Header plus one row per cell, arrival-major; returns the row count.
    pub fn write_grid(writer: &mut dyn Write, grid: &ResultGrid) -> io::Result<usize> {
        write_header(writer)?;
        let depart_dates: Vec<String> = grid
            .departure_epochs_jd
            .iter()
            .map(|&jd| julian::format_date(jd))
            .collect();
        let mut rows = 0;
        for (arr_idx, &arrive_jd) in grid.arrival_epochs_jd.iter().enumerate() {
            let arrive_date = julian::format_date(arrive_jd);
            for (dep_idx, &depart_jd) in grid.departure_epochs_jd.iter().enumerate() {
                let cell = (arr_idx, dep_idx);
                Record {
                    depart_jd,
                    arrive_jd,
                    depart_date: &depart_dates[dep_idx],
                    arrive_date: &arrive_date,
                    tof_days: grid.tof_days[cell],
                    c3_short: grid.c3_short[cell],
                    c3_long: grid.c3_long[cell],
                    vinf_short: grid.vinf_short[cell],
                    vinf_long: grid.vinf_long[cell],
                    dv_short: grid.dv_short[cell],
                    dv_long: grid.dv_long[cell],
                    valid: grid.is_valid(arr_idx, dep_idx),
                }
                .write_to(writer)?;
                rows += 1;
            }
        }
        writer.flush()?;
        Ok(rows)
    }

    #[derive(Debug, Error)]
    pub enum ReadError {
        #[error("CSV error: {0}")]
        Csv(#[from] csv::Error),
        #[error("grid CSV has no `{0}` column")]
        MissingColumn(&'static str),
        #[error("line {line}: `{column}` value `{value}` is not a number")]
        InvalidNumber {
            line: u64,
            column: &'static str,
            value: String,
        },
        #[error("grid CSV has no rows")]
        Empty,
    }

    /// One metric of an exported grid, read back into campaign layout.
    #[derive(Debug, Clone)]
    pub struct GridTable {
        pub metric: Metric,
        /// Sorted distinct departure epochs; the matrix columns.
        pub departure_epochs_jd: Vec<f64>,
        /// Sorted distinct arrival epochs; the matrix rows.
        pub arrival_epochs_jd: Vec<f64>,
        /// NaN for rows flagged invalid and for cells absent from the file.
        pub values: Matrix,
        pub tof_days: Matrix,
    }

    struct Row {
        depart_jd: f64,
        arrive_jd: f64,
        value: f64,
        tof_days: f64,
    }

    /// Read `metric` and the time of flight from a grid CSV written by [`write_grid`].
    ///
    /// Columns are located by header name, so extra or reordered columns are fine.
    pub fn read_table<R: Read>(reader: R, metric: Metric) -> Result<GridTable, ReadError> {
        let mut csv = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = csv.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or(ReadError::MissingColumn(name))
        };
        let depart_col = column("depart_jd")?;
        let arrive_col = column("arrive_jd")?;
        let valid_col = column("valid")?;
        let tof_col = column(Metric::TofDays.column())?;
        let metric_col = column(metric.column())?;

        let mut rows = Vec::new();
        for record in csv.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            let number = |idx: usize, name: &'static str| -> Result<f64, ReadError> {
                let text = record.get(idx).unwrap_or("").trim();
                text.parse().map_err(|_| ReadError::InvalidNumber {
                    line,
                    column: name,
                    value: text.to_string(),
                })
            };
            let epoch = |idx: usize, name: &'static str| -> Result<f64, ReadError> {
                match number(idx, name)? {
                    jd if jd.is_finite() => Ok(jd),
                    jd => Err(ReadError::InvalidNumber {
                        line,
                        column: name,
                        value: jd.to_string(),
                    }),
                }
            };
            let depart_jd = epoch(depart_col, "depart_jd")?;
            let arrive_jd = epoch(arrive_col, "arrive_jd")?;
            let valid = record
                .get(valid_col)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
            let (value, tof_days) = if valid {
                (
                    number(metric_col, metric.column())?,
                    number(tof_col, Metric::TofDays.column())?,
                )
            } else {
                (f64::NAN, f64::NAN)
            };
            rows.push(Row {
                depart_jd,
                arrive_jd,
                value,
                tof_days,
            });
        }
        if rows.is_empty() {
            return Err(ReadError::Empty);
        }

        let departure_epochs_jd = distinct_sorted(rows.iter().map(|r| r.depart_jd));
        let arrival_epochs_jd = distinct_sorted(rows.iter().map(|r| r.arrive_jd));
        let cols = departure_epochs_jd.len();
        let mut values = vec![f64::NAN; arrival_epochs_jd.len() * cols];
        let mut tof = values.clone();
        for row in &rows {
            let (Ok(i), Ok(j)) = (
                arrival_epochs_jd.binary_search_by(|x| x.total_cmp(&row.arrive_jd)),
                departure_epochs_jd.binary_search_by(|x| x.total_cmp(&row.depart_jd)),
            ) else {
                continue;
            };
            values[i * cols + j] = row.value;
            tof[i * cols + j] = row.tof_days;
        }
        let arrivals = arrival_epochs_jd.len();
        Ok(GridTable {
            metric,
            values: Matrix::from_fn(arrivals, cols, |i, j| values[i * cols + j]),
            tof_days: Matrix::from_fn(arrivals, cols, |i, j| tof[i * cols + j]),
            departure_epochs_jd,
            arrival_epochs_jd,
        })
    }

    fn distinct_sorted(epochs: impl Iterator<Item = f64>) -> Vec<f64> {
        let mut epochs: Vec<f64> = epochs.collect();
        epochs.sort_by(f64::total_cmp);
        epochs.dedup();
        epochs
    }
}

pub mod summary {
    use std::fs::File;
    use std::io;
    use std::path::{Path, PathBuf};

    use porkchop_transfer::CampaignSummary;
    use serde::Serialize;
    use serde_json::to_writer_pretty;

    /// Run description stored next to the summary.
    #[derive(Debug, Clone)]
    pub struct Metadata<'a> {
        pub departure_body: &'a str,
        pub arrival_body: &'a str,
        pub central_body: &'a str,
        pub mu_km3_s2: f64,
        pub step_days: f64,
        pub vinf_cutoff_km_s: f64,
    }

    #[derive(Serialize)]
    struct SummarySidecar<'a> {
        departure_body: &'a str,
        arrival_body: &'a str,
        central_body: &'a str,
        mu_km3_s2: f64,
        step_days: f64,
        vinf_cutoff_km_s: f64,
        c3_cutoff_km2_s2: f64,
        #[serde(flatten)]
        summary: &'a CampaignSummary,
    }

    /// `<dir>/<stem>_summary.json` next to a grid export.
    pub fn sidecar_path(output: &Path) -> PathBuf {
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("porkchop");
        parent.join(format!("{}_summary.json", stem))
    }

    /// Write the campaign summary as pretty JSON.
    pub fn write_summary(
        path: &Path,
        meta: &Metadata<'_>,
        summary: &CampaignSummary,
    ) -> io::Result<()> {
        super::create_parent(path)?;
        let sidecar = SummarySidecar {
            departure_body: meta.departure_body,
            arrival_body: meta.arrival_body,
            central_body: meta.central_body,
            mu_km3_s2: meta.mu_km3_s2,
            step_days: meta.step_days,
            vinf_cutoff_km_s: meta.vinf_cutoff_km_s,
            c3_cutoff_km2_s2: meta.vinf_cutoff_km_s * meta.vinf_cutoff_km_s,
            summary,
        };
        to_writer_pretty(File::create(path)?, &sidecar)?;
        Ok(())
    }
}
