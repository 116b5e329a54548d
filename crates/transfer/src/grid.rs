//! Result matrices of a porkchop campaign, indexed `[arrival][departure]`.

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use serde::Serialize;

/// Dense row-major matrix; rows are arrival epochs, columns departure epochs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Build from a function of `(row, col)`, filled in row-major order.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(f(row, col));
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Smallest non-NaN entry with its `(row, col)`; ties keep the first in row-major order.
    pub fn min_finite(&self) -> Option<(f64, usize, usize)> {
        let mut best: Option<(f64, usize)> = None;
        for (idx, &value) in self.data.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            match best {
                Some((current, _)) if value >= current => {}
                _ => best = Some((value, idx)),
            }
        }
        best.map(|(value, idx)| (value, idx / self.cols, idx % self.cols))
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

/// Quantities stored per grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    C3Short,
    C3Long,
    VinfShort,
    VinfLong,
    TofDays,
    DvShort,
    DvLong,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::C3Short,
        Metric::C3Long,
        Metric::VinfShort,
        Metric::VinfLong,
        Metric::TofDays,
        Metric::DvShort,
        Metric::DvLong,
    ];

    /// Column name used by the CSV export.
    pub fn column(self) -> &'static str {
        match self {
            Self::C3Short => "c3_short",
            Self::C3Long => "c3_long",
            Self::VinfShort => "vinf_short",
            Self::VinfLong => "vinf_long",
            Self::TofDays => "tof_days",
            Self::DvShort => "dv_short",
            Self::DvLong => "dv_long",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::C3Short | Self::C3Long => "km^2/s^2",
            Self::TofDays => "days",
            _ => "km/s",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|metric| metric.column() == key)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|m| m.column()).collect();
                format!("unknown metric `{s}` (expected one of {})", known.join(", "))
            })
    }
}

/// Campaign output: one matrix per metric plus the epoch axes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultGrid {
    pub departure_epochs_jd: Vec<f64>,
    pub arrival_epochs_jd: Vec<f64>,
    pub c3_short: Matrix,
    pub c3_long: Matrix,
    pub vinf_short: Matrix,
    pub vinf_long: Matrix,
    pub tof_days: Matrix,
    pub dv_short: Matrix,
    pub dv_long: Matrix,
}

impl ResultGrid {
    /// `(arrivals, departures)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.arrival_epochs_jd.len(), self.departure_epochs_jd.len())
    }

    pub fn cell_count(&self) -> usize {
        self.arrival_epochs_jd.len() * self.departure_epochs_jd.len()
    }

    pub fn matrix(&self, metric: Metric) -> &Matrix {
        match metric {
            Metric::C3Short => &self.c3_short,
            Metric::C3Long => &self.c3_long,
            Metric::VinfShort => &self.vinf_short,
            Metric::VinfLong => &self.vinf_long,
            Metric::TofDays => &self.tof_days,
            Metric::DvShort => &self.dv_short,
            Metric::DvLong => &self.dv_long,
        }
    }

    /// Cells with a non-positive time of flight hold NaN everywhere.
    pub fn is_valid(&self, arrival_index: usize, departure_index: usize) -> bool {
        self.tof_days
            .get(arrival_index, departure_index)
            .is_some_and(|tof| !tof.is_nan())
    }

    /// Day offsets from the first departure and first arrival epoch, as
    /// `(departure_mesh, arrival_mesh)` in the grid's shape.
    pub fn normalized_mesh(&self) -> (Matrix, Matrix) {
        let (rows, cols) = self.shape();
        let dep0 = self.departure_epochs_jd.first().copied().unwrap_or(0.0);
        let arr0 = self.arrival_epochs_jd.first().copied().unwrap_or(0.0);
        let departure = Matrix::from_fn(rows, cols, |_, col| {
            self.departure_epochs_jd[col] - dep0
        });
        let arrival = Matrix::from_fn(rows, cols, |row, _| self.arrival_epochs_jd[row] - arr0);
        (departure, arrival)
    }
}
