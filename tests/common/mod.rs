//! Test-only orbit helpers: a universal-variable Kepler propagator and
//! circular-orbit ephemeris builders.

#![allow(dead_code)]

use std::f64::consts::PI;

use porkchop_planner::ephemeris::StateSample;
use porkchop_planner::impulsive::stumpff;
use porkchop_planner::primitives::constants::{AU_KM, SECONDS_PER_DAY};
use porkchop_planner::primitives::time;
use porkchop_planner::primitives::vector::{self, Vector3};

pub const MU_SUN: f64 = 1.327_124_400_18e11; // km^3 / s^2
pub const MARS_SMA_AU: f64 = 1.523679;
/// Arbitrary reference epoch for synthetic ephemerides (2023-02-25).
pub const EPOCH0_JD: f64 = 2_460_000.5;

/// Propagate `(r0, v0)` by `dt` seconds on a Kepler orbit.
pub fn propagate(r0: Vector3, v0: Vector3, dt: f64, mu: f64) -> (Vector3, Vector3) {
    let sqrt_mu = mu.sqrt();
    let r0_mag = vector::norm(&r0);
    let v0_mag = vector::norm(&v0);
    let vr0 = vector::dot(&r0, &v0) / r0_mag;
    let alpha = 2.0 / r0_mag - v0_mag * v0_mag / mu;

    let mut chi = sqrt_mu * alpha.abs() * dt;
    for _ in 0..200 {
        let z = alpha * chi * chi;
        let c = stumpff::c(z);
        let s = stumpff::s(z);
        let f = r0_mag * vr0 / sqrt_mu * chi * chi * c
            + (1.0 - alpha * r0_mag) * chi.powi(3) * s
            + r0_mag * chi
            - sqrt_mu * dt;
        let dfdchi = r0_mag * vr0 / sqrt_mu * chi * (1.0 - alpha * chi * chi * s)
            + (1.0 - alpha * r0_mag) * chi * chi * c
            + r0_mag;
        let step = f / dfdchi;
        chi -= step;
        if step.abs() < 1e-12 * chi.abs().max(1.0) {
            break;
        }
    }

    let z = alpha * chi * chi;
    let c = stumpff::c(z);
    let s = stumpff::s(z);
    let f = 1.0 - chi * chi / r0_mag * c;
    let g = dt - chi.powi(3) * s / sqrt_mu;
    let r = vector::add(&vector::scale(&r0, f), &vector::scale(&v0, g));
    let r_mag = vector::norm(&r);
    let f_dot = sqrt_mu / (r_mag * r0_mag) * (alpha * chi.powi(3) * s - chi);
    let g_dot = 1.0 - chi * chi / r_mag * c;
    let v = vector::add(&vector::scale(&r0, f_dot), &vector::scale(&v0, g_dot));
    (r, v)
}

/// Coplanar circular orbit of radius `radius_km`, phase `phase0_rad` at `EPOCH0_JD`.
#[derive(Debug, Clone, Copy)]
pub struct CircularOrbit {
    pub radius_km: f64,
    pub phase0_rad: f64,
    pub mu: f64,
}

impl CircularOrbit {
    pub fn new(radius_au: f64, phase0_rad: f64) -> Self {
        Self {
            radius_km: radius_au * AU_KM,
            phase0_rad,
            mu: MU_SUN,
        }
    }

    pub fn mean_motion(&self) -> f64 {
        (self.mu / self.radius_km.powi(3)).sqrt()
    }

    pub fn sample(&self, epoch_jd: f64) -> StateSample {
        let angle =
            self.phase0_rad + self.mean_motion() * (epoch_jd - EPOCH0_JD) * SECONDS_PER_DAY;
        let speed = self.radius_km * self.mean_motion();
        StateSample {
            epoch_jd,
            position_km: [
                self.radius_km * angle.cos(),
                self.radius_km * angle.sin(),
                0.0,
            ],
            velocity_km_s: [-speed * angle.sin(), speed * angle.cos(), 0.0],
        }
    }

    /// Samples at `EPOCH0_JD + offset` for each day offset.
    pub fn samples(&self, day_offsets: &[f64]) -> Vec<StateSample> {
        day_offsets
            .iter()
            .map(|offset| self.sample(EPOCH0_JD + offset))
            .collect()
    }
}

/// Hohmann transfer time between two circular radii, in days.
pub fn hohmann_tof_days(r1_km: f64, r2_km: f64, mu: f64) -> f64 {
    let a = 0.5 * (r1_km + r2_km);
    time::seconds_to_days(PI * (a.powi(3) / mu).sqrt())
}

/// Launch energy of the Hohmann departure burn.
pub fn hohmann_c3(r1_km: f64, r2_km: f64, mu: f64) -> f64 {
    let a = 0.5 * (r1_km + r2_km);
    let v_transfer = (mu * (2.0 / r1_km - 1.0 / a)).sqrt();
    let dv = v_transfer - (mu / r1_km).sqrt();
    dv * dv
}

/// Earth and Mars on circular orbits phased so that a Hohmann transfer leaves
/// Earth at `EPOCH0_JD` and reaches Mars one Hohmann time later.
pub fn earth_mars_hohmann_phasing() -> (CircularOrbit, CircularOrbit) {
    let earth = CircularOrbit::new(1.0, 0.0);
    let mut mars = CircularOrbit::new(MARS_SMA_AU, 0.0);
    let tof_s = time::days_to_seconds(hohmann_tof_days(earth.radius_km, mars.radius_km, MU_SUN));
    mars.phase0_rad = PI - mars.mean_motion() * tof_s;
    (earth, mars)
}

/// Render samples as a Horizons vector table with `$$SOE` / `$$EOE` markers.
pub fn horizons_text(samples: &[StateSample]) -> String {
    let mut text = String::from(
        "*******************************************************************************\n\
         Ephemeris / API_USER\n\
         Target body name: synthetic\n\
         *******************************************************************************\n\
         $$SOE\n",
    );
    for sample in samples {
        let [x, y, z] = sample.position_km;
        let [vx, vy, vz] = sample.velocity_km_s;
        text.push_str(&format!(
            "{:.9}, A.D. synthetic, {:.15E}, {:.15E}, {:.15E}, {:.15E}, {:.15E}, {:.15E},\n",
            sample.epoch_jd, x, y, z, vx, vy, vz
        ));
    }
    text.push_str(
        "$$EOE\n\
         *******************************************************************************\n",
    );
    text
}
