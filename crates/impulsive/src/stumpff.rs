//! Stumpff functions C(z) and S(z) for the universal-variable formulation.
//!
//! `z = α·χ²` where α is the reciprocal semi-major axis: positive for ellipses,
//! negative for hyperbolas, zero for the parabolic limit.

/// Half-width of the band around z = 0 evaluated by Taylor series.
///
/// The closed forms cancel catastrophically as z approaches zero.
pub const SERIES_BAND: f64 = 1e-3;

/// Stumpff function C(z).
pub fn c(z: f64) -> f64 {
    if z > SERIES_BAND {
        (1.0 - z.sqrt().cos()) / z
    } else if z < -SERIES_BAND {
        ((-z).sqrt().cosh() - 1.0) / (-z)
    } else {
        // 1/2! - z/4! + z²/6! - z³/8! + z⁴/10!
        0.5 + z
            * (-1.0 / 24.0
                + z * (1.0 / 720.0 + z * (-1.0 / 40_320.0 + z * (1.0 / 3_628_800.0))))
    }
}

/// Stumpff function S(z).
pub fn s(z: f64) -> f64 {
    if z > SERIES_BAND {
        let sz = z.sqrt();
        (sz - sz.sin()) / sz.powi(3)
    } else if z < -SERIES_BAND {
        let sz = (-z).sqrt();
        (sz.sinh() - sz) / sz.powi(3)
    } else {
        // 1/3! - z/5! + z²/7! - z³/9! + z⁴/11!
        1.0 / 6.0
            + z * (-1.0 / 120.0
                + z * (1.0 / 5_040.0 + z * (-1.0 / 362_880.0 + z * (1.0 / 39_916_800.0))))
    }
}
