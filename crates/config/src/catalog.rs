//! Immutable lookup of physical constants for named solar-system bodies.

use std::collections::HashSet;
use std::path::Path;

use porkchop_core::constants::{G_KM3_KG_S2, MU_SUN_KM3_S2};
use serde::Deserialize;

use crate::{ConfigError, is_toml};

/// Constants for one body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyConstants {
    pub name: String,
    /// Horizons COMMAND identifier, e.g. `499` for Mars.
    pub horizons_id: String,
    pub mu_km3_s2: f64,
    pub radius_km: f64,
    pub semi_major_axis_km: Option<f64>,
}

/// Catalog file entry; μ may be given directly or derived from the mass.
#[derive(Debug, Deserialize)]
struct BodyRecord {
    name: String,
    horizons_id: String,
    #[serde(default)]
    mu_km3_s2: Option<f64>,
    #[serde(default)]
    mass_kg: Option<f64>,
    radius_km: f64,
    #[serde(default)]
    semi_major_axis_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    bodies: Vec<BodyRecord>,
}

impl TryFrom<BodyRecord> for BodyConstants {
    type Error = ConfigError;

    fn try_from(record: BodyRecord) -> Result<Self, Self::Error> {
        let mu_km3_s2 = match (record.mu_km3_s2, record.mass_kg) {
            (Some(mu), _) => mu,
            (None, Some(mass)) => mass * G_KM3_KG_S2,
            (None, None) => {
                return Err(ConfigError::InvalidBody {
                    name: record.name,
                    reason: "needs either mu_km3_s2 or mass_kg".to_string(),
                });
            }
        };
        Ok(Self {
            name: record.name,
            horizons_id: record.horizons_id,
            mu_km3_s2,
            radius_km: record.radius_km,
            semi_major_axis_km: record.semi_major_axis_km,
        })
    }
}

// name, Horizons id, μ (km³/s²), mean radius (km), heliocentric semi-major axis (km)
const BUILTIN: &[(&str, &str, f64, f64, Option<f64>)] = &[
    ("Sun", "10", MU_SUN_KM3_S2, 695_700.0, None),
    ("Mercury", "199", 22_031.868, 2_439.4, Some(57.909e6)),
    ("Venus", "299", 324_858.592, 6_051.8, Some(108.209e6)),
    ("Earth", "399", 398_600.435_5, 6_378.137, Some(149.598e6)),
    ("Moon", "301", 4_902.800_1, 1_737.4, None),
    ("Mars", "499", 42_828.375, 3_396.19, Some(227.923e6)),
    ("Jupiter", "599", 126_686_531.9, 71_492.0, Some(778.570e6)),
    ("Io", "501", 5_959.916, 1_821.6, None),
    ("Europa", "502", 3_202.739, 1_560.8, None),
    ("Ganymede", "503", 9_887.834, 2_631.2, None),
    ("Callisto", "504", 7_179.289, 2_410.3, None),
    ("Saturn", "699", 37_931_206.2, 60_268.0, Some(1_433.529e6)),
    ("Uranus", "799", 5_793_951.3, 25_559.0, Some(2_872.463e6)),
    ("Neptune", "899", 6_835_099.5, 24_764.0, Some(4_495.060e6)),
    ("Pluto", "999", 869.6, 1_188.3, Some(5_906.380e6)),
];

/// Read-only body table, looked up by name or Horizons id (case-insensitive).
#[derive(Debug, Clone)]
pub struct BodyCatalog {
    bodies: Vec<BodyConstants>,
}

impl BodyCatalog {
    /// Build a catalog, rejecting duplicates and non-physical constants.
    pub fn new(bodies: Vec<BodyConstants>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for body in &bodies {
            if !seen.insert(body.name.to_lowercase()) {
                return Err(ConfigError::DuplicateBody(body.name.clone()));
            }
            if !(body.mu_km3_s2.is_finite() && body.mu_km3_s2 > 0.0) {
                return Err(ConfigError::InvalidBody {
                    name: body.name.clone(),
                    reason: format!("mu_km3_s2 must be positive, got {}", body.mu_km3_s2),
                });
            }
            if !(body.radius_km.is_finite() && body.radius_km > 0.0) {
                return Err(ConfigError::InvalidBody {
                    name: body.name.clone(),
                    reason: format!("radius_km must be positive, got {}", body.radius_km),
                });
            }
        }
        Ok(Self { bodies })
    }

    /// The Sun, planets, Pluto, the Moon and the Galilean moons.
    pub fn builtin() -> Self {
        let bodies = BUILTIN
            .iter()
            .map(|&(name, id, mu, radius, sma)| BodyConstants {
                name: name.to_string(),
                horizons_id: id.to_string(),
                mu_km3_s2: mu,
                radius_km: radius,
                semi_major_axis_km: sma,
            })
            .collect();
        Self { bodies }
    }

    pub fn get(&self, key: &str) -> Option<&BodyConstants> {
        let key = key.trim();
        self.bodies
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(key) || b.horizons_id.eq_ignore_ascii_case(key))
    }

    pub fn require(&self, key: &str) -> Result<&BodyConstants, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::UnknownBody(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BodyConstants> {
        self.bodies.iter()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Load a catalog from a TOML or YAML file holding a `bodies` list.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<BodyCatalog, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let file: CatalogFile = if is_toml(path) {
        toml::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };
    let bodies = file
        .bodies
        .into_iter()
        .map(BodyConstants::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    BodyCatalog::new(bodies)
}
