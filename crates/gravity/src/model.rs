//! Gravitational parameters and mean radii keyed by body name.

use std::collections::BTreeMap;

use swingby_config::BodyConfig;
use swingby_ephem::normalize_body_name;
use thiserror::Error;

/// Universal gravitational constant in km³ kg⁻¹ s⁻².
const G_KM3_KG_S2: f64 = 6.6743e-11 * 1e-9;

/// Errors raised while building or querying a [`GravityModel`].
#[derive(Debug, Error, PartialEq)]
pub enum GravityError {
    #[error("gravity table must contain `sun`")]
    MissingSun,
    #[error("GM for `{body}` must be strictly positive (got {value})")]
    NonPositiveGm { body: String, value: f64 },
    #[error("radius for `{body}` must be strictly positive (got {value})")]
    NonPositiveRadius { body: String, value: f64 },
    #[error("`{0}` has a GM entry but no radius entry")]
    MissingRadius(String),
    #[error("`{0}` has a radius entry but no GM entry")]
    MissingGm(String),
    #[error("body `{0}` is not in the gravity tables")]
    UnknownBody(String),
}

/// Immutable GM (km³/s²) and radius (km) tables.
///
/// Every body carries both entries, so anything usable for force computation
/// can also be checked for collisions.
#[derive(Debug, Clone, PartialEq)]
pub struct GravityModel {
    gm: BTreeMap<String, f64>,
    radius: BTreeMap<String, f64>,
}

impl GravityModel {
    /// Build from explicit tables, validating the invariants.
    pub fn new<I, J, K>(gm: I, radius: J) -> Result<Self, GravityError>
    where
        I: IntoIterator<Item = (K, f64)>,
        J: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let gm: BTreeMap<String, f64> = gm
            .into_iter()
            .map(|(name, value)| (normalize_body_name(name.as_ref()), value))
            .collect();
        let radius: BTreeMap<String, f64> = radius
            .into_iter()
            .map(|(name, value)| (normalize_body_name(name.as_ref()), value))
            .collect();

        if !gm.contains_key("sun") {
            return Err(GravityError::MissingSun);
        }
        for (body, &value) in &gm {
            if !(value > 0.0 && value.is_finite()) {
                return Err(GravityError::NonPositiveGm {
                    body: body.clone(),
                    value,
                });
            }
            if !radius.contains_key(body) {
                return Err(GravityError::MissingRadius(body.clone()));
            }
        }
        for (body, &value) in &radius {
            if !(value > 0.0 && value.is_finite()) {
                return Err(GravityError::NonPositiveRadius {
                    body: body.clone(),
                    value,
                });
            }
            if !gm.contains_key(body) {
                return Err(GravityError::MissingGm(body.clone()));
            }
        }

        Ok(Self { gm, radius })
    }

    /// Build from catalog entries loaded by `swingby_config`.
    pub fn from_catalog(bodies: &[BodyConfig]) -> Result<Self, GravityError> {
        Self::new(
            bodies.iter().map(|b| (b.name.as_str(), b.mu_km3_s2)),
            bodies.iter().map(|b| (b.name.as_str(), b.radius_km)),
        )
    }

    /// Sun and the nine classical planets.
    ///
    /// The Sun and Earth use measured GM values; the other planets are G times
    /// their catalogued masses.
    pub fn solar_system() -> Self {
        let gm = [
            ("sun", 1.327e11),
            ("mercury", G_KM3_KG_S2 * 330.2e21),
            ("venus", G_KM3_KG_S2 * 4_868.5e21),
            ("earth", 398_600.435_436_095_9),
            ("mars", G_KM3_KG_S2 * 641.85e21),
            ("jupiter", G_KM3_KG_S2 * 1.8986e27),
            ("saturn", G_KM3_KG_S2 * 568_460e21),
            ("uranus", G_KM3_KG_S2 * 86_832e21),
            ("neptune", G_KM3_KG_S2 * 102_430e21),
            ("pluto", G_KM3_KG_S2 * 13.105e21),
        ];
        let radius = [
            ("sun", 696_000.0),
            ("mercury", 2_439.7),
            ("venus", 6_051.8),
            ("earth", 6_371.0),
            ("mars", 3_390.0),
            ("jupiter", 69_911.0),
            ("saturn", 58_232.0),
            ("uranus", 25_362.0),
            ("neptune", 24_622.0),
            ("pluto", 1_185.0),
        ];
        Self {
            gm: gm.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
            radius: radius.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
        }
    }

    /// GM of `body` (km³/s²).
    pub fn gm(&self, body: &str) -> Result<f64, GravityError> {
        self.gm
            .get(&normalize_body_name(body))
            .copied()
            .ok_or_else(|| GravityError::UnknownBody(body.to_string()))
    }

    /// Mean radius of `body` (km).
    pub fn radius(&self, body: &str) -> Result<f64, GravityError> {
        self.radius
            .get(&normalize_body_name(body))
            .copied()
            .ok_or_else(|| GravityError::UnknownBody(body.to_string()))
    }

    /// GM of the Sun, guaranteed present by construction.
    pub fn sun_gm(&self) -> f64 {
        self.gm.get("sun").copied().unwrap_or_default()
    }

    pub fn contains(&self, body: &str) -> bool {
        self.gm.contains_key(&normalize_body_name(body))
    }

    /// Body names in the tables, sorted.
    pub fn bodies(&self) -> impl Iterator<Item = &str> {
        self.gm.keys().map(String::as_str)
    }

    /// Speed of a circular heliocentric orbit at `radius_km` (km/s).
    pub fn circular_speed(&self, radius_km: f64) -> f64 {
        (self.sun_gm() / radius_km).sqrt()
    }
}

impl Default for GravityModel {
    fn default() -> Self {
        Self::solar_system()
    }
}
