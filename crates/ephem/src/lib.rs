//! Ephemeris lookups for the swingby workspace.
//!
//! The propagation core only needs planar heliocentric positions of named
//! bodies at given instants. [`EphemerisProvider`] is that seam; the crate ships
//! an analytic mean-elements model and a circular-orbit model behind it.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use swingby_core::vector::Vector2;
use thiserror::Error;

pub mod circular;
pub mod elements;

pub use circular::CircularEphemeris;
pub use elements::MeanElementsEphemeris;

/// Errors surfaced while resolving body positions.
#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("body `{0}` is not covered by this ephemeris")]
    UnknownBody(String),
    #[error("ephemeris returned a non-finite position for `{body}` at {instant}")]
    NonFinite { body: String, instant: NaiveDateTime },
}

/// Time series of planar coordinates (km) for one body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanetTrack {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PlanetTrack {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, position_km: Vector2) {
        self.x.push(position_km[0]);
        self.y.push(position_km[1]);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Body name to coordinate series.
pub type PlanetCoordinates = BTreeMap<String, PlanetTrack>;

/// Source of heliocentric planar positions for named bodies.
///
/// Implementations must be reentrant: the propagator calls [`position`]
/// repeatedly inside each integrator step.
///
/// [`position`]: EphemerisProvider::position
pub trait EphemerisProvider {
    /// Position (km) of `body` at `instant`.
    fn position(&self, body: &str, instant: NaiveDateTime) -> Result<Vector2, EphemerisError>;

    /// Positions of every body in `bodies` across `instants`.
    fn positions(
        &self,
        bodies: &[String],
        instants: &[NaiveDateTime],
    ) -> Result<PlanetCoordinates, EphemerisError> {
        let mut coordinates = PlanetCoordinates::new();
        for body in bodies {
            let mut track = PlanetTrack::with_capacity(instants.len());
            for &instant in instants {
                track.push(self.position(body, instant)?);
            }
            coordinates.insert(body.clone(), track);
        }
        tracing::debug!(
            bodies = bodies.len(),
            samples = instants.len(),
            "sampled planet coordinates"
        );
        Ok(coordinates)
    }
}

impl<E: EphemerisProvider + ?Sized> EphemerisProvider for &E {
    fn position(&self, body: &str, instant: NaiveDateTime) -> Result<Vector2, EphemerisError> {
        (**self).position(body, instant)
    }

    fn positions(
        &self,
        bodies: &[String],
        instants: &[NaiveDateTime],
    ) -> Result<PlanetCoordinates, EphemerisError> {
        (**self).positions(bodies, instants)
    }
}

/// Normalize a body name for table lookups.
///
/// Names are trimmed and lower-cased; a trailing "barycenter" qualifier is
/// dropped so that "EARTH BARYCENTER" and "earth" resolve to the same entry.
pub fn normalize_body_name(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    match lower.strip_suffix("barycenter") {
        Some(stripped) if !stripped.trim().is_empty() => stripped.trim().to_string(),
        _ => lower,
    }
}
