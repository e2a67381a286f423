//! Planar heliocentric equation of motion.
//!
//! The Sun sits fixed at the origin. Each active planet contributes a
//! point-mass pull evaluated at its ephemeris position for the current
//! instant. An empty planet list reduces to the two-body problem.

use chrono::NaiveDateTime;
use swingby_core::StateVector;
use swingby_core::time::offset_instant;
use swingby_core::vector::{self, Vector2};
use swingby_ephem::{EphemerisError, EphemerisProvider, normalize_body_name};
use thiserror::Error;

use crate::model::{GravityError, GravityModel};

/// The spacecraft came closer to a body's centre than its mean radius.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "spacecraft intersects `{body}` at {instant}: {distance_km:.3} km from centre, radius {radius_km:.3} km"
)]
pub struct CollisionError {
    pub body: String,
    pub distance_km: f64,
    pub radius_km: f64,
    pub elapsed_s: f64,
    pub instant: NaiveDateTime,
}

#[derive(Debug, Error)]
pub enum DynamicsError {
    #[error(transparent)]
    Collision(#[from] CollisionError),
    #[error("ephemeris lookup failed: {0}")]
    Ephemeris(#[from] EphemerisError),
    #[error("gravity table lookup failed: {0}")]
    Gravity(#[from] GravityError),
}

#[derive(Debug, Clone)]
struct ActiveBody {
    name: String,
    gm: f64,
    radius_km: f64,
}

/// Force model over the Sun plus a fixed set of planets.
///
/// GM and radius of each active body are resolved once at construction, so
/// unknown names fail before any integration starts.
#[derive(Debug)]
pub struct ForceModel<'a, E: ?Sized> {
    ephemeris: &'a E,
    mission_start: NaiveDateTime,
    sun_gm: f64,
    bodies: Vec<ActiveBody>,
}

impl<'a, E: EphemerisProvider + ?Sized> ForceModel<'a, E> {
    pub fn new<S: AsRef<str>>(
        gravity: &GravityModel,
        ephemeris: &'a E,
        mission_start: NaiveDateTime,
        planets: &[S],
    ) -> Result<Self, DynamicsError> {
        let bodies = planets
            .iter()
            .map(|planet| {
                let name = normalize_body_name(planet.as_ref());
                Ok(ActiveBody {
                    gm: gravity.gm(&name)?,
                    radius_km: gravity.radius(&name)?,
                    name,
                })
            })
            .collect::<Result<Vec<_>, GravityError>>()?;

        Ok(Self {
            ephemeris,
            mission_start,
            sun_gm: gravity.sun_gm(),
            bodies,
        })
    }

    /// Sun-only dynamics.
    pub fn two_body(gravity: &GravityModel, ephemeris: &'a E, mission_start: NaiveDateTime) -> Self {
        Self {
            ephemeris,
            mission_start,
            sun_gm: gravity.sun_gm(),
            bodies: Vec::new(),
        }
    }

    pub fn active_bodies(&self) -> impl Iterator<Item = &str> {
        self.bodies.iter().map(|b| b.name.as_str())
    }

    pub fn mission_start(&self) -> NaiveDateTime {
        self.mission_start
    }

    /// Acceleration (km/s²) at `position_km`, `elapsed_s` seconds into the mission.
    pub fn acceleration(
        &self,
        position_km: &Vector2,
        elapsed_s: f64,
    ) -> Result<Vector2, DynamicsError> {
        let mut accel = [0.0, 0.0];

        if !self.bodies.is_empty() {
            let instant = offset_instant(self.mission_start, elapsed_s);
            for body in &self.bodies {
                let planet = self.ephemeris.position(&body.name, instant)?;
                let d = vector::sub(position_km, &planet);
                let d_norm = vector::norm(&d);
                if d_norm < body.radius_km {
                    tracing::warn!(
                        body = %body.name,
                        distance_km = d_norm,
                        radius_km = body.radius_km,
                        %instant,
                        "swingby altitude below surface"
                    );
                    return Err(CollisionError {
                        body: body.name.clone(),
                        distance_km: d_norm,
                        radius_km: body.radius_km,
                        elapsed_s,
                        instant,
                    }
                    .into());
                }
                let d3 = d_norm * d_norm * d_norm;
                accel[0] -= body.gm * d[0] / d3;
                accel[1] -= body.gm * d[1] / d3;
            }
        }

        let r_norm = vector::norm(position_km);
        if r_norm == 0.0 {
            return Err(CollisionError {
                body: "sun".to_string(),
                distance_km: 0.0,
                radius_km: 0.0,
                elapsed_s,
                instant: offset_instant(self.mission_start, elapsed_s),
            }
            .into());
        }
        let r3 = r_norm * r_norm * r_norm;
        accel[0] -= self.sun_gm * position_km[0] / r3;
        accel[1] -= self.sun_gm * position_km[1] / r3;

        Ok(accel)
    }

    /// State derivative `[vx, vy, ax, ay]` for a flat `[x, y, vx, vy]` state.
    pub fn derivative(&self, state: &[f64; 4], elapsed_s: f64) -> Result<[f64; 4], DynamicsError> {
        let accel = self.acceleration(&[state[0], state[1]], elapsed_s)?;
        Ok([state[2], state[3], accel[0], accel[1]])
    }
}

/// One-shot evaluation of the equation of motion.
///
/// Builds a [`ForceModel`] for `planets` and evaluates it at `state`. Prefer
/// holding a `ForceModel` when evaluating repeatedly.
pub fn equation_of_motion<E, S>(
    state: &StateVector,
    elapsed_s: f64,
    mission_start: NaiveDateTime,
    planets: &[S],
    gravity: &GravityModel,
    ephemeris: &E,
) -> Result<[f64; 4], DynamicsError>
where
    E: EphemerisProvider + ?Sized,
    S: AsRef<str>,
{
    ForceModel::new(gravity, ephemeris, mission_start, planets)?
        .derivative(&state.to_array(), elapsed_s)
}
