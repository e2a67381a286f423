//! Initial spacecraft state from an Earth-escape parameterisation.
//!
//! Velocities are built in Earth's local frame (radial outward, transverse
//! along Earth's prograde direction) and rotated into the inertial frame by
//! Earth's heliocentric longitude at mission start. Earth's reference speed is
//! the circular speed at 1 au.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use swingby_config::EscapeModelSetting;
use swingby_core::StateVector;
use swingby_core::constants::AU_KM;
use swingby_core::frame::rotate;
use swingby_core::vector::{self, Vector2};
use swingby_ephem::{EphemerisError, EphemerisProvider};
use swingby_gravity::{GravityError, GravityModel};
use thiserror::Error;

/// Closed form used for the escape velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EscapeVelocityModel {
    /// Radial `v∞/2`, transverse `v_E + v∞`. Heliocentric speed exceeds `v_E`.
    #[default]
    ExcessAlongTrack,
    /// Adds `v∞` to Earth's velocity along an asymptote tilted outward by
    /// `asin(v∞ / 2v_E)`: radial `v∞² / 2v_E`,
    /// transverse `v_E + v∞·sqrt(4v_E² - v∞²) / 2v_E`.
    /// Relative speed is exactly `v∞` and heliocentric speed exceeds `v_E`.
    /// Requires `v∞ < 2v_E`.
    GeometricIntercept,
}

impl From<EscapeModelSetting> for EscapeVelocityModel {
    fn from(value: EscapeModelSetting) -> Self {
        match value {
            EscapeModelSetting::ExcessAlongTrack => Self::ExcessAlongTrack,
            EscapeModelSetting::GeometricIntercept => Self::GeometricIntercept,
        }
    }
}

/// Launch geometry: escape model and clearance from Earth's centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub escape_model: EscapeVelocityModel,
    /// Outward x-offset from Earth's centre in Earth radii, within `[1, 3]`.
    pub earth_clearance_radii: f64,
}

impl LaunchConfig {
    pub const MIN_CLEARANCE_RADII: f64 = 1.0;
    pub const MAX_CLEARANCE_RADII: f64 = 3.0;
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            escape_model: EscapeVelocityModel::default(),
            earth_clearance_radii: Self::MIN_CLEARANCE_RADII,
        }
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("v-infinity {v_inf_km_s} km/s is outside the range of the {model:?} model (limit {limit_km_s} km/s)")]
    VInfinityOutOfRange {
        model: EscapeVelocityModel,
        v_inf_km_s: f64,
        limit_km_s: f64,
    },
    #[error("ephemeris lookup failed: {0}")]
    Ephemeris(#[from] EphemerisError),
    #[error("gravity table lookup failed: {0}")]
    Gravity(#[from] GravityError),
}

/// Escape velocity in Earth's local `(radial, transverse)` frame.
pub fn local_escape_velocity(
    model: EscapeVelocityModel,
    v_earth_km_s: f64,
    v_inf_km_s: f64,
) -> Result<Vector2, LaunchError> {
    match model {
        EscapeVelocityModel::ExcessAlongTrack => Ok([0.5 * v_inf_km_s, v_earth_km_s + v_inf_km_s]),
        EscapeVelocityModel::GeometricIntercept => {
            let limit = 2.0 * v_earth_km_s;
            if v_inf_km_s >= limit {
                return Err(LaunchError::VInfinityOutOfRange {
                    model,
                    v_inf_km_s,
                    limit_km_s: limit,
                });
            }
            let sin_tilt = v_inf_km_s / limit;
            let cos_tilt = (1.0 - sin_tilt * sin_tilt).sqrt();
            Ok([
                v_inf_km_s * sin_tilt,
                v_earth_km_s + v_inf_km_s * cos_tilt,
            ])
        }
    }
}

/// Earth's reference heliocentric speed: circular orbit at 1 au.
pub fn earth_reference_speed(gravity: &GravityModel) -> f64 {
    gravity.circular_speed(AU_KM)
}

/// Initial spacecraft state at mission start.
///
/// Position is Earth's ephemeris position shifted outward along +x by
/// `earth_clearance_radii` Earth radii, with `y` equal to Earth's.
pub fn initial_state<E>(
    mission_start: NaiveDateTime,
    v_inf_km_s: f64,
    launch: &LaunchConfig,
    gravity: &GravityModel,
    ephemeris: &E,
) -> Result<StateVector, LaunchError>
where
    E: EphemerisProvider + ?Sized,
{
    let earth = ephemeris.position("earth", mission_start)?;
    let earth_radius = gravity.radius("earth")?;
    let v_earth = earth_reference_speed(gravity);

    let local = local_escape_velocity(launch.escape_model, v_earth, v_inf_km_s)?;
    let longitude = vector::angle(&earth);
    let velocity = rotate(&local, longitude);

    let state = StateVector::new(
        [earth[0] + launch.earth_clearance_radii * earth_radius, earth[1]],
        velocity,
    );
    tracing::debug!(
        ?state,
        longitude_deg = longitude.to_degrees(),
        model = ?launch.escape_model,
        "initial state"
    );
    Ok(state)
}
