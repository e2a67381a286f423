//! Coplanar circular-orbit ephemeris.
//!
//! Each body moves on a circle about the origin with constant angular rate.
//! Useful for idealised scenarios and for tests that need exact positions.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use chrono::NaiveDateTime;
use swingby_core::vector::Vector2;

use crate::{EphemerisError, EphemerisProvider, normalize_body_name};

#[derive(Debug, Clone, Copy, PartialEq)]
struct CircularOrbit {
    radius_km: f64,
    angular_rate_rad_s: f64,
    phase_rad: f64,
}

/// Bodies on circular orbits referenced to a common epoch.
#[derive(Debug, Clone)]
pub struct CircularEphemeris {
    epoch: NaiveDateTime,
    orbits: BTreeMap<String, CircularOrbit>,
}

impl CircularEphemeris {
    /// Empty ephemeris; only `sun` (fixed at the origin) resolves.
    pub fn new(epoch: NaiveDateTime) -> Self {
        Self {
            epoch,
            orbits: BTreeMap::new(),
        }
    }

    /// Add a body with orbit radius, sidereal period and polar angle at the epoch.
    pub fn with_body(
        mut self,
        name: &str,
        radius_km: f64,
        period_s: f64,
        phase_at_epoch_rad: f64,
    ) -> Self {
        self.orbits.insert(
            normalize_body_name(name),
            CircularOrbit {
                radius_km,
                angular_rate_rad_s: TAU / period_s,
                phase_rad: phase_at_epoch_rad,
            },
        );
        self
    }

    /// Add a body that never moves (zero angular rate).
    pub fn with_fixed_body(mut self, name: &str, position_km: Vector2) -> Self {
        self.orbits.insert(
            normalize_body_name(name),
            CircularOrbit {
                radius_km: position_km[0].hypot(position_km[1]),
                angular_rate_rad_s: 0.0,
                phase_rad: position_km[1].atan2(position_km[0]),
            },
        );
        self
    }
}

impl EphemerisProvider for CircularEphemeris {
    fn position(&self, body: &str, instant: NaiveDateTime) -> Result<Vector2, EphemerisError> {
        let name = normalize_body_name(body);
        if name == "sun" {
            return Ok([0.0, 0.0]);
        }
        let orbit = self
            .orbits
            .get(&name)
            .ok_or_else(|| EphemerisError::UnknownBody(body.to_string()))?;

        let elapsed = instant - self.epoch;
        let elapsed_s = elapsed.num_seconds() as f64 + f64::from(elapsed.subsec_nanos()) * 1e-9;
        let angle = orbit.phase_rad + orbit.angular_rate_rad_s * elapsed_s;
        let (sin, cos) = angle.sin_cos();
        Ok([orbit.radius_km * cos, orbit.radius_km * sin])
    }
}
