//! Planar spacecraft state in the Sun-centred inertial frame.

use serde::{Deserialize, Serialize};

use crate::vector::{self, Vector2};

/// Position (km) and velocity (km/s) of the spacecraft.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateVector {
    pub position_km: Vector2,
    pub velocity_km_s: Vector2,
}

impl StateVector {
    pub fn new(position_km: Vector2, velocity_km_s: Vector2) -> Self {
        Self {
            position_km,
            velocity_km_s,
        }
    }

    /// Build from a flat `[x, y, vx, vy]` row.
    pub fn from_array(row: [f64; 4]) -> Self {
        Self {
            position_km: [row[0], row[1]],
            velocity_km_s: [row[2], row[3]],
        }
    }

    /// Flat `[x, y, vx, vy]` row as consumed by the integrator and reporting layer.
    pub fn to_array(&self) -> [f64; 4] {
        [
            self.position_km[0],
            self.position_km[1],
            self.velocity_km_s[0],
            self.velocity_km_s[1],
        ]
    }

    /// Copy of this state with `delta_v_km_s` added to the velocity; position unchanged.
    pub fn with_impulse(&self, delta_v_km_s: Vector2) -> Self {
        Self {
            position_km: self.position_km,
            velocity_km_s: vector::add(&self.velocity_km_s, &delta_v_km_s),
        }
    }

    /// Heliocentric distance (km).
    pub fn radius_km(&self) -> f64 {
        vector::norm(&self.position_km)
    }

    /// Heliocentric speed (km/s).
    pub fn speed_km_s(&self) -> f64 {
        vector::norm(&self.velocity_km_s)
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}
