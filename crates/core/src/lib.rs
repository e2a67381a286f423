//! Core units, constants, and shared primitives for the swingby trajectory workspace.

pub mod state;

pub use state::StateVector;

/// Physical constants expressed in kilometre/second units unless stated otherwise.
pub mod constants {
    /// Kilometres per astronomical unit.
    pub const AU_KM: f64 = 149_597_870.7;
    /// Seconds per day.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    /// Integer seconds per day, used for sample grids.
    pub const SECONDS_PER_DAY_I64: i64 = 86_400;
    /// Days per Julian century.
    pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;
    /// Julian date of the J2000.0 epoch (2000-01-01T12:00:00).
    pub const J2000_JD: f64 = 2_451_545.0;
    /// Julian date of the Unix epoch (1970-01-01T00:00:00).
    pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;
}

/// Basic unit conversion helpers.
pub mod units {
    /// Convert astronomical units to kilometres.
    #[inline]
    pub fn au_to_km(v: f64) -> f64 {
        v * super::constants::AU_KM
    }
}

/// Time utilities: elapsed mission seconds versus wall-clock instants.
pub mod time {
    use chrono::{NaiveDateTime, TimeDelta};

    use super::constants::{
        DAYS_PER_JULIAN_CENTURY, J2000_JD, SECONDS_PER_DAY, SECONDS_PER_DAY_I64, UNIX_EPOCH_JD,
    };

    /// Wall-clock instant reached `elapsed_s` seconds after `start`.
    ///
    /// Sub-second offsets are kept at nanosecond resolution so that integrator
    /// stages inside a step resolve to distinct ephemeris instants.
    pub fn offset_instant(start: NaiveDateTime, elapsed_s: f64) -> NaiveDateTime {
        let whole = elapsed_s.floor();
        let nanos = ((elapsed_s - whole) * 1e9).round() as i64;
        start + TimeDelta::seconds(whole as i64) + TimeDelta::nanoseconds(nanos)
    }

    /// Daily sample grid in integer seconds: `days` points starting at `start_s`.
    pub fn daily_grid(start_s: i64, days: u32) -> Vec<i64> {
        (0..i64::from(days))
            .map(|day| start_s + day * SECONDS_PER_DAY_I64)
            .collect()
    }

    /// Daily wall-clock series of `days` instants starting at `start`.
    pub fn daily_instants(start: NaiveDateTime, days: u32) -> Vec<NaiveDateTime> {
        (0..i64::from(days))
            .map(|day| start + TimeDelta::days(day))
            .collect()
    }

    /// Julian date of a wall-clock instant, treating it as UTC.
    pub fn julian_date(instant: NaiveDateTime) -> f64 {
        let utc = instant.and_utc();
        let seconds = utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) * 1e-9;
        UNIX_EPOCH_JD + seconds / SECONDS_PER_DAY
    }

    /// Julian centuries elapsed since J2000.0.
    pub fn julian_centuries_since_j2000(instant: NaiveDateTime) -> f64 {
        (julian_date(instant) - J2000_JD) / DAYS_PER_JULIAN_CENTURY
    }
}

/// Minimal planar vector helpers to avoid ad-hoc `[f64; 2]` math everywhere.
pub mod vector {
    /// Alias for a planar vector in kilometres or km/s depending on context.
    pub type Vector2 = [f64; 2];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector2) -> f64 {
        v[0].hypot(v[1])
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector2, b: &Vector2) -> f64 {
        a[0] * b[0] + a[1] * b[1]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector2, b: &Vector2) -> Vector2 {
        [a[0] + b[0], a[1] + b[1]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector2, b: &Vector2) -> Vector2 {
        [a[0] - b[0], a[1] - b[1]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector2, s: f64) -> Vector2 {
        [v[0] * s, v[1] * s]
    }

    /// Polar angle of a vector measured from +x (radians, `(-π, π]`).
    #[inline]
    pub fn angle(v: &Vector2) -> f64 {
        v[1].atan2(v[0])
    }
}

/// Planar rotations and rotating-frame transforms.
pub mod frame {
    use super::vector::Vector2;

    /// Rotate a vector counter-clockwise by `angle` radians.
    #[inline]
    pub fn rotate(v: &Vector2, angle: f64) -> Vector2 {
        let (sin, cos) = angle.sin_cos();
        [v[0] * cos - v[1] * sin, v[0] * sin + v[1] * cos]
    }

    /// Rotate each `(x, y)` pair by the phase `omega * time` of its sample.
    ///
    /// `x`, `y` and `times_s` must have equal length; extra entries in the
    /// longer slices are ignored.
    pub fn to_rotating(x: &[f64], y: &[f64], omega_rad_s: f64, times_s: &[f64]) -> Vec<Vector2> {
        x.iter()
            .zip(y)
            .zip(times_s)
            .map(|((&x, &y), &t)| rotate(&[x, y], omega_rad_s * t))
            .collect()
    }
}
