//! Validated mission configuration.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use swingby_config::{IntegratorSettings, MissionFile};
use swingby_core::vector::{self, Vector2};
use swingby_ephem::normalize_body_name;
use swingby_gravity::GravityModel;
use swingby_propagator::IntegratorConfig;
use thiserror::Error;

use crate::launch::{EscapeVelocityModel, LaunchConfig};

/// Invalid mission parameters, detected before any propagation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreconditionError {
    #[error("mission needs at least one segment")]
    NoSegments,
    #[error("{durations} segment durations but {delta_vs} delta-V vectors")]
    LengthMismatch { durations: usize, delta_vs: usize },
    #[error("segment {index} has non-positive duration {days} days")]
    NonPositiveDuration { index: usize, days: i64 },
    #[error("segment {index} duration {days} days exceeds the supported range")]
    DurationTooLong { index: usize, days: i64 },
    #[error("mission of {total_days} days from {start} ends outside the representable date range")]
    MissionTooLong { start: NaiveDateTime, total_days: u64 },
    #[error("segment {index} delta-V {delta_v:?} is not finite")]
    NonFiniteDeltaV { index: usize, delta_v: Vector2 },
    #[error("v-infinity must be finite and positive (got {0} km/s)")]
    InvalidVInfinity(f64),
    #[error("planet `{0}` is missing from the gravity or radius table")]
    UnknownPlanet(String),
    #[error("planet `{0}` is listed more than once")]
    DuplicatePlanet(String),
    #[error("`sun` cannot be an active planet; it is always the central body")]
    SunInPlanetList,
    #[error("Earth clearance {0} radii is outside [1, 3]")]
    InvalidClearance(f64),
    #[error("total delta-V {total_km_s:.6} km/s exceeds the budget of {budget_km_s} km/s")]
    DeltaVBudgetExceeded { total_km_s: f64, budget_km_s: f64 },
    #[error("cannot parse mission start `{0}` (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)")]
    InvalidStart(String),
    #[error("invalid integrator settings: {0}")]
    Integrator(String),
}

/// One validated segment: whole-day duration and the impulse at its start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub duration_days: u32,
    pub delta_v_km_s: Vector2,
}

/// Complete description of a mission run.
///
/// Construct with [`MissionConfig::new`] (or from a [`MissionFile`]) so the
/// list-shape invariants are checked once; planet names are checked against a
/// gravity model with [`MissionConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct MissionConfig {
    pub v_infinity_km_s: f64,
    pub mission_start: NaiveDateTime,
    pub segments: Vec<Segment>,
    /// Planets acting on every segment after the first.
    pub planets: Vec<String>,
    pub launch: LaunchConfig,
    /// Whether segment 0 also feels the planet list.
    pub include_planets_in_first_segment: bool,
    pub delta_v_budget_km_s: Option<f64>,
    pub integrator: IntegratorConfig,
}

impl MissionConfig {
    /// Build from parallel duration and delta-V lists.
    pub fn new<S: AsRef<str>>(
        v_infinity_km_s: f64,
        mission_start: NaiveDateTime,
        durations_days: &[i64],
        delta_v_km_s: &[Vector2],
        planets: &[S],
    ) -> Result<Self, PreconditionError> {
        if durations_days.len() != delta_v_km_s.len() {
            return Err(PreconditionError::LengthMismatch {
                durations: durations_days.len(),
                delta_vs: delta_v_km_s.len(),
            });
        }
        if durations_days.is_empty() {
            return Err(PreconditionError::NoSegments);
        }

        let segments = durations_days
            .iter()
            .zip(delta_v_km_s)
            .enumerate()
            .map(|(index, (&days, &delta_v))| {
                if days <= 0 {
                    return Err(PreconditionError::NonPositiveDuration { index, days });
                }
                let duration_days = u32::try_from(days)
                    .map_err(|_| PreconditionError::DurationTooLong { index, days })?;
                Ok(Segment {
                    duration_days,
                    delta_v_km_s: delta_v,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let config = Self {
            v_infinity_km_s,
            mission_start,
            segments,
            planets: planets
                .iter()
                .map(|p| normalize_body_name(p.as_ref()))
                .collect(),
            launch: LaunchConfig::default(),
            include_planets_in_first_segment: false,
            delta_v_budget_km_s: None,
            integrator: IntegratorConfig::default(),
        };
        config.check_shape()?;
        Ok(config)
    }

    pub fn with_launch(mut self, launch: LaunchConfig) -> Self {
        self.launch = launch;
        self
    }

    pub fn with_integrator(mut self, integrator: IntegratorConfig) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn with_planets_in_first_segment(mut self, include: bool) -> Self {
        self.include_planets_in_first_segment = include;
        self
    }

    pub fn with_delta_v_budget(mut self, budget_km_s: f64) -> Self {
        self.delta_v_budget_km_s = Some(budget_km_s);
        self
    }

    /// Sum of all segment durations (days), saturating at `u32::MAX`.
    pub fn total_days(&self) -> u32 {
        self.checked_total_days().unwrap_or(u32::MAX)
    }

    /// End boundary of the last segment, if both the day sum and the date fit.
    pub fn mission_end(&self) -> Option<NaiveDateTime> {
        let days = TimeDelta::try_days(i64::from(self.checked_total_days()?))?;
        self.mission_start.checked_add_signed(days)
    }

    fn checked_total_days(&self) -> Option<u32> {
        self.segments
            .iter()
            .try_fold(0_u32, |acc, s| acc.checked_add(s.duration_days))
    }

    /// Sum of delta-V magnitudes applied at segment boundaries (km/s).
    ///
    /// The first segment's vector is never applied and is not counted.
    pub fn total_delta_v_km_s(&self) -> f64 {
        self.segments
            .iter()
            .skip(1)
            .map(|s| vector::norm(&s.delta_v_km_s))
            .sum()
    }

    /// Full precondition check against the gravity tables.
    pub fn validate(&self, gravity: &GravityModel) -> Result<(), PreconditionError> {
        self.check_shape()?;
        for planet in &self.planets {
            if !gravity.contains(planet) {
                return Err(PreconditionError::UnknownPlanet(planet.clone()));
            }
        }
        Ok(())
    }

    fn check_shape(&self) -> Result<(), PreconditionError> {
        if self.segments.is_empty() {
            return Err(PreconditionError::NoSegments);
        }
        if !(self.v_infinity_km_s > 0.0 && self.v_infinity_km_s.is_finite()) {
            return Err(PreconditionError::InvalidVInfinity(self.v_infinity_km_s));
        }
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.duration_days == 0 {
                return Err(PreconditionError::NonPositiveDuration { index, days: 0 });
            }
            if !segment.delta_v_km_s.iter().all(|v| v.is_finite()) {
                return Err(PreconditionError::NonFiniteDeltaV {
                    index,
                    delta_v: segment.delta_v_km_s,
                });
            }
        }
        if self.mission_end().is_none() {
            return Err(PreconditionError::MissionTooLong {
                start: self.mission_start,
                total_days: self
                    .segments
                    .iter()
                    .map(|s| u64::from(s.duration_days))
                    .sum(),
            });
        }
        for (i, planet) in self.planets.iter().enumerate() {
            if planet == "sun" {
                return Err(PreconditionError::SunInPlanetList);
            }
            if self.planets[..i].contains(planet) {
                return Err(PreconditionError::DuplicatePlanet(planet.clone()));
            }
        }
        let clearance = self.launch.earth_clearance_radii;
        if !(LaunchConfig::MIN_CLEARANCE_RADII..=LaunchConfig::MAX_CLEARANCE_RADII)
            .contains(&clearance)
        {
            return Err(PreconditionError::InvalidClearance(clearance));
        }
        if let Some(budget) = self.delta_v_budget_km_s {
            let total = self.total_delta_v_km_s();
            if total > budget {
                return Err(PreconditionError::DeltaVBudgetExceeded {
                    total_km_s: total,
                    budget_km_s: budget,
                });
            }
        }
        self.integrator
            .validate()
            .map_err(|err| PreconditionError::Integrator(err.to_string()))?;
        Ok(())
    }
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS` (a space separator is accepted too).
pub fn parse_mission_start(text: &str) -> Result<NaiveDateTime, PreconditionError> {
    let trimmed = text.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| PreconditionError::InvalidStart(text.to_string()))
}

fn integrator_from_settings(settings: &IntegratorSettings) -> IntegratorConfig {
    match *settings {
        IntegratorSettings::DormandPrince45 {
            relative_tolerance,
            absolute_tolerance,
            initial_step_s,
            min_step_s,
            max_step_s,
            max_steps_per_segment,
        } => IntegratorConfig::DormandPrince45 {
            relative_tolerance: relative_tolerance
                .unwrap_or(IntegratorConfig::DEFAULT_RELATIVE_TOLERANCE),
            absolute_tolerance: absolute_tolerance
                .unwrap_or(IntegratorConfig::DEFAULT_ABSOLUTE_TOLERANCE),
            initial_step_s: initial_step_s.unwrap_or(IntegratorConfig::DEFAULT_INITIAL_STEP_S),
            min_step_s: min_step_s.unwrap_or(IntegratorConfig::DEFAULT_MIN_STEP_S),
            max_step_s: max_step_s.unwrap_or(IntegratorConfig::DEFAULT_MAX_STEP_S),
            max_steps_per_segment: max_steps_per_segment
                .unwrap_or(IntegratorConfig::DEFAULT_MAX_STEPS),
        },
        IntegratorSettings::RungeKutta4 { steps_per_day } => {
            IntegratorConfig::RungeKutta4 { steps_per_day }
        }
    }
}

impl TryFrom<&MissionFile> for MissionConfig {
    type Error = PreconditionError;

    fn try_from(file: &MissionFile) -> Result<Self, Self::Error> {
        let mission_start = parse_mission_start(&file.start)?;
        let durations: Vec<i64> = file.segments.iter().map(|s| s.duration_days).collect();
        let delta_vs: Vec<Vector2> = file.segments.iter().map(|s| s.delta_v_km_s).collect();

        let mut config = Self::new(
            file.v_infinity_km_s,
            mission_start,
            &durations,
            &delta_vs,
            &file.planets,
        )?;
        config.launch = LaunchConfig {
            escape_model: EscapeVelocityModel::from(file.launch.escape_model),
            earth_clearance_radii: file
                .launch
                .earth_clearance_radii
                .unwrap_or(LaunchConfig::MIN_CLEARANCE_RADII),
        };
        config.include_planets_in_first_segment = file.launch.include_planets_in_first_segment;
        config.delta_v_budget_km_s = file.delta_v_budget_km_s;
        config.integrator = integrator_from_settings(&file.integrator);
        config.check_shape()?;
        Ok(config)
    }
}
