//! Multi-segment mission sequencing with impulsive delta-V at segment boundaries.
//!
//! A mission starts from the launch state built in [`launch`], propagates the
//! first segment (Sun only by default), then applies each following segment's
//! delta-V to the previous segment's end-boundary state and propagates again
//! with the full planet list. Samples from all segments are concatenated into
//! one daily grid, and planet positions are sampled on the same days.

use chrono::NaiveDateTime;
use swingby_core::StateVector;
use swingby_core::frame::to_rotating;
use swingby_core::time::daily_instants;
use swingby_core::vector::{self, Vector2};
use swingby_ephem::{EphemerisError, EphemerisProvider, PlanetCoordinates, PlanetTrack};
use swingby_gravity::{CollisionError, DynamicsError, GravityModel};
use swingby_propagator::{PropagationError, SegmentRequest, SegmentSolution, propagate_segment};
use thiserror::Error;

pub mod config;
pub mod launch;

pub use config::{MissionConfig, PreconditionError, Segment, parse_mission_start};
pub use launch::{EscapeVelocityModel, LaunchConfig, LaunchError, initial_state};

/// Planet series and spacecraft samples disagree in length.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("spacecraft has {spacecraft} samples but `{body}` has {ephemeris}")]
pub struct ShapeMismatchError {
    pub body: String,
    pub spacecraft: usize,
    pub ephemeris: usize,
}

#[derive(Debug, Error)]
pub enum MissionError {
    #[error("invalid mission: {0}")]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Collision(#[from] CollisionError),
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatchError),
    #[error("launch state: {0}")]
    Launch(#[from] LaunchError),
    #[error("segment {segment}: {source}")]
    Propagation {
        segment: usize,
        #[source]
        source: PropagationError,
    },
    #[error("ephemeris sampling failed: {0}")]
    Ephemeris(#[from] EphemerisError),
}

impl MissionError {
    /// Lift collisions out of the propagation stack so callers can match them directly.
    fn from_segment(segment: usize, err: PropagationError) -> Self {
        match err {
            PropagationError::Dynamics(DynamicsError::Collision(collision)) => {
                Self::Collision(collision)
            }
            source => Self::Propagation { segment, source },
        }
    }
}

/// Full multi-segment result.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionSolution {
    pub mission_start: NaiveDateTime,
    pub initial_state: StateVector,
    pub segments: Vec<SegmentSolution>,
    /// Concatenated sample times (s since mission start).
    pub elapsed_s: Vec<i64>,
    /// One instant per day from mission start, aligned with `elapsed_s`.
    pub timeseries: Vec<NaiveDateTime>,
    pub planet_coordinates: PlanetCoordinates,
    /// Spacecraft to Earth distance per sample, when Earth is in the planet list.
    pub spacecraft_earth_distance_km: Option<Vec<f64>>,
    /// Sum of the applied delta-V magnitudes (km/s).
    pub total_delta_v_km_s: f64,
}

impl MissionSolution {
    /// Number of samples across all segments.
    pub fn len(&self) -> usize {
        self.elapsed_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elapsed_s.is_empty()
    }

    /// All samples in order.
    pub fn states(&self) -> impl Iterator<Item = &StateVector> {
        self.segments.iter().flat_map(|s| s.states.iter())
    }

    /// All samples as `[x, y, vx, vy]` rows.
    pub fn rows(&self) -> Vec<[f64; 4]> {
        self.states().map(StateVector::to_array).collect()
    }

    /// Spacecraft positions (km) at every sample.
    pub fn positions(&self) -> Vec<Vector2> {
        self.states().map(|s| s.position_km).collect()
    }

    /// State at the closing boundary of the last segment.
    pub fn final_state(&self) -> Option<StateVector> {
        self.segments.last().map(|s| s.end_state)
    }

    /// Spacecraft track in a frame rotating at `omega_rad_s` about the Sun.
    pub fn spacecraft_track_rotating(&self, omega_rad_s: f64) -> Vec<Vector2> {
        let (x, y): (Vec<f64>, Vec<f64>) = self
            .states()
            .map(|s| (s.position_km[0], s.position_km[1]))
            .unzip();
        let times: Vec<f64> = self.elapsed_s.iter().map(|&t| t as f64).collect();
        to_rotating(&x, &y, omega_rad_s, &times)
    }
}

/// Distance from each spacecraft position to the matching point of `track`.
pub fn spacecraft_body_distance(
    body: &str,
    positions: &[Vector2],
    track: &PlanetTrack,
) -> Result<Vec<f64>, ShapeMismatchError> {
    if positions.len() != track.len() || track.x.len() != track.y.len() {
        return Err(ShapeMismatchError {
            body: body.to_string(),
            spacecraft: positions.len(),
            ephemeris: track.len().min(track.y.len()),
        });
    }
    Ok(positions
        .iter()
        .zip(track.x.iter().zip(&track.y))
        .map(|(p, (&x, &y))| vector::norm(&vector::sub(p, &[x, y])))
        .collect())
}

/// Run a complete mission.
///
/// Preconditions are checked before the provider is queried for anything.
pub fn run_mission<E>(
    config: &MissionConfig,
    gravity: &GravityModel,
    ephemeris: &E,
) -> Result<MissionSolution, MissionError>
where
    E: EphemerisProvider + ?Sized,
{
    config.validate(gravity)?;

    tracing::info!(
        start = %config.mission_start,
        v_infinity_km_s = config.v_infinity_km_s,
        segments = config.segments.len(),
        planets = ?config.planets,
        "mission started"
    );

    let launch_state = initial_state(
        config.mission_start,
        config.v_infinity_km_s,
        &config.launch,
        gravity,
        ephemeris,
    )?;

    let no_planets: &[String] = &[];
    let mut segments: Vec<SegmentSolution> = Vec::with_capacity(config.segments.len());
    let mut state = launch_state;
    let mut offset_s = 0_i64;
    let mut total_delta_v = 0.0;

    for (index, segment) in config.segments.iter().enumerate() {
        let planets = if index == 0 && !config.include_planets_in_first_segment {
            no_planets
        } else {
            config.planets.as_slice()
        };

        if let Some(previous) = segments.last() {
            state = previous.end_state.with_impulse(segment.delta_v_km_s);
            offset_s = previous.end_time_s;
            total_delta_v += vector::norm(&segment.delta_v_km_s);
            tracing::debug!(
                segment = index,
                delta_v_km_s = ?segment.delta_v_km_s,
                elapsed_s = offset_s,
                "applied delta-V"
            );
        }

        let request = SegmentRequest {
            initial_state: state,
            start_offset_s: offset_s,
            duration_days: segment.duration_days,
            mission_start: config.mission_start,
            planets,
        };
        let solution = propagate_segment(&request, gravity, ephemeris, &config.integrator)
            .map_err(|err| MissionError::from_segment(index, err))?;
        segments.push(solution);
    }

    let elapsed_s: Vec<i64> = segments
        .iter()
        .flat_map(|s| s.times_s.iter().copied())
        .collect();
    let timeseries = daily_instants(config.mission_start, config.total_days());
    let planet_coordinates = ephemeris.positions(&config.planets, &timeseries)?;

    let spacecraft_earth_distance_km = match planet_coordinates.get("earth") {
        Some(track) => {
            let positions: Vec<Vector2> = segments
                .iter()
                .flat_map(|s| s.states.iter().map(|st| st.position_km))
                .collect();
            Some(spacecraft_body_distance("earth", &positions, track)?)
        }
        None => None,
    };

    let solution = MissionSolution {
        mission_start: config.mission_start,
        initial_state: launch_state,
        segments,
        elapsed_s,
        timeseries,
        planet_coordinates,
        spacecraft_earth_distance_km,
        total_delta_v_km_s: total_delta_v,
    };

    tracing::info!(
        samples = solution.len(),
        total_delta_v_km_s = solution.total_delta_v_km_s,
        "mission finished"
    );
    Ok(solution)
}
