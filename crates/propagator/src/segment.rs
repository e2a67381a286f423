//! Propagation of one mission segment over a daily sample grid.

use chrono::NaiveDateTime;
use serde::Serialize;
use swingby_core::StateVector;
use swingby_core::constants::SECONDS_PER_DAY_I64;
use swingby_core::time::daily_grid;
use swingby_ephem::EphemerisProvider;
use swingby_gravity::{DynamicsError, ForceModel, GravityModel};
use thiserror::Error;

use crate::integrator::{self, IntegrationError, IntegratorConfig};

#[derive(Debug, Error)]
pub enum PropagationError {
    #[error(transparent)]
    Dynamics(#[from] DynamicsError),
    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),
    #[error("segment duration must be at least one day")]
    EmptySegment,
}

/// Inputs for a single segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentRequest<'a> {
    pub initial_state: StateVector,
    /// Elapsed mission seconds at the segment start.
    pub start_offset_s: i64,
    pub duration_days: u32,
    pub mission_start: NaiveDateTime,
    /// Planets whose gravity acts during this segment.
    pub planets: &'a [String],
}

/// Daily samples of one segment.
///
/// `times_s[i]` is the elapsed mission time of `states[i]`. The grid covers
/// `[start, start + duration)`; the state at the closing boundary is kept
/// separately as `end_state` so consecutive segments never share a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSolution {
    pub times_s: Vec<i64>,
    pub states: Vec<StateVector>,
    pub end_time_s: i64,
    pub end_state: StateVector,
    pub planets: Vec<String>,
}

impl SegmentSolution {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Samples as `[x, y, vx, vy]` rows.
    pub fn rows(&self) -> Vec<[f64; 4]> {
        self.states.iter().map(StateVector::to_array).collect()
    }

    pub fn start_time_s(&self) -> i64 {
        self.times_s.first().copied().unwrap_or(self.end_time_s)
    }
}

/// Integrate the equation of motion across one segment.
///
/// The first sample is `request.initial_state` at `request.start_offset_s`;
/// further samples follow every 86 400 s. Collisions detected by the force
/// model abort the propagation unchanged.
pub fn propagate_segment<E>(
    request: &SegmentRequest<'_>,
    gravity: &GravityModel,
    ephemeris: &E,
    integrator: &IntegratorConfig,
) -> Result<SegmentSolution, PropagationError>
where
    E: EphemerisProvider + ?Sized,
{
    if request.duration_days == 0 {
        return Err(PropagationError::EmptySegment);
    }

    let force = ForceModel::new(
        gravity,
        ephemeris,
        request.mission_start,
        request.planets,
    )?;

    let times_s = daily_grid(request.start_offset_s, request.duration_days);
    let end_time_s = request.start_offset_s + i64::from(request.duration_days) * SECONDS_PER_DAY_I64;
    let sample_times: Vec<f64> = times_s.iter().map(|&t| t as f64).collect();

    tracing::debug!(
        start_s = request.start_offset_s,
        days = request.duration_days,
        planets = ?request.planets,
        "propagating segment"
    );

    let result = integrator::integrate::<_, PropagationError>(
        integrator,
        |t, y| Ok(force.derivative(y, t)?),
        request.start_offset_s as f64,
        request.initial_state.to_array(),
        &sample_times,
        end_time_s as f64,
    )?;

    tracing::debug!(
        accepted = result.stats.accepted,
        rejected = result.stats.rejected,
        evaluations = result.stats.evaluations,
        "segment propagated"
    );

    Ok(SegmentSolution {
        times_s,
        states: result.samples.into_iter().map(StateVector::from_array).collect(),
        end_time_s,
        end_state: StateVector::from_array(result.end_state),
        planets: force.active_bodies().map(str::to_string).collect(),
    })
}
