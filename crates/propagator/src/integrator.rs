//! Explicit Runge–Kutta integrators for the four-component planar state.
//!
//! Two schemes are available: an adaptive Dormand–Prince 5(4) pair with
//! error control, and classical fixed-step RK4. Both stop exactly on every
//! requested sample time.

use serde::{Deserialize, Serialize};
use swingby_core::constants::SECONDS_PER_DAY;
use thiserror::Error;

/// Flat `[x, y, vx, vy]` state.
pub type State4 = [f64; 4];

/// Integrator selection and tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IntegratorConfig {
    /// Adaptive embedded RK5(4) with local error control.
    DormandPrince45 {
        relative_tolerance: f64,
        absolute_tolerance: f64,
        initial_step_s: f64,
        min_step_s: f64,
        max_step_s: f64,
        max_steps_per_segment: usize,
    },
    /// Classical RK4 with a fixed number of steps per day.
    RungeKutta4 { steps_per_day: u32 },
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self::dormand_prince45()
    }
}

impl IntegratorConfig {
    pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-10;
    pub const DEFAULT_ABSOLUTE_TOLERANCE: f64 = 1e-6;
    pub const DEFAULT_INITIAL_STEP_S: f64 = 600.0;
    pub const DEFAULT_MIN_STEP_S: f64 = 1e-3;
    pub const DEFAULT_MAX_STEP_S: f64 = SECONDS_PER_DAY;
    pub const DEFAULT_MAX_STEPS: usize = 2_000_000;

    /// Adaptive Dormand–Prince with the default tolerances.
    pub fn dormand_prince45() -> Self {
        Self::DormandPrince45 {
            relative_tolerance: Self::DEFAULT_RELATIVE_TOLERANCE,
            absolute_tolerance: Self::DEFAULT_ABSOLUTE_TOLERANCE,
            initial_step_s: Self::DEFAULT_INITIAL_STEP_S,
            min_step_s: Self::DEFAULT_MIN_STEP_S,
            max_step_s: Self::DEFAULT_MAX_STEP_S,
            max_steps_per_segment: Self::DEFAULT_MAX_STEPS,
        }
    }

    pub fn runge_kutta4(steps_per_day: u32) -> Self {
        Self::RungeKutta4 { steps_per_day }
    }

    /// Reject settings that cannot drive an integration.
    pub fn validate(&self) -> Result<(), IntegrationError> {
        match *self {
            Self::DormandPrince45 {
                relative_tolerance,
                absolute_tolerance,
                initial_step_s,
                min_step_s,
                max_step_s,
                max_steps_per_segment,
            } => {
                let positive = [
                    ("relative_tolerance", relative_tolerance),
                    ("absolute_tolerance", absolute_tolerance),
                    ("initial_step_s", initial_step_s),
                    ("min_step_s", min_step_s),
                    ("max_step_s", max_step_s),
                ];
                for (name, value) in positive {
                    if !(value > 0.0 && value.is_finite()) {
                        return Err(IntegrationError::InvalidSetting { name, value });
                    }
                }
                if min_step_s > max_step_s {
                    return Err(IntegrationError::InvalidSetting {
                        name: "min_step_s",
                        value: min_step_s,
                    });
                }
                if max_steps_per_segment == 0 {
                    return Err(IntegrationError::InvalidSetting {
                        name: "max_steps_per_segment",
                        value: 0.0,
                    });
                }
                Ok(())
            }
            Self::RungeKutta4 { steps_per_day } => {
                if steps_per_day == 0 {
                    return Err(IntegrationError::InvalidSetting {
                        name: "steps_per_day",
                        value: 0.0,
                    });
                }
                Ok(())
            }
        }
    }
}

/// Failures of the integration scheme itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationError {
    #[error("integrator setting `{name}` is invalid ({value})")]
    InvalidSetting { name: &'static str, value: f64 },
    #[error("step size {step_s:e} s fell below the minimum at t = {time_s} s")]
    StepSizeUnderflow { time_s: f64, step_s: f64 },
    #[error("exceeded {limit} integrator steps before t = {target_s} s (reached t = {time_s} s)")]
    MaxStepsExceeded {
        limit: usize,
        time_s: f64,
        target_s: f64,
    },
    #[error("state became non-finite at t = {time_s} s")]
    NonFinite { time_s: f64 },
    #[error("sample times must be non-decreasing and lie within the integration span")]
    UnorderedSamples,
}

/// Accepted/rejected step counters for one integration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

/// States at the requested sample times plus the state at the span end.
#[derive(Debug, Clone)]
pub struct Integration {
    pub samples: Vec<State4>,
    pub end_state: State4,
    pub stats: StepStats,
}

/// Integrate `rhs` from `(t0, y0)` to `t_end`, recording the state at each of `sample_times`.
///
/// `rhs(t, y)` returns `dy/dt` or an error that aborts the run unchanged.
pub fn integrate<F, E>(
    config: &IntegratorConfig,
    mut rhs: F,
    t0: f64,
    y0: State4,
    sample_times: &[f64],
    t_end: f64,
) -> Result<Integration, E>
where
    F: FnMut(f64, &State4) -> Result<State4, E>,
    E: From<IntegrationError>,
{
    config.validate()?;
    let ordered = sample_times.windows(2).all(|w| w[0] <= w[1])
        && sample_times.iter().all(|&s| s >= t0 && s <= t_end);
    if !ordered || t_end < t0 {
        return Err(IntegrationError::UnorderedSamples.into());
    }

    let mut stepper = Stepper::new(config);
    let mut t = t0;
    let mut y = y0;
    let mut samples = Vec::with_capacity(sample_times.len());

    for &stop in sample_times.iter().chain(std::iter::once(&t_end)) {
        if stop > t {
            y = stepper.advance(&mut rhs, t, y, stop)?;
            t = stop;
        }
        if samples.len() < sample_times.len() {
            samples.push(y);
        }
    }

    tracing::trace!(
        accepted = stepper.stats.accepted,
        rejected = stepper.stats.rejected,
        evaluations = stepper.stats.evaluations,
        "integration finished"
    );

    Ok(Integration {
        samples,
        end_state: y,
        stats: stepper.stats,
    })
}

/// Per-run stepping state carried across sample stops.
struct Stepper<'c> {
    config: &'c IntegratorConfig,
    next_step: f64,
    first_derivative: Option<(f64, State4)>,
    stats: StepStats,
}

impl<'c> Stepper<'c> {
    fn new(config: &'c IntegratorConfig) -> Self {
        let next_step = match *config {
            IntegratorConfig::DormandPrince45 { initial_step_s, .. } => initial_step_s,
            IntegratorConfig::RungeKutta4 { steps_per_day } => {
                SECONDS_PER_DAY / f64::from(steps_per_day)
            }
        };
        Self {
            config,
            next_step,
            first_derivative: None,
            stats: StepStats::default(),
        }
    }

    fn advance<F, E>(&mut self, rhs: &mut F, t: f64, y: State4, target: f64) -> Result<State4, E>
    where
        F: FnMut(f64, &State4) -> Result<State4, E>,
        E: From<IntegrationError>,
    {
        match *self.config {
            IntegratorConfig::DormandPrince45 {
                relative_tolerance,
                absolute_tolerance,
                min_step_s,
                max_step_s,
                max_steps_per_segment,
                ..
            } => self.advance_dp45(
                rhs,
                t,
                y,
                target,
                Tolerances {
                    relative: relative_tolerance,
                    absolute: absolute_tolerance,
                    min_step: min_step_s,
                    max_step: max_step_s,
                    max_steps: max_steps_per_segment,
                },
            ),
            IntegratorConfig::RungeKutta4 { .. } => self.advance_rk4(rhs, t, y, target),
        }
    }

    fn eval<F, E>(&mut self, rhs: &mut F, t: f64, y: &State4) -> Result<State4, E>
    where
        F: FnMut(f64, &State4) -> Result<State4, E>,
    {
        self.stats.evaluations += 1;
        rhs(t, y)
    }

    fn advance_rk4<F, E>(
        &mut self,
        rhs: &mut F,
        mut t: f64,
        mut y: State4,
        target: f64,
    ) -> Result<State4, E>
    where
        F: FnMut(f64, &State4) -> Result<State4, E>,
        E: From<IntegrationError>,
    {
        let span = target - t;
        let steps = (span / self.next_step).ceil().max(1.0) as usize;
        let h = span / steps as f64;

        for step in 0..steps {
            let k1 = self.eval(rhs, t, &y)?;
            let k2 = self.eval(rhs, t + 0.5 * h, &axpy(&y, 0.5 * h, &k1))?;
            let k3 = self.eval(rhs, t + 0.5 * h, &axpy(&y, 0.5 * h, &k2))?;
            let k4 = self.eval(rhs, t + h, &axpy(&y, h, &k3))?;
            for i in 0..4 {
                y[i] += h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
            }
            t = if step + 1 == steps { target } else { t + h };
            if !is_finite(&y) {
                return Err(IntegrationError::NonFinite { time_s: t }.into());
            }
            self.stats.accepted += 1;
        }
        Ok(y)
    }

    fn advance_dp45<F, E>(
        &mut self,
        rhs: &mut F,
        mut t: f64,
        mut y: State4,
        target: f64,
        tol: Tolerances,
    ) -> Result<State4, E>
    where
        F: FnMut(f64, &State4) -> Result<State4, E>,
        E: From<IntegrationError>,
    {
        let mut k1 = match self.first_derivative {
            Some((t_cached, k)) if t_cached == t => k,
            _ => self.eval(rhs, t, &y)?,
        };

        while t < target {
            if self.stats.accepted + self.stats.rejected >= tol.max_steps {
                return Err(IntegrationError::MaxStepsExceeded {
                    limit: tol.max_steps,
                    time_s: t,
                    target_s: target,
                }
                .into());
            }

            let remaining = target - t;
            let proposed = self.next_step.min(tol.max_step);
            let landing = proposed >= remaining;
            let h = if landing { remaining } else { proposed };

            let (y_new, k7, err) = dp45_step(self, rhs, t, &y, &k1, h, &tol)?;

            if err <= 1.0 {
                t = if landing { target } else { t + h };
                y = y_new;
                k1 = k7;
                self.stats.accepted += 1;
                // A step clipped to land on the target says nothing about the
                // achievable step size, so only grow from unclipped steps.
                if !landing || h >= proposed {
                    self.next_step = grow_step(h, err).min(tol.max_step);
                }
            } else {
                self.stats.rejected += 1;
                let shrunk = shrink_step(h, err);
                tracing::trace!(time_s = t, step_s = h, err, "rejected step");
                if shrunk < tol.min_step && remaining > tol.min_step {
                    return Err(IntegrationError::StepSizeUnderflow {
                        time_s: t,
                        step_s: shrunk,
                    }
                    .into());
                }
                self.next_step = shrunk;
            }
        }

        self.first_derivative = Some((t, k1));
        Ok(y)
    }
}

#[derive(Debug, Clone, Copy)]
struct Tolerances {
    relative: f64,
    absolute: f64,
    min_step: f64,
    max_step: f64,
    max_steps: usize,
}

// Dormand–Prince 5(4) tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19_372.0 / 6_561.0;
const A52: f64 = -25_360.0 / 2_187.0;
const A53: f64 = 64_448.0 / 6_561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9_017.0 / 3_168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46_732.0 / 5_247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5_103.0 / 18_656.0;
const A71: f64 = 35.0 / 384.0;
const A73: f64 = 500.0 / 1_113.0;
const A74: f64 = 125.0 / 192.0;
const A75: f64 = -2_187.0 / 6_784.0;
const A76: f64 = 11.0 / 84.0;

// Fifth-order minus fourth-order weights.
const E1: f64 = 71.0 / 57_600.0;
const E3: f64 = -71.0 / 16_695.0;
const E4: f64 = 71.0 / 1_920.0;
const E5: f64 = -17_253.0 / 339_200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// One trial step; returns the fifth-order solution, its derivative (FSAL) and the scaled error.
fn dp45_step<F, E>(
    stepper: &mut Stepper<'_>,
    rhs: &mut F,
    t: f64,
    y: &State4,
    k1: &State4,
    h: f64,
    tol: &Tolerances,
) -> Result<(State4, State4, f64), E>
where
    F: FnMut(f64, &State4) -> Result<State4, E>,
{
    let stage = |coeffs: &[(f64, &State4)]| {
        let mut out = *y;
        for (a, k) in coeffs {
            for i in 0..4 {
                out[i] += h * a * k[i];
            }
        }
        out
    };

    let k2 = stepper.eval(rhs, t + C2 * h, &stage(&[(A21, k1)]))?;
    let k3 = stepper.eval(rhs, t + C3 * h, &stage(&[(A31, k1), (A32, &k2)]))?;
    let k4 = stepper.eval(rhs, t + C4 * h, &stage(&[(A41, k1), (A42, &k2), (A43, &k3)]))?;
    let k5 = stepper.eval(
        rhs,
        t + C5 * h,
        &stage(&[(A51, k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
    )?;
    let k6 = stepper.eval(
        rhs,
        t + h,
        &stage(&[(A61, k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)]),
    )?;
    let y_new = stage(&[(A71, k1), (A73, &k3), (A74, &k4), (A75, &k5), (A76, &k6)]);
    let k7 = stepper.eval(rhs, t + h, &y_new)?;

    let mut err: f64 = 0.0;
    for i in 0..4 {
        let e = h
            * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i] + E7 * k7[i]);
        let scale = tol.absolute + tol.relative * y[i].abs().max(y_new[i].abs());
        err = err.max(e.abs() / scale);
    }
    if err.is_nan() || !is_finite(&y_new) {
        err = f64::INFINITY;
    }

    Ok((y_new, k7, err))
}

fn grow_step(h: f64, err: f64) -> f64 {
    let factor = if err == 0.0 {
        MAX_FACTOR
    } else {
        (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
    };
    h * factor
}

fn shrink_step(h: f64, err: f64) -> f64 {
    let factor = if err.is_finite() {
        (SAFETY * err.powf(-0.25)).clamp(MIN_FACTOR, 1.0)
    } else {
        MIN_FACTOR
    };
    h * factor
}

fn axpy(y: &State4, a: f64, k: &State4) -> State4 {
    [
        y[0] + a * k[0],
        y[1] + a * k[1],
        y[2] + a * k[2],
        y[3] + a * k[3],
    ]
}

fn is_finite(y: &State4) -> bool {
    y.iter().all(|v| v.is_finite())
}
