use chrono::{NaiveDate, NaiveDateTime};
use swingby::common::StateVector;
use swingby::common::constants::{AU_KM, SECONDS_PER_DAY};
use swingby::ephem::{CircularEphemeris, MeanElementsEphemeris};
use swingby::gravity::{DynamicsError, GravityModel};
use swingby::propagator::integrator::{IntegrationError, integrate};
use swingby::propagator::{
    IntegratorConfig, PropagationError, SegmentRequest, SegmentSolution, propagate_segment,
};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 9, 23)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

fn circular_state(gravity: &GravityModel) -> StateVector {
    StateVector::new([AU_KM, 0.0], [0.0, gravity.circular_speed(AU_KM)])
}

fn two_body_segment(
    initial_state: StateVector,
    start_offset_s: i64,
    duration_days: u32,
    integrator: &IntegratorConfig,
) -> SegmentSolution {
    let gravity = GravityModel::solar_system();
    let ephemeris = MeanElementsEphemeris::new();
    let request = SegmentRequest {
        initial_state,
        start_offset_s,
        duration_days,
        mission_start: start(),
        planets: &[],
    };
    propagate_segment(&request, &gravity, &ephemeris, integrator).unwrap()
}

fn specific_energy(state: &StateVector, gm: f64) -> f64 {
    0.5 * state.speed_km_s().powi(2) - gm / state.radius_km()
}

#[test]
fn integrator_tracks_harmonic_oscillator() {
    // y'' = -y with y(0) = 1, y'(0) = 0 packed into the first two slots.
    let rhs = |_t: f64, y: &[f64; 4]| -> Result<[f64; 4], IntegrationError> {
        Ok([y[1], -y[0], 0.0, 0.0])
    };
    let samples = [0.0, 1.0, 2.0, 3.0];
    let config = IntegratorConfig::DormandPrince45 {
        relative_tolerance: 1e-12,
        absolute_tolerance: 1e-12,
        initial_step_s: 0.01,
        min_step_s: 1e-9,
        max_step_s: 0.1,
        max_steps_per_segment: 100_000,
    };
    let out = integrate(&config, rhs, 0.0, [1.0, 0.0, 0.0, 0.0], &samples, 5.0).unwrap();

    assert_eq!(out.samples.len(), samples.len());
    assert_eq!(out.samples[0], [1.0, 0.0, 0.0, 0.0]);
    for (t, y) in samples.iter().zip(&out.samples) {
        assert!((y[0] - t.cos()).abs() < 1e-9, "t = {t}: {} vs {}", y[0], t.cos());
        assert!((y[1] + t.sin()).abs() < 1e-9);
    }
    assert!((out.end_state[0] - 5.0_f64.cos()).abs() < 1e-9);
    assert!(out.stats.accepted > 0);
}

#[test]
fn integrator_rejects_bad_settings_and_samples() {
    let rhs = |_t: f64, _y: &[f64; 4]| -> Result<[f64; 4], IntegrationError> { Ok([0.0; 4]) };
    let err = integrate(
        &IntegratorConfig::runge_kutta4(0),
        rhs,
        0.0,
        [0.0; 4],
        &[0.0],
        1.0,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        IntegrationError::InvalidSetting {
            name: "steps_per_day",
            ..
        }
    ));

    let err = integrate(
        &IntegratorConfig::default(),
        rhs,
        0.0,
        [0.0; 4],
        &[2.0, 1.0],
        3.0,
    )
    .unwrap_err();
    assert_eq!(err, IntegrationError::UnorderedSamples);
}

#[test]
fn step_limit_is_reported() {
    let rhs = |_t: f64, y: &[f64; 4]| -> Result<[f64; 4], IntegrationError> {
        Ok([y[1], -y[0], 0.0, 0.0])
    };
    let config = IntegratorConfig::DormandPrince45 {
        relative_tolerance: 1e-10,
        absolute_tolerance: 1e-10,
        initial_step_s: 1e-3,
        min_step_s: 1e-9,
        max_step_s: 1e-3,
        max_steps_per_segment: 10,
    };
    let err = integrate(&config, rhs, 0.0, [1.0, 0.0, 0.0, 0.0], &[], 1.0).unwrap_err();
    assert!(matches!(err, IntegrationError::MaxStepsExceeded { limit: 10, .. }));
}

#[test]
fn segment_grid_is_daily_and_starts_at_offset() {
    let gravity = GravityModel::solar_system();
    let initial = circular_state(&gravity);
    let offset = 5 * 86_400;
    let solution = two_body_segment(initial, offset, 12, &IntegratorConfig::default());

    assert_eq!(solution.len(), 12);
    assert_eq!(solution.times_s.len(), 12);
    assert_eq!(solution.start_time_s(), offset);
    for pair in solution.times_s.windows(2) {
        assert_eq!(pair[1] - pair[0], 86_400);
    }
    assert_eq!(solution.end_time_s, offset + 12 * 86_400);
    assert_eq!(solution.states[0], initial);
    assert_eq!(solution.rows()[0], initial.to_array());
    assert!(solution.planets.is_empty());
}

#[test]
fn circular_orbit_keeps_radius_and_energy() {
    let gravity = GravityModel::solar_system();
    let gm = gravity.sun_gm();
    let initial = circular_state(&gravity);
    let solution = two_body_segment(initial, 0, 365, &IntegratorConfig::default());

    let e0 = specific_energy(&initial, gm);
    for state in solution.states.iter().chain(std::iter::once(&solution.end_state)) {
        assert!((state.radius_km() - AU_KM).abs() / AU_KM < 1e-6);
        assert!(((specific_energy(state, gm) - e0) / e0).abs() < 1e-6);
    }

    // A circular orbit at 1 au closes in about 365.26 days.
    let period_days = std::f64::consts::TAU * AU_KM / initial.speed_km_s() / SECONDS_PER_DAY;
    let expected_angle = std::f64::consts::TAU * 365.0 / period_days;
    let end = solution.end_state.position_km;
    let angle = end[1].atan2(end[0]).rem_euclid(std::f64::consts::TAU);
    assert!((angle - expected_angle).abs() < 1e-5, "{angle} vs {expected_angle}");
}

#[test]
fn chained_segments_match_continuous_propagation() {
    let gravity = GravityModel::solar_system();
    let initial = StateVector::new([AU_KM, 0.0], [2.5, 34.8]);
    let config = IntegratorConfig::default();

    let first = two_body_segment(initial, 0, 10, &config);
    let second = two_body_segment(first.end_state, first.end_time_s, 15, &config);
    let whole = two_body_segment(initial, 0, 25, &config);

    assert_eq!(second.start_time_s(), 10 * 86_400);
    let chained: Vec<&StateVector> = first.states.iter().chain(&second.states).collect();
    assert_eq!(chained.len(), whole.len());
    for (a, b) in chained.iter().zip(&whole.states) {
        let dx = (a.position_km[0] - b.position_km[0]).hypot(a.position_km[1] - b.position_km[1]);
        let dv = (a.velocity_km_s[0] - b.velocity_km_s[0])
            .hypot(a.velocity_km_s[1] - b.velocity_km_s[1]);
        assert!(dx < 1.0, "position drift {dx} km");
        assert!(dv < 1e-5, "velocity drift {dv} km/s");
    }
    assert_eq!(second.end_time_s, whole.end_time_s);
}

#[test]
fn rk4_and_dormand_prince_agree() {
    let initial = StateVector::new([0.0, -AU_KM], [31.0, 3.0]);
    let adaptive = two_body_segment(initial, 0, 60, &IntegratorConfig::default());
    let fixed = two_body_segment(initial, 0, 60, &IntegratorConfig::runge_kutta4(24));

    for (a, b) in adaptive.states.iter().zip(&fixed.states) {
        let dx = (a.position_km[0] - b.position_km[0]).hypot(a.position_km[1] - b.position_km[1]);
        assert!(dx < 1.0, "RK4 differs by {dx} km");
    }
}

#[test]
fn collision_aborts_segment() {
    let gravity = GravityModel::solar_system();
    let earth = [AU_KM, 0.0];
    let ephemeris = CircularEphemeris::new(start()).with_fixed_body("earth", earth);
    let planets = vec!["earth".to_string()];
    let request = SegmentRequest {
        initial_state: StateVector::new([AU_KM + 50_000.0, 0.0], [-5.0, 0.0]),
        start_offset_s: 0,
        duration_days: 2,
        mission_start: start(),
        planets: &planets,
    };

    let err = propagate_segment(
        &request,
        &gravity,
        &ephemeris,
        &IntegratorConfig::runge_kutta4(1_440),
    )
    .unwrap_err();
    match err {
        PropagationError::Dynamics(DynamicsError::Collision(collision)) => {
            assert_eq!(collision.body, "earth");
            assert!(collision.distance_km < collision.radius_km);
            assert!(collision.elapsed_s > 0.0 && collision.elapsed_s < 86_400.0);
        }
        other => panic!("expected collision, got {other:?}"),
    }
}

#[test]
fn zero_length_segment_is_rejected() {
    let gravity = GravityModel::solar_system();
    let ephemeris = MeanElementsEphemeris::new();
    let request = SegmentRequest {
        initial_state: circular_state(&gravity),
        start_offset_s: 0,
        duration_days: 0,
        mission_start: start(),
        planets: &[],
    };
    let err = propagate_segment(&request, &gravity, &ephemeris, &IntegratorConfig::default())
        .unwrap_err();
    assert!(matches!(err, PropagationError::EmptySegment));
}
