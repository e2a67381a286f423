use chrono::{NaiveDate, NaiveDateTime};
use swingby::common::StateVector;
use swingby::common::constants::AU_KM;
use swingby::ephem::{CircularEphemeris, MeanElementsEphemeris};
use swingby::gravity::{DynamicsError, ForceModel, GravityError, GravityModel, equation_of_motion};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 9, 23)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

const NO_PLANETS: [&str; 0] = [];

#[test]
fn derivative_position_rates_equal_velocity() {
    let gravity = GravityModel::solar_system();
    let ephemeris = MeanElementsEphemeris::new();
    let state = StateVector::new([0.9 * AU_KM, 0.3 * AU_KM], [-8.5, 29.1]);

    for planets in [vec![], vec!["venus", "earth"], vec!["jupiter"]] {
        let d = equation_of_motion(&state, 12_345.0, start(), &planets, &gravity, &ephemeris)
            .unwrap();
        assert_eq!(d[0], state.velocity_km_s[0]);
        assert_eq!(d[1], state.velocity_km_s[1]);
    }
}

#[test]
fn empty_planet_list_is_exact_two_body() {
    let gravity = GravityModel::solar_system();
    let ephemeris = MeanElementsEphemeris::new();
    let gm = gravity.sun_gm();

    for position in [[AU_KM, 0.0], [-0.4 * AU_KM, 1.3 * AU_KM], [123_456.0, -9.8e7]] {
        let state = StateVector::new(position, [1.0, 2.0]);
        let d = equation_of_motion(&state, 0.0, start(), &NO_PLANETS, &gravity, &ephemeris)
            .unwrap();
        let r = position[0].hypot(position[1]);
        let r3 = r * r * r;
        assert_eq!(d[2], -gm * position[0] / r3);
        assert_eq!(d[3], -gm * position[1] / r3);
    }
}

#[test]
fn sun_acceleration_points_inward() {
    let gravity = GravityModel::solar_system();
    let ephemeris = MeanElementsEphemeris::new();
    let force = ForceModel::two_body(&gravity, &ephemeris, start());

    for position in [[AU_KM, 0.0], [0.0, -2.0 * AU_KM], [-3.0e8, 4.0e8], [1.0, 1.0]] {
        let a = force.acceleration(&position, 0.0).unwrap();
        let dot = a[0] * position[0] + a[1] * position[1];
        assert!(dot <= 0.0, "a·r = {dot} at {position:?}");
    }
}

#[test]
fn spacecraft_at_planet_centre_collides() {
    let gravity = GravityModel::solar_system();
    let venus = [0.72 * AU_KM, 0.1 * AU_KM];
    let ephemeris = CircularEphemeris::new(start()).with_fixed_body("venus", venus);
    let state = StateVector::new(venus, [0.0, 35.0]);

    let err = equation_of_motion(&state, 3_600.0, start(), &["venus"], &gravity, &ephemeris)
        .unwrap_err();
    match err {
        DynamicsError::Collision(collision) => {
            assert_eq!(collision.body, "venus");
            assert!(collision.distance_km < 1e-3);
            assert_eq!(collision.radius_km, 6_051.8);
            assert_eq!(collision.instant, start() + chrono::TimeDelta::hours(1));
        }
        other => panic!("expected a collision, got {other:?}"),
    }
}

#[test]
fn just_outside_planet_radius_is_allowed() {
    let gravity = GravityModel::solar_system();
    let earth = [AU_KM, 0.0];
    let ephemeris = CircularEphemeris::new(start()).with_fixed_body("earth", earth);
    let state = StateVector::new([AU_KM + 6_372.0, 0.0], [0.0, 30.0]);

    let d = equation_of_motion(&state, 0.0, start(), &["earth"], &gravity, &ephemeris).unwrap();
    // Earth's pull near its surface dwarfs the solar term.
    assert!(d[2] < -9.0e-3, "ax = {}", d[2]);
}

#[test]
fn spacecraft_at_sun_centre_is_a_collision() {
    let gravity = GravityModel::solar_system();
    let ephemeris = MeanElementsEphemeris::new();
    let force = ForceModel::two_body(&gravity, &ephemeris, start());
    match force.acceleration(&[0.0, 0.0], 0.0) {
        Err(DynamicsError::Collision(collision)) => assert_eq!(collision.body, "sun"),
        other => panic!("expected a sun collision, got {other:?}"),
    }
}

#[test]
fn planet_order_does_not_change_acceleration() {
    let gravity = GravityModel::solar_system();
    let ephemeris = MeanElementsEphemeris::new();
    let state = StateVector::new([0.8 * AU_KM, -0.5 * AU_KM], [10.0, 25.0]);

    let forward = ["venus", "earth", "mars"];
    let reverse = ["mars", "earth", "venus"];
    let a = equation_of_motion(&state, 86_400.0, start(), &forward, &gravity, &ephemeris).unwrap();
    let b = equation_of_motion(&state, 86_400.0, start(), &reverse, &gravity, &ephemeris).unwrap();
    for i in 2..4 {
        let scale = a[i].abs().max(1e-30);
        assert!((a[i] - b[i]).abs() / scale < 1e-12, "{} vs {}", a[i], b[i]);
    }
}

#[test]
fn unknown_planet_is_rejected_before_evaluation() {
    let gravity = GravityModel::solar_system();
    let ephemeris = MeanElementsEphemeris::new();
    let err = ForceModel::new(&gravity, &ephemeris, start(), &["vulcan"]).unwrap_err();
    assert!(matches!(
        err,
        DynamicsError::Gravity(GravityError::UnknownBody(ref name)) if name == "vulcan"
    ));
}

#[test]
fn gravity_model_rejects_invalid_tables() {
    assert_eq!(
        GravityModel::new([("earth", 1.0)], [("earth", 1.0)]).unwrap_err(),
        GravityError::MissingSun
    );
    assert!(matches!(
        GravityModel::new([("sun", 1.0), ("mars", -2.0)], [("sun", 1.0), ("mars", 1.0)]),
        Err(GravityError::NonPositiveGm { .. })
    ));
    assert!(matches!(
        GravityModel::new([("sun", 1.0), ("mars", 2.0)], [("sun", 1.0)]),
        Err(GravityError::MissingRadius(ref body)) if body == "mars"
    ));
}
