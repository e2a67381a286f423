use std::fs;

use chrono::{NaiveDate, NaiveDateTime};
use swingby::config::{
    ConfigError, EscapeModelSetting, IntegratorSettings, load_bodies, load_mission,
    parse_mission_toml, parse_mission_yaml,
};
use swingby::gravity::GravityModel;
use swingby::mission::{EscapeVelocityModel, MissionConfig, PreconditionError, parse_mission_start};
use swingby::propagator::IntegratorConfig;
use tempfile::tempdir;

const VENUS_EARTH_TOML: &str = r#"
v_infinity_km_s = 5.0
start = "2022-09-23"
planets = ["Venus", "earth"]

[[segments]]
duration_days = 30

[[segments]]
duration_days = 60
delta_v_km_s = [-0.005, 0.0]

[launch]
escape_model = "geometric_intercept"
earth_clearance_radii = 2.0

[integrator]
method = "runge_kutta4"
steps_per_day = 48
"#;

fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

#[test]
fn mission_toml_parses_into_validated_config() {
    let file = parse_mission_toml(VENUS_EARTH_TOML).unwrap();
    assert_eq!(file.segments.len(), 2);
    assert_eq!(file.segments[0].delta_v_km_s, [0.0, 0.0]);
    assert_eq!(file.launch.escape_model, EscapeModelSetting::GeometricIntercept);
    assert_eq!(
        file.integrator,
        IntegratorSettings::RungeKutta4 { steps_per_day: 48 }
    );

    let config = MissionConfig::try_from(&file).unwrap();
    assert_eq!(config.mission_start, midnight(2022, 9, 23));
    assert_eq!(config.planets, vec!["venus", "earth"]);
    assert_eq!(config.segments[1].duration_days, 60);
    assert_eq!(config.segments[1].delta_v_km_s, [-0.005, 0.0]);
    assert_eq!(config.launch.escape_model, EscapeVelocityModel::GeometricIntercept);
    assert_eq!(config.launch.earth_clearance_radii, 2.0);
    assert_eq!(config.integrator, IntegratorConfig::runge_kutta4(48));
    assert!(!config.include_planets_in_first_segment);
    assert!(config.validate(&GravityModel::solar_system()).is_ok());
}

#[test]
fn mission_yaml_fills_integrator_defaults() {
    let yaml = r#"
v_infinity_km_s: 7.5
start: "2026-01-15T06:30:00"
planets: [jupiter]
delta_v_budget_km_s: 0.1
segments:
  - duration_days: 10
  - duration_days: 20
    delta_v_km_s: [0.03, 0.04]
integrator:
  method: dormand_prince45
  relative_tolerance: 1.0e-9
"#;
    let file = parse_mission_yaml(yaml).unwrap();
    let config = MissionConfig::try_from(&file).unwrap();

    assert_eq!(
        config.mission_start,
        midnight(2026, 1, 15) + chrono::TimeDelta::minutes(390)
    );
    assert_eq!(config.delta_v_budget_km_s, Some(0.1));
    assert!((config.total_delta_v_km_s() - 0.05).abs() < 1e-12);
    match config.integrator {
        IntegratorConfig::DormandPrince45 {
            relative_tolerance,
            absolute_tolerance,
            max_step_s,
            ..
        } => {
            assert_eq!(relative_tolerance, 1e-9);
            assert_eq!(absolute_tolerance, IntegratorConfig::DEFAULT_ABSOLUTE_TOLERANCE);
            assert_eq!(max_step_s, IntegratorConfig::DEFAULT_MAX_STEP_S);
        }
        other => panic!("unexpected integrator {other:?}"),
    }
}

#[test]
fn malformed_mission_values_are_preconditions() {
    let bad_start = VENUS_EARTH_TOML.replace("2022-09-23", "23/09/2022");
    let file = parse_mission_toml(&bad_start).unwrap();
    assert!(matches!(
        MissionConfig::try_from(&file),
        Err(PreconditionError::InvalidStart(_))
    ));

    let over_budget = format!("delta_v_budget_km_s = 0.001\n{VENUS_EARTH_TOML}");
    let file = parse_mission_toml(&over_budget).unwrap();
    assert!(matches!(
        MissionConfig::try_from(&file),
        Err(PreconditionError::DeltaVBudgetExceeded { .. })
    ));

    let bad_clearance =
        VENUS_EARTH_TOML.replace("earth_clearance_radii = 2.0", "earth_clearance_radii = 0.5");
    let file = parse_mission_toml(&bad_clearance).unwrap();
    assert!(matches!(
        MissionConfig::try_from(&file),
        Err(PreconditionError::InvalidClearance(_))
    ));
}

#[test]
fn start_instants_accept_date_and_datetime() {
    assert_eq!(parse_mission_start("2022-09-23").unwrap(), midnight(2022, 9, 23));
    assert_eq!(
        parse_mission_start(" 2022-09-23 12:00:00 ").unwrap(),
        midnight(2022, 9, 23) + chrono::TimeDelta::hours(12)
    );
    assert!(parse_mission_start("yesterday").is_err());
}

#[test]
fn mission_files_load_from_disk() {
    let dir = tempdir().unwrap();
    let toml_path = dir.path().join("venus_earth.toml");
    fs::write(&toml_path, VENUS_EARTH_TOML).unwrap();
    let from_toml = load_mission(&toml_path).unwrap();
    assert_eq!(from_toml.planets, vec!["Venus", "earth"]);

    let yaml_path = dir.path().join("short.yaml");
    fs::write(
        &yaml_path,
        "v_infinity_km_s: 3.0\nstart: \"2024-02-29\"\nsegments:\n  - duration_days: 5\n",
    )
    .unwrap();
    let from_yaml = load_mission(&yaml_path).unwrap();
    assert!(from_yaml.planets.is_empty());
    assert_eq!(from_yaml.segments.len(), 1);

    assert!(matches!(
        load_mission(dir.path().join("missing.toml")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn body_catalogs_load_from_yaml_and_toml_directory() {
    let dir = tempdir().unwrap();
    let yaml_path = dir.path().join("bodies.yaml");
    fs::write(
        &yaml_path,
        "- name: sun\n  mu_km3_s2: 1.327e11\n  radius_km: 696000.0\n\
         - name: earth\n  mu_km3_s2: 398600.4354360959\n  radius_km: 6371.0\n",
    )
    .unwrap();
    let bodies = load_bodies(&yaml_path).unwrap();
    let gravity = GravityModel::from_catalog(&bodies).unwrap();
    assert_eq!(gravity.gm("earth").unwrap(), 398_600.435_436_095_9);
    assert_eq!(gravity.radius("Earth").unwrap(), 6_371.0);

    let toml_dir = dir.path().join("bodies");
    fs::create_dir(&toml_dir).unwrap();
    fs::write(
        toml_dir.join("sun.toml"),
        "name = \"sun\"\nmu_km3_s2 = 1.327e11\nradius_km = 696000.0\n",
    )
    .unwrap();
    fs::write(
        toml_dir.join("venus.toml"),
        "name = \"venus\"\nmu_km3_s2 = 324938.2955\nradius_km = 6051.8\n",
    )
    .unwrap();
    fs::write(
        toml_dir.join("outer.toml"),
        "[[bodies]]\nname = \"jupiter\"\nmu_km3_s2 = 126712764.1\nradius_km = 69911.0\n\n\
         [[bodies]]\nname = \"saturn\"\nmu_km3_s2 = 37940585.2\nradius_km = 58232.0\n",
    )
    .unwrap();
    fs::write(toml_dir.join("notes.txt"), "ignored").unwrap();
    let bodies = load_bodies(&toml_dir).unwrap();
    let names: Vec<&str> = bodies.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["jupiter", "saturn", "sun", "venus"]);

    let outer = load_bodies(toml_dir.join("outer.toml")).unwrap();
    assert_eq!(outer.len(), 2);
    assert_eq!(outer[1].radius_km, 58_232.0);

    let empty = dir.path().join("empty");
    fs::create_dir(&empty).unwrap();
    assert!(matches!(load_bodies(&empty), Err(ConfigError::Empty(_))));
}

#[test]
fn shipped_catalogs_are_consistent() {
    let root = env!("CARGO_MANIFEST_DIR");
    let bodies = load_bodies(format!("{root}/configs/bodies.yaml")).unwrap();
    let catalog = GravityModel::from_catalog(&bodies).unwrap();
    let builtin = GravityModel::solar_system();
    for body in builtin.bodies() {
        let a = catalog.gm(body).unwrap();
        let b = builtin.gm(body).unwrap();
        assert!(((a - b) / b).abs() < 1e-9, "{body}: {a} vs {b}");
        assert_eq!(catalog.radius(body).unwrap(), builtin.radius(body).unwrap());
    }

    let subset = load_bodies(format!("{root}/configs/bodies")).unwrap();
    let subset = GravityModel::from_catalog(&subset).unwrap();
    assert_eq!(subset.bodies().collect::<Vec<_>>(), ["earth", "sun", "venus"]);
    assert_eq!(subset.gm("venus").unwrap(), catalog.gm("venus").unwrap());

    for name in ["venus_earth.toml", "pluto.yaml"] {
        let file = load_mission(format!("{root}/configs/missions/{name}")).unwrap();
        let config = MissionConfig::try_from(&file).unwrap();
        assert!(config.validate(&catalog).is_ok(), "{name}");
    }
}
