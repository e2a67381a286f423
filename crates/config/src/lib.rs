//! Configuration models and loaders for swingby missions and body catalogs.
//!
//! Records here are plain deserialised data. Validation against the gravity
//! tables happens once, when a [`MissionFile`] is turned into a mission
//! configuration by the mission crate.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Gravitating body entry parsed from a catalog.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BodyConfig {
    pub name: String,
    pub mu_km3_s2: f64,
    pub radius_km: f64,
}

/// Mission description as written in a TOML or YAML file.
#[derive(Debug, Deserialize, Clone)]
pub struct MissionFile {
    /// Hyperbolic excess speed relative to Earth at escape (km/s).
    pub v_infinity_km_s: f64,
    /// Mission start, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`.
    pub start: String,
    /// Planets whose gravity acts on the spacecraft.
    #[serde(default)]
    pub planets: Vec<String>,
    pub segments: Vec<SegmentConfig>,
    /// Upper bound on the summed delta-V magnitudes (km/s).
    #[serde(default)]
    pub delta_v_budget_km_s: Option<f64>,
    #[serde(default)]
    pub launch: LaunchSettings,
    #[serde(default)]
    pub integrator: IntegratorSettings,
}

/// One propagation segment.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SegmentConfig {
    /// Whole days; validated positive downstream.
    pub duration_days: i64,
    /// Impulse applied at the segment start (ignored for the first segment).
    #[serde(default)]
    pub delta_v_km_s: [f64; 2],
}

/// Closed-form escape velocity selection.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EscapeModelSetting {
    #[default]
    ExcessAlongTrack,
    GeometricIntercept,
}

/// Launch geometry options.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct LaunchSettings {
    #[serde(default)]
    pub escape_model: EscapeModelSetting,
    /// Outward offset from Earth in Earth radii.
    #[serde(default)]
    pub earth_clearance_radii: Option<f64>,
    /// Apply planetary gravity during the first segment as well.
    #[serde(default)]
    pub include_planets_in_first_segment: bool,
}

/// Integrator selection; unset values fall back to the propagator defaults.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "method")]
pub enum IntegratorSettings {
    #[serde(rename = "dormand_prince45")]
    DormandPrince45 {
        #[serde(default)]
        relative_tolerance: Option<f64>,
        #[serde(default)]
        absolute_tolerance: Option<f64>,
        #[serde(default)]
        initial_step_s: Option<f64>,
        #[serde(default)]
        min_step_s: Option<f64>,
        #[serde(default)]
        max_step_s: Option<f64>,
        #[serde(default)]
        max_steps_per_segment: Option<usize>,
    },
    #[serde(rename = "runge_kutta4")]
    RungeKutta4 { steps_per_day: u32 },
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self::DormandPrince45 {
            relative_tolerance: None,
            absolute_tolerance: None,
            initial_step_s: None,
            min_step_s: None,
            max_step_s: None,
            max_steps_per_segment: None,
        }
    }
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("no configuration records found at {0}")]
    Empty(PathBuf),
}

/// Load body catalog entries.
///
/// `path` may be a YAML list, a TOML file holding one body or a `[[bodies]]`
/// array, or a directory whose `.toml` files are read in name order.
pub fn load_bodies<P: AsRef<Path>>(path: P) -> Result<Vec<BodyConfig>, ConfigError> {
    let path = path.as_ref();
    let bodies = if path.is_dir() {
        read_body_dir(path)?
    } else {
        read_body_file(path)?
    };
    if bodies.is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }
    tracing::debug!(count = bodies.len(), path = %path.display(), "loaded body catalog");
    Ok(bodies)
}

/// Load a single mission description from a `.toml` or YAML file.
pub fn load_mission<P: AsRef<Path>>(path: P) -> Result<MissionFile, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let mission = match Format::of(path) {
        Format::Toml => parse_mission_toml(&contents)?,
        Format::Yaml => parse_mission_yaml(&contents)?,
    };
    tracing::debug!(path = %path.display(), segments = mission.segments.len(), "loaded mission");
    Ok(mission)
}

/// Parse a mission description from TOML text.
pub fn parse_mission_toml(contents: &str) -> Result<MissionFile, ConfigError> {
    Ok(toml::from_str(contents)?)
}

/// Parse a mission description from YAML text.
pub fn parse_mission_yaml(contents: &str) -> Result<MissionFile, ConfigError> {
    Ok(serde_yaml::from_str(contents)?)
}

/// On-disk format, picked by file extension. Anything but `.toml` is YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TomlBodies {
    Many { bodies: Vec<BodyConfig> },
    One(BodyConfig),
}

fn read_body_file(path: &Path) -> Result<Vec<BodyConfig>, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    match Format::of(path) {
        Format::Toml => Ok(match toml::from_str(&contents)? {
            TomlBodies::Many { bodies } => bodies,
            TomlBodies::One(body) => vec![body],
        }),
        Format::Yaml => Ok(serde_yaml::from_str(&contents)?),
    }
}

fn read_body_dir(dir: &Path) -> Result<Vec<BodyConfig>, ConfigError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && Format::of(&path) == Format::Toml {
            files.push(path);
        }
    }
    files.sort();

    let mut bodies = Vec::new();
    for file in &files {
        bodies.extend(read_body_file(file)?);
    }
    Ok(bodies)
}
