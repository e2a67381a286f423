//! Spacecraft swingby trajectory propagation.
//!
//! This crate re-exports the workspace members so front-ends can depend on a
//! single package: planar state and time helpers ([`common`]), ephemeris
//! providers ([`ephem`]), configuration records ([`config`]), gravity tables
//! and the equation of motion ([`gravity`]), segment integration
//! ([`propagator`]), and launch plus mission sequencing ([`mission`]).

pub use swingby_config as config;
pub use swingby_core as common;
pub use swingby_ephem as ephem;
pub use swingby_gravity as gravity;
pub use swingby_mission as mission;
pub use swingby_propagator as propagator;

pub use swingby_mission::{MissionConfig, MissionError, MissionSolution, run_mission};

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
