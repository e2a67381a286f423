//! Segment propagation: integrate the equation of motion across a daily grid.

pub mod integrator;
pub mod segment;

pub use integrator::{IntegrationError, IntegratorConfig};
pub use segment::{PropagationError, SegmentRequest, SegmentSolution, propagate_segment};
