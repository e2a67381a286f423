//! Gravity model tables and the heliocentric N-body equation of motion.

pub mod dynamics;
pub mod model;

pub use dynamics::{CollisionError, DynamicsError, ForceModel, equation_of_motion};
pub use model::{GravityError, GravityModel};
