//! Robot model and planning context
//!
//! - Serial-chain kinematic groups with forward kinematics
//! - Tip-frame lookup for Cartesian goals and blend spheres
//! - Read-only planning scene holding each group's current configuration

pub mod model;
pub mod scene;

pub use model::*;
pub use scene::*;
