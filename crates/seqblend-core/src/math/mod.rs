//! Mathematical utilities
//!
//! Cartesian sphere tests for blend regions and time-scaling profiles.

pub mod sphere;
pub mod profile;

pub use sphere::*;
pub use profile::*;
