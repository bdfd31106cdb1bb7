//! Cartesian spheres
//!
//! Blend regions are spheres around a command's goal position. A point on the
//! boundary counts as inside.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A closed ball in Cartesian space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    /// Center position [m]
    pub center: Vector3<f64>,
    /// Radius [m]
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Vector3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Distance from the center to a point
    pub fn distance_to(&self, point: &Vector3<f64>) -> f64 {
        (point - self.center).norm()
    }

    /// Whether a point lies inside or on the sphere
    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        self.distance_to(point) <= self.radius
    }

    /// Whether two spheres share any volume
    ///
    /// Touching spheres (center distance equal to the radius sum) do not overlap.
    pub fn overlaps(&self, other: &Sphere) -> bool {
        self.distance_to(&other.center) < self.radius + other.radius
    }
}
