//! Transition curves bridging the two halves of a blend

use nalgebra::DVector;

use crate::config::TransitionKind;

/// Boundary conditions of a transition
///
/// Velocities are in joint units per second; `duration` maps the normalized
/// parameter `s ∈ [0, 1]` to time.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBoundary {
    pub start: DVector<f64>,
    pub start_velocity: DVector<f64>,
    pub end: DVector<f64>,
    pub end_velocity: DVector<f64>,
    pub duration: f64,
}

/// Curve family used inside a blend region
///
/// Implementations must satisfy `position(b, 0) == b.start` and
/// `position(b, 1) == b.end`, with time derivatives at the ends matching the
/// boundary velocities.
pub trait TransitionStrategy: Send + Sync + std::fmt::Debug {
    fn position(&self, boundary: &TransitionBoundary, s: f64) -> DVector<f64>;
}

/// Cubic Hermite spline; continuous position and velocity
#[derive(Debug, Clone, Copy, Default)]
pub struct CubicHermite;

impl TransitionStrategy for CubicHermite {
    fn position(&self, b: &TransitionBoundary, s: f64) -> DVector<f64> {
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        &b.start * h00
            + &b.start_velocity * (h10 * b.duration)
            + &b.end * h01
            + &b.end_velocity * (h11 * b.duration)
    }
}

/// Quintic Hermite spline with zero acceleration at both ends
#[derive(Debug, Clone, Copy, Default)]
pub struct QuinticHermite;

impl TransitionStrategy for QuinticHermite {
    fn position(&self, b: &TransitionBoundary, s: f64) -> DVector<f64> {
        let s3 = s * s * s;
        let s4 = s3 * s;
        let s5 = s4 * s;

        let h0 = 1.0 - 10.0 * s3 + 15.0 * s4 - 6.0 * s5;
        let h1 = s - 6.0 * s3 + 8.0 * s4 - 3.0 * s5;
        let h4 = -4.0 * s3 + 7.0 * s4 - 3.0 * s5;
        let h5 = 10.0 * s3 - 15.0 * s4 + 6.0 * s5;

        &b.start * h0
            + &b.start_velocity * (h1 * b.duration)
            + &b.end_velocity * (h4 * b.duration)
            + &b.end * h5
    }
}

impl TransitionKind {
    pub fn strategy(self) -> Box<dyn TransitionStrategy> {
        match self {
            TransitionKind::CubicHermite => Box::new(CubicHermite),
            TransitionKind::QuinticHermite => Box::new(QuinticHermite),
        }
    }
}
