//! Time-parameterized joint trajectories
//!
//! A [`Trajectory`] is a non-empty sequence of [`Waypoint`]s for one planning
//! group with strictly increasing `time_from_start`. Both invariants are
//! checked on construction and preserved by every operation.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::JointConfiguration;

/// Trajectory construction errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrajectoryError {
    #[error("Trajectory for group '{0}' has no waypoints")]
    Empty(String),
    #[error("Time not strictly increasing at waypoint {index}: {previous} -> {current}")]
    NonIncreasingTime {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("Waypoint {index} has {got} joints, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },
}

/// One timestamped configuration sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Joint positions of the trajectory's group
    pub positions: JointConfiguration,
    /// Time since the trajectory start [s]
    pub time_from_start: f64,
}

impl Waypoint {
    pub fn new(positions: JointConfiguration, time_from_start: f64) -> Self {
        Self {
            positions,
            time_from_start,
        }
    }
}

/// Joint trajectory of a single planning group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    group: String,
    waypoints: Vec<Waypoint>,
}

impl Trajectory {
    /// Create a trajectory, checking the waypoint invariants
    pub fn new(group: impl Into<String>, waypoints: Vec<Waypoint>) -> Result<Self, TrajectoryError> {
        let group = group.into();
        let Some(first) = waypoints.first() else {
            return Err(TrajectoryError::Empty(group));
        };

        let dof = first.positions.len();
        for (index, pair) in waypoints.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            if current.positions.len() != dof {
                return Err(TrajectoryError::DimensionMismatch {
                    index: index + 1,
                    expected: dof,
                    got: current.positions.len(),
                });
            }
            // NaN times fail this comparison as well
            if !(current.time_from_start > previous.time_from_start) {
                return Err(TrajectoryError::NonIncreasingTime {
                    index: index + 1,
                    previous: previous.time_from_start,
                    current: current.time_from_start,
                });
            }
        }

        Ok(Self { group, waypoints })
    }

    /// Build from parallel time and position sequences
    pub fn from_samples(
        group: impl Into<String>,
        times: &[f64],
        positions: Vec<JointConfiguration>,
    ) -> Result<Self, TrajectoryError> {
        let waypoints = times
            .iter()
            .zip(positions)
            .map(|(&t, q)| Waypoint::new(q, t))
            .collect();
        Self::new(group, waypoints)
    }

    /// A single-waypoint trajectory resting at `positions`
    pub fn stationary(group: impl Into<String>, positions: JointConfiguration) -> Self {
        Self {
            group: group.into(),
            waypoints: vec![Waypoint::new(positions, 0.0)],
        }
    }

    /// Planning group the trajectory moves
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn into_waypoints(self) -> Vec<Waypoint> {
        self.waypoints
    }

    /// Number of waypoints (always at least one)
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Number of joints per waypoint
    pub fn dof(&self) -> usize {
        self.first().positions.len()
    }

    pub fn first(&self) -> &Waypoint {
        &self.waypoints[0]
    }

    pub fn last(&self) -> &Waypoint {
        &self.waypoints[self.waypoints.len() - 1]
    }

    pub fn start_time(&self) -> f64 {
        self.first().time_from_start
    }

    pub fn end_time(&self) -> f64 {
        self.last().time_from_start
    }

    /// Total duration [s]
    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    /// Check the strict time ordering across consecutive waypoints
    pub fn has_strictly_increasing_time(&self) -> bool {
        self.waypoints
            .windows(2)
            .all(|pair| pair[1].time_from_start > pair[0].time_from_start)
    }

    /// Append `other`, treating its first waypoint as a duplicate of our last
    ///
    /// The remaining waypoints of `other` are re-stamped to continue from our
    /// end time, keeping their spacing. The junction waypoint is taken from
    /// `self`.
    pub fn append(&mut self, other: &Trajectory) {
        let offset = self.end_time() - other.start_time();
        self.waypoints.extend(
            other.waypoints[1..]
                .iter()
                .map(|wp| Waypoint::new(wp.positions.clone(), wp.time_from_start + offset)),
        );
    }

    /// Copy of the waypoints in `range`, re-stamped to start at time 0
    ///
    /// Returns None if the range is empty or out of bounds.
    pub fn slice_from_zero(&self, range: std::ops::Range<usize>) -> Option<Trajectory> {
        let waypoints = self.waypoints.get(range)?;
        let t0 = waypoints.first()?.time_from_start;
        Some(Self {
            group: self.group.clone(),
            waypoints: waypoints
                .iter()
                .map(|wp| Waypoint::new(wp.positions.clone(), wp.time_from_start - t0))
                .collect(),
        })
    }

    /// Sample the trajectory at time t using linear interpolation
    ///
    /// Times outside the trajectory are clamped to its ends.
    pub fn sample(&self, t: f64) -> JointConfiguration {
        if t <= self.start_time() {
            return self.first().positions.clone();
        }
        if t >= self.end_time() {
            return self.last().positions.clone();
        }

        // First waypoint strictly after t; exists because t < end_time
        let upper = self
            .waypoints
            .partition_point(|wp| wp.time_from_start <= t);
        let (a, b) = (&self.waypoints[upper - 1], &self.waypoints[upper]);
        let alpha = (t - a.time_from_start) / (b.time_from_start - a.time_from_start);

        a.positions.lerp(&b.positions, alpha)
    }

    /// Finite-difference velocity between waypoints `i` and `i + 1`
    ///
    /// Returns None if `i + 1` is out of bounds.
    pub fn segment_velocity(&self, i: usize) -> Option<DVector<f64>> {
        let a = self.waypoints.get(i)?;
        let b = self.waypoints.get(i + 1)?;
        let dt = b.time_from_start - a.time_from_start;
        Some((&b.positions - &a.positions) / dt)
    }

    /// Whether time t lies within the trajectory bounds
    pub fn is_within(&self, t: f64) -> bool {
        t >= self.start_time() && t <= self.end_time()
    }
}
