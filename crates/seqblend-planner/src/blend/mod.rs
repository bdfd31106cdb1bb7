//! Blend engine
//!
//! Joins two consecutive trajectories of one group. Around the goal of the
//! first trajectory a sphere of the blend radius is placed on the tip frame;
//! the part of each trajectory inside that sphere is cut away and replaced by
//! a transition curve that matches position and velocity at the cut points.
//!
//! ```text
//!   first:  o----o----o----o--(o---o---X)          X: first goal, sphere center
//!   second:                   (X---o---o)---o----o
//!   result: o----o----o----o---\~~~~~~~~/---o----o
//!                          enter        exit
//! ```
//!
//! A zero radius concatenates the trajectories instead.

pub mod transition;

use std::fmt;

use nalgebra::DVector;
use thiserror::Error;
use tracing::debug;

use seqblend_core::math::Sphere;
use seqblend_core::{
    JointConfiguration, ModelError, TipKinematics, Trajectory, TrajectoryError, Waypoint,
};

use crate::config::{BlendConfig, ConfigError};
pub use transition::{CubicHermite, QuinticHermite, TransitionBoundary, TransitionStrategy};

/// Which trajectory of a blended pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendSide {
    First,
    Second,
}

impl fmt::Display for BlendSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendSide::First => write!(f, "first"),
            BlendSide::Second => write!(f, "second"),
        }
    }
}

/// Blend failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlendError {
    #[error("Blend sphere of radius {radius} covers the whole {side} trajectory")]
    RegionExceedsSegment { radius: f64, side: BlendSide },
    #[error(
        "Blend spheres overlap: goals {distance} apart, radii {first_radius} + {second_radius}"
    )]
    OverlappingRadii {
        distance: f64,
        first_radius: f64,
        second_radius: f64,
    },
    #[error("Cannot join trajectories of groups '{first}' and '{second}'")]
    GroupMismatch { first: String, second: String },
    #[error("Second trajectory starts {gap} away from the end of the first")]
    DiscontinuousJunction { gap: f64 },
    #[error("Robot model error: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid blended trajectory: {0}")]
    Trajectory(#[from] TrajectoryError),
}

/// Where the blend sphere cuts the two trajectories
#[derive(Debug, Clone, PartialEq)]
pub struct BlendRegion {
    /// Sphere around the first trajectory's final tip position
    pub sphere: Sphere,
    /// Earliest waypoint of the first trajectory's final stretch inside the sphere
    pub enter_index: usize,
    /// Latest waypoint of the second trajectory's initial stretch inside the sphere
    pub exit_index: usize,
    /// Time of the enter waypoint in the first trajectory
    pub enter_time: f64,
    /// Time of the exit waypoint in the second trajectory
    pub exit_time: f64,
}

/// Result of splicing two trajectories
///
/// `head` runs from the first trajectory's start through the transition and
/// ends on the second trajectory's exit waypoint; `tail` is the rest of the
/// second trajectory, starting at that same waypoint at time 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Splice {
    pub head: Trajectory,
    pub tail: Trajectory,
    pub region: BlendRegion,
}

impl Splice {
    /// Head and tail joined into one trajectory
    pub fn joined(&self) -> Trajectory {
        let mut joined = self.head.clone();
        joined.append(&self.tail);
        joined
    }
}

/// Sphere-based trajectory blender
#[derive(Debug)]
pub struct BlendEngine {
    transition: Box<dyn TransitionStrategy>,
    config: BlendConfig,
}

impl Default for BlendEngine {
    fn default() -> Self {
        let config = BlendConfig::default();
        Self {
            transition: config.transition.strategy(),
            config,
        }
    }
}

impl BlendEngine {
    /// Engine using the transition family selected in `config`
    pub fn new(config: BlendConfig) -> Result<Self, ConfigError> {
        let transition = config.transition.strategy();
        Self::with_transition(config, transition)
    }

    /// Engine with a custom transition curve
    pub fn with_transition(
        config: BlendConfig,
        transition: Box<dyn TransitionStrategy>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { transition, config })
    }

    pub fn config(&self) -> &BlendConfig {
        &self.config
    }

    /// Check that `second` continues `first` within the junction tolerance
    pub fn check_junction(&self, first: &Trajectory, second: &Trajectory) -> Result<(), BlendError> {
        if first.group() != second.group() {
            return Err(BlendError::GroupMismatch {
                first: first.group().to_string(),
                second: second.group().to_string(),
            });
        }
        let gap = (&second.first().positions - &first.last().positions).norm();
        if gap > self.config.junction_tolerance {
            return Err(BlendError::DiscontinuousJunction { gap });
        }
        Ok(())
    }

    /// Locate the cut points of a blend of the given radius
    pub fn blend_region<K>(
        &self,
        kinematics: &K,
        first: &Trajectory,
        second: &Trajectory,
        radius: f64,
    ) -> Result<BlendRegion, BlendError>
    where
        K: TipKinematics + ?Sized,
    {
        self.check_junction(first, second)?;
        let group = first.group();
        let sphere = Sphere::new(kinematics.tip_position(group, &first.last().positions)?, radius);

        let inside = |wp: &Waypoint| -> Result<bool, BlendError> {
            Ok(sphere.contains(&kinematics.tip_position(group, &wp.positions)?))
        };

        // The final waypoint is the sphere center, so the scan always starts inside
        let mut enter_index = first.len() - 1;
        while enter_index > 0 && inside(&first.waypoints()[enter_index - 1])? {
            enter_index -= 1;
        }
        if enter_index == 0 {
            return Err(BlendError::RegionExceedsSegment {
                radius,
                side: BlendSide::First,
            });
        }

        let last = second.len() - 1;
        let mut exit_index = 0;
        while exit_index < last && inside(&second.waypoints()[exit_index + 1])? {
            exit_index += 1;
        }
        if exit_index == last {
            return Err(BlendError::RegionExceedsSegment {
                radius,
                side: BlendSide::Second,
            });
        }

        Ok(BlendRegion {
            enter_time: first.waypoints()[enter_index].time_from_start,
            exit_time: second.waypoints()[exit_index].time_from_start,
            sphere,
            enter_index,
            exit_index,
        })
    }

    /// Cut both trajectories at the blend sphere and bridge the gap
    pub fn splice<K>(
        &self,
        kinematics: &K,
        first: &Trajectory,
        second: &Trajectory,
        radius: f64,
    ) -> Result<Splice, BlendError>
    where
        K: TipKinematics + ?Sized,
    {
        let region = self.blend_region(kinematics, first, second, radius)?;
        let enter = &first.waypoints()[region.enter_index];
        let exit = &second.waypoints()[region.exit_index];

        let duration = (first.end_time() - region.enter_time).max(region.exit_time - second.start_time());
        if duration <= 0.0 {
            // Sphere smaller than the waypoint spacing: nothing to cut
            let tail = second
                .slice_from_zero(0..second.len())
                .ok_or(BlendError::RegionExceedsSegment {
                    radius,
                    side: BlendSide::Second,
                })?;
            return Ok(Splice {
                head: first.clone(),
                tail,
                region,
            });
        }

        // enter_index > 0 holds for every region
        let step = self.config.sampling_time.unwrap_or_else(|| {
            region.enter_time - first.waypoints()[region.enter_index - 1].time_from_start
        });
        let samples = (duration / step).ceil().max(1.0) as usize;

        let boundary = TransitionBoundary {
            start: enter.positions.clone(),
            start_velocity: velocity_at(first, region.enter_index),
            end: exit.positions.clone(),
            end_velocity: velocity_at(second, region.exit_index),
            duration,
        };

        let mut waypoints: Vec<Waypoint> = first.waypoints()[..=region.enter_index].to_vec();
        waypoints.extend((1..=samples).map(|k| {
            let s = k as f64 / samples as f64;
            let positions = if k == samples {
                exit.positions.clone()
            } else {
                self.transition.position(&boundary, s)
            };
            Waypoint::new(positions, region.enter_time + s * duration)
        }));
        let head = Trajectory::new(first.group(), waypoints)?;

        let tail = second
            .slice_from_zero(region.exit_index..second.len())
            .ok_or(BlendError::RegionExceedsSegment {
                radius,
                side: BlendSide::Second,
            })?;

        debug!(
            group = first.group(),
            radius,
            enter_index = region.enter_index,
            exit_index = region.exit_index,
            transition_duration = duration,
            samples,
            "spliced blend region"
        );

        Ok(Splice { head, tail, region })
    }

    /// Blend two trajectories; radius 0 concatenates them
    pub fn blend<K>(
        &self,
        kinematics: &K,
        first: &Trajectory,
        second: &Trajectory,
        radius: f64,
    ) -> Result<Trajectory, BlendError>
    where
        K: TipKinematics + ?Sized,
    {
        if radius == 0.0 {
            return self.concatenate(first, second);
        }
        Ok(self.splice(kinematics, first, second, radius)?.joined())
    }

    /// Join two trajectories end to start without blending
    pub fn concatenate(&self, first: &Trajectory, second: &Trajectory) -> Result<Trajectory, BlendError> {
        self.check_junction(first, second)?;
        let mut joined = first.clone();
        joined.append(second);
        Ok(joined)
    }
}

/// Reject consecutive blend spheres that intersect
///
/// Only applies when both radii are positive; spheres overlap when the goals'
/// tip positions are closer than the sum of the radii.
pub fn check_overlapping_radii<K>(
    kinematics: &K,
    group: &str,
    first_goal: &JointConfiguration,
    first_radius: f64,
    second_goal: &JointConfiguration,
    second_radius: f64,
) -> Result<(), BlendError>
where
    K: TipKinematics + ?Sized,
{
    if !(first_radius > 0.0 && second_radius > 0.0) {
        return Ok(());
    }
    let first = Sphere::new(kinematics.tip_position(group, first_goal)?, first_radius);
    let second = Sphere::new(kinematics.tip_position(group, second_goal)?, second_radius);

    if first.overlaps(&second) {
        return Err(BlendError::OverlappingRadii {
            distance: first.distance_to(&second.center),
            first_radius,
            second_radius,
        });
    }
    Ok(())
}

/// Central finite-difference velocity at waypoint `i`
fn velocity_at(trajectory: &Trajectory, i: usize) -> DVector<f64> {
    let before = i.checked_sub(1).and_then(|j| trajectory.segment_velocity(j));
    let after = trajectory.segment_velocity(i);
    match (before, after) {
        (Some(b), Some(a)) => (b + a) * 0.5,
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => DVector::zeros(trajectory.dof()),
    }
}
