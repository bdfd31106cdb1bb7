//! Segment planner boundary
//!
//! A segment planner turns one command and its effective start configuration
//! into one unblended trajectory. The blending core treats it as an opaque,
//! synchronous and possibly expensive call.

use thiserror::Error;

use seqblend_core::{JointConfiguration, ModelError, MotionCommand, PlanningScene, Trajectory, TrajectoryError};

/// Reasons a single command could not be planned
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    #[error("Goal unreachable: joint '{joint}' value {value} outside limits")]
    Unreachable { joint: String, value: f64 },
    #[error("Robot model error: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid trajectory produced: {0}")]
    Trajectory(#[from] TrajectoryError),
    #[error("Interim configuration is collinear with start and goal")]
    DegenerateArc,
    #[error("Command kind '{kind}' not supported for group '{group}'")]
    UnsupportedKind { kind: &'static str, group: String },
    #[error("No feasible trajectory: {0}")]
    Infeasible(String),
}

/// Per-command planning capability
pub trait SegmentPlanner {
    /// Plan `command` starting from `start`
    ///
    /// The returned trajectory must start at `start` and end at the command's
    /// goal.
    fn plan(
        &self,
        command: &MotionCommand,
        start: &JointConfiguration,
        scene: &PlanningScene,
    ) -> Result<Trajectory, PlanningError>;
}

impl<P: SegmentPlanner + ?Sized> SegmentPlanner for &P {
    fn plan(
        &self,
        command: &MotionCommand,
        start: &JointConfiguration,
        scene: &PlanningScene,
    ) -> Result<Trajectory, PlanningError> {
        (**self).plan(command, start, scene)
    }
}

impl<P: SegmentPlanner + ?Sized> SegmentPlanner for Box<P> {
    fn plan(
        &self,
        command: &MotionCommand,
        start: &JointConfiguration,
        scene: &PlanningScene,
    ) -> Result<Trajectory, PlanningError> {
        (**self).plan(command, start, scene)
    }
}
