//! Command list manager
//!
//! Turns a command list into one trajectory per group run:
//!
//! 1. structural validation
//! 2. partition into group runs
//! 3. per run, plan each command from the end of its predecessor, check
//!    adjacent blend spheres, and blend or concatenate the pieces
//!
//! Any failure aborts the whole call; no partial result is returned.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use seqblend_core::{JointConfiguration, ModelError, MotionCommand, MotionSequence, PlanningScene, Trajectory};

use crate::blend::{check_overlapping_radii, BlendEngine, BlendError};
use crate::config::{ConfigError, SequenceConfig, StartStatePolicy};
use crate::partition::{partition, GroupRun};
use crate::segment::{PlanningError, SegmentPlanner};
use crate::validation::{validate, ValidationError};

/// Flat classification of sequence failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NegativeBlendRadius,
    LastBlendRadiusNotZero,
    StartStateAlreadySet,
    PlanningFailed,
    BlendRegionExceedsSegment,
    OverlappingBlendRadii,
    NoTipFrameForEndEffector,
}

/// Coarse result code reported to callers of a planning service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidMotionPlan,
    InvalidRobotState,
    Failure,
}

impl ErrorKind {
    pub fn error_code(self) -> ErrorCode {
        match self {
            ErrorKind::NegativeBlendRadius
            | ErrorKind::LastBlendRadiusNotZero
            | ErrorKind::OverlappingBlendRadii => ErrorCode::InvalidMotionPlan,
            ErrorKind::StartStateAlreadySet => ErrorCode::InvalidRobotState,
            ErrorKind::PlanningFailed
            | ErrorKind::BlendRegionExceedsSegment
            | ErrorKind::NoTipFrameForEndEffector => ErrorCode::Failure,
        }
    }

    fn of_model(error: &ModelError) -> Self {
        match error {
            ModelError::NoTipFrameForEndEffector(_) => ErrorKind::NoTipFrameForEndEffector,
            _ => ErrorKind::PlanningFailed,
        }
    }
}

/// Failure of a `solve` call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequenceError {
    #[error("Invalid command list: {0}")]
    Validation(#[from] ValidationError),
    #[error("Planning command {index} failed: {source}")]
    PlanningFailed {
        index: usize,
        #[source]
        source: PlanningError,
    },
    #[error("Blending command {index} into its successor failed: {source}")]
    Blend {
        index: usize,
        #[source]
        source: BlendError,
    },
    #[error("No start configuration for command {index}: {source}")]
    Model {
        index: usize,
        #[source]
        source: ModelError,
    },
}

impl SequenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SequenceError::Validation(ValidationError::NegativeBlendRadius { .. }) => {
                ErrorKind::NegativeBlendRadius
            }
            SequenceError::Validation(ValidationError::LastBlendRadiusNotZero { .. }) => {
                ErrorKind::LastBlendRadiusNotZero
            }
            SequenceError::Validation(ValidationError::StartStateAlreadySet { .. }) => {
                ErrorKind::StartStateAlreadySet
            }
            SequenceError::PlanningFailed {
                source: PlanningError::Model(model),
                ..
            } => ErrorKind::of_model(model),
            SequenceError::PlanningFailed { .. } => ErrorKind::PlanningFailed,
            SequenceError::Blend { source, .. } => match source {
                BlendError::RegionExceedsSegment { .. } => ErrorKind::BlendRegionExceedsSegment,
                BlendError::OverlappingRadii { .. } => ErrorKind::OverlappingBlendRadii,
                BlendError::Model(model) => ErrorKind::of_model(model),
                BlendError::GroupMismatch { .. }
                | BlendError::DiscontinuousJunction { .. }
                | BlendError::Trajectory(_) => ErrorKind::PlanningFailed,
            },
            SequenceError::Model { source, .. } => ErrorKind::of_model(source),
        }
    }

    /// Sequence index of the command the failure is attributed to
    pub fn command_index(&self) -> usize {
        match self {
            SequenceError::Validation(err) => err.index(),
            SequenceError::PlanningFailed { index, .. }
            | SequenceError::Blend { index, .. }
            | SequenceError::Model { index, .. } => *index,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        self.kind().error_code()
    }
}

/// Progress of a run, reported in debug logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Planning(usize),
    Blending(usize, usize),
    Assembled,
}

/// Plans and blends command lists
pub struct CommandListManager<P> {
    planner: P,
    blender: BlendEngine,
    config: SequenceConfig,
}

impl<P: SegmentPlanner> CommandListManager<P> {
    /// Manager with a blend engine built from `config.blend`
    ///
    /// Fails if any part of `config` is out of range.
    pub fn new(planner: P, config: SequenceConfig) -> Result<Self, ConfigError> {
        let blender = BlendEngine::new(config.blend.clone())?;
        Self::with_blender(planner, blender, config)
    }

    /// Manager using a custom blend engine
    pub fn with_blender(
        planner: P,
        blender: BlendEngine,
        config: SequenceConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            planner,
            blender,
            config,
        })
    }

    pub fn planner(&self) -> &P {
        &self.planner
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// One trajectory per group run of `sequence`, in run order
    pub fn solve(
        &self,
        scene: &PlanningScene,
        sequence: &MotionSequence,
    ) -> Result<Vec<Trajectory>, SequenceError> {
        self.solve_commands(scene, sequence.commands())
    }

    /// Like [`solve`](Self::solve) for a plain command slice
    ///
    /// Errors name commands by their `sequence_index`.
    pub fn solve_commands(
        &self,
        scene: &PlanningScene,
        commands: &[MotionCommand],
    ) -> Result<Vec<Trajectory>, SequenceError> {
        info!(commands = commands.len(), "solving command list");
        validate(commands)?;

        let runs = partition(commands);
        let mut run_ends: HashMap<&str, JointConfiguration> = HashMap::new();
        let mut trajectories = Vec::with_capacity(runs.len());

        for run in &runs {
            let start = self.run_start(scene, run, &run_ends)?;
            let trajectory = self.solve_run(scene, run, start)?;
            run_ends.insert(run.group, trajectory.last().positions.clone());
            trajectories.push(trajectory);
        }

        info!(
            runs = runs.len(),
            waypoints = trajectories.iter().map(Trajectory::len).sum::<usize>(),
            "command list solved"
        );
        Ok(trajectories)
    }

    fn run_start(
        &self,
        scene: &PlanningScene,
        run: &GroupRun<'_>,
        run_ends: &HashMap<&str, JointConfiguration>,
    ) -> Result<JointConfiguration, SequenceError> {
        let first = &run.commands[0];
        if run.is_first {
            if let Some(start) = &first.explicit_start {
                return Ok(start.clone());
            }
        }
        if self.config.start_state_policy == StartStatePolicy::PreviousRunEnd {
            if let Some(end) = run_ends.get(run.group) {
                return Ok(end.clone());
            }
        }
        scene
            .group_state(run.group)
            .cloned()
            .map_err(|source| SequenceError::Model {
                index: first.sequence_index,
                source,
            })
    }

    fn plan(
        &self,
        scene: &PlanningScene,
        command: &MotionCommand,
        start: &JointConfiguration,
    ) -> Result<Trajectory, SequenceError> {
        debug!(phase = ?RunPhase::Planning(command.sequence_index), kind = command.kind.name());
        self.planner
            .plan(command, start, scene)
            .map_err(|source| SequenceError::PlanningFailed {
                index: command.sequence_index,
                source,
            })
    }

    /// Plan and assemble one run
    ///
    /// The run is folded pairwise: `committed` holds the finished prefix,
    /// `pending` the latest piece that may still be cut by the next blend.
    fn solve_run(
        &self,
        scene: &PlanningScene,
        run: &GroupRun<'_>,
        start: JointConfiguration,
    ) -> Result<Trajectory, SequenceError> {
        let model = scene.model();
        let radii = run.effective_blend_radii(model.is_end_effector(run.group));
        debug!(group = run.group, commands = run.len(), phase = ?RunPhase::Idle, "starting run");

        let first = self.plan(scene, &run.commands[0], &start)?;
        let (committed, pending) = run.commands.windows(2).enumerate().try_fold(
            (None::<Trajectory>, first),
            |(committed, pending), (i, pair)| -> Result<(Option<Trajectory>, Trajectory), SequenceError> {
                let (current, next) = (&pair[0], &pair[1]);
                let planned = self.plan(scene, next, &pending.last().positions)?;

                let blend_error = |source: BlendError| SequenceError::Blend {
                    index: current.sequence_index,
                    source,
                };
                check_overlapping_radii(model, run.group, &current.goal, radii[i], &next.goal, radii[i + 1])
                    .map_err(blend_error)?;

                if radii[i] > 0.0 {
                    debug!(phase = ?RunPhase::Blending(current.sequence_index, next.sequence_index), radius = radii[i]);
                    let splice = self
                        .blender
                        .splice(model, &pending, &planned, radii[i])
                        .map_err(blend_error)?;
                    Ok((Some(extend(committed, splice.head)), splice.tail))
                } else {
                    self.blender.check_junction(&pending, &planned).map_err(blend_error)?;
                    Ok((Some(extend(committed, pending)), planned))
                }
            },
        )?;

        let trajectory = extend(committed, pending);
        debug!(
            group = run.group,
            phase = ?RunPhase::Assembled,
            waypoints = trajectory.len(),
            duration = trajectory.duration(),
            "run assembled"
        );
        Ok(trajectory)
    }
}

fn extend(committed: Option<Trajectory>, piece: Trajectory) -> Trajectory {
    match committed {
        Some(mut trajectory) => {
            trajectory.append(&piece);
            trajectory
        }
        None => piece,
    }
}
