//! Motion commands and command sequences
//!
//! A [`MotionSequence`] is the caller's ordered command list. It is read-only
//! input to the blending planner; the helpers here only exist to build and
//! edit a sequence before it is handed over.

use serde::{Deserialize, Serialize};

use crate::JointConfiguration;

/// Kind of motion a command requests
///
/// Each kind is planned by a segment planner; the blending core never looks
/// inside the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandKind {
    /// Point-to-point motion in joint space
    PointToPoint,
    /// Straight-line motion of the tip
    Linear,
    /// Circular arc passing through an interim configuration
    Circular { interim: JointConfiguration },
    /// Gripper finger actuation
    Gripper,
}

impl CommandKind {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::PointToPoint => "ptp",
            CommandKind::Linear => "lin",
            CommandKind::Circular { .. } => "circ",
            CommandKind::Gripper => "gripper",
        }
    }
}

/// One entry of a command list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand {
    /// What kind of motion to plan
    pub kind: CommandKind,
    /// Kinematic group the command moves
    pub planning_group: String,
    /// Start configuration overriding the inferred start
    ///
    /// Only the first command of a sequence may carry one.
    #[serde(default)]
    pub explicit_start: Option<JointConfiguration>,
    /// Goal configuration of the group
    pub goal: JointConfiguration,
    /// Blend radius into the next command [m]; 0 disables blending
    #[serde(default)]
    pub blend_radius: f64,
    /// Position in the sequence (assigned by [`MotionSequence`])
    #[serde(default)]
    pub sequence_index: usize,
}

impl MotionCommand {
    pub fn new(kind: CommandKind, planning_group: impl Into<String>, goal: JointConfiguration) -> Self {
        Self {
            kind,
            planning_group: planning_group.into(),
            explicit_start: None,
            goal,
            blend_radius: 0.0,
            sequence_index: 0,
        }
    }

    /// Point-to-point command
    pub fn ptp(planning_group: impl Into<String>, goal: JointConfiguration) -> Self {
        Self::new(CommandKind::PointToPoint, planning_group, goal)
    }

    /// Straight-line command
    pub fn lin(planning_group: impl Into<String>, goal: JointConfiguration) -> Self {
        Self::new(CommandKind::Linear, planning_group, goal)
    }

    /// Circular command through `interim`
    pub fn circ(
        planning_group: impl Into<String>,
        interim: JointConfiguration,
        goal: JointConfiguration,
    ) -> Self {
        Self::new(CommandKind::Circular { interim }, planning_group, goal)
    }

    /// Gripper actuation command
    pub fn gripper(planning_group: impl Into<String>, goal: JointConfiguration) -> Self {
        Self::new(CommandKind::Gripper, planning_group, goal)
    }

    pub fn with_start(mut self, start: JointConfiguration) -> Self {
        self.explicit_start = Some(start);
        self
    }

    pub fn with_blend_radius(mut self, radius: f64) -> Self {
        self.blend_radius = radius;
        self
    }
}

/// Ordered list of motion commands
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionSequence {
    commands: Vec<MotionCommand>,
}

impl MotionSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command, assigning its sequence index
    pub fn push(&mut self, mut command: MotionCommand) -> &mut Self {
        command.sequence_index = self.commands.len();
        self.commands.push(command);
        self
    }

    /// Builder-style [`push`](Self::push)
    pub fn with(mut self, command: MotionCommand) -> Self {
        self.push(command);
        self
    }

    pub fn commands(&self) -> &[MotionCommand] {
        &self.commands
    }

    pub fn get(&self, index: usize) -> Option<&MotionCommand> {
        self.commands.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut MotionCommand> {
        self.commands.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Set the blend radius of command `index`; returns false if out of range
    pub fn set_blend_radius(&mut self, index: usize, radius: f64) -> bool {
        match self.commands.get_mut(index) {
            Some(command) => {
                command.blend_radius = radius;
                true
            }
            None => false,
        }
    }

    pub fn set_all_blend_radii_to_zero(&mut self) {
        for command in &mut self.commands {
            command.blend_radius = 0.0;
        }
    }

    /// Keep only the first `len` commands
    pub fn truncate(&mut self, len: usize) {
        self.commands.truncate(len);
    }

    /// The sequence repeated `times` times back to back
    ///
    /// Explicit start states are removed from all copies after the first so
    /// the result stays a valid sequence.
    pub fn repeated(&self, times: usize) -> MotionSequence {
        let mut result = MotionSequence::new();
        for pass in 0..times {
            for command in &self.commands {
                let mut command = command.clone();
                if pass > 0 {
                    command.explicit_start = None;
                }
                result.push(command);
            }
        }
        result
    }

    /// Number of maximal runs of equal planning group
    pub fn group_run_count(&self) -> usize {
        self.commands
            .windows(2)
            .filter(|pair| pair[0].planning_group != pair[1].planning_group)
            .count()
            + usize::from(!self.commands.is_empty())
    }
}

impl FromIterator<MotionCommand> for MotionSequence {
    fn from_iter<I: IntoIterator<Item = MotionCommand>>(iter: I) -> Self {
        let mut sequence = MotionSequence::new();
        for command in iter {
            sequence.push(command);
        }
        sequence
    }
}
