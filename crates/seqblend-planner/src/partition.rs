//! Group partitioning
//!
//! Splits a validated command list into maximal runs of commands sharing one
//! planning group. Each run is planned and blended on its own and yields one
//! output trajectory.

use tracing::warn;

use seqblend_core::MotionCommand;

/// Maximal contiguous run of commands of one planning group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRun<'a> {
    /// Planning group shared by all commands
    pub group: &'a str,
    /// Commands of the run, in sequence order
    pub commands: &'a [MotionCommand],
    /// Whether the run starts the whole command list
    pub is_first: bool,
}

impl<'a> GroupRun<'a> {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Blend radius each command actually blends into its successor with
    ///
    /// The last command of a run never blends (there is nothing in the same
    /// group to blend into), and end-effector groups are never blended.
    /// Non-zero requests that get dropped are logged.
    pub fn effective_blend_radii(&self, end_effector: bool) -> Vec<f64> {
        let last = self.commands.len().saturating_sub(1);
        self.commands
            .iter()
            .enumerate()
            .map(|(i, command)| {
                if command.blend_radius == 0.0 {
                    return 0.0;
                }
                if end_effector {
                    warn!(
                        index = command.sequence_index,
                        group = self.group,
                        radius = command.blend_radius,
                        "blending is not supported for end-effector groups, using radius 0"
                    );
                    return 0.0;
                }
                if i == last {
                    warn!(
                        index = command.sequence_index,
                        group = self.group,
                        radius = command.blend_radius,
                        "blending across a group change is not supported, using radius 0"
                    );
                    return 0.0;
                }
                command.blend_radius
            })
            .collect()
    }
}

/// Partition a command list into group runs
///
/// A run boundary is placed at every change of planning group. An empty list
/// yields no runs.
pub fn partition(commands: &[MotionCommand]) -> Vec<GroupRun<'_>> {
    let mut runs = Vec::new();
    let mut start = 0;

    for end in 1..=commands.len() {
        let boundary = end == commands.len()
            || commands[end].planning_group != commands[start].planning_group;
        if boundary {
            runs.push(GroupRun {
                group: &commands[start].planning_group,
                commands: &commands[start..end],
                is_first: start == 0,
            });
            start = end;
        }
    }

    runs
}
