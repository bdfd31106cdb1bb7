//! Reference cell and command sequences
//!
//! A three-axis Cartesian gantry with a single-finger gripper, plus the
//! command lists used by the integration tests and the demo binary.
//! On the gantry, joint space coincides with tip position, which keeps
//! blend spheres easy to reason about.

use nalgebra::{DVector, Isometry3, Vector3};

use seqblend_core::robot::JointLimits;
use seqblend_core::{GroupModel, JointConfiguration, JointModel, MotionCommand, MotionSequence, RobotModel};

/// Gantry planning group
pub const ARM_GROUP: &str = "manipulator";
/// Gripper planning group
pub const GRIPPER_GROUP: &str = "gripper";
/// Tip link of the gantry
pub const ARM_TIP: &str = "tcp";

/// Gantry axis limits: [-1.5, 1.5] m, 1 m/s, 2 m/s²
pub fn gantry_limits() -> JointLimits {
    JointLimits {
        lower: -1.5,
        upper: 1.5,
        max_velocity: 1.0,
        max_acceleration: 2.0,
    }
}

/// Gantry with gripper
pub fn gantry_cell() -> RobotModel {
    let axis = |name: &str, direction: Vector3<f64>| {
        JointModel::prismatic(name, direction, Isometry3::identity()).with_limits(gantry_limits())
    };
    let arm = GroupModel::new(
        ARM_GROUP,
        vec![axis("x", Vector3::x()), axis("y", Vector3::y()), axis("z", Vector3::z())],
    )
    .with_tip(ARM_TIP, Isometry3::identity());

    let finger = JointModel::prismatic("finger", Vector3::y(), Isometry3::identity()).with_limits(JointLimits {
        lower: 0.0,
        upper: 0.05,
        max_velocity: 0.1,
        max_acceleration: 0.5,
    });
    let gripper = GroupModel::new(GRIPPER_GROUP, vec![finger]).as_end_effector();

    RobotModel::new("gantry_cell", vec![arm, gripper])
}

/// Gantry configuration
pub fn xyz(x: f64, y: f64, z: f64) -> JointConfiguration {
    DVector::from_row_slice(&[x, y, z])
}

/// Gripper opening
pub fn finger(opening: f64) -> JointConfiguration {
    DVector::from_row_slice(&[opening])
}

/// PTP, CIRC, LIN closing back on the home position
///
/// Both inner junctions are blended with radius 0.1.
pub fn complex_sequence() -> MotionSequence {
    MotionSequence::new()
        .with(
            MotionCommand::ptp(ARM_GROUP, xyz(0.5, 0.0, 0.0))
                .with_start(xyz(0.0, 0.0, 0.0))
                .with_blend_radius(0.1),
        )
        .with(MotionCommand::circ(ARM_GROUP, xyz(0.75, 0.25, 0.0), xyz(0.5, 0.5, 0.0)).with_blend_radius(0.1))
        .with(MotionCommand::lin(ARM_GROUP, xyz(0.0, 0.0, 0.0)))
}

/// Two lines at constant height with one blended corner
pub fn simple_sequence() -> MotionSequence {
    MotionSequence::new()
        .with(
            MotionCommand::lin(ARM_GROUP, xyz(0.6, 0.0, 0.2))
                .with_start(xyz(0.0, 0.0, 0.2))
                .with_blend_radius(0.1),
        )
        .with(MotionCommand::lin(ARM_GROUP, xyz(0.6, 0.6, 0.2)))
}

/// Gripper and gantry commands interleaved into four group runs
pub fn complex_sequence_with_gripper() -> MotionSequence {
    MotionSequence::new()
        .with(MotionCommand::gripper(GRIPPER_GROUP, finger(0.03)))
        .with(MotionCommand::ptp(ARM_GROUP, xyz(0.5, 0.0, 0.0)).with_blend_radius(0.1))
        .with(MotionCommand::lin(ARM_GROUP, xyz(0.5, 0.5, 0.0)).with_blend_radius(0.05))
        .with(MotionCommand::gripper(GRIPPER_GROUP, finger(0.0)))
        .with(MotionCommand::ptp(ARM_GROUP, xyz(0.0, 0.0, 0.0)))
}

/// Open and close the gripper
pub fn pure_gripper_sequence() -> MotionSequence {
    MotionSequence::new()
        .with(MotionCommand::gripper(GRIPPER_GROUP, finger(0.04)).with_start(finger(0.0)))
        .with(MotionCommand::gripper(GRIPPER_GROUP, finger(0.01)))
}

/// Two point-to-point moves sharing a corner at (0.4, 0.2, 0)
pub fn ptp_ptp_sequence(radius: f64) -> MotionSequence {
    MotionSequence::new()
        .with(
            MotionCommand::ptp(ARM_GROUP, xyz(0.4, 0.2, 0.0))
                .with_start(xyz(0.0, 0.0, 0.0))
                .with_blend_radius(radius),
        )
        .with(MotionCommand::ptp(ARM_GROUP, xyz(0.8, 0.0, 0.1)))
}

/// Point-to-point move followed by a line
pub fn ptp_lin_sequence(radius: f64) -> MotionSequence {
    MotionSequence::new()
        .with(
            MotionCommand::ptp(ARM_GROUP, xyz(0.4, 0.2, 0.0))
                .with_start(xyz(0.0, 0.0, 0.0))
                .with_blend_radius(radius),
        )
        .with(MotionCommand::lin(ARM_GROUP, xyz(0.4, 0.8, 0.0)))
}

/// Line followed by a point-to-point move
pub fn lin_ptp_sequence(radius: f64) -> MotionSequence {
    MotionSequence::new()
        .with(
            MotionCommand::lin(ARM_GROUP, xyz(0.4, 0.2, 0.0))
                .with_start(xyz(0.0, 0.0, 0.0))
                .with_blend_radius(radius),
        )
        .with(MotionCommand::ptp(ARM_GROUP, xyz(-0.2, 0.6, 0.3)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    #[test]
    fn test_cell_groups() {
        let cell = gantry_cell();

        assert_eq!(cell.tip_frame(ARM_GROUP).unwrap(), ARM_TIP);
        assert!(cell.is_end_effector(GRIPPER_GROUP));
        assert_eq!(cell.group(ARM_GROUP).unwrap().dof(), 3);
    }

    #[test]
    fn test_sequences_are_valid() {
        for sequence in [
            complex_sequence(),
            simple_sequence(),
            complex_sequence_with_gripper(),
            pure_gripper_sequence(),
            ptp_ptp_sequence(0.1),
            ptp_lin_sequence(0.1),
            lin_ptp_sequence(0.1),
        ] {
            assert!(validate(sequence.commands()).is_ok());
        }
    }

    #[test]
    fn test_gripper_sequence_runs() {
        assert_eq!(complex_sequence_with_gripper().group_run_count(), 4);
    }
}
