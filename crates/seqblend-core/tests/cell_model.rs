//! Core model integration tests
//!
//! A cell described in TOML (planar two-link arm plus gripper) exercised
//! through the planning scene, tip kinematics and trajectory utilities.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::{DVector, Vector3};

use seqblend_core::math::{sample_times, Sphere, TrapezoidalProfile};
use seqblend_core::{
    ModelError, MotionCommand, MotionSequence, PlanningScene, RobotModel, TipKinematics, Trajectory,
};

const CELL: &str = r#"
    name = "planar_cell"

    [[groups]]
    name = "arm"
    tip_link = "tool0"
    tip_offset = { rotation = [0.0, 0.0, 0.0, 1.0], translation = [0.5, 0.0, 0.0] }

    [[groups.joints]]
    name = "shoulder"
    joint_type = "revolute"
    axis = [0.0, 0.0, 1.0]

    [[groups.joints]]
    name = "elbow"
    joint_type = "revolute"
    axis = [0.0, 0.0, 1.0]
    origin = { rotation = [0.0, 0.0, 0.0, 1.0], translation = [1.0, 0.0, 0.0] }

    [[groups]]
    name = "hand"
    end_effector = true

    [[groups.joints]]
    name = "finger"
    joint_type = "prismatic"
    axis = [0.0, 1.0, 0.0]
    limits = { lower = 0.0, upper = 0.04, max_velocity = 0.1, max_acceleration = 0.5 }
"#;

fn q(values: &[f64]) -> DVector<f64> {
    DVector::from_row_slice(values)
}

fn cell() -> Arc<RobotModel> {
    Arc::new(RobotModel::from_toml_str(CELL).unwrap())
}

mod model_tests {
    use super::*;

    #[test]
    fn test_cell_from_toml() {
        let cell = cell();

        assert_eq!(cell.groups.len(), 2);
        assert_eq!(cell.tip_frame("arm"), Ok("tool0"));
        assert_eq!(
            cell.tip_frame("hand"),
            Err(ModelError::NoTipFrameForEndEffector("hand".into()))
        );
    }

    #[test]
    fn test_tip_positions() {
        let cell = cell();

        let stretched = cell.tip_position("arm", &q(&[0.0, 0.0])).unwrap();
        assert_relative_eq!(stretched, Vector3::new(1.5, 0.0, 0.0), epsilon = 1e-12);

        let folded = cell.tip_position("arm", &q(&[FRAC_PI_2, -FRAC_PI_2])).unwrap();
        assert_relative_eq!(folded, Vector3::new(0.5, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_malformed_description() {
        let err = RobotModel::from_toml_str("name = 3").unwrap_err();
        assert!(matches!(err, ModelError::InvalidDescription(_)));
    }
}

mod scene_tests {
    use super::*;

    #[test]
    fn test_scene_defaults_to_home() {
        let scene = PlanningScene::new(cell());

        assert_eq!(scene.group_state("arm").unwrap(), &q(&[0.0, 0.0]));
        assert_eq!(scene.group_state("hand").unwrap(), &q(&[0.0]));
        assert!(scene.group_state("base").is_err());
    }

    #[test]
    fn test_scene_state_dimension_checked() {
        let err = PlanningScene::new(cell())
            .with_group_state("arm", q(&[0.1]))
            .unwrap_err();
        assert!(matches!(err, ModelError::DimensionMismatch { expected: 2, got: 1, .. }));
    }
}

mod trajectory_tests {
    use super::*;

    /// Shoulder sweep timed by a trapezoidal profile
    fn shoulder_sweep(angle: f64) -> Trajectory {
        let profile = TrapezoidalProfile::new(angle, 1.0, 2.0).unwrap();
        let times = sample_times(profile.duration(), 0.01);
        let positions = times
            .iter()
            .map(|&t| q(&[profile.position(t), 0.0]))
            .collect();
        Trajectory::from_samples("arm", &times, positions).unwrap()
    }

    #[test]
    fn test_sweep_stays_on_reach_circle() {
        let cell = cell();
        let sweep = shoulder_sweep(FRAC_PI_2);

        for wp in sweep.waypoints() {
            let tip = cell.tip_position("arm", &wp.positions).unwrap();
            assert_relative_eq!(tip.norm(), 1.5, epsilon = 1e-12);
        }
        assert_relative_eq!(sweep.last().positions[0], FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_tip_leaves_goal_sphere_before_start() {
        let cell = cell();
        let sweep = shoulder_sweep(FRAC_PI_2);
        let goal = cell.tip_position("arm", &sweep.last().positions).unwrap();
        let sphere = Sphere::new(goal, 0.2);

        let inside = sweep
            .waypoints()
            .iter()
            .filter(|wp| sphere.contains(&cell.tip_position("arm", &wp.positions).unwrap()))
            .count();
        assert!(inside > 1);
        assert!(inside < sweep.len());
        assert!(!sphere.contains(&cell.tip_position("arm", &sweep.first().positions).unwrap()));
    }

    #[test]
    fn test_sweep_and_return() {
        let out = shoulder_sweep(FRAC_PI_2);
        let back_positions: Vec<_> = out.waypoints().iter().rev().map(|wp| wp.positions.clone()).collect();
        let times: Vec<f64> = out.waypoints().iter().map(|wp| wp.time_from_start).collect();
        let back = Trajectory::from_samples("arm", &times, back_positions).unwrap();

        let mut round_trip = out.clone();
        round_trip.append(&back);

        assert_relative_eq!(round_trip.duration(), 2.0 * out.duration(), epsilon = 1e-12);
        assert_relative_eq!(round_trip.sample(out.duration())[0], FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(round_trip.last().positions[0], 0.0, epsilon = 1e-12);
    }
}

mod sequence_tests {
    use super::*;

    #[test]
    fn test_pick_sequence_runs() {
        let sequence: MotionSequence = vec![
            MotionCommand::gripper("hand", q(&[0.04])),
            MotionCommand::ptp("arm", q(&[0.5, 0.0])).with_blend_radius(0.1),
            MotionCommand::lin("arm", q(&[0.5, 0.5])),
            MotionCommand::gripper("hand", q(&[0.0])),
        ]
        .into_iter()
        .collect();

        assert_eq!(sequence.len(), 4);
        assert_eq!(sequence.group_run_count(), 3);
        let indices: Vec<usize> = sequence.commands().iter().map(|c| c.sequence_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_repeated_sequence_keeps_single_start() {
        let sequence = MotionSequence::new()
            .with(MotionCommand::ptp("arm", q(&[0.5, 0.0])).with_start(q(&[0.0, 0.0])))
            .with(MotionCommand::ptp("arm", q(&[0.0, 0.0])));

        let repeated = sequence.repeated(4);

        assert_eq!(repeated.len(), 8);
        assert_eq!(
            repeated.commands().iter().filter(|c| c.explicit_start.is_some()).count(),
            1
        );
        assert_eq!(repeated.get(7).unwrap().sequence_index, 7);
    }
}
