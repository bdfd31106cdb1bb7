//! Reference segment planner
//!
//! Deterministic planner for the four command kinds, good enough to drive the
//! blending core without an external motion planning stack:
//!
//! - point-to-point and gripper: straight joint-space path, synchronized
//!   trapezoidal profile timed by the slowest joint
//! - line: straight joint-space path (a straight tip path for Cartesian
//!   gantries), timed by the slower of the joint and tip speed limits
//! - arc: circle in joint space through start, interim and goal
//!
//! Obstacles and inverse kinematics are out of scope; a goal is feasible when
//! it respects the joint limits.

use std::f64::consts::TAU;

use nalgebra::DVector;
use tracing::debug;

use seqblend_core::math::{sample_times, TrapezoidalProfile};
use seqblend_core::robot::GroupModel;
use seqblend_core::{
    CommandKind, JointConfiguration, ModelError, MotionCommand, PlanningScene, TipKinematics, Trajectory,
};

use crate::config::{ConfigError, ReferencePlannerConfig};
use crate::segment::{PlanningError, SegmentPlanner};

/// Distances below this are treated as no motion
const MOTION_EPSILON: f64 = 1e-9;

/// Polyline resolution used to measure an arc's tip path
const ARC_TIP_SEGMENTS: usize = 256;

/// Built-in planner for all command kinds
#[derive(Debug, Clone, Default)]
pub struct ReferencePlanner {
    config: ReferencePlannerConfig,
}

impl ReferencePlanner {
    pub fn new(config: ReferencePlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReferencePlannerConfig {
        &self.config
    }

    /// Slowest-joint profile over the normalized path from `start` to `goal`
    ///
    /// Returns None when no joint moves.
    fn joint_profile(
        &self,
        group: &GroupModel,
        start: &JointConfiguration,
        goal: &JointConfiguration,
    ) -> Result<Option<TrapezoidalProfile>, PlanningError> {
        let mut slowest: Option<TrapezoidalProfile> = None;

        for (i, joint) in group.joints.iter().enumerate() {
            let distance = (goal[i] - start[i]).abs();
            if distance < MOTION_EPSILON {
                continue;
            }
            let profile = TrapezoidalProfile::new(
                distance,
                joint.limits.max_velocity * self.config.velocity_scaling,
                joint.limits.max_acceleration * self.config.acceleration_scaling,
            )
            .ok_or_else(|| {
                PlanningError::Infeasible(format!("joint '{}' has non-positive limits", joint.name))
            })?;

            if slowest.map_or(true, |s| profile.duration() > s.duration()) {
                slowest = Some(profile);
            }
        }

        Ok(slowest)
    }

    /// Profile covering an arc length using the most restrictive joint limits
    fn path_profile(&self, group: &GroupModel, length: f64) -> Result<TrapezoidalProfile, PlanningError> {
        let (v, a) = group.joints.iter().fold((f64::INFINITY, f64::INFINITY), |(v, a), joint| {
            (v.min(joint.limits.max_velocity), a.min(joint.limits.max_acceleration))
        });
        TrapezoidalProfile::new(
            length,
            v * self.config.velocity_scaling,
            a * self.config.acceleration_scaling,
        )
        .ok_or_else(|| PlanningError::Infeasible(format!("group '{}' has no usable joint limits", group.name)))
    }

    fn tip_profile(&self, length: f64) -> Result<TrapezoidalProfile, PlanningError> {
        TrapezoidalProfile::new(
            length,
            self.config.max_cartesian_velocity,
            self.config.max_cartesian_acceleration,
        )
        .ok_or_else(|| PlanningError::Infeasible("non-positive Cartesian limits".to_string()))
    }

    /// Sample `path(progress)` along the profile; the last sample is exactly `goal`
    fn sample_path<F>(
        &self,
        group: &str,
        profile: &TrapezoidalProfile,
        goal: &JointConfiguration,
        path: F,
    ) -> Result<Trajectory, PlanningError>
    where
        F: Fn(f64) -> JointConfiguration,
    {
        let times = sample_times(profile.duration(), self.config.sampling_time);
        let last = times.len() - 1;
        let positions = times
            .iter()
            .enumerate()
            .map(|(k, &t)| if k == last { goal.clone() } else { path(profile.progress(t)) })
            .collect();

        Ok(Trajectory::from_samples(group, &times, positions)?)
    }

    fn plan_ptp(
        &self,
        group: &GroupModel,
        start: &JointConfiguration,
        goal: &JointConfiguration,
    ) -> Result<Trajectory, PlanningError> {
        let Some(profile) = self.joint_profile(group, start, goal)? else {
            return Ok(Trajectory::stationary(&group.name, goal.clone()));
        };
        let delta = goal - start;
        self.sample_path(&group.name, &profile, goal, |s| start + &delta * s)
    }

    fn plan_lin(
        &self,
        group: &GroupModel,
        scene: &PlanningScene,
        start: &JointConfiguration,
        goal: &JointConfiguration,
    ) -> Result<Trajectory, PlanningError> {
        let model = scene.model();
        let tip_start = model.tip_position(&group.name, start)?;
        let tip_goal = model.tip_position(&group.name, goal)?;

        let Some(joint_profile) = self.joint_profile(group, start, goal)? else {
            return Ok(Trajectory::stationary(&group.name, goal.clone()));
        };
        let tip_profile = self.tip_profile((tip_goal - tip_start).norm())?;
        let profile = if tip_profile.duration() > joint_profile.duration() {
            tip_profile
        } else {
            joint_profile
        };

        let delta = goal - start;
        self.sample_path(&group.name, &profile, goal, |s| start + &delta * s)
    }

    fn plan_circ(
        &self,
        group: &GroupModel,
        scene: &PlanningScene,
        start: &JointConfiguration,
        interim: &JointConfiguration,
        goal: &JointConfiguration,
    ) -> Result<Trajectory, PlanningError> {
        group.tip_frame()?;
        let arc = JointArc::through(start, interim, goal).ok_or(PlanningError::DegenerateArc)?;

        let path_profile = self.path_profile(group, arc.length())?;
        let tip_profile = self.tip_profile(arc.tip_length(scene.model(), &group.name)?)?;
        let profile = if tip_profile.duration() > path_profile.duration() {
            tip_profile
        } else {
            path_profile
        };

        self.sample_path(&group.name, &profile, goal, |s| arc.point(s))
    }

    fn check_goal(group: &GroupModel, goal: &JointConfiguration) -> Result<(), PlanningError> {
        group.check_dimension(goal)?;
        if let Some((joint, value)) = group.limit_violations(goal).into_iter().next() {
            return Err(PlanningError::Unreachable { joint, value });
        }
        Ok(())
    }
}

impl SegmentPlanner for ReferencePlanner {
    fn plan(
        &self,
        command: &MotionCommand,
        start: &JointConfiguration,
        scene: &PlanningScene,
    ) -> Result<Trajectory, PlanningError> {
        let group = scene.model().group(&command.planning_group)?;
        group.check_dimension(start)?;
        Self::check_goal(group, &command.goal)?;

        let trajectory = match &command.kind {
            CommandKind::PointToPoint => self.plan_ptp(group, start, &command.goal)?,
            CommandKind::Linear => self.plan_lin(group, scene, start, &command.goal)?,
            CommandKind::Circular { interim } => {
                Self::check_goal(group, interim)?;
                self.plan_circ(group, scene, start, interim, &command.goal)?
            }
            CommandKind::Gripper => {
                if !group.end_effector {
                    return Err(PlanningError::UnsupportedKind {
                        kind: command.kind.name(),
                        group: group.name.clone(),
                    });
                }
                self.plan_ptp(group, start, &command.goal)?
            }
        };

        debug!(
            index = command.sequence_index,
            kind = command.kind.name(),
            group = %group.name,
            waypoints = trajectory.len(),
            duration = trajectory.duration(),
            "planned segment"
        );
        Ok(trajectory)
    }
}

/// Circle through three joint configurations
///
/// The circle lies in the plane spanned by `interim - start` and
/// `goal - start`; points are expressed in that plane's orthonormal basis.
#[derive(Debug, Clone)]
struct JointArc {
    origin: DVector<f64>,
    e1: DVector<f64>,
    e2: DVector<f64>,
    center: (f64, f64),
    radius: f64,
    start_angle: f64,
    sweep: f64,
}

impl JointArc {
    fn through(start: &DVector<f64>, interim: &DVector<f64>, goal: &DVector<f64>) -> Option<Self> {
        let u = interim - start;
        let w = goal - start;
        let u_norm = u.norm();
        if u_norm < MOTION_EPSILON || w.norm() < MOTION_EPSILON {
            return None;
        }

        let e1 = &u / u_norm;
        let w_par = w.dot(&e1);
        let w_perp = &w - &e1 * w_par;
        let h = w_perp.norm();
        if h < 1e-6 * w.norm() {
            return None;
        }
        let e2 = w_perp / h;

        // Circumcenter of (0, 0), (|u|, 0), (w_par, h)
        let cx = u_norm / 2.0;
        let cy = (w_par * w_par + h * h - 2.0 * cx * w_par) / (2.0 * h);
        let radius = (cx * cx + cy * cy).sqrt();

        let angle = |x: f64, y: f64| (y - cy).atan2(x - cx);
        let start_angle = angle(0.0, 0.0);
        let ccw = |a: f64| (a - start_angle).rem_euclid(TAU);
        let to_interim = ccw(angle(u_norm, 0.0));
        let to_goal = ccw(angle(w_par, h));

        // Travel in whichever direction passes the interim point first
        let sweep = if to_interim < to_goal { to_goal } else { to_goal - TAU };

        Some(Self {
            origin: start.clone(),
            e1,
            e2,
            center: (cx, cy),
            radius,
            start_angle,
            sweep,
        })
    }

    fn length(&self) -> f64 {
        self.radius * self.sweep.abs()
    }

    /// Point at fraction `s` of the sweep
    fn point(&self, s: f64) -> DVector<f64> {
        let theta = self.start_angle + s * self.sweep;
        let x = self.center.0 + self.radius * theta.cos();
        let y = self.center.1 + self.radius * theta.sin();
        &self.origin + &self.e1 * x + &self.e2 * y
    }

    /// Length of the tip path traced by the arc, as a polyline
    fn tip_length<K>(&self, kinematics: &K, group: &str) -> Result<f64, ModelError>
    where
        K: TipKinematics + ?Sized,
    {
        let mut previous = kinematics.tip_position(group, &self.point(0.0))?;
        let mut length = 0.0;
        for k in 1..=ARC_TIP_SEGMENTS {
            let tip = kinematics.tip_position(group, &self.point(k as f64 / ARC_TIP_SEGMENTS as f64))?;
            length += (tip - previous).norm();
            previous = tip;
        }
        Ok(length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::{gantry_cell, ARM_GROUP, GRIPPER_GROUP};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn q(x: f64, y: f64, z: f64) -> DVector<f64> {
        DVector::from_row_slice(&[x, y, z])
    }

    fn scene() -> PlanningScene {
        PlanningScene::new(Arc::new(gantry_cell()))
    }

    #[test]
    fn test_ptp_reaches_goal_with_increasing_time() {
        let planner = ReferencePlanner::default();
        let command = MotionCommand::ptp(ARM_GROUP, q(0.5, 0.2, 0.0));

        let traj = planner.plan(&command, &q(0.0, 0.0, 0.0), &scene()).unwrap();

        assert_eq!(traj.group(), ARM_GROUP);
        assert_eq!(traj.first().positions, q(0.0, 0.0, 0.0));
        assert_eq!(traj.last().positions, q(0.5, 0.2, 0.0));
        assert!(traj.has_strictly_increasing_time());
        // Leading axis x: triangular profile, 2 * sqrt(0.5 / 2) = 1.0 s
        assert_relative_eq!(traj.duration(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ptp_without_motion_is_stationary() {
        let planner = ReferencePlanner::default();
        let command = MotionCommand::ptp(ARM_GROUP, q(0.1, 0.1, 0.1));

        let traj = planner.plan(&command, &q(0.1, 0.1, 0.1), &scene()).unwrap();

        assert_eq!(traj.len(), 1);
        assert_relative_eq!(traj.duration(), 0.0);
    }

    #[test]
    fn test_velocity_scaling_slows_motion() {
        let fast = ReferencePlanner::default();
        let slow = ReferencePlanner::new(ReferencePlannerConfig {
            velocity_scaling: 0.25,
            ..Default::default()
        })
        .unwrap();
        let command = MotionCommand::ptp(ARM_GROUP, q(1.0, 0.0, 0.0));
        let start = q(-1.0, 0.0, 0.0);

        let fast_traj = fast.plan(&command, &start, &scene()).unwrap();
        let slow_traj = slow.plan(&command, &start, &scene()).unwrap();

        assert!(slow_traj.duration() > fast_traj.duration());
    }

    #[test]
    fn test_unreachable_goal() {
        let planner = ReferencePlanner::default();
        let command = MotionCommand::lin(ARM_GROUP, q(0.0, 2700.0, 0.0));

        let err = planner.plan(&command, &q(0.0, 0.0, 0.0), &scene()).unwrap_err();

        assert_eq!(
            err,
            PlanningError::Unreachable {
                joint: "y".into(),
                value: 2700.0
            }
        );
    }

    #[test]
    fn test_unknown_group_and_bad_dimension() {
        let planner = ReferencePlanner::default();

        let unknown = MotionCommand::ptp("tool_changer", q(0.0, 0.0, 0.0));
        assert!(matches!(
            planner.plan(&unknown, &q(0.0, 0.0, 0.0), &scene()),
            Err(PlanningError::Model(_))
        ));

        let short = MotionCommand::ptp(ARM_GROUP, DVector::from_row_slice(&[0.1]));
        assert!(matches!(
            planner.plan(&short, &q(0.0, 0.0, 0.0), &scene()),
            Err(PlanningError::Model(_))
        ));
    }

    #[test]
    fn test_lin_respects_cartesian_limit() {
        let planner = ReferencePlanner::new(ReferencePlannerConfig {
            max_cartesian_velocity: 0.1,
            ..Default::default()
        })
        .unwrap();
        let command = MotionCommand::lin(ARM_GROUP, q(0.3, 0.4, 0.0));

        let traj = planner.plan(&command, &q(0.0, 0.0, 0.0), &scene()).unwrap();
        let expected = TrapezoidalProfile::new(0.5, 0.1, 2.0).unwrap().duration();

        assert_relative_eq!(traj.duration(), expected, epsilon = 1e-9);
        // Tip stays on the straight line y = 4/3 x
        for wp in traj.waypoints() {
            assert_relative_eq!(wp.positions[1], wp.positions[0] * 4.0 / 3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_circ_respects_cartesian_limit() {
        let planner = ReferencePlanner::new(ReferencePlannerConfig {
            max_cartesian_velocity: 0.1,
            ..Default::default()
        })
        .unwrap();
        let command = MotionCommand::circ(ARM_GROUP, q(0.75, 0.25, 0.0), q(0.5, 0.5, 0.0));

        let traj = planner.plan(&command, &q(0.5, 0.0, 0.0), &scene()).unwrap();

        // Half circle of radius 0.25 cruising at 0.1 m/s
        let expected = TrapezoidalProfile::new(std::f64::consts::PI * 0.25, 0.1, 2.0)
            .unwrap()
            .duration();
        assert_relative_eq!(traj.duration(), expected, epsilon = 1e-3);

        let peak = (0..traj.len() - 1)
            .filter_map(|i| traj.segment_velocity(i))
            .map(|v| v.norm())
            .fold(0.0, f64::max);
        assert!(peak <= 0.1 + 1e-4, "peak tip speed {peak}");
    }

    #[test]
    fn test_lin_on_gripper_fails() {
        let planner = ReferencePlanner::default();
        let command = MotionCommand::lin(GRIPPER_GROUP, DVector::from_row_slice(&[0.02]));

        let err = planner
            .plan(&command, &DVector::from_row_slice(&[0.0]), &scene())
            .unwrap_err();
        assert!(matches!(err, PlanningError::Model(_)));
    }

    #[test]
    fn test_gripper_kind_requires_end_effector() {
        let planner = ReferencePlanner::default();

        let ok = MotionCommand::gripper(GRIPPER_GROUP, DVector::from_row_slice(&[0.03]));
        let traj = planner.plan(&ok, &DVector::from_row_slice(&[0.0]), &scene()).unwrap();
        assert_relative_eq!(traj.last().positions[0], 0.03);

        let wrong = MotionCommand::gripper(ARM_GROUP, q(0.1, 0.0, 0.0));
        assert!(matches!(
            planner.plan(&wrong, &q(0.0, 0.0, 0.0), &scene()),
            Err(PlanningError::UnsupportedKind { kind: "gripper", .. })
        ));
    }

    #[test]
    fn test_circ_passes_interim() {
        let planner = ReferencePlanner::default();
        let command = MotionCommand::circ(ARM_GROUP, q(0.75, 0.25, 0.0), q(0.5, 0.5, 0.0));

        let traj = planner.plan(&command, &q(0.5, 0.0, 0.0), &scene()).unwrap();

        let center = q(0.5, 0.25, 0.0);
        for wp in traj.waypoints() {
            assert_relative_eq!((&wp.positions - &center).norm(), 0.25, epsilon = 1e-9);
        }
        let closest = traj
            .waypoints()
            .iter()
            .map(|wp| (&wp.positions - q(0.75, 0.25, 0.0)).norm())
            .fold(f64::INFINITY, f64::min);
        assert!(closest < 0.02);
        assert_eq!(traj.last().positions, q(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_circ_midpoint_of_semicircle() {
        let arc = JointArc::through(&q(0.5, 0.0, 0.0), &q(0.25, 0.25, 0.0), &q(0.5, 0.5, 0.0)).unwrap();

        assert_relative_eq!(arc.point(0.0), q(0.5, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(arc.point(1.0), q(0.5, 0.5, 0.0), epsilon = 1e-9);
        assert_relative_eq!(arc.point(0.5), q(0.25, 0.25, 0.0), epsilon = 1e-9);
        assert_relative_eq!(arc.length(), std::f64::consts::PI * 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_arc_takes_long_way_when_interim_requires_it() {
        // Interim lies on the far side, so three quarters of the circle are swept
        let arc = JointArc::through(&q(1.0, 0.0, 0.0), &q(-1.0, 0.0, 0.0), &q(0.0, 1.0, 0.0)).unwrap();

        assert_relative_eq!(arc.length(), 1.5 * std::f64::consts::PI, epsilon = 1e-9);
        assert_relative_eq!(arc.point(2.0 / 3.0), q(-1.0, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_circ() {
        let planner = ReferencePlanner::default();
        let command = MotionCommand::circ(ARM_GROUP, q(0.25, 0.0, 0.0), q(0.5, 0.0, 0.0));

        let err = planner.plan(&command, &q(0.0, 0.0, 0.0), &scene()).unwrap_err();
        assert_eq!(err, PlanningError::DegenerateArc);
    }
}
