//! # seqblend core
//!
//! Data model and geometry shared by the command-list blending planner.
//!
//! ## Modules
//!
//! - [`math`]: Cartesian sphere tests and time-scaling profiles
//! - [`trajectory`]: Time-parameterized joint trajectories
//! - [`command`]: Motion commands and ordered command sequences
//! - [`robot`]: Kinematic groups, forward kinematics, tip frames and the planning scene

pub mod math;
pub mod trajectory;
pub mod command;
pub mod robot;

use nalgebra::{DVector, Vector3};

pub use command::{CommandKind, MotionCommand, MotionSequence};
pub use robot::{GroupModel, JointModel, ModelError, PlanningScene, RobotModel, TipKinematics};
pub use trajectory::{Trajectory, TrajectoryError, Waypoint};

/// 3D vector type (Cartesian positions)
pub type Vec3 = Vector3<f64>;

/// Joint-space configuration of one planning group
pub type JointConfiguration = DVector<f64>;
