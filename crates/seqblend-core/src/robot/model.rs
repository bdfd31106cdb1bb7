//! Kinematic robot model
//!
//! A robot is a set of planning groups. Each group is a serial chain of
//! single-axis joints; the pose of the chain's tip link follows from the joint
//! values by composing `origin * motion(q)` along the chain.
//!
//! End-effector groups (grippers) have no tip frame of their own: Cartesian
//! goals and blend spheres are undefined for them.

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::JointConfiguration;

/// Robot model errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Unknown planning group '{0}'")]
    UnknownGroup(String),
    #[error("Group '{0}' is an end-effector and has no tip frame")]
    NoTipFrameForEndEffector(String),
    #[error("Group '{group}' expects {expected} joint values, got {got}")]
    DimensionMismatch {
        group: String,
        expected: usize,
        got: usize,
    },
    #[error("Invalid robot description: {0}")]
    InvalidDescription(String),
}

/// Joint motion type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointType {
    /// Rotation about the joint axis [rad]
    Revolute,
    /// Translation along the joint axis [m]
    Prismatic,
}

/// Position, velocity and acceleration bounds of one joint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    pub lower: f64,
    pub upper: f64,
    pub max_velocity: f64,
    pub max_acceleration: f64,
}

impl Default for JointLimits {
    fn default() -> Self {
        Self {
            lower: -std::f64::consts::PI,
            upper: std::f64::consts::PI,
            max_velocity: 1.0,
            max_acceleration: 2.0,
        }
    }
}

impl JointLimits {
    /// Whether a joint value respects the position bounds
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Single-axis joint of a serial chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointModel {
    pub name: String,
    pub joint_type: JointType,
    /// Joint axis in the joint frame (normalized on use)
    pub axis: Vector3<f64>,
    /// Transform from the parent link to the joint frame at zero position
    #[serde(default = "Isometry3::identity")]
    pub origin: Isometry3<f64>,
    #[serde(default)]
    pub limits: JointLimits,
}

impl JointModel {
    pub fn revolute(name: impl Into<String>, axis: Vector3<f64>, origin: Isometry3<f64>) -> Self {
        Self {
            name: name.into(),
            joint_type: JointType::Revolute,
            axis,
            origin,
            limits: JointLimits::default(),
        }
    }

    pub fn prismatic(name: impl Into<String>, axis: Vector3<f64>, origin: Isometry3<f64>) -> Self {
        Self {
            name: name.into(),
            joint_type: JointType::Prismatic,
            axis,
            origin,
            limits: JointLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Motion of the joint frame for joint value q
    pub fn motion(&self, q: f64) -> Isometry3<f64> {
        let axis = Unit::new_normalize(self.axis);
        match self.joint_type {
            JointType::Revolute => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(&axis, q),
            ),
            JointType::Prismatic => Isometry3::translation(axis.x * q, axis.y * q, axis.z * q),
        }
    }
}

/// Planning group: a serial chain with an optional tip link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupModel {
    pub name: String,
    pub joints: Vec<JointModel>,
    /// Name of the link at the end of the chain
    #[serde(default)]
    pub tip_link: Option<String>,
    /// Offset of the tip link from the last joint frame
    #[serde(default = "Isometry3::identity")]
    pub tip_offset: Isometry3<f64>,
    /// Whether the group is an end-effector (gripper)
    #[serde(default)]
    pub end_effector: bool,
}

impl GroupModel {
    pub fn new(name: impl Into<String>, joints: Vec<JointModel>) -> Self {
        Self {
            name: name.into(),
            joints,
            tip_link: None,
            tip_offset: Isometry3::identity(),
            end_effector: false,
        }
    }

    pub fn with_tip(mut self, link: impl Into<String>, offset: Isometry3<f64>) -> Self {
        self.tip_link = Some(link.into());
        self.tip_offset = offset;
        self
    }

    pub fn as_end_effector(mut self) -> Self {
        self.end_effector = true;
        self
    }

    /// Number of joints in the chain
    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    /// Reference frame for Cartesian goals of this group
    pub fn tip_frame(&self) -> Result<&str, ModelError> {
        if self.end_effector {
            return Err(ModelError::NoTipFrameForEndEffector(self.name.clone()));
        }
        self.tip_link
            .as_deref()
            .ok_or_else(|| ModelError::NoTipFrameForEndEffector(self.name.clone()))
    }

    /// Check that a configuration has one value per joint
    pub fn check_dimension(&self, q: &JointConfiguration) -> Result<(), ModelError> {
        if q.len() != self.dof() {
            return Err(ModelError::DimensionMismatch {
                group: self.name.clone(),
                expected: self.dof(),
                got: q.len(),
            });
        }
        Ok(())
    }

    /// Pose of the tip link relative to the group's base
    pub fn forward_kinematics(&self, q: &JointConfiguration) -> Result<Isometry3<f64>, ModelError> {
        self.check_dimension(q)?;
        let chain = self
            .joints
            .iter()
            .zip(q.iter())
            .fold(Isometry3::identity(), |pose, (joint, &value)| {
                pose * joint.origin * joint.motion(value)
            });
        Ok(chain * self.tip_offset)
    }

    /// Names of joints whose value lies outside the position limits
    pub fn limit_violations(&self, q: &JointConfiguration) -> Vec<(String, f64)> {
        self.joints
            .iter()
            .zip(q.iter())
            .filter(|(joint, &value)| !joint.limits.contains(value))
            .map(|(joint, &value)| (joint.name.clone(), value))
            .collect()
    }

    /// Default configuration: zero clamped into each joint's limits
    ///
    /// Inverted limits yield the upper bound; NaN bounds are ignored.
    pub fn home(&self) -> JointConfiguration {
        JointConfiguration::from_iterator(
            self.dof(),
            self.joints
                .iter()
                .map(|joint| 0.0_f64.max(joint.limits.lower).min(joint.limits.upper)),
        )
    }
}

/// Lookup of tip positions for the blend engine
pub trait TipKinematics {
    /// Cartesian position of the group's tip frame for configuration q
    fn tip_position(&self, group: &str, q: &JointConfiguration) -> Result<Vector3<f64>, ModelError>;
}

/// Kinematic model of a robot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotModel {
    pub name: String,
    pub groups: Vec<GroupModel>,
}

impl RobotModel {
    pub fn new(name: impl Into<String>, groups: Vec<GroupModel>) -> Self {
        Self {
            name: name.into(),
            groups,
        }
    }

    /// Parse a robot description from TOML
    pub fn from_toml_str(text: &str) -> Result<Self, ModelError> {
        let model: RobotModel =
            toml::from_str(text).map_err(|e| ModelError::InvalidDescription(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        for (i, group) in self.groups.iter().enumerate() {
            if self.groups[..i].iter().any(|other| other.name == group.name) {
                return Err(ModelError::InvalidDescription(format!(
                    "duplicate group '{}'",
                    group.name
                )));
            }
            if let Some(joint) = group.joints.iter().find(|j| !(j.limits.lower <= j.limits.upper)) {
                return Err(ModelError::InvalidDescription(format!(
                    "joint '{}' has lower limit above upper limit or NaN limits",
                    joint.name
                )));
            }
        }
        Ok(())
    }

    pub fn group(&self, name: &str) -> Result<&GroupModel, ModelError> {
        self.groups
            .iter()
            .find(|group| group.name == name)
            .ok_or_else(|| ModelError::UnknownGroup(name.to_string()))
    }

    /// Tip frame of a group; fails for end-effector groups
    pub fn tip_frame(&self, group: &str) -> Result<&str, ModelError> {
        self.group(group)?.tip_frame()
    }

    /// Whether a group is an end-effector (unknown groups are not)
    pub fn is_end_effector(&self, group: &str) -> bool {
        self.group(group).map(|g| g.end_effector).unwrap_or(false)
    }
}

impl TipKinematics for RobotModel {
    fn tip_position(&self, group: &str, q: &JointConfiguration) -> Result<Vector3<f64>, ModelError> {
        let group = self.group(group)?;
        group.tip_frame()?;
        Ok(group.forward_kinematics(q)?.translation.vector)
    }
}
