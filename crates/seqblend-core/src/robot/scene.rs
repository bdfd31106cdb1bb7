//! Planning scene
//!
//! Read-only context for a planning call: the robot model and the current
//! configuration of every group. It supplies the start configuration of a
//! command when neither the caller nor a preceding command defines one.

use std::collections::HashMap;
use std::sync::Arc;

use crate::robot::model::{ModelError, RobotModel};
use crate::JointConfiguration;

#[derive(Debug, Clone)]
pub struct PlanningScene {
    model: Arc<RobotModel>,
    states: HashMap<String, JointConfiguration>,
}

impl PlanningScene {
    /// Scene with every group at its home configuration
    pub fn new(model: Arc<RobotModel>) -> Self {
        let states = model
            .groups
            .iter()
            .map(|group| (group.name.clone(), group.home()))
            .collect();
        Self { model, states }
    }

    /// Set the current configuration of a group
    pub fn with_group_state(
        mut self,
        group: &str,
        state: JointConfiguration,
    ) -> Result<Self, ModelError> {
        self.model.group(group)?.check_dimension(&state)?;
        self.states.insert(group.to_string(), state);
        Ok(self)
    }

    pub fn model(&self) -> &RobotModel {
        &self.model
    }

    pub fn shared_model(&self) -> Arc<RobotModel> {
        Arc::clone(&self.model)
    }

    /// Current configuration of a group
    pub fn group_state(&self, group: &str) -> Result<&JointConfiguration, ModelError> {
        self.states
            .get(group)
            .ok_or_else(|| ModelError::UnknownGroup(group.to_string()))
    }
}
