//! Planner configuration
//!
//! Configuration for the command list manager, the blend engine and the
//! reference segment planner. Every field has a serde default so partial
//! TOML documents are accepted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Main sequence planning configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Blend engine configuration
    pub blend: BlendConfig,
    /// Reference segment planner configuration
    pub planner: ReferencePlannerConfig,
    /// Where runs that are not the first in the list start
    pub start_state_policy: StartStatePolicy,
}

impl SequenceConfig {
    /// Parse and validate a TOML configuration
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SequenceConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.blend.validate()?;
        self.planner.validate()
    }
}

/// Start configuration of the first command of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartStatePolicy {
    /// Always the scene's configuration of the group
    #[default]
    Scene,
    /// End of the group's previous run if there is one, else the scene
    PreviousRunEnd,
}

/// Shape of the transition curve inside a blend region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Cubic Hermite: position and velocity continuous
    #[default]
    CubicHermite,
    /// Quintic Hermite with zero acceleration at both splice points
    QuinticHermite,
}

/// Blend engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    /// Transition curve family
    pub transition: TransitionKind,
    /// Sampling step of the transition [s]
    ///
    /// None uses the first trajectory's sampling interval at the blend entry.
    pub sampling_time: Option<f64>,
    /// Maximum joint-space gap allowed between the two trajectories' junction
    pub junction_tolerance: f64,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            transition: TransitionKind::CubicHermite,
            sampling_time: None,
            junction_tolerance: 1e-6,
        }
    }
}

impl BlendConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dt) = self.sampling_time {
            if !(dt > 0.0) {
                return Err(ConfigError::Invalid {
                    field: "blend.sampling_time",
                    reason: format!("must be positive, got {dt}"),
                });
            }
        }
        if !(self.junction_tolerance >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "blend.junction_tolerance",
                reason: format!("must be non-negative, got {}", self.junction_tolerance),
            });
        }
        Ok(())
    }
}

/// Reference segment planner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencePlannerConfig {
    /// Waypoint spacing [s]
    pub sampling_time: f64,
    /// Fraction of the joint velocity limits used, in (0, 1]
    pub velocity_scaling: f64,
    /// Fraction of the joint acceleration limits used, in (0, 1]
    pub acceleration_scaling: f64,
    /// Tip speed limit for line and arc commands [m/s]
    pub max_cartesian_velocity: f64,
    /// Tip acceleration limit for line and arc commands [m/s²]
    pub max_cartesian_acceleration: f64,
}

impl Default for ReferencePlannerConfig {
    fn default() -> Self {
        Self {
            sampling_time: 0.01,
            velocity_scaling: 1.0,
            acceleration_scaling: 1.0,
            max_cartesian_velocity: 1.0,
            max_cartesian_acceleration: 2.0,
        }
    }
}

impl ReferencePlannerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("planner.sampling_time", self.sampling_time),
            ("planner.max_cartesian_velocity", self.max_cartesian_velocity),
            ("planner.max_cartesian_acceleration", self.max_cartesian_acceleration),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }

        let scaling = [
            ("planner.velocity_scaling", self.velocity_scaling),
            ("planner.acceleration_scaling", self.acceleration_scaling),
        ];
        for (field, value) in scaling {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be in (0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SequenceConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.start_state_policy, StartStatePolicy::Scene);
        assert_eq!(config.blend.transition, TransitionKind::CubicHermite);
        assert!(config.blend.sampling_time.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config = SequenceConfig::from_toml_str(
            r#"
            start_state_policy = "previous_run_end"

            [blend]
            transition = "quintic_hermite"
            sampling_time = 0.005

            [planner]
            velocity_scaling = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.start_state_policy, StartStatePolicy::PreviousRunEnd);
        assert_eq!(config.blend.transition, TransitionKind::QuinticHermite);
        assert_eq!(config.blend.sampling_time, Some(0.005));
        assert_eq!(config.planner.velocity_scaling, 0.5);
        assert_eq!(config.planner.sampling_time, 0.01);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SequenceConfig::from_toml_str("[planner]\nvelocity_scaling = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "planner.velocity_scaling", .. }));

        let err = SequenceConfig::from_toml_str("[blend]\nsampling_time = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "blend.sampling_time", .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let err = SequenceConfig::from_toml_str("[blend\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
