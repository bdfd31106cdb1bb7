//! seqblend planner
//!
//! Plans an ordered list of motion commands into one continuous joint
//! trajectory per planning-group run, optionally smoothing the corners between
//! consecutive commands of the same group.
//!
//! # Pipeline
//!
//! ```text
//! commands ──► validate ──► partition ──► per run: plan ─► check spheres ─► blend ──► trajectories
//!                                                   ▲                          │
//!                                                   └──────── next start ◄─────┘
//! ```
//!
//! # Components
//!
//! - [`validation`]: Structural checks on the command list
//! - [`partition`]: Group runs and effective blend radii
//! - [`segment`]: Per-command planner boundary
//! - [`reference`]: Built-in planner for point-to-point, line, arc and gripper commands
//! - [`blend`]: Sphere-based blend engine and transition curves
//! - [`manager`]: The `solve` entry point
//! - [`config`]: TOML-loadable configuration
//! - [`scenarios`]: Reference gantry cell and command lists
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use seqblend_core::PlanningScene;
//! use seqblend_planner::{scenarios, CommandListManager, ReferencePlanner, SequenceConfig};
//!
//! let config = SequenceConfig::default();
//! let manager = CommandListManager::new(ReferencePlanner::new(config.planner.clone())?, config)?;
//! let scene = PlanningScene::new(Arc::new(scenarios::gantry_cell()));
//!
//! let trajectories = manager.solve(&scene, &scenarios::complex_sequence())?;
//! assert_eq!(trajectories.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod validation;
pub mod partition;
pub mod segment;
pub mod reference;
pub mod blend;
pub mod manager;
pub mod scenarios;

// Re-exports
pub use blend::{BlendEngine, BlendError, BlendRegion, Splice, TransitionStrategy};
pub use config::{BlendConfig, ConfigError, ReferencePlannerConfig, SequenceConfig, StartStatePolicy, TransitionKind};
pub use manager::{CommandListManager, ErrorCode, ErrorKind, RunPhase, SequenceError};
pub use partition::{partition, GroupRun};
pub use reference::ReferencePlanner;
pub use segment::{PlanningError, SegmentPlanner};
pub use validation::{validate, ValidationError};
