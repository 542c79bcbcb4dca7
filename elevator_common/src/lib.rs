//! Elevator Common Library
//!
//! Shared configuration types, constants and the actuator driver interface
//! used by every crate in the elevator workspace.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and shared config types
//! - [`consts`] - Workspace-wide numeric limits and defaults
//! - [`elevator`] - Elevator configuration (travel range, guards, gains, motion)
//! - [`hal`] - Actuator driver trait, HAL error and setup types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust,no_run
//! use elevator_common::config::ConfigLoader;
//! use elevator_common::elevator::ElevatorConfig;
//! use std::path::Path;
//!
//! let config = ElevatorConfig::load_validated(Path::new("config/elevator.toml"))?;
//! println!("travel: {:?}", config.travel);
//! # Ok::<(), elevator_common::config::ConfigError>(())
//! ```

pub mod config;
pub mod consts;
pub mod elevator;
pub mod hal;
pub mod prelude;
