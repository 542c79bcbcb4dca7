//! Prelude module for common re-exports.
//!
//! ```rust
//! use elevator_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};
pub use crate::elevator::{ElevatorConfig, GuardConfig, TravelRange};

// ─── Driver Interface ───────────────────────────────────────────────
pub use crate::hal::driver::{ActuatorDriver, HalError};
pub use crate::hal::types::{ActuatorSetup, AppliedControl};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_CYCLE_TIME_US, MAX_OUTPUT_VOLTAGE};

/// Default control period as Duration.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_micros(DEFAULT_CYCLE_TIME_US as u64);
