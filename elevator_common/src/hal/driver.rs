//! Actuator driver trait and error types.
//!
//! This module defines:
//! - `ActuatorDriver` trait - Interface the controller uses to reach the motors
//! - `HalError` enum - Error types for driver operations
//! - `DriverFactory` type alias - Factory function type
//! - `DriverDiagnostics` struct - Optional driver counters

use crate::elevator::config::ElevatorConfig;
use crate::hal::types::ActuatorSetup;
use std::time::Duration;
use thiserror::Error;

/// Error types for driver operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HalError {
    /// Driver used before `init()` or after `shutdown()`.
    #[error("Driver not ready: {0}")]
    NotReady(String),

    /// Driver initialization failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Hardware communication error (bus loss, timeout, stale frame).
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),

    /// Command rejected by the driver (e.g. non-finite value).
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Driver not found in the registry.
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

impl HalError {
    /// Whether the condition may clear by itself on a later cycle.
    #[inline]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::CommunicationError(_))
    }
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn(&ElevatorConfig) -> Box<dyn ActuatorDriver>;

/// Optional driver counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverDiagnostics {
    /// Commands accepted by the driver.
    pub commands_applied: u64,
    /// Position reads served.
    pub position_reads: u64,
    /// Commands that failed.
    pub failed_commands: u64,
    /// Position reads that failed.
    pub failed_reads: u64,
    /// Driver-specific detail.
    pub custom: Option<String>,
}

/// Interface to the leader/follower motor pair.
///
/// The controller owns exactly one driver and talks only to the logical
/// leader; follower mirroring is configured by `init()`. All heights are in
/// mechanism units, the driver applies the sensor-to-mechanism ratio.
///
/// # Lifecycle
///
/// 1. `init()` - Called once before the first command
/// 2. `update()` / commands / reads - Called from the control loop
/// 3. `shutdown()` - Neutralise outputs and close handles; idempotent
///
/// # Timing Contracts
///
/// | Operation | RT Constraint |
/// |-----------|---------------|
/// | `init()` | None (pre-loop) |
/// | `update()`, commands, reads | **HARD**, must not block |
/// | `shutdown()` | None (post-loop) |
pub trait ActuatorDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Apply the device setup: gains, profile limits, neutral mode, follower relation.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` if the devices cannot be configured.
    fn init(&mut self, setup: &ActuatorSetup) -> Result<(), HalError>;

    /// Command motion-profile position tracking toward `target`.
    fn apply_position_command(&mut self, target: f64) -> Result<(), HalError>;

    /// Command an open-loop voltage on the leader.
    fn apply_voltage_command(&mut self, volts: f64) -> Result<(), HalError>;

    /// Latest measured leader position in mechanism units.
    fn measured_position(&self) -> Result<f64, HalError>;

    /// Advance background device state by `dt`.
    ///
    /// Real hardware progresses on its own; the default does nothing.
    fn update(&mut self, _dt: Duration) -> Result<(), HalError> {
        Ok(())
    }

    /// Neutralise outputs and release device handles.
    ///
    /// Must be safe to call more than once.
    fn shutdown(&mut self) -> Result<(), HalError>;

    /// Get driver counters.
    /// Default: None
    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        None
    }
}

impl<D: ActuatorDriver + ?Sized> ActuatorDriver for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn version(&self) -> &'static str {
        (**self).version()
    }

    fn init(&mut self, setup: &ActuatorSetup) -> Result<(), HalError> {
        (**self).init(setup)
    }

    fn apply_position_command(&mut self, target: f64) -> Result<(), HalError> {
        (**self).apply_position_command(target)
    }

    fn apply_voltage_command(&mut self, volts: f64) -> Result<(), HalError> {
        (**self).apply_voltage_command(volts)
    }

    fn measured_position(&self) -> Result<f64, HalError> {
        (**self).measured_position()
    }

    fn update(&mut self, dt: Duration) -> Result<(), HalError> {
        (**self).update(dt)
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        (**self).shutdown()
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        (**self).diagnostics()
    }
}
