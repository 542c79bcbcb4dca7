//! Controller error type.

use elevator_common::config::ConfigError;
use elevator_common::hal::driver::HalError;
use thiserror::Error;

/// Errors surfaced by the elevator controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    /// Configuration rejected at construction.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Driver failure (init, command or read).
    #[error("driver error: {0}")]
    Driver(#[from] HalError),

    /// Requested target is NaN; the stored target is left unchanged.
    #[error("target height must be a number, got {0}")]
    NonFiniteTarget(f64),
}
