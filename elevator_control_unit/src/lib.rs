//! # Elevator Control Unit Library
//!
//! Closed-loop position control for a leader/follower elevator. Every
//! control period the controller reads the measured height, classifies it
//! against the end-stop guards and issues exactly one command to the
//! actuator driver.
//!
//! ## Modules
//!
//! - [`controller`] - `ElevatorController`: target clamping and the guarded tick
//! - [`guard`] - Guard thresholds and zone classification
//! - [`command`] - Cross-thread setpoint requests
//! - [`status`] - Lock-free status board for observers
//! - [`cycle`] - Periodic cycle runner, timing statistics and RT setup
//! - [`error`] - Controller error type

pub mod command;
pub mod controller;
pub mod cycle;
pub mod error;
pub mod guard;
pub mod status;

pub use controller::{ElevatorController, TickOutcome};
pub use error::ControlError;
