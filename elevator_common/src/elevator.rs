//! Elevator-specific shared types.
//!
//! - [`config`] - Configuration tables loaded from TOML
//! - [`state`] - Guard zone classification shared by controller and status readers

pub mod config;
pub mod state;

pub use config::{
    ElevatorConfig, GainsConfig, GuardConfig, MotionProfileConfig, MotorConfig, SimulationConfig,
    TravelRange,
};
pub use state::GuardZone;
