//! Simulation driver module.
//!
//! Software leader/follower plant for running the control unit without
//! hardware.

mod driver;
mod physics;

pub use driver::{SimulationDriver, SimulationHandle};
pub use physics::{CarriageSimulator, DriveMode, FollowerSimulator};

use elevator_common::elevator::ElevatorConfig;
use elevator_common::hal::driver::ActuatorDriver;

/// Factory function to create a simulation driver instance.
pub fn create_driver(config: &ElevatorConfig) -> Box<dyn ActuatorDriver> {
    Box::new(SimulationDriver::new(config))
}
