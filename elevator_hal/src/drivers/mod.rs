//! Actuator driver implementations.
//!
//! - [`simulation`] - Software plant for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `ActuatorDriver` from `elevator_common::hal::driver`
//! 3. Register its factory in [`register_all_drivers`]

pub mod simulation;

use elevator_common::consts::SIMULATION_DRIVER;

use crate::driver_registry::DriverRegistry;

/// Register every built-in driver into `registry`.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    // Already-registered built-ins are left in place.
    let _ = registry.register(SIMULATION_DRIVER, simulation::create_driver);
}
