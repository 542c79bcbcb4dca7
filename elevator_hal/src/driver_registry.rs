//! Driver registry for actuator drivers.
//!
//! Provides a `DriverRegistry` struct for registering and retrieving driver
//! factories. Constructed at startup and passed by value; no global state.

use elevator_common::elevator::ElevatorConfig;
use elevator_common::hal::driver::{ActuatorDriver, DriverFactory, HalError};
use std::collections::HashMap;

use crate::drivers::register_all_drivers;

/// Registry of available actuator drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in driver.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Errors
    /// Returns `HalError::InitFailed` if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) -> Result<(), HalError> {
        if self.factories.contains_key(name) {
            return Err(HalError::InitFailed(format!(
                "driver '{name}' is already registered"
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// Returns `HalError::DriverNotFound` if no driver with the given name is registered.
    pub fn create_driver(
        &self,
        name: &str,
        config: &ElevatorConfig,
    ) -> Result<Box<dyn ActuatorDriver>, HalError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| HalError::DriverNotFound(name.to_string()))?;
        Ok(factory(config))
    }

    /// List all registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
