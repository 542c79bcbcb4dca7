//! # Elevator HAL Library
//!
//! Actuator drivers for the elevator control unit. Drivers implement the
//! `ActuatorDriver` trait defined in `elevator_common::hal::driver` and are
//! looked up by name through a [`DriverRegistry`].
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   by name   ┌─────────────────────┐
//! │  elevator_control    │────────────►│  DriverRegistry     │
//! │  _unit (controller)  │             └─────────┬───────────┘
//! └──────────┬───────────┘                       │ factory(config)
//!            │ owns                              ▼
//!            │                        ┌─────────────────────┐
//!            └───────────────────────►│  ActuatorDriver     │ (trait object)
//!                                     │  leader + follower  │
//!                                     └─────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::simulation::{SimulationDriver, SimulationHandle};
