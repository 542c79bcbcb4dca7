//! Hardware abstraction layer interface.
//!
//! - [`driver`] - `ActuatorDriver` trait, `HalError`, driver factory type
//! - [`types`] - Setup and command types exchanged with drivers

pub mod driver;
pub mod types;
