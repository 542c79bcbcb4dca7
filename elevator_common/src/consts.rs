//! Workspace-wide constants.
//!
//! Single source of truth for numeric limits and default paths.

/// Default control period in microseconds (50 Hz = 20 000 µs).
pub const DEFAULT_CYCLE_TIME_US: u32 = 20_000;

/// Shortest accepted control period [µs].
pub const CYCLE_TIME_US_MIN: u32 = 1_000;

/// Longest accepted control period [µs].
pub const CYCLE_TIME_US_MAX: u32 = 100_000;

/// Largest voltage magnitude a motor output may be asked to apply [V].
pub const MAX_OUTPUT_VOLTAGE: f64 = 12.0;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/elevator.toml";

/// Registry name of the built-in simulation driver.
pub const SIMULATION_DRIVER: &str = "simulation";
