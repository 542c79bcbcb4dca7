//! Elevator configuration structures.
//!
//! All config types use `serde::Deserialize` for TOML loading and carry
//! defaults that reproduce the production calibration, so a file only needs
//! to list what differs. Every table implements [`Validate`]; invalid
//! configuration is rejected at load time, never at runtime.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{ConfigError, SharedConfig, Validate};
use crate::consts::{CYCLE_TIME_US_MAX, CYCLE_TIME_US_MIN, DEFAULT_CYCLE_TIME_US, MAX_OUTPUT_VOLTAGE};
use crate::hal::types::{GravityType, NeutralMode};

/// Gear reduction between motor rotor and the elevator drum.
pub const DEFAULT_SENSOR_TO_MECHANISM_RATIO: f64 = 42.6 / 80.5;

const METERS_PER_INCH: f64 = 0.0254;

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

fn require_finite(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite, got {value}")))
    }
}

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete elevator configuration, immutable after the controller is built.
///
/// # TOML Example
///
/// ```toml
/// cycle_time_us = 20000
///
/// [shared]
/// service_name = "elevator"
///
/// [travel]
/// min_height = 0.0
/// max_height = 81.0
///
/// [guard]
/// kg_top = 0.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevatorConfig {
    /// Service name and log level.
    pub shared: SharedConfig,
    /// Control period [µs] (default: 20 000 = 20 ms).
    pub cycle_time_us: u32,
    /// Target held from construction until the first request (clamped).
    pub initial_target: f64,
    /// Physical travel range.
    pub travel: TravelRange,
    /// End-stop guard margins and hold voltage.
    pub guard: GuardConfig,
    /// Leader/follower motor wiring.
    pub motors: MotorConfig,
    /// Feedforward and feedback gains.
    pub gains: GainsConfig,
    /// Motion-profile limits.
    pub motion: MotionProfileConfig,
    /// Plant parameters used by the simulation driver only.
    pub simulation: SimulationConfig,
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            cycle_time_us: DEFAULT_CYCLE_TIME_US,
            initial_target: 0.0,
            travel: TravelRange::default(),
            guard: GuardConfig::default(),
            motors: MotorConfig::default(),
            gains: GainsConfig::default(),
            motion: MotionProfileConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl ElevatorConfig {
    /// Control period as a `Duration`.
    #[inline]
    pub fn cycle_time(&self) -> Duration {
        Duration::from_micros(self.cycle_time_us as u64)
    }
}

impl Validate for ElevatorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if !(CYCLE_TIME_US_MIN..=CYCLE_TIME_US_MAX).contains(&self.cycle_time_us) {
            return Err(invalid(format!(
                "cycle_time_us {} out of range [{}, {}]",
                self.cycle_time_us, CYCLE_TIME_US_MIN, CYCLE_TIME_US_MAX
            )));
        }
        require_finite("initial_target", self.initial_target)?;

        self.travel.validate()?;
        self.guard.validate_within(&self.travel)?;
        self.motors.validate()?;
        self.gains.validate()?;
        self.motion.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

// ─── Travel Range ───────────────────────────────────────────────────

/// Physical travel range of the carriage, in mechanism units.
///
/// Invariant once validated: both bounds finite and `min_height < max_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelRange {
    /// Lowest reachable height (bottom hard-stop).
    pub min_height: f64,
    /// Highest reachable height (top hard-stop).
    pub max_height: f64,
}

impl Default for TravelRange {
    fn default() -> Self {
        Self {
            min_height: 0.0,
            max_height: 81.0,
        }
    }
}

impl TravelRange {
    /// Build a validated range.
    pub fn new(min_height: f64, max_height: f64) -> Result<Self, ConfigError> {
        let range = Self {
            min_height,
            max_height,
        };
        range.validate()?;
        Ok(range)
    }

    /// Saturate `height` into `[min_height, max_height]`.
    ///
    /// Infinities saturate to the matching bound. `NaN` is returned unchanged
    /// and must be rejected by the caller.
    #[inline]
    pub fn clamp(&self, height: f64) -> f64 {
        height.clamp(self.min_height, self.max_height)
    }

    /// Distance between the two hard-stops.
    #[inline]
    pub fn span(&self) -> f64 {
        self.max_height - self.min_height
    }
}

impl Validate for TravelRange {
    fn validate(&self) -> Result<(), ConfigError> {
        require_finite("travel.min_height", self.min_height)?;
        require_finite("travel.max_height", self.max_height)?;
        if self.min_height >= self.max_height {
            return Err(invalid(format!(
                "travel.min_height {} must be below travel.max_height {}",
                self.min_height, self.max_height
            )));
        }
        Ok(())
    }
}

// ─── Guard ──────────────────────────────────────────────────────────

/// End-stop guard margins and the top hold voltage.
///
/// Bottom hold engages when `target < min + bottom_target_margin` and
/// `measured < min + bottom_position_margin`. Top hold engages when both
/// `measured` and `target` exceed `max - top_margin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Target margin above the bottom stop [units] (default: 1).
    pub bottom_target_margin: f64,
    /// Position margin above the bottom stop [units] (default: 2).
    pub bottom_position_margin: f64,
    /// Margin below the top stop for both target and position [units] (default: 8).
    pub top_margin: f64,
    /// Voltage applied to the leader while holding at the top [V].
    pub kg_top: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            bottom_target_margin: 1.0,
            bottom_position_margin: 2.0,
            top_margin: 8.0,
            kg_top: 0.5,
        }
    }
}

impl GuardConfig {
    /// Validate margins against the travel range they will be applied to.
    pub fn validate_within(&self, travel: &TravelRange) -> Result<(), ConfigError> {
        for (name, margin) in [
            ("guard.bottom_target_margin", self.bottom_target_margin),
            ("guard.bottom_position_margin", self.bottom_position_margin),
            ("guard.top_margin", self.top_margin),
        ] {
            require_finite(name, margin)?;
            if margin < 0.0 {
                return Err(invalid(format!("{name} must be non-negative, got {margin}")));
            }
            if margin > travel.span() {
                return Err(invalid(format!(
                    "{name} {margin} exceeds travel span {}",
                    travel.span()
                )));
            }
        }

        require_finite("guard.kg_top", self.kg_top)?;
        if self.kg_top.abs() > MAX_OUTPUT_VOLTAGE {
            return Err(invalid(format!(
                "guard.kg_top {} exceeds ±{} V",
                self.kg_top, MAX_OUTPUT_VOLTAGE
            )));
        }
        Ok(())
    }
}

// ─── Motors ─────────────────────────────────────────────────────────

/// Leader/follower motor wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// Device id of the commanded motor.
    pub leader_id: u8,
    /// Device id of the mirrored motor.
    pub follower_id: u8,
    /// Bus the motors are attached to.
    pub bus: String,
    /// Follower spins opposite to the leader.
    pub follower_opposed: bool,
    /// Behaviour of both outputs when no voltage is applied.
    pub neutral_mode: NeutralMode,
    /// Rotor rotations per mechanism unit.
    pub sensor_to_mechanism_ratio: f64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            leader_id: 50,
            follower_id: 51,
            bus: "canivore".to_string(),
            follower_opposed: true,
            neutral_mode: NeutralMode::Brake,
            sensor_to_mechanism_ratio: DEFAULT_SENSOR_TO_MECHANISM_RATIO,
        }
    }
}

impl Validate for MotorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.leader_id == self.follower_id {
            return Err(invalid(format!(
                "motors.leader_id and motors.follower_id must differ (both {})",
                self.leader_id
            )));
        }
        if self.bus.is_empty() {
            return Err(invalid("motors.bus cannot be empty".to_string()));
        }
        require_finite("motors.sensor_to_mechanism_ratio", self.sensor_to_mechanism_ratio)?;
        if self.sensor_to_mechanism_ratio <= 0.0 {
            return Err(invalid(format!(
                "motors.sensor_to_mechanism_ratio must be positive, got {}",
                self.sensor_to_mechanism_ratio
            )));
        }
        Ok(())
    }
}

// ─── Gains ──────────────────────────────────────────────────────────

/// Slot gains passed to the leader at init.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainsConfig {
    /// How `kg` is applied.
    pub gravity_type: GravityType,
    /// Static friction feedforward [V].
    pub ks: f64,
    /// Gravity feedforward [V].
    pub kg: f64,
    /// Velocity feedforward [V per rps].
    pub kv: f64,
    /// Acceleration feedforward [V per rps²].
    pub ka: f64,
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
}

impl Default for GainsConfig {
    fn default() -> Self {
        let drum = METERS_PER_INCH * DEFAULT_SENSOR_TO_MECHANISM_RATIO;
        Self {
            gravity_type: GravityType::ElevatorStatic,
            ks: 0.041645,
            kg: 0.38,
            kv: 8.84 * drum,
            ka: 0.13 * drum,
            kp: 3.0,
            ki: 0.05,
            kd: 0.0,
        }
    }
}

impl Validate for GainsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, gain) in [
            ("gains.ks", self.ks),
            ("gains.kg", self.kg),
            ("gains.kv", self.kv),
            ("gains.ka", self.ka),
        ] {
            require_finite(name, gain)?;
        }
        for (name, gain) in [
            ("gains.kp", self.kp),
            ("gains.ki", self.ki),
            ("gains.kd", self.kd),
        ] {
            require_finite(name, gain)?;
            if gain < 0.0 {
                return Err(invalid(format!("{name} must be non-negative, got {gain}")));
            }
        }
        Ok(())
    }
}

// ─── Motion Profile ─────────────────────────────────────────────────

/// Motion-profile limits handed to the device profile generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionProfileConfig {
    /// Cruise velocity [units/s].
    pub cruise_velocity: f64,
    /// Acceleration limit [units/s²].
    pub acceleration: f64,
    /// Jerk limit [units/s³]; 0 disables jerk limiting.
    pub jerk: f64,
}

impl Default for MotionProfileConfig {
    fn default() -> Self {
        Self {
            cruise_velocity: 40.0,
            acceleration: 50.0,
            jerk: 1600.0,
        }
    }
}

impl Validate for MotionProfileConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, limit) in [
            ("motion.cruise_velocity", self.cruise_velocity),
            ("motion.acceleration", self.acceleration),
        ] {
            require_finite(name, limit)?;
            if limit <= 0.0 {
                return Err(invalid(format!("{name} must be positive, got {limit}")));
            }
        }
        require_finite("motion.jerk", self.jerk)?;
        if self.jerk < 0.0 {
            return Err(invalid(format!(
                "motion.jerk must be non-negative, got {}",
                self.jerk
            )));
        }
        Ok(())
    }
}

// ─── Simulation ─────────────────────────────────────────────────────

/// Plant parameters for the simulation driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Carriage speed per volt above the gravity voltage [units/s/V].
    pub velocity_per_volt: f64,
    /// Voltage that exactly balances gravity; defaults to `gains.kg`.
    pub gravity_volts: Option<f64>,
    /// Carriage height when the simulation starts.
    pub initial_height: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            velocity_per_volt: 10.0,
            gravity_volts: None,
            initial_height: 0.0,
        }
    }
}

impl Validate for SimulationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_finite("simulation.velocity_per_volt", self.velocity_per_volt)?;
        if self.velocity_per_volt <= 0.0 {
            return Err(invalid(format!(
                "simulation.velocity_per_volt must be positive, got {}",
                self.velocity_per_volt
            )));
        }
        if let Some(volts) = self.gravity_volts {
            require_finite("simulation.gravity_volts", volts)?;
        }
        require_finite("simulation.initial_height", self.initial_height)?;
        Ok(())
    }
}
