//! HAL setup and command types.
//!
//! - `ActuatorSetup` - One-shot device configuration applied at init
//! - `AppliedControl` - The control request a driver is currently applying
//! - `NeutralMode` / `GravityType` - Device configuration enums

use serde::{Deserialize, Serialize};

use crate::elevator::config::{ElevatorConfig, GainsConfig, MotionProfileConfig};

/// Output behaviour when no voltage is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NeutralMode {
    /// Short the windings; the carriage resists back-driving.
    #[default]
    Brake,
    /// Leave the windings open.
    Coast,
}

/// How the gravity feedforward `kg` is applied by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GravityType {
    /// Constant gravity term (vertical elevator).
    #[default]
    ElevatorStatic,
    /// Gravity term scaled by the cosine of the mechanism angle.
    ArmCosine,
}

/// Device configuration handed to a driver once, before the first command.
///
/// The follower relation lives here: drivers configure the follower to
/// mirror the leader and never receive a per-cycle follower command.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorSetup {
    /// Leader device id.
    pub leader_id: u8,
    /// Follower device id.
    pub follower_id: u8,
    /// Bus name.
    pub bus: String,
    /// Follower output is inverted relative to the leader.
    pub follower_opposed: bool,
    /// Neutral behaviour of both outputs.
    pub neutral_mode: NeutralMode,
    /// Rotor rotations per mechanism unit.
    pub sensor_to_mechanism_ratio: f64,
    /// Slot gains.
    pub gains: GainsConfig,
    /// Profile limits.
    pub motion: MotionProfileConfig,
}

impl ActuatorSetup {
    /// Extract the device setup from a validated configuration.
    pub fn from_config(config: &ElevatorConfig) -> Self {
        Self {
            leader_id: config.motors.leader_id,
            follower_id: config.motors.follower_id,
            bus: config.motors.bus.clone(),
            follower_opposed: config.motors.follower_opposed,
            neutral_mode: config.motors.neutral_mode,
            sensor_to_mechanism_ratio: config.motors.sensor_to_mechanism_ratio,
            gains: config.gains,
            motion: config.motion,
        }
    }
}

/// Control request currently applied to the leader output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AppliedControl {
    /// Nothing applied yet, or outputs neutralised at shutdown.
    #[default]
    Neutral,
    /// Motion-profile position tracking toward `target`.
    PositionProfile {
        /// Target height in mechanism units.
        target: f64,
    },
    /// Open-loop voltage.
    Voltage {
        /// Applied voltage [V].
        volts: f64,
    },
}

impl AppliedControl {
    /// Short name of the request class, for logs and diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::PositionProfile { .. } => "position_profile",
            Self::Voltage { .. } => "voltage_out",
        }
    }
}
