//! Carriage physics simulator.
//!
//! The `CarriageSimulator` models the leader-driven carriage in mechanism
//! units:
//! - Profile: velocity/acceleration-limited move toward a target
//! - Voltage: steady-state speed proportional to voltage above gravity
//! - Neutral: brake holds, coast lets the carriage fall
//!
//! The carriage never leaves the hard-stops; contact is counted.

use elevator_common::elevator::{MotionProfileConfig, TravelRange};
use elevator_common::hal::types::NeutralMode;
use tracing::trace;

/// Velocity below which the carriage counts as stopped [units/s].
const STOPPED_VELOCITY: f64 = 1e-3;

/// Drive request currently acting on the carriage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveMode {
    /// No output.
    Neutral,
    /// Profiled move toward a target height.
    Profile {
        /// Target height [units].
        target: f64,
    },
    /// Open-loop voltage.
    Voltage {
        /// Applied voltage [V].
        volts: f64,
    },
}

/// Carriage simulator providing the measured height.
#[derive(Debug, Clone)]
pub struct CarriageSimulator {
    /// Hard-stop positions
    hard_stops: TravelRange,
    /// Profile limits
    motion: MotionProfileConfig,
    /// Neutral behaviour
    neutral_mode: NeutralMode,
    /// Speed per volt above gravity
    velocity_per_volt: f64,
    /// Voltage balancing gravity
    gravity_volts: f64,
    /// Current height
    position: f64,
    /// Current velocity
    velocity: f64,
    /// Active drive request
    mode: DriveMode,
    /// Number of transitions into hard-stop contact
    hard_stop_contacts: u64,
    /// Carriage currently resting on a stop
    on_stop: bool,
}

impl CarriageSimulator {
    /// Create a carriage resting at `initial_height` (clamped to the stops).
    pub fn new(
        hard_stops: TravelRange,
        motion: MotionProfileConfig,
        velocity_per_volt: f64,
        gravity_volts: f64,
        initial_height: f64,
    ) -> Self {
        let position = hard_stops.clamp(initial_height);
        Self {
            hard_stops,
            motion,
            neutral_mode: NeutralMode::Brake,
            velocity_per_volt,
            gravity_volts,
            position,
            velocity: 0.0,
            mode: DriveMode::Neutral,
            hard_stop_contacts: 0,
            on_stop: false,
        }
    }

    /// Replace profile limits and neutral behaviour (applied at driver init).
    pub fn configure(&mut self, motion: MotionProfileConfig, neutral_mode: NeutralMode) {
        self.motion = motion;
        self.neutral_mode = neutral_mode;
    }

    /// Switch the active drive request.
    pub fn command(&mut self, mode: DriveMode) {
        self.mode = mode;
    }

    /// Advance the plant by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }

        match self.mode {
            DriveMode::Neutral => self.update_neutral(dt),
            DriveMode::Profile { target } => self.update_profile(target, dt),
            DriveMode::Voltage { volts } => {
                self.velocity = (volts - self.gravity_volts) * self.velocity_per_volt;
            }
        }

        self.position += self.velocity * dt;
        self.enforce_hard_stops();

        trace!(
            "carriage: pos={:.3}, vel={:.3}, mode={:?}",
            self.position, self.velocity, self.mode
        );
    }

    fn update_neutral(&mut self, dt: f64) {
        match self.neutral_mode {
            NeutralMode::Brake => self.decelerate_to_stop(dt),
            NeutralMode::Coast => {
                self.velocity = -self.gravity_volts * self.velocity_per_volt;
            }
        }
    }

    /// Triangular/trapezoidal profile toward `target`.
    fn update_profile(&mut self, target: f64, dt: f64) {
        let target = self.hard_stops.clamp(target);
        let position_error = target - self.position;
        let max_vel = self.motion.cruise_velocity;
        let max_acc = self.motion.acceleration;

        // Settled: close enough that one more step could only dither.
        if position_error.abs() <= max_acc * dt * dt && self.velocity.abs() <= max_acc * dt {
            self.position = target;
            self.velocity = 0.0;
            return;
        }

        let stopping_distance = self.velocity * self.velocity / (2.0 * max_acc);
        let desired_velocity = if position_error.abs() <= stopping_distance {
            position_error.signum() * (2.0 * max_acc * position_error.abs()).sqrt().min(max_vel)
        } else {
            position_error.signum() * max_vel
        };

        let max_vel_change = max_acc * dt;
        self.velocity += (desired_velocity - self.velocity).clamp(-max_vel_change, max_vel_change);
        self.velocity = self.velocity.clamp(-max_vel, max_vel);
    }

    fn decelerate_to_stop(&mut self, dt: f64) {
        if self.velocity.abs() < STOPPED_VELOCITY {
            self.velocity = 0.0;
            return;
        }

        let decel = self.motion.acceleration * dt;
        if self.velocity > 0.0 {
            self.velocity = (self.velocity - decel).max(0.0);
        } else {
            self.velocity = (self.velocity + decel).min(0.0);
        }
    }

    fn enforce_hard_stops(&mut self) {
        let clamped = self.hard_stops.clamp(self.position);
        let touching = clamped != self.position
            || (clamped == self.hard_stops.min_height && self.velocity < 0.0)
            || (clamped == self.hard_stops.max_height && self.velocity > 0.0);

        if touching {
            self.position = clamped;
            self.velocity = 0.0;
            if !self.on_stop {
                self.hard_stop_contacts += 1;
            }
        }
        self.on_stop = touching;
    }

    /// Current height [units].
    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current velocity [units/s].
    #[inline]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Active drive request.
    #[inline]
    pub fn mode(&self) -> DriveMode {
        self.mode
    }

    /// Teleport the carriage to `height` (clamped to the stops) at rest.
    pub fn set_position(&mut self, height: f64) {
        self.position = self.hard_stops.clamp(height);
        self.velocity = 0.0;
    }

    /// Number of times the carriage was driven into a hard-stop.
    #[inline]
    pub fn hard_stop_contacts(&self) -> u64 {
        self.hard_stop_contacts
    }
}
