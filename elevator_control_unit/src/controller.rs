//! Elevator position controller.
//!
//! `ElevatorController` owns the actuator driver and the target height.
//! `set_target` clamps into the travel range and immediately issues a
//! position command; `tick` runs once per control period and issues exactly
//! one command according to the end-stop guards (see [`crate::guard`]).
//!
//! # Driver faults
//!
//! A failed read or command never aborts the loop: `tick` returns
//! [`TickOutcome::Skipped`] and the next tick retries from the stored
//! target. Warnings are rate-limited (first 10, then every 1000th).
//!
//! # Release
//!
//! The driver is shut down on drop, also when `init` fails inside `new`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use elevator_common::elevator::GuardZone;
use elevator_common::hal::driver::DriverDiagnostics;
use elevator_common::prelude::{
    ActuatorDriver, ActuatorSetup, ElevatorConfig, HalError, TravelRange, Validate,
};
use tracing::{debug, error, info, warn};

use crate::error::ControlError;
use crate::guard::GuardThresholds;

// ─── Shared Target ──────────────────────────────────────────────────

/// Target height readable from any thread.
///
/// Stored as the `f64` bit pattern in one `AtomicU64`, so every load returns
/// a value that was actually stored.
#[derive(Debug, Clone, Default)]
pub struct SharedTarget(Arc<AtomicU64>);

impl SharedTarget {
    fn new(height: f64) -> Self {
        Self(Arc::new(AtomicU64::new(height.to_bits())))
    }

    /// Current target height.
    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    #[inline]
    fn store(&self, height: f64) {
        self.0.store(height.to_bits(), Ordering::Release);
    }
}

// ─── Tick Outcome ───────────────────────────────────────────────────

/// Result of one control tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A command was issued.
    Applied {
        /// Zone that selected the command.
        zone: GuardZone,
        /// Height measured this tick.
        measured: f64,
        /// Target in force this tick.
        target: f64,
    },
    /// The driver failed; no command was issued this tick.
    Skipped(HalError),
}

impl TickOutcome {
    /// Zone of an applied tick.
    pub fn zone(&self) -> Option<GuardZone> {
        match self {
            Self::Applied { zone, .. } => Some(*zone),
            Self::Skipped(_) => None,
        }
    }

    /// Whether the tick issued its command.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// Position controller for one leader/follower elevator.
pub struct ElevatorController<D: ActuatorDriver> {
    driver: D,
    travel: TravelRange,
    guards: GuardThresholds,
    target: SharedTarget,
    /// Only used to log zone changes.
    last_zone: Option<GuardZone>,
    fault_count: u64,
    shut_down: bool,
}

impl<D: ActuatorDriver> ElevatorController<D> {
    /// Validate `config`, take ownership of `driver` and initialise it.
    ///
    /// The initial target is `config.initial_target` clamped into the travel
    /// range. No command is issued until the first `set_target` or `tick`.
    ///
    /// # Errors
    /// `ControlError::Config` for an invalid configuration,
    /// `ControlError::Driver` if the driver fails to initialise (the driver is
    /// shut down before returning).
    pub fn new(config: &ElevatorConfig, mut driver: D) -> Result<Self, ControlError> {
        if let Err(e) = config.validate() {
            let _ = driver.shutdown();
            return Err(e.into());
        }

        let travel = config.travel;
        let mut controller = Self {
            driver,
            travel,
            guards: GuardThresholds::new(&travel, &config.guard),
            target: SharedTarget::new(travel.clamp(config.initial_target)),
            last_zone: None,
            fault_count: 0,
            shut_down: false,
        };

        // On failure `controller` drops here and releases the driver.
        controller
            .driver
            .init(&ActuatorSetup::from_config(config))?;

        info!(
            "Elevator controller ready: driver={} v{}, travel=[{}, {}], target={}",
            controller.driver.name(),
            controller.driver.version(),
            travel.min_height,
            travel.max_height,
            controller.target.load()
        );
        Ok(controller)
    }

    /// Clamp `height` into the travel range, store it and command the leader toward it.
    ///
    /// Returns the accepted (clamped) target. Infinities saturate to a bound.
    ///
    /// # Errors
    /// `NonFiniteTarget` for NaN, with the stored target unchanged.
    /// `Driver` if the command fails; the new target is kept and the next
    /// tick retries the command.
    pub fn set_target(&mut self, height: f64) -> Result<f64, ControlError> {
        if height.is_nan() {
            return Err(ControlError::NonFiniteTarget(height));
        }

        let clamped = self.travel.clamp(height);
        if clamped != height {
            debug!("Target {} clamped to {}", height, clamped);
        }
        self.target.store(clamped);

        if let Err(e) = self.driver.apply_position_command(clamped) {
            self.report_fault("position command", &e);
            return Err(e.into());
        }
        Ok(clamped)
    }

    /// Last accepted target height.
    #[inline]
    pub fn target_height(&self) -> f64 {
        self.target.load()
    }

    /// Handle for reading the target from other threads.
    pub fn shared_target(&self) -> SharedTarget {
        self.target.clone()
    }

    /// Measured height, read live from the driver.
    pub fn height(&self) -> Result<f64, HalError> {
        self.driver.measured_position()
    }

    /// Run one control cycle. Never blocks.
    pub fn tick(&mut self) -> TickOutcome {
        let target = self.target.load();
        let measured = match self.driver.measured_position() {
            Ok(height) => height,
            Err(e) => {
                self.report_fault("position read", &e);
                return TickOutcome::Skipped(e);
            }
        };

        let zone = self.guards.classify(target, measured);
        if self.last_zone != Some(zone) {
            debug!(
                "Guard zone {:?} -> {:?} (target={}, measured={:.3})",
                self.last_zone, zone, target, measured
            );
            self.last_zone = Some(zone);
        }

        let result = match self.guards.hold_voltage(zone) {
            Some(volts) => self.driver.apply_voltage_command(volts),
            None => self.driver.apply_position_command(target),
        };
        if let Err(e) = result {
            self.report_fault("tick command", &e);
            return TickOutcome::Skipped(e);
        }

        TickOutcome::Applied {
            zone,
            measured,
            target,
        }
    }

    /// Advance background driver state by `dt` (simulation physics).
    pub fn update_driver(&mut self, dt: Duration) -> Result<(), HalError> {
        self.driver.update(dt)
    }

    /// Guard thresholds in force.
    pub fn guards(&self) -> GuardThresholds {
        self.guards
    }

    /// Driver faults seen since construction.
    pub fn fault_count(&self) -> u64 {
        self.fault_count
    }

    /// Driver counters, if the driver keeps any.
    pub fn diagnostics(&self) -> Option<DriverDiagnostics> {
        self.driver.diagnostics()
    }

    /// Whether the driver has been released.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Neutralise outputs and release the driver. Idempotent once it succeeds.
    ///
    /// A failed driver shutdown leaves the controller armed, so a later call
    /// (or drop) tries again.
    pub fn shutdown(&mut self) -> Result<(), ControlError> {
        if self.shut_down {
            return Ok(());
        }
        if let Some(diag) = self.driver.diagnostics() {
            info!(
                "Driver diagnostics: commands={}, reads={}, failed_commands={}, failed_reads={}",
                diag.commands_applied, diag.position_reads, diag.failed_commands, diag.failed_reads
            );
        }
        self.driver.shutdown()?;
        self.shut_down = true;
        info!("Elevator controller shut down ({} driver faults)", self.fault_count);
        Ok(())
    }

    /// Count a fault and log it, rate-limited. Bus errors are expected to
    /// clear and log at WARN; anything else needs attention and logs at ERROR.
    fn report_fault(&mut self, what: &str, err: &HalError) {
        self.fault_count += 1;
        if self.fault_count > 10 && self.fault_count % 1000 != 0 {
            return;
        }
        if err.is_transient() {
            warn!("Driver fault on {} (#{}): {}", what, self.fault_count, err);
        } else {
            error!("Persistent driver fault on {} (#{}): {}", what, self.fault_count, err);
        }
    }
}

impl<D: ActuatorDriver> Drop for ElevatorController<D> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Driver shutdown failed: {e}");
        }
    }
}
