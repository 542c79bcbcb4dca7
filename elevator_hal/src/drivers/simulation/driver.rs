//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements `ActuatorDriver` on top of a software
//! carriage and follower. Plant state lives behind a mutex shared with
//! [`SimulationHandle`], which test code keeps after the driver has been
//! moved into a controller. The handle can seed the carriage, inspect the
//! applied control and inject bus faults; it cannot command or release the
//! motors.

use super::physics::{CarriageSimulator, DriveMode, FollowerSimulator};
use elevator_common::consts::{MAX_OUTPUT_VOLTAGE, SIMULATION_DRIVER};
use elevator_common::elevator::ElevatorConfig;
use elevator_common::hal::driver::{ActuatorDriver, DriverDiagnostics, HalError};
use elevator_common::hal::types::{ActuatorSetup, AppliedControl};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Driver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Ready,
    Shutdown,
}

/// Plant and bookkeeping shared by the driver and its handles.
#[derive(Debug)]
struct SimState {
    /// Lifecycle state
    lifecycle: Lifecycle,
    /// Rotor rotations per mechanism unit (from setup)
    sensor_to_mechanism_ratio: f64,
    /// Leader-driven carriage
    carriage: CarriageSimulator,
    /// Mirrored follower
    follower: FollowerSimulator,
    /// Last accepted control request
    applied: AppliedControl,
    /// Reads still to fail
    failing_reads: u32,
    /// Commands still to fail
    failing_commands: u32,
    /// Counters reported through `diagnostics()`
    diag: DriverDiagnostics,
    /// Simulated time since init
    sim_time: Duration,
}

impl SimState {
    fn ensure_ready(&self) -> Result<(), HalError> {
        match self.lifecycle {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Created => Err(HalError::NotReady("driver not initialized".to_string())),
            Lifecycle::Shutdown => Err(HalError::NotReady("driver shut down".to_string())),
        }
    }

    /// Common gate for every outbound command.
    fn begin_command(&mut self, value: f64, what: &str) -> Result<(), HalError> {
        self.ensure_ready()?;
        if self.failing_commands > 0 {
            self.failing_commands -= 1;
            self.diag.failed_commands += 1;
            return Err(HalError::CommunicationError(format!(
                "injected fault on {what} command"
            )));
        }
        if !value.is_finite() {
            self.diag.failed_commands += 1;
            return Err(HalError::InvalidCommand(format!(
                "{what} command must be finite, got {value}"
            )));
        }
        Ok(())
    }

    fn rotor_position(&self) -> f64 {
        self.carriage.position() * self.sensor_to_mechanism_ratio
    }

    fn sync_follower(&mut self) {
        let leader_rotor = self.rotor_position();
        self.follower.follow(leader_rotor);
    }
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    // Plant state stays consistent across a panicking test thread.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulation driver implementing the `ActuatorDriver` trait.
pub struct SimulationDriver {
    /// Driver version
    version: &'static str,
    /// Shared plant state
    state: Arc<Mutex<SimState>>,
}

impl SimulationDriver {
    /// Create a new simulation driver from the elevator configuration.
    ///
    /// Hard-stops are placed at the travel range; plant constants come from
    /// the `[simulation]` table, with the gravity voltage defaulting to `gains.kg`.
    pub fn new(config: &ElevatorConfig) -> Self {
        let sim = &config.simulation;
        let gravity_volts = sim.gravity_volts.unwrap_or(config.gains.kg);

        let state = SimState {
            lifecycle: Lifecycle::Created,
            sensor_to_mechanism_ratio: config.motors.sensor_to_mechanism_ratio,
            carriage: CarriageSimulator::new(
                config.travel,
                config.motion,
                sim.velocity_per_volt,
                gravity_volts,
                sim.initial_height,
            ),
            follower: FollowerSimulator::new(config.motors.follower_opposed),
            applied: AppliedControl::Neutral,
            failing_reads: 0,
            failing_commands: 0,
            diag: DriverDiagnostics::default(),
            sim_time: Duration::ZERO,
        };

        Self {
            version: env!("CARGO_PKG_VERSION"),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Handle onto this driver's plant, usable after the driver is moved away.
    pub fn handle(&self) -> SimulationHandle {
        SimulationHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl ActuatorDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        SIMULATION_DRIVER
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, setup: &ActuatorSetup) -> Result<(), HalError> {
        let mut state = lock(&self.state);
        if state.lifecycle == Lifecycle::Shutdown {
            return Err(HalError::InitFailed(
                "driver already shut down".to_string(),
            ));
        }
        if !(setup.sensor_to_mechanism_ratio.is_finite() && setup.sensor_to_mechanism_ratio > 0.0) {
            return Err(HalError::InitFailed(format!(
                "sensor_to_mechanism_ratio must be positive, got {}",
                setup.sensor_to_mechanism_ratio
            )));
        }
        if setup.leader_id == setup.follower_id {
            return Err(HalError::InitFailed(format!(
                "leader and follower share device id {}",
                setup.leader_id
            )));
        }

        state.sensor_to_mechanism_ratio = setup.sensor_to_mechanism_ratio;
        state.carriage.configure(setup.motion, setup.neutral_mode);
        state.follower.set_opposed(setup.follower_opposed);
        state.sync_follower();
        state.lifecycle = Lifecycle::Ready;

        info!(
            "Simulation driver ready: leader={} follower={} (opposed={}) on '{}', neutral={:?}",
            setup.leader_id,
            setup.follower_id,
            setup.follower_opposed,
            setup.bus,
            setup.neutral_mode
        );
        debug!(
            "Profile limits: cruise={} accel={} jerk={} (jerk not modelled)",
            setup.motion.cruise_velocity, setup.motion.acceleration, setup.motion.jerk
        );
        Ok(())
    }

    fn apply_position_command(&mut self, target: f64) -> Result<(), HalError> {
        let mut state = lock(&self.state);
        state.begin_command(target, "position")?;
        state.carriage.command(DriveMode::Profile { target });
        state.applied = AppliedControl::PositionProfile { target };
        state.diag.commands_applied += 1;
        Ok(())
    }

    fn apply_voltage_command(&mut self, volts: f64) -> Result<(), HalError> {
        let mut state = lock(&self.state);
        state.begin_command(volts, "voltage")?;
        let volts = volts.clamp(-MAX_OUTPUT_VOLTAGE, MAX_OUTPUT_VOLTAGE);
        state.carriage.command(DriveMode::Voltage { volts });
        state.applied = AppliedControl::Voltage { volts };
        state.diag.commands_applied += 1;
        Ok(())
    }

    fn measured_position(&self) -> Result<f64, HalError> {
        let mut state = lock(&self.state);
        state.ensure_ready()?;
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            state.diag.failed_reads += 1;
            return Err(HalError::CommunicationError(
                "injected fault on position read".to_string(),
            ));
        }
        state.diag.position_reads += 1;
        Ok(state.carriage.position())
    }

    fn update(&mut self, dt: Duration) -> Result<(), HalError> {
        let mut state = lock(&self.state);
        if state.lifecycle != Lifecycle::Ready {
            return Ok(());
        }
        state.carriage.update(dt.as_secs_f64());
        state.sync_follower();
        state.sim_time += dt;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        let mut state = lock(&self.state);
        if state.lifecycle == Lifecycle::Shutdown {
            return Ok(());
        }
        state.carriage.command(DriveMode::Neutral);
        state.applied = AppliedControl::Neutral;
        state.lifecycle = Lifecycle::Shutdown;
        info!(
            "Simulation driver shut down after {:.2}s ({} commands, {} reads)",
            state.sim_time.as_secs_f64(),
            state.diag.commands_applied,
            state.diag.position_reads
        );
        Ok(())
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        let state = lock(&self.state);
        Some(DriverDiagnostics {
            custom: Some(format!(
                "hard_stop_contacts={}",
                state.carriage.hard_stop_contacts()
            )),
            ..state.diag.clone()
        })
    }
}

// ─── Simulation Handle ──────────────────────────────────────────────

/// Plant-side access to a [`SimulationDriver`].
///
/// Models what a bench operator can do to the mechanism: move the carriage
/// by hand, watch the outputs, pull the bus. Motor commands and the driver
/// lifecycle stay with whoever owns the driver.
#[derive(Debug, Clone)]
pub struct SimulationHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimulationHandle {
    /// Seed the measured position (clamped to the hard-stops), carriage at rest.
    pub fn set_position(&self, height: f64) {
        let mut state = lock(&self.state);
        state.carriage.set_position(height);
        state.sync_follower();
    }

    /// Control request most recently accepted by the leader.
    pub fn applied_control(&self) -> AppliedControl {
        lock(&self.state).applied
    }

    /// Fail the next `count` position reads with a communication error.
    pub fn fail_next_reads(&self, count: u32) {
        lock(&self.state).failing_reads = count;
    }

    /// Fail the next `count` commands with a communication error.
    pub fn fail_next_commands(&self, count: u32) {
        lock(&self.state).failing_commands = count;
    }

    /// Carriage height [units].
    pub fn position(&self) -> f64 {
        lock(&self.state).carriage.position()
    }

    /// Leader rotor position [rotations].
    pub fn rotor_position(&self) -> f64 {
        lock(&self.state).rotor_position()
    }

    /// Follower rotor position [rotations].
    pub fn follower_rotor_position(&self) -> f64 {
        lock(&self.state).follower.rotor_position()
    }

    /// Carriage velocity [units/s].
    pub fn velocity(&self) -> f64 {
        lock(&self.state).carriage.velocity()
    }

    /// Times the carriage was driven into a hard-stop.
    pub fn hard_stop_contacts(&self) -> u64 {
        lock(&self.state).carriage.hard_stop_contacts()
    }

    /// Whether `init()` succeeded and `shutdown()` has not run.
    pub fn is_ready(&self) -> bool {
        lock(&self.state).lifecycle == Lifecycle::Ready
    }

    /// Simulated time since init.
    pub fn sim_time(&self) -> Duration {
        lock(&self.state).sim_time
    }

    /// Command and read counters.
    pub fn counters(&self) -> DriverDiagnostics {
        lock(&self.state).diag.clone()
    }
}
