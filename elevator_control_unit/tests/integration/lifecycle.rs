//! Integration test: construction, shutdown and driver release.
//!
//! Validates: configs load from TOML and build a controller through the
//! registry, invalid configs are fatal, and the driver is neutralised on
//! explicit shutdown and on drop.

use std::io::Write;
use std::sync::{Arc, Mutex};

use elevator_common::config::{ConfigError, ConfigLoader};
use elevator_common::elevator::ElevatorConfig;
use elevator_common::hal::driver::{ActuatorDriver, HalError};
use elevator_common::hal::types::{ActuatorSetup, AppliedControl};
use elevator_control_unit::{ControlError, ElevatorController};
use elevator_hal::{DriverRegistry, SimulationDriver};

/// Simulation driver that reports its shutdown count through shared state.
struct Tracked {
    inner: SimulationDriver,
    shutdowns: Arc<Mutex<u32>>,
    fail_init: bool,
}

impl ActuatorDriver for Tracked {
    fn name(&self) -> &'static str {
        "tracked"
    }

    fn version(&self) -> &'static str {
        self.inner.version()
    }

    fn init(&mut self, setup: &ActuatorSetup) -> Result<(), HalError> {
        if self.fail_init {
            return Err(HalError::InitFailed("bus unavailable".to_string()));
        }
        self.inner.init(setup)
    }

    fn apply_position_command(&mut self, target: f64) -> Result<(), HalError> {
        self.inner.apply_position_command(target)
    }

    fn apply_voltage_command(&mut self, volts: f64) -> Result<(), HalError> {
        self.inner.apply_voltage_command(volts)
    }

    fn measured_position(&self) -> Result<f64, HalError> {
        self.inner.measured_position()
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        *self.shutdowns.lock().unwrap() += 1;
        self.inner.shutdown()
    }
}

fn tracked(fail_init: bool) -> (Tracked, Arc<Mutex<u32>>) {
    let shutdowns = Arc::new(Mutex::new(0));
    let driver = Tracked {
        inner: SimulationDriver::new(&ElevatorConfig::default()),
        shutdowns: Arc::clone(&shutdowns),
        fail_init,
    };
    (driver, shutdowns)
}

#[test]
fn controller_builds_from_toml_through_registry() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
initial_target = 12.0

[travel]
min_height = 0.0
max_height = 60.0

[guard]
kg_top = 0.7
"#
    )
    .unwrap();

    let config = ElevatorConfig::load_validated(file.path()).unwrap();
    let driver = DriverRegistry::with_builtin_drivers()
        .create_driver("simulation", &config)
        .unwrap();
    let mut controller = ElevatorController::new(&config, driver).unwrap();

    assert_eq!(controller.target_height(), 12.0);
    assert_eq!(controller.set_target(70.0), Ok(60.0));
    assert_eq!(controller.guards().top, 52.0);
    assert_eq!(controller.guards().kg_top, 0.7);
}

#[test]
fn unknown_driver_name_is_reported() {
    let config = ElevatorConfig::default();
    let result = DriverRegistry::with_builtin_drivers().create_driver("talonfx", &config);
    assert!(matches!(result, Err(HalError::DriverNotFound(_))));
}

#[test]
fn inverted_travel_range_is_fatal() {
    let config = ElevatorConfig::from_toml_str(
        r#"
[travel]
min_height = 81.0
max_height = 0.0
"#,
    )
    .unwrap();
    let (driver, shutdowns) = tracked(false);
    let result = ElevatorController::new(&config, driver);
    assert!(matches!(
        result,
        Err(ControlError::Config(ConfigError::ValidationError(_)))
    ));
    assert_eq!(*shutdowns.lock().unwrap(), 1);
}

#[test]
fn init_failure_releases_driver() {
    let (driver, shutdowns) = tracked(true);
    let result = ElevatorController::new(&ElevatorConfig::default(), driver);
    assert!(matches!(
        result,
        Err(ControlError::Driver(HalError::InitFailed(_)))
    ));
    assert_eq!(*shutdowns.lock().unwrap(), 1);
}

#[test]
fn drop_shuts_driver_down_once() {
    let (driver, shutdowns) = tracked(false);
    let mut controller = ElevatorController::new(&ElevatorConfig::default(), driver).unwrap();
    controller.set_target(30.0).unwrap();
    controller.tick();
    drop(controller);
    assert_eq!(*shutdowns.lock().unwrap(), 1);
}

#[test]
fn explicit_shutdown_neutralises_and_blocks_commands() {
    let (mut controller, sim) = super::sim_controller_at(40.0);
    controller.set_target(40.0).unwrap();
    controller.shutdown().unwrap();
    controller.shutdown().unwrap();

    assert_eq!(sim.applied_control(), AppliedControl::Neutral);
    assert!(!sim.is_ready());
    assert!(matches!(
        controller.tick(),
        elevator_control_unit::TickOutcome::Skipped(HalError::NotReady(_))
    ));
}

#[test]
fn follower_mirrors_leader_through_a_move() {
    let (mut runner, sim) = super::sim_runner();
    runner.setpoint_sender().set_height(30.0).unwrap();
    super::run_cycles(&mut runner, 200);

    assert!(sim.rotor_position() > 0.0);
    assert!((sim.follower_rotor_position() + sim.rotor_position()).abs() < 1e-9);
}

#[test]
fn plant_handle_outlives_the_controller_without_owning_the_driver() {
    let (mut controller, sim) = super::sim_controller_at(40.0);
    controller.set_target(45.0).unwrap();
    assert!(sim.is_ready());

    drop(controller);
    assert!(!sim.is_ready());
    assert_eq!(sim.applied_control(), AppliedControl::Neutral);
}

#[test]
fn plant_handle_cannot_override_the_guard_decision() {
    let (mut controller, sim) = super::sim_controller_at(1.0);
    controller.set_target(0.0).unwrap();

    // Moving the carriage by hand only changes what the next tick measures.
    sim.set_position(80.0);
    assert_eq!(
        sim.applied_control(),
        AppliedControl::PositionProfile { target: 0.0 }
    );
    assert_eq!(
        controller.tick().zone(),
        Some(elevator_common::elevator::GuardZone::Tracking)
    );

    sim.set_position(1.0);
    assert_eq!(
        controller.tick().zone(),
        Some(elevator_common::elevator::GuardZone::BottomHold)
    );
    assert_eq!(sim.applied_control(), AppliedControl::Voltage { volts: 0.0 });
    assert_eq!(controller.diagnostics().unwrap().commands_applied, 3);
}
