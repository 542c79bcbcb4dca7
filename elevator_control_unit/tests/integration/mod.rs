//! Shared helpers for the integration suites.

mod driver_faults;
mod guard_zones;
mod lifecycle;
mod setpoint;

use elevator_common::elevator::ElevatorConfig;
use elevator_control_unit::ElevatorController;
use elevator_control_unit::cycle::CycleRunner;
use elevator_hal::{SimulationDriver, SimulationHandle};

/// Controller on a fresh simulation driver with the default calibration,
/// plus the plant handle.
pub fn sim_controller() -> (ElevatorController<SimulationDriver>, SimulationHandle) {
    let config = ElevatorConfig::default();
    let driver = SimulationDriver::new(&config);
    let sim = driver.handle();
    (ElevatorController::new(&config, driver).unwrap(), sim)
}

/// Controller whose carriage is seeded at `height` (no physics stepping).
pub fn sim_controller_at(height: f64) -> (ElevatorController<SimulationDriver>, SimulationHandle) {
    let (controller, sim) = sim_controller();
    sim.set_position(height);
    (controller, sim)
}

/// Cycle runner over a fresh simulation controller, plus the plant handle.
pub fn sim_runner() -> (CycleRunner<SimulationDriver>, SimulationHandle) {
    let (controller, sim) = sim_controller();
    (CycleRunner::new(controller, ElevatorConfig::default().cycle_time()), sim)
}

/// Step `runner` `cycles` times.
pub fn run_cycles(runner: &mut CycleRunner<SimulationDriver>, cycles: usize) {
    for _ in 0..cycles {
        runner.step();
    }
}
