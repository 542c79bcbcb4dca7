//! Integration test: driver faults.
//!
//! Validates: a failed read or command skips the cycle without changing the
//! target, the loop keeps running, and the next healthy tick retries.

use elevator_common::elevator::GuardZone;
use elevator_common::hal::driver::HalError;
use elevator_common::hal::types::AppliedControl;
use elevator_control_unit::{ControlError, TickOutcome};

use super::{run_cycles, sim_controller_at, sim_runner};

#[test]
fn read_fault_skips_the_cycle() {
    let (mut controller, sim) = sim_controller_at(30.0);
    controller.set_target(50.0).unwrap();
    let commands = sim.counters().commands_applied;

    sim.fail_next_reads(1);
    assert!(matches!(
        controller.tick(),
        TickOutcome::Skipped(HalError::CommunicationError(_))
    ));
    // Nothing issued on the skipped tick.
    assert_eq!(sim.counters().commands_applied, commands);
    assert_eq!(controller.target_height(), 50.0);

    assert_eq!(controller.tick().zone(), Some(GuardZone::Tracking));
    assert_eq!(
        sim.applied_control(),
        AppliedControl::PositionProfile { target: 50.0 }
    );
}

#[test]
fn command_fault_skips_and_next_tick_retries() {
    let (mut controller, sim) = sim_controller_at(80.0);
    controller.set_target(81.0).unwrap();

    sim.fail_next_commands(1);
    assert!(matches!(controller.tick(), TickOutcome::Skipped(_)));
    assert_eq!(controller.fault_count(), 1);

    assert_eq!(controller.tick().zone(), Some(GuardZone::TopHold));
    assert_eq!(
        sim.applied_control(),
        AppliedControl::Voltage { volts: 0.5 }
    );
}

#[test]
fn failed_set_target_still_stores_target() {
    let (mut controller, sim) = sim_controller_at(10.0);
    sim.fail_next_commands(1);

    assert!(matches!(
        controller.set_target(90.0),
        Err(ControlError::Driver(HalError::CommunicationError(_)))
    ));
    assert_eq!(controller.target_height(), 81.0);

    assert!(controller.tick().is_applied());
    assert_eq!(
        sim.applied_control(),
        AppliedControl::PositionProfile { target: 81.0 }
    );
}

#[test]
fn loop_survives_a_burst_of_faults() {
    let (mut runner, sim) = sim_runner();
    runner.setpoint_sender().set_height(40.0).unwrap();
    runner.step();

    sim.fail_next_reads(25);
    run_cycles(&mut runner, 25);
    assert_eq!(runner.stats().skipped, 25);
    assert_eq!(runner.status().snapshot().skipped, 25);

    run_cycles(&mut runner, 300);
    let height = runner.controller().height().unwrap();
    assert!((height - 40.0).abs() < 0.5, "height={height}");
    assert_eq!(runner.stats().skipped, 25);
    assert_eq!(runner.stats().cycle_count, 326);
}

#[test]
fn diagnostics_count_injected_faults() {
    let (mut controller, sim) = sim_controller_at(30.0);
    sim.fail_next_reads(3);
    for _ in 0..5 {
        controller.tick();
    }
    let diag = controller.diagnostics().unwrap();
    assert_eq!(diag.failed_reads, 3);
    assert_eq!(diag.position_reads, 2);
}
