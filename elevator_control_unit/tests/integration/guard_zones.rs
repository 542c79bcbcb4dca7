//! Integration test: end-stop guard zones.
//!
//! Validates: bottom hold (0 V), top hold (kg_top), tracking otherwise,
//! strict threshold comparisons at min+1, min+2 and max-8, and full moves
//! into both stops with the simulated carriage.

use elevator_common::elevator::GuardZone;
use elevator_common::hal::types::AppliedControl;
use elevator_control_unit::TickOutcome;

use super::{run_cycles, sim_controller_at, sim_runner};

#[test]
fn low_target_near_bottom_applies_zero_volts() {
    let (mut controller, sim) = sim_controller_at(1.0);
    assert_eq!(controller.set_target(-1.0), Ok(0.0));

    assert_eq!(
        controller.tick(),
        TickOutcome::Applied {
            zone: GuardZone::BottomHold,
            measured: 1.0,
            target: 0.0
        }
    );
    assert_eq!(
        sim.applied_control(),
        AppliedControl::Voltage { volts: 0.0 }
    );
}

#[test]
fn high_target_near_top_applies_hold_voltage() {
    let (mut controller, sim) = sim_controller_at(80.0);
    controller.set_target(81.0).unwrap();

    assert_eq!(controller.tick().zone(), Some(GuardZone::TopHold));
    assert_eq!(
        sim.applied_control(),
        AppliedControl::Voltage { volts: 0.5 }
    );
}

#[test]
fn mid_target_from_top_tracks() {
    let (mut controller, sim) = sim_controller_at(80.0);
    controller.set_target(40.0).unwrap();

    assert_eq!(controller.tick().zone(), Some(GuardZone::Tracking));
    assert_eq!(
        sim.applied_control(),
        AppliedControl::PositionProfile { target: 40.0 }
    );
}

#[test]
fn bottom_target_threshold_is_exclusive() {
    let (mut controller, _sim) = sim_controller_at(0.5);
    controller.set_target(1.0).unwrap();
    assert_eq!(controller.tick().zone(), Some(GuardZone::Tracking));

    controller.set_target(0.99).unwrap();
    assert_eq!(controller.tick().zone(), Some(GuardZone::BottomHold));
}

#[test]
fn bottom_position_threshold_is_exclusive() {
    let (mut controller, sim) = sim_controller_at(2.0);
    controller.set_target(0.0).unwrap();
    assert_eq!(controller.tick().zone(), Some(GuardZone::Tracking));

    sim.set_position(1.99);
    assert_eq!(controller.tick().zone(), Some(GuardZone::BottomHold));
}

#[test]
fn top_threshold_is_exclusive_on_both_inputs() {
    let (mut controller, sim) = sim_controller_at(73.0);
    controller.set_target(81.0).unwrap();
    assert_eq!(controller.tick().zone(), Some(GuardZone::Tracking));

    sim.set_position(80.0);
    controller.set_target(73.0).unwrap();
    assert_eq!(controller.tick().zone(), Some(GuardZone::Tracking));

    controller.set_target(73.01).unwrap();
    assert_eq!(controller.tick().zone(), Some(GuardZone::TopHold));
}

#[test]
fn zone_is_recomputed_every_tick() {
    let (mut controller, sim) = sim_controller_at(80.0);
    controller.set_target(81.0).unwrap();
    assert_eq!(controller.tick().zone(), Some(GuardZone::TopHold));

    sim.set_position(72.0);
    assert_eq!(controller.tick().zone(), Some(GuardZone::Tracking));

    sim.set_position(74.0);
    assert_eq!(controller.tick().zone(), Some(GuardZone::TopHold));
}

#[test]
fn full_raise_ends_held_against_top_stop() {
    let (mut runner, sim) = sim_runner();
    runner.setpoint_sender().set_height(81.0).unwrap();
    run_cycles(&mut runner, 800);

    let height = runner.controller().height().unwrap();
    assert!((height - 81.0).abs() < 0.5, "height={height}");
    assert_eq!(runner.status().zone(), GuardZone::TopHold);
    assert_eq!(
        sim.applied_control(),
        AppliedControl::Voltage { volts: 0.5 }
    );
}

#[test]
fn full_lower_ends_at_zero_volts_on_bottom_stop() {
    let (mut runner, sim) = sim_runner();
    sim.set_position(60.0);
    runner.setpoint_sender().set_height(0.0).unwrap();
    run_cycles(&mut runner, 400);

    let height = runner.controller().height().unwrap();
    assert!(height.abs() < 0.5, "height={height}");
    assert_eq!(runner.status().zone(), GuardZone::BottomHold);
    assert_eq!(
        sim.applied_control(),
        AppliedControl::Voltage { volts: 0.0 }
    );
}
