//! Integration test: target clamping and setpoint requests.
//!
//! Validates: `set_target` saturates into [0, 81], commands the leader at
//! once, is idempotent, and requests queued from other threads reach the
//! controller before the next tick.

use elevator_common::elevator::GuardZone;
use elevator_common::hal::types::AppliedControl;
use elevator_control_unit::ControlError;

use super::{run_cycles, sim_controller, sim_runner};

#[test]
fn mid_range_target_is_commanded_immediately() {
    let (mut controller, sim) = sim_controller();
    assert_eq!(controller.set_target(40.5), Ok(40.5));
    assert_eq!(controller.target_height(), 40.5);
    assert_eq!(
        sim.applied_control(),
        AppliedControl::PositionProfile { target: 40.5 }
    );
}

#[test]
fn targets_outside_travel_saturate() {
    let (mut controller, sim) = sim_controller();
    assert_eq!(controller.set_target(82.0), Ok(81.0));
    assert_eq!(controller.target_height(), 81.0);
    assert_eq!(
        sim.applied_control(),
        AppliedControl::PositionProfile { target: 81.0 }
    );

    assert_eq!(controller.set_target(-1.0), Ok(0.0));
    assert_eq!(controller.target_height(), 0.0);

    assert_eq!(controller.set_target(1e9), Ok(81.0));
    assert_eq!(controller.set_target(-1e9), Ok(0.0));
}

#[test]
fn bounds_themselves_are_accepted_unchanged() {
    let (mut controller, _sim) = sim_controller();
    assert_eq!(controller.set_target(0.0), Ok(0.0));
    assert_eq!(controller.set_target(81.0), Ok(81.0));
}

#[test]
fn repeated_set_target_is_idempotent() {
    let (mut controller, sim) = sim_controller();
    for _ in 0..3 {
        assert_eq!(controller.set_target(55.25), Ok(55.25));
        assert_eq!(controller.target_height(), 55.25);
    }
    assert_eq!(
        sim.applied_control(),
        AppliedControl::PositionProfile { target: 55.25 }
    );
}

#[test]
fn nan_request_leaves_target_alone() {
    let (mut controller, _sim) = sim_controller();
    controller.set_target(20.0).unwrap();
    assert!(matches!(
        controller.set_target(f64::NAN),
        Err(ControlError::NonFiniteTarget(_))
    ));
    assert_eq!(controller.target_height(), 20.0);
}

#[test]
fn carriage_reaches_mid_range_target() {
    let (mut runner, _sim) = sim_runner();
    runner.setpoint_sender().set_height(40.5).unwrap();
    run_cycles(&mut runner, 250);

    let height = runner.controller().height().unwrap();
    assert!((height - 40.5).abs() < 0.5, "height={height}");
    assert_eq!(runner.status().zone(), GuardZone::Tracking);
}

#[test]
fn last_request_in_a_batch_wins() {
    let (mut runner, _sim) = sim_runner();
    let tx = runner.setpoint_sender();
    tx.set_height(10.0).unwrap();
    tx.set_height(90.0).unwrap();
    tx.set_height(25.0).unwrap();
    runner.step();
    assert_eq!(runner.controller().target_height(), 25.0);
    assert_eq!(runner.status().target(), 25.0);
}

#[test]
fn deferred_request_reads_source_on_loop_thread() {
    let (mut runner, _sim) = sim_runner();
    let tx = runner.setpoint_sender();
    let handle = std::thread::spawn(move || tx.set_height_from(|| 100.0));
    handle.join().unwrap().unwrap();

    runner.step();
    assert_eq!(runner.controller().target_height(), 81.0);
}

#[test]
fn shared_target_is_visible_to_other_threads() {
    let (mut controller, _sim) = sim_controller();
    let shared = controller.shared_target();
    controller.set_target(64.0).unwrap();
    let seen = std::thread::spawn(move || shared.load()).join().unwrap();
    assert_eq!(seen, 64.0);
}
