//! Integration test: full operating round trip.
//!
//! Undefined → Idle → Homing → Homed → Running (two steps) → Complete,
//! then the AutoRun re-trigger back into Running.

use evo_common::sequencer::command::CommandSet;
use evo_common::sequencer::permissive::PermissiveGroup;
use evo_common::sequencer::state::OperatingState;
use evo_common::sequencer::step::StepId;

use super::harness::{CONFIG, Cell};

#[test]
fn cold_start_requires_reset() {
    let mut cell = Cell::new();
    assert_eq!(cell.state(), OperatingState::Undefined);
    for _ in 0..3 {
        assert_eq!(cell.cycle().state, OperatingState::Undefined);
    }
    let status = cell.pulse(CommandSet::RESET);
    assert_eq!(status.state, OperatingState::Idle);
    assert!(status.fault_code.is_none());
}

#[test]
fn home_run_complete_and_auto_restart() {
    let mut cell = Cell::idle();

    let status = cell.pulse(CommandSet::HOME);
    assert_eq!(status.state, OperatingState::Homing);
    assert_eq!(status.active_step.step_id, StepId(10));
    // Entry cycle latches nothing yet.
    assert!(status.outputs_deenergized());

    let status = cell.cycle();
    assert!(status.outputs[0].retract);
    assert!(status.active_step.permissions_ok);

    let status = cell.complete_step();
    assert_eq!(status.state, OperatingState::Homed);
    assert!(status.active_step.is_idle());
    assert!(status.outputs_deenergized());

    let status = cell.pulse(CommandSet::START);
    assert_eq!(status.state, OperatingState::Running);
    assert_eq!(status.active_step.step_id, StepId(20));

    let status = cell.cycle();
    assert!(status.outputs[0].advance);
    assert!(!status.outputs[0].retract);

    let status = cell.complete_step();
    assert_eq!(status.active_step.step_id, StepId(30));
    assert_eq!(status.state, OperatingState::Running);

    let status = cell.cycle();
    assert!(status.outputs[0].retract);

    let status = cell.complete_step();
    assert_eq!(status.state, OperatingState::Complete);
    assert!(status.active_step.is_idle());

    let status = cell.cycle();
    assert_eq!(status.state, OperatingState::Running);
    assert_eq!(status.active_step.step_id, StepId(20));
    assert!(status.last_fault_code.is_none());
}

#[test]
fn auto_restart_waits_for_auto_interlock() {
    let mut cell = Cell::idle();
    cell.pulse(CommandSet::START);
    cell.complete_step();
    cell.complete_step();
    assert_eq!(cell.state(), OperatingState::Complete);

    cell.set_group(PermissiveGroup::AutoInterlock, 0b01, 0);
    for _ in 0..3 {
        assert_eq!(cell.cycle().state, OperatingState::Complete);
    }
    cell.set_group(PermissiveGroup::AutoInterlock, 0b11, 0);
    assert_eq!(cell.cycle().state, OperatingState::Running);
}

#[test]
fn settled_states_are_idempotent_without_commands() {
    let mut cell = Cell::idle();
    let first = cell.cycle();
    for _ in 0..10 {
        let status = cell.cycle();
        assert_eq!(status.state, first.state);
        assert_eq!(status.active_step, first.active_step);
        assert_eq!(status.outputs, first.outputs);
    }

    let mut cell = Cell::from_config(&CONFIG.replace("auto_run = true", "auto_run = false"));
    cell.pulse(CommandSet::RESET);
    cell.pulse(CommandSet::START);
    cell.complete_step();
    cell.complete_step();
    for _ in 0..10 {
        assert_eq!(cell.cycle().state, OperatingState::Complete);
    }
    assert_eq!(cell.pulse(CommandSet::START).state, OperatingState::Running);
}

#[test]
fn controlled_stop_and_reset() {
    let mut cell = Cell::idle();
    cell.pulse(CommandSet::START);
    cell.cycle();

    let status = cell.pulse(CommandSet::STOP);
    assert_eq!(status.state, OperatingState::Stopping);
    // No stopping program configured: settles on the next cycle.
    let status = cell.cycle();
    assert_eq!(status.state, OperatingState::Stopped);
    assert!(status.outputs_deenergized());

    assert_eq!(cell.pulse(CommandSet::RESET).state, OperatingState::Idle);
}
