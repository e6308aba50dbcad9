//! Integration test: Pause / Proceed restore contract.
//!
//! Proceed restores the operating state and the exact active step captured
//! when Pausing was entered, including its elapsed time. The step timer does
//! not run while paused.

use std::time::Duration;

use evo_common::sequencer::command::{Command, CommandSet};
use evo_common::sequencer::permissive::PermissiveGroup;
use evo_common::sequencer::state::OperatingState;
use evo_common::sequencer::step::StepId;

use super::harness::Cell;

/// Running in step 20 with `secs` elapsed.
fn running_for(secs: u64) -> Cell {
    let mut cell = Cell::idle();
    cell.pulse(CommandSet::START);
    for _ in 0..secs {
        cell.cycle();
    }
    assert_eq!(cell.controller.active_step().elapsed, Duration::from_secs(secs));
    cell
}

#[test]
fn pause_and_proceed_restore_step_and_elapsed() {
    let mut cell = running_for(2);

    // The step ticks once more in the cycle that accepts Pause.
    let status = cell.pulse(CommandSet::PAUSE);
    assert_eq!(status.state, OperatingState::Pausing);
    let snapshot = status.active_step;
    assert_eq!(snapshot.step_id, StepId(20));
    assert_eq!(snapshot.elapsed, Duration::from_secs(3));

    assert_eq!(cell.cycle().state, OperatingState::Paused);
    for _ in 0..10 {
        let status = cell.cycle();
        assert_eq!(status.state, OperatingState::Paused);
        assert!(status.outputs_deenergized());
    }

    assert_eq!(cell.pulse(CommandSet::PROCEED).state, OperatingState::Proceeding);
    let status = cell.cycle();
    assert_eq!(status.state, OperatingState::Running);
    assert_eq!(status.active_step, snapshot);

    // Two more ticks reach the 5 s window.
    assert_eq!(cell.cycle().active_step.step_id, StepId(20));
    assert_eq!(cell.cycle().active_step.step_id, StepId(21));
}

#[test]
fn proceed_gated_by_proceed_permissive() {
    let mut cell = running_for(1);
    cell.pulse(CommandSet::PAUSE);
    cell.cycle();

    cell.set_group(PermissiveGroup::Proceed, 0b01, 0);
    let status = cell.pulse(CommandSet::PROCEED);
    assert_eq!(status.state, OperatingState::Paused);
    assert_eq!(status.blocked, Some(Command::Proceed));

    cell.set_group(PermissiveGroup::Proceed, 0b11, 0);
    assert_eq!(cell.pulse(CommandSet::PROCEED).state, OperatingState::Proceeding);
}

#[test]
fn stop_from_paused_discards_snapshot() {
    let mut cell = running_for(1);
    cell.pulse(CommandSet::PAUSE);
    cell.cycle();

    assert_eq!(cell.pulse(CommandSet::STOP).state, OperatingState::Stopping);
    assert_eq!(cell.cycle().state, OperatingState::Stopped);
    cell.pulse(CommandSet::RESET);

    let status = cell.pulse(CommandSet::START);
    assert_eq!(status.active_step.step_id, StepId(20));
    assert_eq!(status.active_step.elapsed, Duration::ZERO);
}

#[test]
fn pause_ignored_outside_running() {
    let mut cell = Cell::idle();
    let status = cell.pulse(CommandSet::PAUSE);
    assert_eq!(status.state, OperatingState::Idle);
    assert_eq!(status.blocked, None);
}
