//! Integration test: step timeout, external fault and retry.

use std::time::Duration;

use evo_common::sequencer::command::CommandSet;
use evo_common::sequencer::fault::FaultCode;
use evo_common::sequencer::permissive::PermissiveInput;
use evo_common::sequencer::state::OperatingState;
use evo_common::sequencer::step::StepId;

use super::harness::Cell;

fn running() -> Cell {
    let mut cell = Cell::idle();
    let status = cell.pulse(CommandSet::START);
    assert_eq!(status.active_step.step_id, StepId(20));
    assert_eq!(status.active_step.elapsed, Duration::ZERO);
    cell
}

#[test]
fn timeout_moves_to_fault_step_on_fifth_tick() {
    let mut cell = running();
    for tick in 1..5 {
        let status = cell.cycle();
        assert_eq!(status.active_step.step_id, StepId(20), "tick {tick}");
        assert_eq!(status.active_step.elapsed, Duration::from_secs(tick));
    }

    let status = cell.cycle();
    assert_eq!(status.active_step.step_id, StepId(21));
    assert_eq!(status.active_step.fault_code, Some(FaultCode::Timeout));
    assert_eq!(status.last_fault_code, Some(FaultCode::Timeout));
    assert!(status.outputs_deenergized());
    // Step faults stay local to the step.
    assert_eq!(status.state, OperatingState::Running);
    assert!(status.fault_code.is_none());

    for _ in 0..3 {
        let status = cell.cycle();
        assert_eq!(status.active_step.step_id, StepId(21));
        assert!(status.outputs_deenergized());
    }
}

#[test]
fn retry_reenters_base_step_with_fresh_timer() {
    let mut cell = running();
    for _ in 0..5 {
        cell.cycle();
    }
    assert_eq!(cell.step(), StepId(21));

    let status = cell.pulse(CommandSet::RETRY);
    assert_eq!(status.active_step.step_id, StepId(20));
    assert_eq!(status.active_step.elapsed, Duration::ZERO);
    assert!(status.active_step.fault_code.is_none());
    assert_eq!(status.state, OperatingState::Running);
    // Most recent fault remains visible.
    assert_eq!(status.last_fault_code, Some(FaultCode::Timeout));

    let status = cell.cycle();
    assert!(status.outputs[0].advance);
}

#[test]
fn external_fault_is_not_retryable_by_default() {
    let mut cell = running();
    cell.inputs.external_fault = true;
    let status = cell.cycle();
    assert_eq!(status.active_step.step_id, StepId(21));
    assert_eq!(status.active_step.fault_code, Some(FaultCode::ExternalFault));
    cell.inputs.external_fault = false;

    let status = cell.pulse(CommandSet::RETRY);
    assert_eq!(status.active_step.step_id, StepId(21));
    assert_eq!(status.active_step.fault_code, Some(FaultCode::ExternalFault));

    // Stop and Reset are the way out.
    assert_eq!(cell.pulse(CommandSet::STOP).state, OperatingState::Stopping);
    assert_eq!(cell.cycle().state, OperatingState::Stopped);
    let status = cell.pulse(CommandSet::RESET);
    assert_eq!(status.state, OperatingState::Idle);
    assert!(status.active_step.is_idle());
}

#[test]
fn blocked_step_holds_outputs_off_and_still_times_out() {
    let mut cell = running();
    cell.inputs.step_permissives = PermissiveInput::new(0, 0);
    cell.inputs.step_done = true;
    for _ in 1..5 {
        let status = cell.cycle();
        assert_eq!(status.active_step.step_id, StepId(20));
        assert!(!status.active_step.permissions_ok);
        assert!(!status.step_permissive.ok);
        assert!(status.outputs_deenergized());
    }
    let status = cell.cycle();
    assert_eq!(status.active_step.step_id, StepId(21));
}

#[test]
fn step_bypass_releases_required_bit() {
    let mut cell = running();
    cell.inputs.step_permissives = PermissiveInput::new(0, 0b1);
    let status = cell.cycle();
    assert!(status.active_step.permissions_ok);
    assert_eq!(status.step_permissive.bypassed_count(), 1);
    assert!(status.outputs[0].advance);
}
