//! Integration test: conflict and discordance de-energize in the same cycle.

use evo_common::sequencer::command::{Command, CommandSet};
use evo_common::sequencer::fault::FaultCode;
use evo_common::sequencer::io::{ActuatorFeedback, ActuatorRequest};
use evo_common::sequencer::permissive::PermissiveGroup;
use evo_common::sequencer::state::OperatingState;

use super::harness::Cell;

const BOTH: ActuatorRequest = ActuatorRequest {
    advance: true,
    retract: true,
};

#[test]
fn conflicting_request_faults_and_cuts_outputs_same_cycle() {
    let mut cell = Cell::idle();
    cell.pulse(CommandSet::START);
    assert!(cell.cycle().outputs[0].advance);

    cell.inputs.manual[0] = BOTH;
    let status = cell.cycle();
    assert_eq!(status.state, OperatingState::Fault);
    assert_eq!(status.fault_code, Some(FaultCode::ConflictingCommands));
    assert_eq!(status.last_fault_code, Some(FaultCode::ConflictingCommands));
    assert!(status.outputs_deenergized());
    assert!(status.active_step.is_idle());
}

#[test]
fn reset_refused_while_conflict_asserted() {
    let mut cell = Cell::idle();
    cell.inputs.manual[0] = BOTH;
    assert_eq!(cell.cycle().state, OperatingState::Fault);

    let status = cell.pulse(CommandSet::RESET);
    assert_eq!(status.state, OperatingState::Fault);
    assert_eq!(status.blocked, Some(Command::Reset));
    assert!(status.outputs_deenergized());

    cell.inputs.manual[0] = ActuatorRequest::default();
    let status = cell.pulse(CommandSet::RESET);
    assert_eq!(status.state, OperatingState::Idle);
    assert!(status.fault_code.is_none());
    assert_eq!(status.last_fault_code, Some(FaultCode::ConflictingCommands));
}

#[test]
fn refused_reset_keeps_fault_cause() {
    let mut cell = Cell::idle();
    cell.inputs.manual[0] = BOTH;
    assert_eq!(cell.cycle().state, OperatingState::Fault);
    cell.inputs.manual[0] = ActuatorRequest::default();

    cell.set_group(PermissiveGroup::Reset, 0, 0);
    let status = cell.pulse(CommandSet::RESET);
    assert_eq!(status.state, OperatingState::Fault);
    assert_eq!(status.blocked, Some(Command::Reset));
    assert_eq!(status.fault_code, Some(FaultCode::ConflictingCommands));
    assert_eq!(status.last_fault_code, Some(FaultCode::ConflictingCommands));

    cell.set_group(PermissiveGroup::Reset, 0b1, 0);
    let status = cell.pulse(CommandSet::RESET);
    assert_eq!(status.state, OperatingState::Idle);
    assert_eq!(status.last_fault_code, Some(FaultCode::ConflictingCommands));
}

#[test]
fn no_end_position_at_rest_is_undefined() {
    let mut cell = Cell::idle();
    cell.inputs.feedback[0] = ActuatorFeedback::default();
    cell.inputs.manual[0].advance = true;
    let status = cell.cycle();
    assert_eq!(status.state, OperatingState::Undefined);
    assert_eq!(status.fault_code, Some(FaultCode::UndefinedState));
    assert!(status.outputs_deenergized());
}

#[test]
fn lost_end_position_recovers_through_reset_and_jog() {
    let mut cell = Cell::idle();
    cell.inputs.feedback[0] = ActuatorFeedback::default();
    assert_eq!(cell.cycle().state, OperatingState::Undefined);
    assert_eq!(cell.cycle().state, OperatingState::Undefined);

    // Position unknown, not discordant: Reset and jog back to an end.
    let status = cell.pulse(CommandSet::RESET);
    assert_eq!(status.state, OperatingState::Idle);
    assert_eq!(status.last_fault_code, Some(FaultCode::UndefinedState));

    cell.inputs.manual[0].retract = true;
    assert!(cell.cycle().outputs[0].retract);
    cell.inputs.feedback[0] = ActuatorFeedback::RETRACTED;
    cell.inputs.manual[0].retract = false;
    for _ in 0..3 {
        assert_eq!(cell.cycle().state, OperatingState::Idle);
    }
}

#[test]
fn moving_actuator_may_leave_its_end() {
    let mut cell = Cell::idle();
    cell.pulse(CommandSet::START);
    assert!(cell.cycle().outputs[0].advance);

    cell.inputs.feedback[0] = ActuatorFeedback::default();
    for _ in 0..3 {
        let status = cell.cycle();
        assert_eq!(status.state, OperatingState::Running);
        assert!(status.outputs[0].advance);
    }
    cell.inputs.feedback[0] = ActuatorFeedback::ADVANCED;
    assert_eq!(cell.complete_step().active_step.step_id.0, 30);
}

#[test]
fn both_ends_is_undefined_even_while_driven() {
    let mut cell = Cell::idle();
    cell.pulse(CommandSet::START);
    cell.cycle();

    cell.inputs.feedback[0] = ActuatorFeedback {
        advanced: true,
        retracted: true,
    };
    let status = cell.cycle();
    assert_eq!(status.state, OperatingState::Undefined);
    assert_eq!(status.fault_code, Some(FaultCode::UndefinedState));
    assert!(status.outputs_deenergized());

    cell.inputs.feedback[0] = ActuatorFeedback::RETRACTED;
    assert_eq!(cell.pulse(CommandSet::RESET).state, OperatingState::Idle);
}

#[test]
fn manual_jog_only_in_settled_states() {
    let mut cell = Cell::idle();
    cell.inputs.manual[0].advance = true;
    assert!(cell.cycle().outputs[0].advance);

    cell.inputs.manual[0].advance = false;
    cell.inputs.manual[0].retract = true;
    cell.pulse(CommandSet::START);
    // Running drives the program plan, not the jog request.
    let status = cell.cycle();
    assert!(status.outputs[0].advance);
    assert!(!status.outputs[0].retract);
}
