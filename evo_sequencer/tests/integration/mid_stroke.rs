//! Integration test: Stop, Abort, Pause and step changes with an actuator
//! between its end positions.
//!
//! Dropping the drive mid-stroke leaves no confirmed end position. That is
//! not discordance: the commanded state must be reached and the actuator
//! must stay recoverable by jogging.

use evo_common::sequencer::command::CommandSet;
use evo_common::sequencer::io::ActuatorFeedback;
use evo_common::sequencer::state::OperatingState;
use evo_common::sequencer::step::StepId;

use super::harness::{CONFIG, Cell};

/// Running in step 20 with the clamp driven and past its retracted end.
fn clamp_mid_stroke(cell: &mut Cell) {
    cell.pulse(CommandSet::START);
    assert!(cell.cycle().outputs[0].advance);
    cell.inputs.feedback[0] = ActuatorFeedback::default();
    let status = cell.cycle();
    assert_eq!(status.state, OperatingState::Running);
    assert!(status.outputs[0].advance);
}

#[test]
fn stop_mid_stroke_reaches_stopped_and_jogs_home() {
    let mut cell = Cell::idle();
    clamp_mid_stroke(&mut cell);

    let status = cell.pulse(CommandSet::STOP);
    assert_eq!(status.state, OperatingState::Stopping);
    assert!(status.outputs_deenergized());
    for _ in 0..3 {
        let status = cell.cycle();
        assert_eq!(status.state, OperatingState::Stopped);
        assert!(status.fault_code.is_none());
    }

    cell.inputs.manual[0].retract = true;
    assert!(cell.cycle().outputs[0].retract);
    cell.inputs.feedback[0] = ActuatorFeedback::RETRACTED;
    cell.inputs.manual[0].retract = false;
    assert_eq!(cell.cycle().state, OperatingState::Stopped);
    assert_eq!(cell.pulse(CommandSet::RESET).state, OperatingState::Idle);
}

#[test]
fn abort_mid_stroke_reaches_aborted() {
    let mut cell = Cell::idle();
    clamp_mid_stroke(&mut cell);

    let status = cell.pulse(CommandSet::ABORT);
    assert_eq!(status.state, OperatingState::Aborting);
    assert!(status.outputs_deenergized());
    for _ in 0..3 {
        let status = cell.cycle();
        assert_eq!(status.state, OperatingState::Aborted);
        assert!(status.fault_code.is_none());
    }
    // Stopped between ends, nothing to clear.
    assert_eq!(cell.pulse(CommandSet::RESET).state, OperatingState::Idle);
}

#[test]
fn pause_mid_stroke_holds_and_proceeds() {
    let mut cell = Cell::idle();
    clamp_mid_stroke(&mut cell);

    assert_eq!(cell.pulse(CommandSet::PAUSE).state, OperatingState::Pausing);
    for _ in 0..5 {
        let status = cell.cycle();
        assert_eq!(status.state, OperatingState::Paused);
        assert!(status.outputs_deenergized());
    }

    assert_eq!(cell.pulse(CommandSet::PROCEED).state, OperatingState::Proceeding);
    let status = cell.cycle();
    assert_eq!(status.state, OperatingState::Running);
    assert_eq!(status.active_step.step_id, StepId(20));
    assert!(status.outputs[0].advance);

    cell.inputs.feedback[0] = ActuatorFeedback::ADVANCED;
    assert_eq!(cell.complete_step().active_step.step_id, StepId(30));
}

#[test]
fn next_step_not_driving_moving_actuator() {
    let text = CONFIG.replace(
        "step = 30\nnext = 0\ntimeout_s = 5.0\nretract = [\"clamp\"]",
        "step = 30\nnext = 0\ntimeout_s = 5.0",
    );
    let mut cell = Cell::from_config(&text);
    cell.pulse(CommandSet::RESET);
    clamp_mid_stroke(&mut cell);

    let status = cell.complete_step();
    assert_eq!(status.active_step.step_id, StepId(30));
    for _ in 0..3 {
        let status = cell.cycle();
        assert_eq!(status.state, OperatingState::Running);
        assert_eq!(status.active_step.step_id, StepId(30));
        assert!(status.outputs_deenergized());
    }
}
