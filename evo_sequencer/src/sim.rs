//! Simulated cell: a host process image without hardware.
//!
//! Each configured actuator travels between its end positions at one unit
//! per cycle while a drive line is energized. A step counts as done once
//! every energized actuator has reached the end it is driven towards. All
//! permissive inputs read live.
//!
//! An optional operator asserts the command that moves the cell forward
//! from each settled state, which makes the binary runnable end to end.

use evo_common::consts::MAX_ACTUATORS;
use evo_common::sequencer::command::CommandSet;
use evo_common::sequencer::io::{
    ActuatorFeedback, ActuatorOutput, ActuatorRequest, CycleInputs, CycleStatus,
};
use evo_common::sequencer::permissive::{PermissiveGroup, PermissiveInput};
use evo_common::sequencer::state::OperatingState;
use tracing::trace;

use crate::cycle::{CycleError, CycleIo};

/// Position of one simulated actuator, `0` is retracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Travel {
    position: u32,
}

#[derive(Debug, Clone)]
pub struct SimulatedCell {
    actuator_count: usize,
    travel_cycles: u32,
    actuators: [Travel; MAX_ACTUATORS],
    outputs: [ActuatorOutput; MAX_ACTUATORS],
    state: OperatingState,
    operator: bool,
    auto_run: bool,
    pending: CommandSet,
    manual: [ActuatorRequest; MAX_ACTUATORS],
    permissives: [PermissiveInput; PermissiveGroup::COUNT],
    step_permissives: PermissiveInput,
    external_fault: bool,
}

impl SimulatedCell {
    /// `travel_cycles` is clamped to at least 1.
    pub fn new(actuator_count: usize, travel_cycles: u32) -> Self {
        Self {
            actuator_count: actuator_count.min(MAX_ACTUATORS),
            travel_cycles: travel_cycles.max(1),
            actuators: [Travel::default(); MAX_ACTUATORS],
            outputs: [ActuatorOutput::OFF; MAX_ACTUATORS],
            state: OperatingState::Undefined,
            operator: false,
            auto_run: false,
            pending: CommandSet::empty(),
            manual: [ActuatorRequest::default(); MAX_ACTUATORS],
            permissives: [PermissiveInput::satisfied(); PermissiveGroup::COUNT],
            step_permissives: PermissiveInput::satisfied(),
            external_fault: false,
        }
    }

    /// Enable the scripted operator. With `auto_run` it leaves Complete alone.
    pub fn with_operator(mut self, auto_run: bool) -> Self {
        self.operator = true;
        self.auto_run = auto_run;
        self
    }

    /// Assert `commands` for the next cycle only.
    pub fn inject_command(&mut self, commands: CommandSet) {
        self.pending |= commands;
    }

    pub fn set_manual(&mut self, index: usize, request: ActuatorRequest) {
        if let Some(slot) = self.manual.get_mut(index) {
            *slot = request;
        }
    }

    pub fn set_external_fault(&mut self, asserted: bool) {
        self.external_fault = asserted;
    }

    pub fn set_permissive(&mut self, group: PermissiveGroup, input: PermissiveInput) {
        self.permissives[group.index()] = input;
    }

    pub fn set_step_permissives(&mut self, input: PermissiveInput) {
        self.step_permissives = input;
    }

    /// Last state written by the sequencer.
    pub fn state(&self) -> OperatingState {
        self.state
    }

    pub fn feedback(&self, index: usize) -> ActuatorFeedback {
        match self.actuators.get(index) {
            Some(travel) => ActuatorFeedback {
                advanced: travel.position >= self.travel_cycles,
                retracted: travel.position == 0,
            },
            None => ActuatorFeedback::default(),
        }
    }

    fn step_done(&self) -> bool {
        let mut energized = false;
        for index in 0..self.actuator_count {
            let out = self.outputs[index];
            let fb = self.feedback(index);
            if out.advance {
                energized = true;
                if !fb.advanced {
                    return false;
                }
            } else if out.retract {
                energized = true;
                if !fb.retracted {
                    return false;
                }
            }
        }
        energized
    }

    fn operator_command(&self) -> CommandSet {
        if !self.operator {
            return CommandSet::empty();
        }
        match self.state {
            OperatingState::Undefined
            | OperatingState::Fault
            | OperatingState::Stopped
            | OperatingState::Aborted => CommandSet::RESET,
            OperatingState::Idle => CommandSet::HOME,
            OperatingState::Homed => CommandSet::START,
            OperatingState::Complete if !self.auto_run => CommandSet::START,
            _ => CommandSet::empty(),
        }
    }
}

impl CycleIo for SimulatedCell {
    fn read_inputs(&mut self, inputs: &mut CycleInputs) -> Result<(), CycleError> {
        *inputs = CycleInputs {
            commands: self.operator_command() | self.pending,
            permissives: self.permissives,
            step_permissives: self.step_permissives,
            step_done: self.step_done(),
            external_fault: self.external_fault,
            manual: self.manual,
            ..CycleInputs::default()
        };
        for index in 0..self.actuator_count {
            inputs.feedback[index] = self.feedback(index);
        }
        self.pending = CommandSet::empty();
        Ok(())
    }

    fn write_outputs(&mut self, status: &CycleStatus) -> Result<(), CycleError> {
        if status.state != self.state {
            trace!(from = ?self.state, to = ?status.state, "cell observed state change");
        }
        self.state = status.state;
        self.outputs = status.outputs;

        let end = self.travel_cycles;
        for index in 0..self.actuator_count {
            let out = self.outputs[index];
            let travel = &mut self.actuators[index];
            if out.advance && !out.retract {
                travel.position = (travel.position + 1).min(end);
            } else if out.retract && !out.advance {
                travel.position = travel.position.saturating_sub(1);
            }
        }
        Ok(())
    }
}
