//! Deterministic cycle harness.
//!
//! One [`Cell`] wraps a controller built from [`CONFIG`] and a persistent
//! input image. Commands are pulsed for a single cycle; everything else
//! stays asserted until changed.

use evo_common::sequencer::command::CommandSet;
use evo_common::sequencer::io::{ActuatorFeedback, CycleInputs, CycleStatus};
use evo_common::sequencer::permissive::{PermissiveGroup, PermissiveInput};
use evo_common::sequencer::state::OperatingState;
use evo_common::sequencer::step::StepId;
use evo_sequencer::config::load_config_from_str;
use evo_sequencer::state::controller::StateController;

/// One-second scan so step timeouts count in whole cycles.
pub const CONFIG: &str = r#"
cycle_time_us = 1000000
auto_run = true

[shared]
service_name = "integration"

[permissives.home]
width = 4

[permissives.start]
width = 4

[permissives.proceed]
width = 2

[permissives.auto_interlock]
width = 2

[permissives.reset]
width = 1

[[actuators]]
name = "clamp"

[sequences.homing]
entry = 10

[[sequences.homing.steps]]
step = 10
next = 0
timeout_s = 5.0
retract = ["clamp"]

[sequences.running]
entry = 20

[[sequences.running.steps]]
step = 20
next = 30
timeout_s = 5.0
required = 0x0001
advance = ["clamp"]

[[sequences.running.steps]]
step = 30
next = 0
timeout_s = 5.0
retract = ["clamp"]
"#;

pub struct Cell {
    pub controller: StateController,
    pub inputs: CycleInputs,
}

impl Cell {
    pub fn new() -> Self {
        Self::from_config(CONFIG)
    }

    pub fn from_config(text: &str) -> Self {
        let controller = load_config_from_str(text).unwrap().controller;
        let mut inputs = CycleInputs::all_permissives_satisfied();
        inputs.feedback[0] = ActuatorFeedback::RETRACTED;
        Self { controller, inputs }
    }

    /// Cell in Idle after the cold-start Reset.
    pub fn idle() -> Self {
        let mut cell = Self::new();
        cell.pulse(CommandSet::RESET);
        assert_eq!(cell.state(), OperatingState::Idle);
        cell
    }

    /// One cycle with the current inputs.
    pub fn cycle(&mut self) -> CycleStatus {
        self.controller.cycle(&self.inputs)
    }

    /// One cycle with `commands` asserted, released afterwards.
    pub fn pulse(&mut self, commands: CommandSet) -> CycleStatus {
        self.inputs.commands = commands;
        let status = self.cycle();
        self.inputs.commands = CommandSet::empty();
        status
    }

    /// One cycle with the step completion condition met.
    pub fn complete_step(&mut self) -> CycleStatus {
        self.inputs.step_done = true;
        let status = self.cycle();
        self.inputs.step_done = false;
        status
    }

    pub fn set_group(&mut self, group: PermissiveGroup, live: u16, bypass: u16) {
        self.inputs
            .set_permissive(group, PermissiveInput::new(live, bypass));
    }

    pub fn state(&self) -> OperatingState {
        self.controller.state()
    }

    pub fn step(&self) -> StepId {
        self.controller.active_step().step_id
    }
}
