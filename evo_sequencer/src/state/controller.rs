//! State controller: one call to [`StateController::cycle`] is one scan.
//!
//! Cycle order:
//! 1. Evaluate permissive groups.
//! 2. Arbitrate commands (highest priority wins, rest dropped).
//! 3. Tick the step program of the current state (timer accumulates first).
//! 4. Interlocks: conflict → Fault, discordance → Undefined.
//! 5. Selected command, gated by its permissive group.
//! 6. Program completion / transient-state settling.
//! 7. Automatic transitions (AutoRun, start after homing).
//! 8. Latch outputs. Any fault de-energizes every actuator in the same cycle.
//!
//! At most one state transition fires per cycle, in the priority order above.

use std::collections::HashMap;
use std::time::Duration;

use evo_common::consts::MAX_ACTUATORS;
use evo_common::sequencer::command::Command;
use evo_common::sequencer::config::SequencerConfig;
use evo_common::sequencer::fault::FaultCode;
use evo_common::sequencer::io::{ActuatorOutput, CycleInputs, CycleStatus};
use evo_common::sequencer::permissive::{PermissiveGroup, PermissiveReport};
use evo_common::sequencer::state::OperatingState;
use evo_common::sequencer::step::{ActiveStep, StepId};
use static_assertions::assert_impl_all;
use tracing::{debug, info, trace, warn};

use super::operating::{OperatingStateMachine, StateEvent, TransitionResult};
use crate::command::arbitration::Arbitration;
use crate::error::SetupError;
use crate::permissive::PermissiveEvaluator;
use crate::safety::interlock::{ActuatorInterlock, Discordance, InterlockVerdict};
use crate::step::program::StepProgram;
use crate::step::sequencer::{OutputPlan, StepInputs, StepOutput, StepTransition};

/// Outcome of gating a command against the transition table and permissives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Fire(StateEvent),
    Blocked,
    Ignored,
}

/// Step programs indexed by the state that runs them.
#[derive(Debug, Clone, Default)]
struct Programs {
    homing: Option<StepProgram>,
    running: Option<StepProgram>,
    stopping: Option<StepProgram>,
    aborting: Option<StepProgram>,
}

impl Programs {
    fn slot(&mut self, state: OperatingState) -> Option<&mut Option<StepProgram>> {
        match state {
            OperatingState::Homing => Some(&mut self.homing),
            OperatingState::Running => Some(&mut self.running),
            OperatingState::Stopping => Some(&mut self.stopping),
            OperatingState::Aborting => Some(&mut self.aborting),
            _ => None,
        }
    }

    fn get(&self, state: OperatingState) -> Option<&StepProgram> {
        match state {
            OperatingState::Homing => self.homing.as_ref(),
            OperatingState::Running => self.running.as_ref(),
            OperatingState::Stopping => self.stopping.as_ref(),
            OperatingState::Aborting => self.aborting.as_ref(),
            _ => None,
        }
    }

    fn get_mut(&mut self, state: OperatingState) -> Option<&mut StepProgram> {
        self.slot(state).and_then(Option::as_mut)
    }

    fn iter(&self) -> impl Iterator<Item = &StepProgram> {
        [&self.homing, &self.running, &self.stopping, &self.aborting]
            .into_iter()
            .flatten()
    }

    fn reset(&mut self) {
        for program in [
            &mut self.homing,
            &mut self.running,
            &mut self.stopping,
            &mut self.aborting,
        ]
        .into_iter()
        .flatten()
        {
            program.reset();
        }
    }
}

/// Owner of the operating state, the active step and every engine.
#[derive(Debug, Clone)]
pub struct StateController {
    machine: OperatingStateMachine,
    groups: [PermissiveEvaluator; PermissiveGroup::COUNT],
    step_evaluator: PermissiveEvaluator,
    programs: Programs,
    interlock: ActuatorInterlock,
    active: ActiveStep,
    pause_snapshot: Option<ActiveStep>,
    fault_code: Option<FaultCode>,
    last_fault_code: Option<FaultCode>,
    start_after_homing: bool,
    auto_run: bool,
    homing_required: bool,
    cycle_time: Duration,
    status: CycleStatus,
}

assert_impl_all!(StateController: Send);

impl StateController {
    /// Build every engine from configuration.
    ///
    /// Scalar bounds are assumed validated ([`SequencerConfig::validate`]);
    /// structural problems are reported here.
    pub fn new(config: &SequencerConfig) -> Result<Self, SetupError> {
        let mut groups = [PermissiveEvaluator::new(1, None)?; PermissiveGroup::COUNT];
        for group in PermissiveGroup::ALL {
            groups[group.index()] =
                PermissiveEvaluator::from_config(config.permissives.group(group))?;
        }
        let step_evaluator = PermissiveEvaluator::new(config.step_permissive_width, None)?;
        let interlock = ActuatorInterlock::from_config(&config.actuators)?;
        let actuators: HashMap<&str, usize> = interlock.indices().collect();

        let mut programs = Programs::default();
        for (state, sequence) in config.sequences.iter() {
            let program = StepProgram::from_config(
                state,
                sequence,
                &actuators,
                config.step_permissive_width,
            )?;
            if let Some(slot) = programs.slot(state) {
                *slot = Some(program);
            }
        }

        let mut claimed: Vec<StepId> = Vec::new();
        for program in programs.iter() {
            for id in program.step_ids() {
                if claimed.contains(&id) {
                    return Err(SetupError::DuplicateStep(id.0));
                }
                claimed.push(id);
            }
        }

        let status = CycleStatus {
            actuator_count: interlock.count() as u8,
            ..CycleStatus::default()
        };

        Ok(Self {
            machine: OperatingStateMachine::new(),
            groups,
            step_evaluator,
            programs,
            interlock,
            active: ActiveStep::default(),
            pause_snapshot: None,
            fault_code: None,
            last_fault_code: None,
            start_after_homing: false,
            auto_run: config.auto_run,
            homing_required: config.homing_required,
            cycle_time: config.cycle_time(),
            status,
        })
    }

    #[inline]
    pub const fn state(&self) -> OperatingState {
        self.machine.state()
    }

    #[inline]
    pub const fn active_step(&self) -> &ActiveStep {
        &self.active
    }

    #[inline]
    pub const fn fault_code(&self) -> Option<FaultCode> {
        self.fault_code
    }

    #[inline]
    pub const fn last_fault_code(&self) -> Option<FaultCode> {
        self.last_fault_code
    }

    /// Status published by the last cycle.
    #[inline]
    pub const fn status(&self) -> &CycleStatus {
        &self.status
    }

    #[inline]
    pub const fn cycle_time(&self) -> Duration {
        self.cycle_time
    }

    /// Name of the actuator at `index`.
    pub fn actuator_name(&self, index: usize) -> &str {
        self.interlock.name(index)
    }

    /// Run one scan cycle.
    pub fn cycle(&mut self, inputs: &CycleInputs) -> CycleStatus {
        let state = self.machine.state();

        let mut reports = [PermissiveReport::default(); PermissiveGroup::COUNT];
        for group in PermissiveGroup::ALL {
            reports[group.index()] = self.groups[group.index()].evaluate(inputs.permissive(group));
        }

        let arbitration = Arbitration::resolve(inputs.commands);
        if !arbitration.dropped.is_empty() {
            debug!(
                selected = ?arbitration.selected,
                dropped = ?arbitration.dropped,
                "lower-priority commands dropped"
            );
        }

        let (phase_complete, step_report) =
            self.run_phase(state, inputs, arbitration.is(Command::Retry));

        let verdict = self.interlock.evaluate(
            &inputs.feedback,
            &inputs.manual,
            &self.status.outputs,
        );

        let mut blocked = None;
        let mut event = self.interlock_event(state, &verdict);
        if event.is_none() {
            if let Some(command) = arbitration.selected {
                match self.gate_command(command, state, &reports, &verdict) {
                    Gate::Fire(ev) => event = Some(ev),
                    Gate::Blocked => blocked = Some(command),
                    Gate::Ignored => {
                        trace!(?command, ?state, "command not applicable");
                    }
                }
            }
        }
        if event.is_none() && phase_complete {
            event = Some(StateEvent::PhaseComplete);
        }
        if event.is_none() {
            event = self.auto_event(state, &reports, &mut blocked);
        }

        if let Some(command) = blocked {
            // A refused Reset keeps the cause of the active fault.
            if self.fault_code.is_none() {
                self.last_fault_code = Some(FaultCode::PermissivesNotOk);
            }
            if self.status.blocked != Some(command) {
                warn!(?command, ?state, "command blocked by permissives");
            }
        }

        if let Some(event) = event {
            self.apply_event(state, event, &verdict);
        }

        let outputs = self.latch_outputs(inputs, &verdict);

        self.status = CycleStatus {
            cycle: self.status.cycle.wrapping_add(1),
            state: self.machine.state(),
            active_step: self.active,
            fault_code: self.fault_code,
            last_fault_code: self.last_fault_code,
            blocked,
            permissives: reports,
            step_permissive: step_report,
            outputs,
            actuator_count: self.status.actuator_count,
        };
        self.status
    }

    // ─── Phase ──────────────────────────────────────────────────────

    /// Advance the work of the current state. Returns whether it finished.
    fn run_phase(
        &mut self,
        state: OperatingState,
        inputs: &CycleInputs,
        retry: bool,
    ) -> (bool, PermissiveReport) {
        if matches!(state, OperatingState::Pausing | OperatingState::Proceeding) {
            return (true, PermissiveReport::default());
        }
        if !state.runs_sequence() {
            return (false, PermissiveReport::default());
        }

        let Some(program) = self.programs.get_mut(state) else {
            return (true, PermissiveReport::default());
        };

        self.active.accumulate(self.cycle_time);
        let step_inputs = StepInputs {
            permissives: inputs.step_permissives,
            done: inputs.step_done,
            external_fault: inputs.external_fault,
            retry,
        };
        match program.tick(&self.active, &step_inputs, &self.step_evaluator) {
            Some(output) => {
                let report = output.permissive;
                self.apply_step_output(output);
                (self.active.is_idle(), report)
            }
            None => {
                if !self.active.is_idle() {
                    debug!(step = %self.active.step_id, ?state, "active step not owned by program");
                }
                (self.active.is_idle(), PermissiveReport::default())
            }
        }
    }

    fn apply_step_output(&mut self, output: StepOutput) {
        let from = self.active.step_id;
        if output.next_step != from {
            self.active = ActiveStep::enter(output.next_step);
            match output.transition {
                StepTransition::Advanced => {
                    debug!(from = %from, to = %output.next_step, "step advanced");
                }
                StepTransition::Retried => {
                    info!(from = %from, to = %output.next_step, "step retried");
                }
                t if t.is_fault() => {
                    warn!(
                        step = %from,
                        fault_step = %output.next_step,
                        fault = ?output.fault_code,
                        "step fault"
                    );
                    self.last_fault_code = output.fault_code;
                }
                _ => {}
            }
        } else {
            self.active.permissions_ok = output.permissions_ok;
        }
        self.active.fault_code = output.fault_code;
    }

    // ─── Events ─────────────────────────────────────────────────────

    fn interlock_event(
        &self,
        state: OperatingState,
        verdict: &InterlockVerdict,
    ) -> Option<StateEvent> {
        if let Some(index) = verdict.conflict {
            if state != OperatingState::Fault {
                warn!(actuator = self.interlock.name(index), "conflicting directional request");
                return Some(StateEvent::Conflict);
            }
        }
        if let Some((index, kind)) = verdict.discordant {
            if !state.is_faulted() {
                let kind = match kind {
                    Discordance::BothEnds => "both end positions",
                    Discordance::NoEnd => "end position lost at rest",
                };
                warn!(actuator = self.interlock.name(index), kind, "feedback discordance");
                return Some(StateEvent::Discordance);
            }
        }
        None
    }

    fn gate_command(
        &mut self,
        command: Command,
        state: OperatingState,
        reports: &[PermissiveReport; PermissiveGroup::COUNT],
        verdict: &InterlockVerdict,
    ) -> Gate {
        let ok = |group: PermissiveGroup| reports[group.index()].ok;

        let (event, permitted) = match command {
            Command::Abort => (StateEvent::Abort, true),
            Command::Stop => (StateEvent::Stop, true),
            Command::Home => (StateEvent::Home, ok(PermissiveGroup::Home)),
            Command::Start if state == OperatingState::Idle && self.homing_required => (
                StateEvent::Home,
                ok(PermissiveGroup::Home) && ok(PermissiveGroup::Start),
            ),
            Command::Start => (StateEvent::Start, ok(PermissiveGroup::Start)),
            Command::Pause => (StateEvent::Pause, true),
            Command::Proceed => (StateEvent::Proceed, ok(PermissiveGroup::Proceed)),
            Command::Reset => (
                StateEvent::Reset,
                ok(PermissiveGroup::Reset)
                    && verdict.is_clear()
                    && self.status.outputs_deenergized(),
            ),
            // Handled by the step program.
            Command::Retry => return Gate::Ignored,
        };

        if !self.machine.accepts(event) {
            return Gate::Ignored;
        }
        if !permitted {
            return Gate::Blocked;
        }
        if command == Command::Start && event == StateEvent::Home {
            self.start_after_homing = true;
        }
        Gate::Fire(event)
    }

    fn auto_event(
        &mut self,
        state: OperatingState,
        reports: &[PermissiveReport; PermissiveGroup::COUNT],
        blocked: &mut Option<Command>,
    ) -> Option<StateEvent> {
        match state {
            OperatingState::Complete
                if self.auto_run && reports[PermissiveGroup::AutoInterlock.index()].ok =>
            {
                Some(StateEvent::AutoRestart)
            }
            OperatingState::Homed if self.start_after_homing => {
                self.start_after_homing = false;
                if reports[PermissiveGroup::Start.index()].ok {
                    Some(StateEvent::Start)
                } else {
                    *blocked = Some(Command::Start);
                    None
                }
            }
            _ => None,
        }
    }

    fn apply_event(&mut self, from: OperatingState, event: StateEvent, verdict: &InterlockVerdict) {
        match self.machine.handle_event(event) {
            TransitionResult::Ok(to) => {
                info!(?from, ?to, ?event, "state transition");
                self.enter_state(from, to, verdict);
            }
            TransitionResult::Rejected(reason) => {
                debug!(?from, ?event, reason, "transition rejected");
            }
        }
    }

    /// Entry actions.
    fn enter_state(&mut self, from: OperatingState, to: OperatingState, verdict: &InterlockVerdict) {
        use OperatingState::*;

        if !matches!(to, Homing | Homed) {
            self.start_after_homing = false;
        }
        if !matches!(to, Pausing | Paused | Proceeding | Running) {
            self.pause_snapshot = None;
        }

        match to {
            Running if from == Proceeding => {
                match self.pause_snapshot.take() {
                    Some(snapshot) => self.active = snapshot,
                    None => self.enter_program(to),
                }
            }
            Homing | Running | Stopping | Aborting => self.enter_program(to),
            Pausing => self.pause_snapshot = Some(self.active),
            Paused | Proceeding => {}
            Homed | Stopped | Aborted | Complete => self.clear_step(),
            Idle => {
                self.clear_step();
                self.fault_code = None;
            }
            Fault | Undefined => {
                let code = if to == Fault && verdict.conflict.is_some() {
                    FaultCode::ConflictingCommands
                } else {
                    FaultCode::UndefinedState
                };
                self.clear_step();
                self.fault_code = Some(code);
                self.last_fault_code = Some(code);
            }
        }
    }

    fn enter_program(&mut self, state: OperatingState) {
        self.programs.reset();
        self.active = match self.programs.get(state) {
            Some(program) => {
                debug!(program = ?program.owner(), entry = %program.entry(), "program entered");
                ActiveStep::enter(program.entry())
            }
            None => ActiveStep::default(),
        };
    }

    fn clear_step(&mut self) {
        self.programs.reset();
        self.active = ActiveStep::default();
    }

    // ─── Outputs ────────────────────────────────────────────────────

    fn latch_outputs(
        &self,
        inputs: &CycleInputs,
        verdict: &InterlockVerdict,
    ) -> [ActuatorOutput; MAX_ACTUATORS] {
        let mut outputs = [ActuatorOutput::OFF; MAX_ACTUATORS];
        let state = self.machine.state();
        if state.is_faulted() || verdict.conflict.is_some() || self.active.fault_code.is_some() {
            return outputs;
        }

        let count = self.interlock.count();
        if state.runs_sequence() {
            let plan = self
                .programs
                .get(state)
                .map_or(OutputPlan::NONE, |p| p.plan_for(&self.active));
            for (index, output) in outputs.iter_mut().enumerate().take(count) {
                output.advance = plan.advance & (1 << index) != 0;
                output.retract = plan.retract & (1 << index) != 0;
            }
        } else if state.is_settled() {
            for (index, output) in outputs.iter_mut().enumerate().take(count) {
                output.advance = inputs.manual[index].advance;
                output.retract = inputs.manual[index].retract;
            }
        }
        outputs
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
