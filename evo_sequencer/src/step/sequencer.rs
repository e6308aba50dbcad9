//! Single-step sequencer.
//!
//! A `StepSequencer` is self-gating: it produces output only while the
//! active step id is its own step or its fault sibling. Its only mutation
//! surface is its own phase and latched fault; the returned [`StepOutput`]
//! is applied to the active step by the controller.
//!
//! Evaluation order while Active:
//! 1. External fault → fault step, `ExternalFault`.
//! 2. Permissives ok and done → `next`.
//! 3. Elapsed ≥ timeout → fault step, `Timeout`.
//! 4. Hold (blocked if permissives are not ok; the clock keeps running).

use std::time::Duration;

use evo_common::sequencer::fault::{FaultClass, FaultCode};
use evo_common::sequencer::permissive::{PermissiveInput, PermissiveMask, PermissiveReport};
use evo_common::sequencer::step::{ActiveStep, StepId};

use crate::permissive::PermissiveEvaluator;

/// Sequencer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPhase {
    /// Active step belongs to someone else.
    #[default]
    Inactive,
    /// Executing the base step.
    Active,
    /// Parked in the fault sibling.
    Faulted,
    /// Success condition met, `next` emitted.
    Complete,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTransition {
    /// Waiting for completion.
    Hold,
    /// Waiting, step permissives not ok.
    Blocked,
    /// Success, moving to `next`.
    Advanced,
    /// Window expired, moving to the fault step.
    TimedOut,
    /// External fault, moving to the fault step.
    ExternalFault,
    /// Waiting in the fault step.
    FaultHold,
    /// Retry accepted, back to the base step.
    Retried,
}

impl StepTransition {
    #[inline]
    pub const fn is_fault(self) -> bool {
        matches!(self, Self::TimedOut | Self::ExternalFault)
    }
}

/// Actuator drive plan of a step, as bitmasks over actuator indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputPlan {
    pub advance: u16,
    pub retract: u16,
}

impl OutputPlan {
    pub const NONE: Self = Self {
        advance: 0,
        retract: 0,
    };

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.advance == 0 && self.retract == 0
    }
}

/// Resolved, immutable step definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    pub step: StepId,
    pub next: StepId,
    pub fault_step: StepId,
    pub timeout: Duration,
    /// Required step permissive bits.
    pub required: PermissiveMask,
    /// Fault classes a Retry may clear.
    pub retry_on: FaultClass,
    pub plan: OutputPlan,
}

/// Per-tick inputs seen by the owning sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepInputs {
    pub permissives: PermissiveInput,
    pub done: bool,
    pub external_fault: bool,
    pub retry: bool,
}

/// Sequencer output for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub next_step: StepId,
    pub fault_code: Option<FaultCode>,
    pub permissions_ok: bool,
    pub transition: StepTransition,
    pub permissive: PermissiveReport,
}

/// Timeout / gating / fault-step engine for one step.
#[derive(Debug, Clone)]
pub struct StepSequencer {
    def: StepDefinition,
    phase: StepPhase,
    latched: Option<FaultCode>,
}

impl StepSequencer {
    pub const fn new(def: StepDefinition) -> Self {
        Self {
            def,
            phase: StepPhase::Inactive,
            latched: None,
        }
    }

    #[inline]
    pub const fn definition(&self) -> &StepDefinition {
        &self.def
    }

    #[inline]
    pub const fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Step-local fault currently latched.
    #[inline]
    pub const fn latched_fault(&self) -> Option<FaultCode> {
        self.latched
    }

    /// Active step id is this step or its fault sibling.
    #[inline]
    pub fn owns(&self, step_id: StepId) -> bool {
        step_id == self.def.step || step_id == self.def.fault_step
    }

    pub fn reset(&mut self) {
        self.phase = StepPhase::Inactive;
        self.latched = None;
    }

    /// Run one tick. Returns `None` when the active step is not ours.
    pub fn tick(
        &mut self,
        active: &ActiveStep,
        inputs: &StepInputs,
        evaluator: &PermissiveEvaluator,
    ) -> Option<StepOutput> {
        let id = active.step_id;
        if id == self.def.step {
            Some(self.tick_base(active, inputs, evaluator))
        } else if id == self.def.fault_step {
            Some(self.tick_fault(inputs, evaluator))
        } else {
            self.reset();
            None
        }
    }

    fn tick_base(
        &mut self,
        active: &ActiveStep,
        inputs: &StepInputs,
        evaluator: &PermissiveEvaluator,
    ) -> StepOutput {
        if self.phase != StepPhase::Active {
            self.phase = StepPhase::Active;
            self.latched = None;
        }

        let report = evaluator.evaluate_with(inputs.permissives, self.def.required);
        let ok = report.ok;

        if inputs.external_fault {
            return self.fault(FaultCode::ExternalFault, StepTransition::ExternalFault, report);
        }
        if ok && inputs.done {
            self.phase = StepPhase::Complete;
            return self.output(self.def.next, None, StepTransition::Advanced, report);
        }
        if active.elapsed >= self.def.timeout {
            return self.fault(FaultCode::Timeout, StepTransition::TimedOut, report);
        }

        let transition = if ok {
            StepTransition::Hold
        } else {
            StepTransition::Blocked
        };
        self.output(self.def.step, None, transition, report)
    }

    fn tick_fault(&mut self, inputs: &StepInputs, evaluator: &PermissiveEvaluator) -> StepOutput {
        // Fault step entered without passing through the base step.
        let code = match self.latched {
            Some(code) => code,
            None => {
                self.latched = Some(FaultCode::ExternalFault);
                FaultCode::ExternalFault
            }
        };
        self.phase = StepPhase::Faulted;

        let report = evaluator.evaluate_with(inputs.permissives, self.def.required);
        if inputs.retry && self.def.retry_on.permits(code) {
            self.phase = StepPhase::Active;
            self.latched = None;
            return self.output(self.def.step, None, StepTransition::Retried, report);
        }
        self.output(
            self.def.fault_step,
            Some(code),
            StepTransition::FaultHold,
            report,
        )
    }

    fn fault(
        &mut self,
        code: FaultCode,
        transition: StepTransition,
        report: PermissiveReport,
    ) -> StepOutput {
        self.phase = StepPhase::Faulted;
        self.latched = Some(code);
        self.output(self.def.fault_step, Some(code), transition, report)
    }

    #[inline]
    fn output(
        &self,
        next_step: StepId,
        fault_code: Option<FaultCode>,
        transition: StepTransition,
        permissive: PermissiveReport,
    ) -> StepOutput {
        StepOutput {
            next_step,
            fault_code,
            permissions_ok: permissive.ok,
            transition,
            permissive,
        }
    }

    /// Drive plan for `active`: energized only while this step holds with
    /// permissives ok and no fault.
    pub fn plan_for(&self, active: &ActiveStep) -> OutputPlan {
        if active.step_id == self.def.step
            && self.phase == StepPhase::Active
            && active.permissions_ok
            && active.fault_code.is_none()
        {
            self.def.plan
        } else {
            OutputPlan::NONE
        }
    }
}
