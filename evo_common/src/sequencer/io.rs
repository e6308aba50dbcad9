//! Per-cycle contract between the host and the sequencer.
//!
//! The host fills [`CycleInputs`] from its process image once per scan and
//! reads back [`CycleStatus`]. Both are fixed-size `Copy` records so they can
//! be exchanged without allocation.

use serde::{Deserialize, Serialize};

use super::command::{Command, CommandSet};
use super::fault::FaultCode;
use super::permissive::{PermissiveGroup, PermissiveInput, PermissiveReport};
use super::state::OperatingState;
use super::step::ActiveStep;
use crate::consts::MAX_ACTUATORS;

// ─── Actuator Signals ───────────────────────────────────────────────

/// End-position feedback of one double-acting actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActuatorFeedback {
    pub advanced: bool,
    pub retracted: bool,
}

impl ActuatorFeedback {
    pub const ADVANCED: Self = Self {
        advanced: true,
        retracted: false,
    };
    pub const RETRACTED: Self = Self {
        advanced: false,
        retracted: true,
    };

    /// Both end positions reported at once.
    #[inline]
    pub const fn is_contradictory(self) -> bool {
        self.advanced && self.retracted
    }

    /// Neither end position reported.
    #[inline]
    pub const fn is_between(self) -> bool {
        !self.advanced && !self.retracted
    }
}

/// Manual (jog) request for one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActuatorRequest {
    pub advance: bool,
    pub retract: bool,
}

impl ActuatorRequest {
    #[inline]
    pub const fn is_conflicting(self) -> bool {
        self.advance && self.retract
    }
}

/// Drive lines of one actuator. Never both energized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActuatorOutput {
    pub advance: bool,
    pub retract: bool,
}

impl ActuatorOutput {
    pub const OFF: Self = Self {
        advance: false,
        retract: false,
    };

    #[inline]
    pub const fn is_energized(self) -> bool {
        self.advance || self.retract
    }
}

// ─── Cycle Inputs ───────────────────────────────────────────────────

/// Everything the sequencer samples at the start of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleInputs {
    /// Command lines asserted this cycle (level-triggered).
    pub commands: CommandSet,
    /// Permissive inputs, indexed by [`PermissiveGroup::index`].
    pub permissives: [PermissiveInput; PermissiveGroup::COUNT],
    /// Step permissives for the active step.
    pub step_permissives: PermissiveInput,
    /// Completion condition of the active step.
    pub step_done: bool,
    /// External fault request for the active step.
    pub external_fault: bool,
    pub feedback: [ActuatorFeedback; MAX_ACTUATORS],
    pub manual: [ActuatorRequest; MAX_ACTUATORS],
}

impl CycleInputs {
    #[inline]
    pub fn permissive(&self, group: PermissiveGroup) -> PermissiveInput {
        self.permissives[group.index()]
    }

    #[inline]
    pub fn set_permissive(&mut self, group: PermissiveGroup, input: PermissiveInput) {
        self.permissives[group.index()] = input;
    }

    /// All groups and the step permissives fully satisfied.
    pub fn all_permissives_satisfied() -> Self {
        Self {
            permissives: [PermissiveInput::satisfied(); PermissiveGroup::COUNT],
            step_permissives: PermissiveInput::satisfied(),
            ..Self::default()
        }
    }
}

// ─── Cycle Status ───────────────────────────────────────────────────

/// Snapshot published at the end of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CycleStatus {
    pub cycle: u64,
    pub state: OperatingState,
    pub active_step: ActiveStep,
    /// Controller fault, cleared by Reset.
    pub fault_code: Option<FaultCode>,
    /// Most recent fault of any origin. Never cleared.
    pub last_fault_code: Option<FaultCode>,
    /// Command refused this cycle by a permissive group.
    pub blocked: Option<Command>,
    pub permissives: [PermissiveReport; PermissiveGroup::COUNT],
    pub step_permissive: PermissiveReport,
    pub outputs: [ActuatorOutput; MAX_ACTUATORS],
    /// Number of configured actuators (entries of `outputs` in use).
    pub actuator_count: u8,
}

impl CycleStatus {
    #[inline]
    pub fn report(&self, group: PermissiveGroup) -> &PermissiveReport {
        &self.permissives[group.index()]
    }

    /// Configured actuator outputs.
    pub fn active_outputs(&self) -> &[ActuatorOutput] {
        let count = (self.actuator_count as usize).min(MAX_ACTUATORS);
        &self.outputs[..count]
    }

    /// No drive line energized on any actuator.
    pub fn outputs_deenergized(&self) -> bool {
        self.outputs.iter().all(|o| !o.is_energized())
    }
}
