//! Operating state transitions.
//!
//! Implements the transition table of the sequenced cell:
//!
//! ```text
//! Idle|Homed|Complete --Home--> Homing --done--> Homed
//! Idle|Homed|Complete --Start--> Running --done--> Complete --AutoRestart--> Running
//! Running --Pause--> Pausing --> Paused --Proceed--> Proceeding --> Running
//! non-fault --Stop--> Stopping --> Stopped
//! non-fault --Abort--> Aborting --> Aborted
//! Fault|Undefined|Stopped|Aborted|Complete --Reset--> Idle
//! any --Conflict--> Fault          non-faulted --Discordance--> Undefined
//! ```
//!
//! Guards (permissives, safe-to-clear) are evaluated by the controller
//! before an event is raised. This table only decides validity.

use evo_common::sequencer::state::OperatingState;

/// Result of a transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded, new state.
    Ok(OperatingState),
    /// Transition rejected, reason.
    Rejected(&'static str),
}

/// Event that can trigger a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    Home,
    Start,
    Stop,
    Abort,
    Pause,
    Proceed,
    Reset,
    /// Step program finished, or transient state settled.
    PhaseComplete,
    /// AutoRun re-trigger from Complete.
    AutoRestart,
    /// Conflicting directional request detected.
    Conflict,
    /// Feedback inconsistent with any valid position.
    Discordance,
}

/// Pure transition function.
pub fn transition(state: OperatingState, event: StateEvent) -> TransitionResult {
    use OperatingState::*;
    use StateEvent::*;

    let next = match (state, event) {
        (Fault, Conflict) => return TransitionResult::Rejected("already in Fault"),
        (_, Conflict) => Fault,

        (Fault | Undefined, Discordance) => {
            return TransitionResult::Rejected("fault already latched");
        }
        (_, Discordance) => Undefined,

        (Fault | Undefined | Aborting | Aborted, Abort) => {
            return TransitionResult::Rejected(invalid_transition_reason(state, event));
        }
        (_, Abort) => Aborting,

        (Fault | Undefined | Stopping | Stopped | Aborting | Aborted, Stop) => {
            return TransitionResult::Rejected(invalid_transition_reason(state, event));
        }
        (_, Stop) => Stopping,

        (Idle | Homed | Complete, Home) => Homing,
        (Idle | Homed | Complete, Start) => Running,
        (Complete, AutoRestart) => Running,

        (Running, Pause) => Pausing,
        (Paused, Proceed) => Proceeding,

        (Homing, PhaseComplete) => Homed,
        (Running, PhaseComplete) => Complete,
        (Pausing, PhaseComplete) => Paused,
        (Proceeding, PhaseComplete) => Running,
        (Stopping, PhaseComplete) => Stopped,
        (Aborting, PhaseComplete) => Aborted,

        (Fault | Undefined | Stopped | Aborted | Complete, Reset) => Idle,

        _ => return TransitionResult::Rejected(invalid_transition_reason(state, event)),
    };
    TransitionResult::Ok(next)
}

fn invalid_transition_reason(state: OperatingState, event: StateEvent) -> &'static str {
    use OperatingState::*;
    use StateEvent::*;
    match (state, event) {
        (Fault | Undefined, _) => "faulted: only Reset allowed",
        (Aborting | Aborted, Abort) => "abort already in progress",
        (Stopping | Stopped, Stop) => "stop already in progress",
        (Aborting | Aborted, Stop) => "abort overrides stop",
        (_, Reset) => "Reset only clears Fault, Undefined, Stopped, Aborted or Complete",
        (_, PhaseComplete) => "no phase running",
        (_, Home | Start) => "Home/Start only from Idle, Homed or Complete",
        (_, Pause) => "Pause only while Running",
        (_, Proceed) => "Proceed only while Paused",
        (_, AutoRestart) => "AutoRestart only from Complete",
        _ => "invalid event for current state",
    }
}

/// Operating state holder.
#[derive(Debug, Clone)]
pub struct OperatingStateMachine {
    state: OperatingState,
}

impl OperatingStateMachine {
    /// Cold start in `Undefined`.
    pub const fn new() -> Self {
        Self {
            state: OperatingState::Undefined,
        }
    }

    #[inline]
    pub const fn state(&self) -> OperatingState {
        self.state
    }

    /// Would `event` be accepted in the current state.
    #[inline]
    pub fn accepts(&self, event: StateEvent) -> bool {
        matches!(transition(self.state, event), TransitionResult::Ok(_))
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: StateEvent) -> TransitionResult {
        let result = transition(self.state, event);
        if let TransitionResult::Ok(next) = result {
            self.state = next;
        }
        result
    }
}

impl Default for OperatingStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
