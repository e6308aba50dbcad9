//! Operating state of a sequenced cell.
//!
//! Each state carries a power-of-two code so HMI and diagnostics consumers
//! can combine states into bitmasks. Membership inside the engine goes
//! through [`OperatingState::group`] instead of bit arithmetic.

use serde::{Deserialize, Serialize};

/// Operating state (exactly one is current at any instant).
///
/// `Fault` and `Undefined` are absorbing: only a permission-gated Reset
/// leaves them. Cold start is `Undefined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum OperatingState {
    /// Ready, nothing sequenced.
    Idle = 0x0001,
    /// Production program executing.
    Running = 0x0002,
    /// Controlled stop in progress.
    Stopping = 0x0004,
    /// Homing program executing.
    Homing = 0x0008,
    /// Abort in progress.
    Aborting = 0x0010,
    /// Homing finished, ready to start.
    Homed = 0x0020,
    /// Controlled stop finished.
    Stopped = 0x0040,
    /// Abort finished.
    Aborted = 0x0080,
    /// Production program finished.
    Complete = 0x0100,
    /// Pause requested, freezing the active step.
    Pausing = 0x0200,
    /// Frozen at the stored step.
    Paused = 0x0400,
    /// Resuming the stored step.
    Proceeding = 0x0800,
    /// Fault latched.
    Fault = 0x1000,
    /// Feedback inconsistent with any valid state (also the cold-start state).
    #[default]
    Undefined = 0x2000,
}

/// Explicit grouping of operating states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateGroup {
    /// At rest, waiting for a command.
    Settled,
    /// Doing work or moving between settled states.
    Acting,
    /// Fault latched, only Reset leaves.
    Faulted,
}

impl OperatingState {
    /// Every state, in code order.
    pub const ALL: [Self; 14] = [
        Self::Idle,
        Self::Running,
        Self::Stopping,
        Self::Homing,
        Self::Aborting,
        Self::Homed,
        Self::Stopped,
        Self::Aborted,
        Self::Complete,
        Self::Pausing,
        Self::Paused,
        Self::Proceeding,
        Self::Fault,
        Self::Undefined,
    ];

    /// Power-of-two state code.
    #[inline]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Classification used by the controller and by status consumers.
    pub const fn group(self) -> StateGroup {
        match self {
            Self::Idle
            | Self::Homed
            | Self::Stopped
            | Self::Aborted
            | Self::Complete
            | Self::Paused => StateGroup::Settled,
            Self::Running
            | Self::Stopping
            | Self::Homing
            | Self::Aborting
            | Self::Pausing
            | Self::Proceeding => StateGroup::Acting,
            Self::Fault | Self::Undefined => StateGroup::Faulted,
        }
    }

    #[inline]
    pub const fn is_settled(self) -> bool {
        matches!(self.group(), StateGroup::Settled)
    }

    #[inline]
    pub const fn is_faulted(self) -> bool {
        matches!(self.group(), StateGroup::Faulted)
    }

    /// States whose work is carried out by a step program.
    #[inline]
    pub const fn runs_sequence(self) -> bool {
        matches!(
            self,
            Self::Homing | Self::Running | Self::Stopping | Self::Aborting
        )
    }

    /// Bitmask test against a combination of state codes.
    #[inline]
    pub const fn is_in(self, mask: u16) -> bool {
        self.code() & mask != 0
    }

    /// Combine several states into a code mask.
    pub const fn mask_of(states: &[Self]) -> u16 {
        let mut mask = 0;
        let mut i = 0;
        while i < states.len() {
            mask |= states[i].code();
            i += 1;
        }
        mask
    }
}
