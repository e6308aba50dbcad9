//! Fault codes and retry classes.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Fault taxonomy reported through `fault_code` / `last_fault_code`.
///
/// Every code is recoverable through Reset or Retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FaultCode {
    /// No completion within the step's configured window.
    Timeout = 1,
    /// Injected by the surrounding equipment logic.
    ExternalFault = 2,
    /// Mutually exclusive requests asserted together.
    ConflictingCommands = 3,
    /// Requested transition blocked by a permissive group.
    PermissivesNotOk = 4,
    /// Feedback combination inconsistent with any valid state.
    UndefinedState = 5,
}

impl FaultCode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Timeout),
            2 => Some(Self::ExternalFault),
            3 => Some(Self::ConflictingCommands),
            4 => Some(Self::PermissivesNotOk),
            5 => Some(Self::UndefinedState),
            _ => None,
        }
    }

    /// Class flag for retry policies.
    pub const fn class(self) -> FaultClass {
        match self {
            Self::Timeout => FaultClass::TIMEOUT,
            Self::ExternalFault => FaultClass::EXTERNAL_FAULT,
            Self::ConflictingCommands => FaultClass::CONFLICTING_COMMANDS,
            Self::PermissivesNotOk => FaultClass::PERMISSIVES_NOT_OK,
            Self::UndefinedState => FaultClass::UNDEFINED_STATE,
        }
    }

    /// Raised by a step sequencer (as opposed to the state controller).
    #[inline]
    pub const fn is_step_local(self) -> bool {
        matches!(self, Self::Timeout | Self::ExternalFault)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ExternalFault => "external_fault",
            Self::ConflictingCommands => "conflicting_commands",
            Self::PermissivesNotOk => "permissives_not_ok",
            Self::UndefinedState => "undefined_state",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Set of fault classes, used for per-step retry permission.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FaultClass: u8 {
        const TIMEOUT              = 0x01;
        const EXTERNAL_FAULT       = 0x02;
        const CONFLICTING_COMMANDS = 0x04;
        const PERMISSIVES_NOT_OK   = 0x08;
        const UNDEFINED_STATE      = 0x10;
    }
}

impl FaultClass {
    pub fn from_codes(codes: &[FaultCode]) -> Self {
        codes
            .iter()
            .fold(Self::empty(), |acc, code| acc | code.class())
    }

    #[inline]
    pub const fn permits(self, code: FaultCode) -> bool {
        self.contains(code.class())
    }
}

impl Default for FaultClass {
    fn default() -> Self {
        Self::TIMEOUT
    }
}
