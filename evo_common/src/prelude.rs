//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use evo_common::prelude::*;` and get
//! the most important types without listing individual paths.
//!
//! # Usage
//!
//! ```rust
//! use evo_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::sequencer::config::{SequencerConfig, StepConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CYCLE_TIME_US, MAX_ACTUATORS, MAX_PERMISSIVE_BITS};

// ─── Sequencer Types ────────────────────────────────────────────────
pub use crate::sequencer::command::{Command, CommandSet};
pub use crate::sequencer::fault::{FaultClass, FaultCode};
pub use crate::sequencer::io::{
    ActuatorFeedback, ActuatorOutput, ActuatorRequest, CycleInputs, CycleStatus,
};
pub use crate::sequencer::permissive::{
    BitState, PermissiveGroup, PermissiveInput, PermissiveMask, PermissiveReport,
};
pub use crate::sequencer::state::{OperatingState, StateGroup};
pub use crate::sequencer::step::{ActiveStep, StepId};

/// Default scan cycle time as Duration.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_micros(CYCLE_TIME_US as u64);
