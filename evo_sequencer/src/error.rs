//! Setup-time errors.
//!
//! Everything that can be wrong with a configuration is detected when the
//! engines are built. The cycle itself has no error path.

use evo_common::sequencer::state::OperatingState;
use thiserror::Error;

/// Structural configuration error, raised while building the engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("permissive width {width} out of range [1, 16]")]
    InvalidWidth { width: u8 },

    #[error("required mask {required:#06x} exceeds modeled width {width}")]
    RequiredOutsideWidth { required: u16, width: u8 },

    #[error("step {step}: timeout {timeout_s}s is not a valid duration")]
    InvalidTimeout { step: u16, timeout_s: String },

    #[error("step id {0} is used more than once")]
    DuplicateStep(u16),

    #[error("step {step}: fault step {fault_step} collides with another step")]
    FaultStepCollision { step: u16, fault_step: u16 },

    #[error("step {step}: no fault step id available")]
    FaultStepOverflow { step: u16 },

    #[error("{program:?} program: entry step {entry} is not defined")]
    UnknownEntry { program: OperatingState, entry: u16 },

    #[error("{program:?} program: step {step} continues to undefined step {next}")]
    UnknownNextStep {
        program: OperatingState,
        step: u16,
        next: u16,
    },

    #[error("{program:?} program: more than {max} steps")]
    TooManySteps { program: OperatingState, max: usize },

    #[error("more than {max} actuators configured")]
    TooManyActuators { max: usize },

    #[error("actuator name '{0}' is used more than once")]
    DuplicateActuator(String),

    #[error("step {step}: unknown actuator '{name}'")]
    UnknownActuator { step: u16, name: String },

    #[error("step {step}: actuator '{name}' driven in both directions")]
    ConflictingDrive { step: u16, name: String },
}
