//! Step identity and the active-step record.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::fault::FaultCode;
use crate::consts::FAULT_STEP_OFFSET;

/// Step identifier. `0` is the idle step (no step active).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub u16);

impl StepId {
    pub const IDLE: Self = Self(0);

    #[inline]
    pub const fn is_idle(self) -> bool {
        self.0 == 0
    }

    /// Default fault sibling (`id + 1`). `None` on overflow.
    #[inline]
    pub const fn fault_sibling(self) -> Option<Self> {
        match self.0.checked_add(FAULT_STEP_OFFSET) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for StepId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// Mutable record of the step currently being executed.
///
/// Exactly one exists per controller. `elapsed` restarts whenever
/// `step_id` changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActiveStep {
    pub step_id: StepId,
    /// Step-local fault latched by the owning sequencer.
    pub fault_code: Option<FaultCode>,
    /// Step permissive result of the last evaluation.
    pub permissions_ok: bool,
    /// Time spent in `step_id`.
    pub elapsed: Duration,
}

impl ActiveStep {
    /// Fresh record for a newly entered step.
    pub const fn enter(step_id: StepId) -> Self {
        Self {
            step_id,
            fault_code: None,
            permissions_ok: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Record for a step already `elapsed` into its window.
    pub const fn at(step_id: StepId, elapsed: Duration) -> Self {
        Self {
            step_id,
            fault_code: None,
            permissions_ok: false,
            elapsed,
        }
    }

    #[inline]
    pub fn accumulate(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    #[inline]
    pub fn elapsed_s(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    #[inline]
    pub const fn is_idle(&self) -> bool {
        self.step_id.is_idle()
    }
}
