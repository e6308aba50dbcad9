//! Permissive evaluation.
//!
//! `effective = live | bypass`, `ok = effective ⊇ required`. The evaluator is
//! a pure function of its inputs; width and required-mask consistency are
//! checked once when it is built.

use evo_common::consts::MAX_PERMISSIVE_BITS;
use evo_common::sequencer::config::PermissiveGroupConfig;
use evo_common::sequencer::permissive::{
    BitState, BitStatus, PermissiveInput, PermissiveMask, PermissiveReport,
};

use crate::error::SetupError;

/// Core predicate: every required bit is present in `effective`.
#[inline]
pub const fn permits(effective: PermissiveMask, required: PermissiveMask) -> bool {
    effective.contains(required)
}

/// Evaluator for one permissive group of fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissiveEvaluator {
    width: u8,
    modeled: PermissiveMask,
    required: PermissiveMask,
}

impl PermissiveEvaluator {
    /// Build an evaluator. `required = None` requires every modeled bit.
    pub fn new(width: u8, required: Option<u16>) -> Result<Self, SetupError> {
        if width == 0 || width as usize > MAX_PERMISSIVE_BITS {
            return Err(SetupError::InvalidWidth { width });
        }
        let modeled = PermissiveMask::low_bits(width);
        let required = match required {
            Some(bits) => Self::check_required(width, bits)?,
            None => modeled,
        };
        Ok(Self {
            width,
            modeled,
            required,
        })
    }

    pub fn from_config(config: &PermissiveGroupConfig) -> Result<Self, SetupError> {
        Self::new(config.width, config.required)
    }

    /// Reject required bits beyond `width`.
    pub fn check_required(width: u8, bits: u16) -> Result<PermissiveMask, SetupError> {
        let required = PermissiveMask::from_bits(bits);
        if !PermissiveMask::low_bits(width).contains(required) {
            return Err(SetupError::RequiredOutsideWidth {
                required: bits,
                width,
            });
        }
        Ok(required)
    }

    #[inline]
    pub const fn width(&self) -> u8 {
        self.width
    }

    #[inline]
    pub const fn required(&self) -> PermissiveMask {
        self.required
    }

    /// Evaluate against the configured required mask.
    #[inline]
    pub fn evaluate(&self, input: PermissiveInput) -> PermissiveReport {
        self.evaluate_with(input, self.required)
    }

    /// Evaluate against an explicit required mask (per-step requirements).
    ///
    /// Live and bypass bits beyond the modeled width are ignored. Required
    /// bits beyond it can never be satisfied.
    pub fn evaluate_with(&self, input: PermissiveInput, required: PermissiveMask) -> PermissiveReport {
        let live = input.live & self.modeled;
        let bypass = input.bypass & self.modeled;
        let effective = live | bypass;

        let mut bits = [BitStatus::default(); MAX_PERMISSIVE_BITS];
        for (index, status) in bits.iter_mut().enumerate().take(self.width as usize) {
            let bit = index as u8;
            *status = BitStatus {
                state: BitState::from_signals(live.is_set(bit), bypass.is_set(bit)),
                required: required.is_set(bit),
            };
        }

        PermissiveReport {
            ok: permits(effective, required),
            width: self.width,
            effective,
            missing: required.without(effective),
            bits,
        }
    }
}
