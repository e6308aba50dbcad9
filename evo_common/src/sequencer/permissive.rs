//! Permissive (interlock) masks, groups and status reports.
//!
//! A permissive set is two explicit fixed-width masks: `live` sensor bits and
//! an operator `bypass`. Requirements are a third mask. No signed all-ones
//! conventions are used anywhere.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};

use crate::consts::MAX_PERMISSIVE_BITS;

/// Fixed-width (≤ 16 bits) permissive bit-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissiveMask(u16);

impl PermissiveMask {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(u16::MAX);

    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Mask with the lowest `width` bits set (saturates at 16).
    pub const fn low_bits(width: u8) -> Self {
        if width as usize >= MAX_PERMISSIVE_BITS {
            Self::ALL
        } else {
            Self((1u16 << width) - 1)
        }
    }

    /// Single-bit mask, empty for indices ≥ 16.
    pub const fn bit(index: u8) -> Self {
        if (index as usize) < MAX_PERMISSIVE_BITS {
            Self(1u16 << index)
        } else {
            Self::EMPTY
        }
    }

    #[inline]
    pub const fn is_set(self, index: u8) -> bool {
        (index as usize) < MAX_PERMISSIVE_BITS && self.0 & (1u16 << index) != 0
    }

    /// Every bit of `other` is also set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl BitOr for PermissiveMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitAnd for PermissiveMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl Not for PermissiveMask {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Display for PermissiveMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Raw permissive input for one group, as delivered by the host each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissiveInput {
    /// Live interlock conditions (1 = satisfied).
    pub live: PermissiveMask,
    /// Maintenance bypass (1 = forced satisfied).
    pub bypass: PermissiveMask,
}

impl PermissiveInput {
    pub const fn new(live: u16, bypass: u16) -> Self {
        Self {
            live: PermissiveMask::from_bits(live),
            bypass: PermissiveMask::from_bits(bypass),
        }
    }

    /// Every live bit asserted, nothing bypassed.
    pub const fn satisfied() -> Self {
        Self::new(u16::MAX, 0)
    }

    #[inline]
    pub const fn effective(self) -> PermissiveMask {
        self.live.union(self.bypass)
    }
}

/// Per-bit state for HMI reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitState {
    /// Neither live nor bypassed.
    #[default]
    Open,
    /// Live sensor satisfied.
    Satisfied,
    /// Forced by bypass, live sensor open.
    Bypassed,
    /// Live sensor satisfied and bypass set.
    SatisfiedBypassed,
}

impl BitState {
    pub const fn from_signals(live: bool, bypass: bool) -> Self {
        match (live, bypass) {
            (false, false) => Self::Open,
            (true, false) => Self::Satisfied,
            (false, true) => Self::Bypassed,
            (true, true) => Self::SatisfiedBypassed,
        }
    }

    #[inline]
    pub const fn is_effective(self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// Status of one permissive bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BitStatus {
    pub state: BitState,
    /// Bit participates in the `ok` decision.
    pub required: bool,
}

/// Result of one permissive evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissiveReport {
    /// Every required bit is effective.
    pub ok: bool,
    /// Modeled width; entries of `bits` beyond it are unused.
    pub width: u8,
    /// `live | bypass`, restricted to the modeled width.
    pub effective: PermissiveMask,
    /// Required bits that are not effective.
    pub missing: PermissiveMask,
    pub bits: [BitStatus; MAX_PERMISSIVE_BITS],
}

impl PermissiveReport {
    /// Modeled bit statuses.
    pub fn modeled_bits(&self) -> &[BitStatus] {
        let width = (self.width as usize).min(MAX_PERMISSIVE_BITS);
        &self.bits[..width]
    }

    /// Number of bits currently held satisfied only by bypass.
    pub fn bypassed_count(&self) -> usize {
        self.modeled_bits()
            .iter()
            .filter(|b| b.state == BitState::Bypassed)
            .count()
    }
}

/// Permission group consulted by the state controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissiveGroup {
    /// Guards Idle/Homed/Complete → Homing.
    Home,
    /// Guards → Running.
    Start,
    /// Guards Paused → Proceeding.
    Proceed,
    /// Keeps AutoRun re-triggering Complete → Running.
    AutoInterlock,
    /// Guards fault clearing and recovery to Idle.
    Reset,
}

impl PermissiveGroup {
    pub const COUNT: usize = 5;

    /// All groups in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Home,
        Self::Start,
        Self::Proceed,
        Self::AutoInterlock,
        Self::Reset,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Start => "start",
            Self::Proceed => "proceed",
            Self::AutoInterlock => "auto_interlock",
            Self::Reset => "reset",
        }
    }
}
