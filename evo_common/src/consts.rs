//! System-wide constants for the EVO sequencer workspace.
//!
//! Single source of truth for all numeric limits and default paths.
//! Imported by all crates. No duplication permitted.

use static_assertions::const_assert;

/// Default scan cycle time in microseconds (10 ms, typical PLC task).
pub const CYCLE_TIME_US: u32 = 10_000;

/// Minimum accepted scan cycle time [µs].
pub const CYCLE_TIME_US_MIN: u32 = 100;

/// Maximum accepted scan cycle time [µs].
pub const CYCLE_TIME_US_MAX: u32 = 1_000_000;

/// Maximum width of one permissive bit-field.
pub const MAX_PERMISSIVE_BITS: usize = 16;

/// Maximum number of double-acting actuators driven by one sequencer.
pub const MAX_ACTUATORS: usize = 16;

/// Maximum number of steps in one step program.
pub const MAX_STEPS_PER_SEQUENCE: usize = 64;

/// Default distance between a step and its fault sibling.
pub const FAULT_STEP_OFFSET: u16 = 1;

/// Default status snapshot interval [cycles].
pub const STATUS_INTERVAL_DEFAULT: u32 = 100;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/evo/sequencer.toml";

// Permissive and actuator masks are carried in `u16`.
const_assert!(MAX_PERMISSIVE_BITS <= 16);
const_assert!(MAX_ACTUATORS <= 16);
