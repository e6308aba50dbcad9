//! # EVO Sequencer Library
//!
//! Cyclic, scan-based sequencing engine for discrete process control.
//! One call to [`state::controller::StateController::cycle`] is one scan:
//! permissive groups are evaluated, commands arbitrated, the active step
//! program ticked, safety checks applied and actuator outputs latched.
//!
//! ## Engines
//!
//! 1. **PermissiveEvaluator**: interlock bit-field + bypass → ok + per-bit report
//! 2. **StepSequencer**: one step's window: timeout, gating, fault step, retry
//! 3. **StateController**: operating state, arbitration, active step, outputs
//!
//! ## Zero-Allocation Cycle
//!
//! Programs and evaluators are built once from configuration. The cycle
//! itself works on fixed-size arrays and `heapless` vectors only.

pub mod command;
pub mod config;
pub mod cycle;
pub mod error;
pub mod permissive;
pub mod safety;
pub mod sim;
pub mod state;
pub mod step;
