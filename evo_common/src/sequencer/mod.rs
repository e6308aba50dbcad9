//! Sequencer shared types.
//!
//! Everything exchanged between the sequencing engines and their host lives
//! here: operating states, command lines, permissive masks and reports, step
//! identity, fault codes, the per-cycle input/output contract and the TOML
//! configuration structures.

pub mod command;
pub mod config;
pub mod fault;
pub mod io;
pub mod permissive;
pub mod state;
pub mod step;
