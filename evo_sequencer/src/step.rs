//! Step sequencing root.
//!
//! A [`sequencer::StepSequencer`] owns one step and its fault sibling.
//! A [`program::StepProgram`] chains them into the work of one operating state.

pub mod program;
pub mod sequencer;
