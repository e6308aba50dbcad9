//! State machine module root.
//!
//! The operating-state transition table and the controller that drives it.

pub mod controller;
pub mod operating;
