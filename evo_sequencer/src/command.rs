//! Command processing root.
//!
//! Priority arbitration of the per-cycle command lines.

pub mod arbitration;
