//! EVO Common Library
//!
//! Shared constants, configuration loading and sequencer data types for all
//! EVO sequencer crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Workspace-wide numeric limits and defaults
//! - [`config`] - Configuration loading traits and types
//! - [`sequencer`] - Operating states, commands, permissives, steps and the
//!   per-cycle input/output contract
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! evo = { package = "evo_common", path = "../evo_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use evo_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod sequencer;
