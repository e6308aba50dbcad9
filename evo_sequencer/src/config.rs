//! TOML configuration loader with validation.
//!
//! Loading runs in two passes: [`SequencerConfig::validate`] checks scalar
//! bounds, then building the [`StateController`] checks structure (step ids,
//! fault-step pairing, actuator names). A config that loads is runnable.

use std::path::Path;

use evo_common::config::{ConfigError, ConfigLoader};
use evo_common::sequencer::config::SequencerConfig;
use thiserror::Error;
use tracing::debug;

use crate::error::SetupError;
use crate::state::controller::StateController;

// ─── Error Type ─────────────────────────────────────────────────────

/// Configuration loading or build error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid sequencer setup: {0}")]
    Setup(#[from] SetupError),
}

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Validated configuration and the controller built from it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SequencerConfig,
    pub controller: StateController,
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load, validate and build from a TOML file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, LoadError> {
    let config = SequencerConfig::load(path)?;
    build(config)
}

/// Load config from a TOML string (for testing).
pub fn load_config_from_str(text: &str) -> Result<LoadedConfig, LoadError> {
    let config = SequencerConfig::from_toml_str(text)?;
    build(config)
}

fn build(config: SequencerConfig) -> Result<LoadedConfig, LoadError> {
    config.validate()?;
    let controller = StateController::new(&config)?;
    debug!(
        service = %config.shared.service_name,
        actuators = config.actuators.len(),
        "sequencer configuration built"
    );
    Ok(LoadedConfig { config, controller })
}
