//! Configuration structures for the sequencer.
//!
//! All config types use `serde::Deserialize` for TOML loading.
//! Scalar bounds are checked by [`SequencerConfig::validate`]; structural
//! checks (step graph, actuator names) happen when the engine is built.
//!
//! # TOML Example
//!
//! ```toml
//! cycle_time_us = 10000
//! auto_run = true
//!
//! [shared]
//! service_name = "press-cell-01"
//!
//! [permissives.start]
//! width = 4
//!
//! [[actuators]]
//! name = "clamp"
//!
//! [sequences.running]
//! entry = 20
//!
//! [[sequences.running.steps]]
//! step = 20
//! next = 0
//! timeout_s = 5.0
//! advance = ["clamp"]
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    CYCLE_TIME_US, CYCLE_TIME_US_MAX, CYCLE_TIME_US_MIN, MAX_ACTUATORS, MAX_PERMISSIVE_BITS,
    MAX_STEPS_PER_SEQUENCE, STATUS_INTERVAL_DEFAULT,
};

use super::fault::FaultCode;
use super::permissive::PermissiveGroup;
use super::state::OperatingState;

/// Longest accepted step timeout [s].
pub const STEP_TIMEOUT_MAX_S: f64 = 86_400.0;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Top-level sequencer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencerConfig {
    pub shared: SharedConfig,

    /// Scan period in microseconds (default: 10000 = 10ms).
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,

    /// Restart Running from Complete while AutoInterlock holds.
    #[serde(default)]
    pub auto_run: bool,

    /// Start from Idle goes through Homing first.
    #[serde(default)]
    pub homing_required: bool,

    /// Status snapshot interval [cycles] (default: 100).
    #[serde(default = "default_status_interval")]
    pub status_interval: u32,

    /// Modeled width of the step permissive field (default: 16).
    #[serde(default = "default_width")]
    pub step_permissive_width: u8,

    #[serde(default)]
    pub permissives: PermissiveGroupsConfig,

    #[serde(default)]
    pub actuators: Vec<ActuatorConfig>,

    pub sequences: SequencesConfig,
}

fn default_cycle_time_us() -> u32 {
    CYCLE_TIME_US
}
fn default_status_interval() -> u32 {
    STATUS_INTERVAL_DEFAULT
}
fn default_width() -> u8 {
    MAX_PERMISSIVE_BITS as u8
}
fn default_true() -> bool {
    true
}
fn default_retry_on() -> Vec<FaultCode> {
    vec![FaultCode::Timeout]
}

impl SequencerConfig {
    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.cycle_time_us < CYCLE_TIME_US_MIN || self.cycle_time_us > CYCLE_TIME_US_MAX {
            return Err(invalid(format!(
                "cycle_time_us {} out of range [{}, {}]",
                self.cycle_time_us, CYCLE_TIME_US_MIN, CYCLE_TIME_US_MAX
            )));
        }
        if self.status_interval == 0 {
            return Err(invalid("status_interval must be at least 1".to_string()));
        }
        check_width("step_permissive_width", self.step_permissive_width)?;
        for group in PermissiveGroup::ALL {
            check_width(group.name(), self.permissives.group(group).width)?;
        }
        if self.actuators.len() > MAX_ACTUATORS {
            return Err(invalid(format!(
                "{} actuators configured, at most {} supported",
                self.actuators.len(),
                MAX_ACTUATORS
            )));
        }
        for (state, sequence) in self.sequences.iter() {
            sequence.validate(state)?;
        }
        Ok(())
    }

    /// Nominal cycle period.
    pub fn cycle_time(&self) -> std::time::Duration {
        std::time::Duration::from_micros(u64::from(self.cycle_time_us))
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::ValidationError(message)
}

fn check_width(name: &str, width: u8) -> Result<(), ConfigError> {
    if width == 0 || width as usize > MAX_PERMISSIVE_BITS {
        return Err(invalid(format!(
            "{name} width {width} out of range [1, {MAX_PERMISSIVE_BITS}]"
        )));
    }
    Ok(())
}

// ─── Permissive Groups ──────────────────────────────────────────────

/// One permissive group: modeled width and required mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissiveGroupConfig {
    #[serde(default = "default_width")]
    pub width: u8,
    /// Required bits. `None` requires every modeled bit.
    #[serde(default)]
    pub required: Option<u16>,
}

impl Default for PermissiveGroupConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            required: None,
        }
    }
}

/// `[permissives.*]` tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissiveGroupsConfig {
    #[serde(default)]
    pub home: PermissiveGroupConfig,
    #[serde(default)]
    pub start: PermissiveGroupConfig,
    #[serde(default)]
    pub proceed: PermissiveGroupConfig,
    #[serde(default)]
    pub auto_interlock: PermissiveGroupConfig,
    #[serde(default)]
    pub reset: PermissiveGroupConfig,
}

impl PermissiveGroupsConfig {
    pub fn group(&self, group: PermissiveGroup) -> &PermissiveGroupConfig {
        match group {
            PermissiveGroup::Home => &self.home,
            PermissiveGroup::Start => &self.start,
            PermissiveGroup::Proceed => &self.proceed,
            PermissiveGroup::AutoInterlock => &self.auto_interlock,
            PermissiveGroup::Reset => &self.reset,
        }
    }
}

// ─── Actuators ──────────────────────────────────────────────────────

/// Double-acting actuator with advanced/retracted end-position feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    pub name: String,
    /// Treat losing a confirmed end position while not driven as discordant.
    #[serde(default = "default_true")]
    pub monitor_rest: bool,
}

// ─── Sequences ──────────────────────────────────────────────────────

/// Step programs per sequence-running state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequencesConfig {
    #[serde(default)]
    pub homing: Option<SequenceConfig>,
    pub running: SequenceConfig,
    #[serde(default)]
    pub stopping: Option<SequenceConfig>,
    #[serde(default)]
    pub aborting: Option<SequenceConfig>,
}

impl SequencesConfig {
    /// Configured programs with the state that runs them.
    pub fn iter(&self) -> impl Iterator<Item = (OperatingState, &SequenceConfig)> {
        [
            (OperatingState::Homing, self.homing.as_ref()),
            (OperatingState::Running, Some(&self.running)),
            (OperatingState::Stopping, self.stopping.as_ref()),
            (OperatingState::Aborting, self.aborting.as_ref()),
        ]
        .into_iter()
        .filter_map(|(state, seq)| seq.map(|s| (state, s)))
    }
}

/// Ordered step program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Step entered when the owning state is entered.
    pub entry: u16,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

impl SequenceConfig {
    fn validate(&self, state: OperatingState) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(invalid(format!("{state:?} sequence has no steps")));
        }
        if self.steps.len() > MAX_STEPS_PER_SEQUENCE {
            return Err(invalid(format!(
                "{state:?} sequence has {} steps, at most {} supported",
                self.steps.len(),
                MAX_STEPS_PER_SEQUENCE
            )));
        }
        if self.entry == 0 {
            return Err(invalid(format!("{state:?} sequence entry cannot be step 0")));
        }
        for step in &self.steps {
            step.validate()?;
        }
        Ok(())
    }
}

/// One step of a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    pub step: u16,
    /// Step entered on success. `0` ends the program.
    pub next: u16,
    /// Activation window [s].
    pub timeout_s: f64,
    /// Fault sibling. Defaults to `step + 1`.
    #[serde(default)]
    pub fault_step: Option<u16>,
    /// Required step permissive bits.
    #[serde(default)]
    pub required: u16,
    /// Fault classes a Retry may clear.
    #[serde(default = "default_retry_on")]
    pub retry_on: Vec<FaultCode>,
    /// Actuators driven towards advanced while the step holds.
    #[serde(default)]
    pub advance: Vec<String>,
    /// Actuators driven towards retracted while the step holds.
    #[serde(default)]
    pub retract: Vec<String>,
}

impl StepConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.step == 0 {
            return Err(invalid("step id 0 is reserved for idle".to_string()));
        }
        if !self.timeout_s.is_finite() || self.timeout_s <= 0.0 || self.timeout_s > STEP_TIMEOUT_MAX_S
        {
            return Err(invalid(format!(
                "step {} timeout_s {} out of range (0, {}]",
                self.step, self.timeout_s, STEP_TIMEOUT_MAX_S
            )));
        }
        // Controller faults are cleared by Reset only.
        if let Some(code) = self.retry_on.iter().find(|c| !c.is_step_local()) {
            return Err(invalid(format!(
                "step {} retry_on lists {code}, which a step cannot raise",
                self.step
            )));
        }
        Ok(())
    }
}
