//! Actuator interlocks.
//!
//! Two conditions are checked every cycle, before any output is latched:
//! - **Conflict**: advance and retract requested together for one actuator.
//! - **Discordance**: both end positions reported, or an actuator confirmed
//!   at an end and not driven since loses that end.
//!
//! An actuator left mid-stroke by Stop, Abort, Pause or a step change has no
//! confirmed end until feedback reports one again, so it is not discordant.

use evo_common::consts::MAX_ACTUATORS;
use evo_common::sequencer::config::ActuatorConfig;
use evo_common::sequencer::io::{ActuatorFeedback, ActuatorOutput, ActuatorRequest};

use crate::error::SetupError;

/// Kind of feedback discordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discordance {
    /// Advanced and retracted at once.
    BothEnds,
    /// Confirmed end position lost while not driven.
    NoEnd,
}

/// Outcome of one interlock evaluation. Indices refer to actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterlockVerdict {
    pub conflict: Option<usize>,
    pub discordant: Option<(usize, Discordance)>,
}

impl InterlockVerdict {
    #[inline]
    pub const fn is_clear(&self) -> bool {
        self.conflict.is_none() && self.discordant.is_none()
    }
}

/// Per-actuator monitoring configuration and end-position latches.
#[derive(Debug, Clone)]
pub struct ActuatorInterlock {
    names: Vec<String>,
    monitor_rest: [bool; MAX_ACTUATORS],
    /// Last end position reported, not driven since.
    confirmed: [bool; MAX_ACTUATORS],
}

impl ActuatorInterlock {
    pub fn from_config(actuators: &[ActuatorConfig]) -> Result<Self, SetupError> {
        if actuators.len() > MAX_ACTUATORS {
            return Err(SetupError::TooManyActuators { max: MAX_ACTUATORS });
        }
        let mut names: Vec<String> = Vec::with_capacity(actuators.len());
        let mut monitor_rest = [false; MAX_ACTUATORS];
        for (index, actuator) in actuators.iter().enumerate() {
            if names.contains(&actuator.name) {
                return Err(SetupError::DuplicateActuator(actuator.name.clone()));
            }
            names.push(actuator.name.clone());
            monitor_rest[index] = actuator.monitor_rest;
        }
        Ok(Self {
            names,
            monitor_rest,
            confirmed: [false; MAX_ACTUATORS],
        })
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, index: usize) -> &str {
        self.names.get(index).map_or("?", String::as_str)
    }

    /// Name → output index.
    pub fn indices(&self) -> impl Iterator<Item = (&str, usize)> {
        self.names.iter().enumerate().map(|(i, n)| (n.as_str(), i))
    }

    /// Actuator `index` has reported an end position and not been driven since.
    #[inline]
    pub fn is_confirmed(&self, index: usize) -> bool {
        self.confirmed.get(index).copied().unwrap_or(false)
    }

    /// Check configured actuators and update the end-position latches.
    /// First offender of each kind is reported.
    ///
    /// A `NoEnd` trip releases the latch: the position is unknown from then
    /// on, and the actuator may be reset and jogged back to an end.
    pub fn evaluate(
        &mut self,
        feedback: &[ActuatorFeedback; MAX_ACTUATORS],
        manual: &[ActuatorRequest; MAX_ACTUATORS],
        previous: &[ActuatorOutput; MAX_ACTUATORS],
    ) -> InterlockVerdict {
        let mut verdict = InterlockVerdict::default();
        for index in 0..self.count() {
            if verdict.conflict.is_none() && manual[index].is_conflicting() {
                verdict.conflict = Some(index);
            }
            if previous[index].is_energized() {
                self.confirmed[index] = false;
            }
            let fb = feedback[index];
            if fb.is_contradictory() {
                self.confirmed[index] = false;
                if verdict.discordant.is_none() {
                    verdict.discordant = Some((index, Discordance::BothEnds));
                }
            } else if fb.is_between() {
                if self.confirmed[index] && self.monitor_rest[index] {
                    self.confirmed[index] = false;
                    if verdict.discordant.is_none() {
                        verdict.discordant = Some((index, Discordance::NoEnd));
                    }
                }
            } else {
                self.confirmed[index] = true;
            }
        }
        verdict
    }
}
