//! Step program: the ordered chain of steps run by one operating state.
//!
//! Built once from [`SequenceConfig`]. Structural checks happen here:
//! unique ids, fault-step collisions, `next` reachability, actuator names
//! and drive conflicts. A program is complete when its chain reaches step 0.

use std::collections::HashMap;
use std::time::Duration;

use evo_common::consts::{MAX_ACTUATORS, MAX_STEPS_PER_SEQUENCE};
use evo_common::sequencer::config::{SequenceConfig, StepConfig};
use evo_common::sequencer::fault::FaultClass;
use evo_common::sequencer::state::OperatingState;
use evo_common::sequencer::step::{ActiveStep, StepId};
use heapless::Vec as FixedVec;

use super::sequencer::{OutputPlan, StepDefinition, StepInputs, StepOutput, StepSequencer};
use crate::error::SetupError;
use crate::permissive::PermissiveEvaluator;

/// Steps of one program, executed one at a time.
#[derive(Debug, Clone)]
pub struct StepProgram {
    owner: OperatingState,
    entry: StepId,
    steps: FixedVec<StepSequencer, MAX_STEPS_PER_SEQUENCE>,
}

impl StepProgram {
    /// Build a program for `owner`.
    ///
    /// `actuators` maps actuator names to output indices. Step required masks
    /// are checked against `step_width`.
    pub fn from_config(
        owner: OperatingState,
        config: &SequenceConfig,
        actuators: &HashMap<&str, usize>,
        step_width: u8,
    ) -> Result<Self, SetupError> {
        let mut base_ids = Vec::with_capacity(config.steps.len());
        for step in &config.steps {
            if base_ids.contains(&step.step) {
                return Err(SetupError::DuplicateStep(step.step));
            }
            base_ids.push(step.step);
        }
        if !base_ids.contains(&config.entry) {
            return Err(SetupError::UnknownEntry {
                program: owner,
                entry: config.entry,
            });
        }

        let mut steps = FixedVec::new();
        let mut fault_ids: Vec<u16> = Vec::with_capacity(config.steps.len());
        for step in &config.steps {
            let def = resolve_step(owner, step, &base_ids, actuators, step_width)?;
            let fault = def.fault_step.0;
            if base_ids.contains(&fault) || fault_ids.contains(&fault) {
                return Err(SetupError::FaultStepCollision {
                    step: step.step,
                    fault_step: fault,
                });
            }
            fault_ids.push(fault);
            steps
                .push(StepSequencer::new(def))
                .map_err(|_| SetupError::TooManySteps {
                    program: owner,
                    max: MAX_STEPS_PER_SEQUENCE,
                })?;
        }

        Ok(Self {
            owner,
            entry: StepId(config.entry),
            steps,
        })
    }

    #[inline]
    pub const fn owner(&self) -> OperatingState {
        self.owner
    }

    #[inline]
    pub const fn entry(&self) -> StepId {
        self.entry
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `step_id` is a base or fault step of this program.
    pub fn owns(&self, step_id: StepId) -> bool {
        self.steps.iter().any(|s| s.owns(step_id))
    }

    /// Every id this program claims (base and fault steps).
    pub fn step_ids(&self) -> impl Iterator<Item = StepId> + '_ {
        self.steps
            .iter()
            .flat_map(|s| [s.definition().step, s.definition().fault_step])
    }

    pub fn sequencer(&self, step_id: StepId) -> Option<&StepSequencer> {
        self.steps.iter().find(|s| s.owns(step_id))
    }

    /// Tick every sequencer. At most one owns the active step and answers.
    pub fn tick(
        &mut self,
        active: &ActiveStep,
        inputs: &StepInputs,
        evaluator: &PermissiveEvaluator,
    ) -> Option<StepOutput> {
        let mut output = None;
        for seq in self.steps.iter_mut() {
            if let Some(out) = seq.tick(active, inputs, evaluator) {
                output = Some(out);
            }
        }
        output
    }

    /// Drive plan of the sequencer owning `active`.
    pub fn plan_for(&self, active: &ActiveStep) -> OutputPlan {
        self.sequencer(active.step_id)
            .map_or(OutputPlan::NONE, |s| s.plan_for(active))
    }

    pub fn reset(&mut self) {
        for seq in self.steps.iter_mut() {
            seq.reset();
        }
    }
}

fn resolve_step(
    owner: OperatingState,
    step: &StepConfig,
    base_ids: &[u16],
    actuators: &HashMap<&str, usize>,
    step_width: u8,
) -> Result<StepDefinition, SetupError> {
    if step.next != 0 && !base_ids.contains(&step.next) {
        return Err(SetupError::UnknownNextStep {
            program: owner,
            step: step.step,
            next: step.next,
        });
    }

    let fault_step = match step.fault_step {
        Some(id) => StepId(id),
        None => StepId(step.step)
            .fault_sibling()
            .ok_or(SetupError::FaultStepOverflow { step: step.step })?,
    };
    if fault_step.is_idle() {
        return Err(SetupError::FaultStepCollision {
            step: step.step,
            fault_step: 0,
        });
    }

    let timeout = Duration::try_from_secs_f64(step.timeout_s).map_err(|_| {
        SetupError::InvalidTimeout {
            step: step.step,
            timeout_s: step.timeout_s.to_string(),
        }
    })?;
    if timeout.is_zero() {
        return Err(SetupError::InvalidTimeout {
            step: step.step,
            timeout_s: step.timeout_s.to_string(),
        });
    }

    let required = PermissiveEvaluator::check_required(step_width, step.required)?;
    let advance = actuator_mask(step.step, &step.advance, actuators)?;
    let retract = actuator_mask(step.step, &step.retract, actuators)?;
    let both = advance & retract;
    if both != 0 {
        let index = both.trailing_zeros() as usize;
        let name = actuators
            .iter()
            .find(|(_, i)| **i == index)
            .map_or_else(|| index.to_string(), |(n, _)| (*n).to_string());
        return Err(SetupError::ConflictingDrive {
            step: step.step,
            name,
        });
    }

    Ok(StepDefinition {
        step: StepId(step.step),
        next: StepId(step.next),
        fault_step,
        timeout,
        required,
        retry_on: FaultClass::from_codes(&step.retry_on),
        plan: OutputPlan { advance, retract },
    })
}

fn actuator_mask(
    step: u16,
    names: &[String],
    actuators: &HashMap<&str, usize>,
) -> Result<u16, SetupError> {
    names.iter().try_fold(0u16, |mask, name| {
        match actuators.get(name.as_str()) {
            Some(&index) if index < MAX_ACTUATORS => Ok(mask | (1u16 << index)),
            _ => Err(SetupError::UnknownActuator {
                step,
                name: name.clone(),
            }),
        }
    })
}
