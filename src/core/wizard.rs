//! Wizard controller - step transitions and cross-step data accumulation
//!
//! The controller owns the current step and the accumulated answers. It
//! gates `next` on step validation, keeps unvalidated edits on `back`, and
//! releases the accumulated answers exactly once when the final step is
//! submitted or skipped.

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::identity::{FieldKey, StepId};
use crate::schema::registry::SchemaRegistry;
use crate::schema::validator::{StepValidationError, StepValidator, StepValues};

/// Union of all values collected across steps so far
pub type AccumulatedData = BTreeMap<FieldKey, String>;

/// Where the wizard currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    Step(StepId),
    /// The accumulated answers have been handed off for submission
    Submitted,
}

/// Result of a successful transition
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Now showing the given step
    Moved(StepId),
    /// `back` on the first step
    Stayed(StepId),
    /// Final step completed; the answers are handed to the submitter
    Submit(AccumulatedData),
}

/// Errors that can occur while driving the wizard
#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Invalid(#[from] StepValidationError),

    #[error("Skip is only offered on the final step (current step: {0})")]
    SkipNotOffered(StepId),

    #[error("The wizard has already been submitted")]
    AlreadySubmitted,
}

/// Owns the wizard state for one run
#[derive(Debug)]
pub struct WizardController {
    registry: SchemaRegistry,
    validator: StepValidator,
    phase: WizardPhase,
    accumulated: AccumulatedData,
}

impl WizardController {
    /// Create a wizard positioned on the first step with no answers
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            validator: StepValidator::new(registry),
            phase: WizardPhase::Step(StepId::first()),
            accumulated: AccumulatedData::new(),
        }
    }

    /// Get the current phase
    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    /// Get the active step, or `None` once submitted
    pub fn current_step(&self) -> Option<StepId> {
        match self.phase {
            WizardPhase::Step(step) => Some(step),
            WizardPhase::Submitted => None,
        }
    }

    /// Whether the skip escape hatch is available on the active step
    pub fn can_skip(&self) -> bool {
        self.current_step().is_some_and(|s| s.is_final())
    }

    /// Whether `back` would move
    pub fn can_go_back(&self) -> bool {
        self.current_step().and_then(|s| s.previous()).is_some()
    }

    /// The answers accumulated so far
    pub fn accumulated(&self) -> &AccumulatedData {
        &self.accumulated
    }

    /// Values to pre-populate the active step's inputs with
    pub fn prefill(&self) -> StepValues {
        let Some(step) = self.current_step() else {
            return StepValues::new();
        };
        self.registry
            .fields(step)
            .iter()
            .filter_map(|f| self.accumulated.get(&f.key).map(|v| (f.key, v.clone())))
            .collect()
    }

    /// Validate the active step and advance, or hand off on the final step.
    ///
    /// On a validation failure the accumulated answers are left untouched.
    pub fn next(&mut self, input: &StepValues) -> Result<Transition, WizardError> {
        let step = self.active_step()?;
        let normalized = self.validator.validate(step, input)?;
        self.accumulated.extend(normalized);

        match step.next() {
            Some(next) => {
                debug!(from = %step, to = %next, "wizard advanced");
                self.phase = WizardPhase::Step(next);
                Ok(Transition::Moved(next))
            }
            None => Ok(self.hand_off()),
        }
    }

    /// Keep the active step's raw values and move to the previous step
    pub fn back(&mut self, input: &StepValues) -> Result<Transition, WizardError> {
        let step = self.active_step()?;
        self.merge_raw(step, input);

        match step.previous() {
            Some(previous) => {
                debug!(from = %step, to = %previous, "wizard moved back");
                self.phase = WizardPhase::Step(previous);
                Ok(Transition::Moved(previous))
            }
            None => Ok(Transition::Stayed(step)),
        }
    }

    /// Merge the final step's raw values without validation and hand off
    pub fn skip(&mut self, input: &StepValues) -> Result<Transition, WizardError> {
        let step = self.active_step()?;
        if !step.is_final() {
            return Err(WizardError::SkipNotOffered(step));
        }
        self.merge_raw(step, input);
        debug!(step = %step, "final step skipped");
        Ok(self.hand_off())
    }

    fn active_step(&self) -> Result<StepId, WizardError> {
        self.current_step().ok_or(WizardError::AlreadySubmitted)
    }

    fn merge_raw(&mut self, step: StepId, input: &StepValues) {
        for field in self.registry.fields(step) {
            if let Some(value) = input.get(&field.key) {
                self.accumulated.insert(field.key, value.clone());
            }
        }
    }

    fn hand_off(&mut self) -> Transition {
        self.phase = WizardPhase::Submitted;
        let data = std::mem::take(&mut self.accumulated);
        info!(fields = data.len(), "wizard complete, handing off for submission");
        Transition::Submit(data)
    }
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new(SchemaRegistry::default())
    }
}
