//! Step state machine for a multi-step flow.
//!
//! Holds the current 1-based step and the errors from the last rejected advance. Validation
//! only runs on an explicit advance or submit, never while the user is typing.

use crate::config::CoreConfig;
use crate::steps::{all_steps_valid, validate_step, FlowDraft, ValidationResult};
use crate::submission::{SubmissionOutcome, Submitter};
use std::marker::PhantomData;

/// Navigation state for one draft of type `D`.
///
/// The machine never ends on its own; the caller discards it after a successful submission.
#[derive(Debug)]
pub struct StepMachine<D> {
    step: usize,
    errors: ValidationResult,
    calling_code: String,
    _draft: PhantomData<fn(&D)>,
}

impl<D: FlowDraft> StepMachine<D> {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            step: 1,
            errors: ValidationResult::new(),
            calling_code: cfg.calling_code().to_string(),
            _draft: PhantomData,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total_steps(&self) -> usize {
        D::total_steps()
    }

    pub fn label(&self) -> &'static str {
        D::steps()
            .get(self.step - 1)
            .map(|s| s.label)
            .unwrap_or_default()
    }

    /// Errors stored by the last rejected advance or submit.
    pub fn errors(&self) -> &[String] {
        self.errors.errors()
    }

    pub fn can_retreat(&self) -> bool {
        self.step > 1
    }

    pub fn is_final_step(&self) -> bool {
        self.step == D::total_steps()
    }

    /// Whether the current step would pass right now. Does not store errors.
    pub fn can_advance(&self, draft: &D) -> bool {
        !self.is_final_step() && validate_step(self.step, draft).is_empty()
    }

    /// Whether the terminal action should be enabled.
    pub fn can_submit(&self, draft: &D) -> bool {
        self.is_final_step() && all_steps_valid(draft)
    }

    /// Validates the current step and moves forward by one when it passes.
    ///
    /// On failure the step is unchanged and the returned errors are also stored for display.
    /// Entering a step runs the draft's [`FlowDraft::on_enter_step`] hook.
    pub fn attempt_advance(&mut self, draft: &mut D) -> ValidationResult {
        let result = validate_step(self.step, draft);
        if !result.is_empty() {
            tracing::debug!(flow = %D::FLOW, step = self.step, errors = result.errors().len(), "advance rejected");
            self.errors = result.clone();
            return result;
        }

        self.errors = ValidationResult::new();
        if self.step < D::total_steps() {
            self.step += 1;
            draft.on_enter_step(self.step, &self.calling_code);
            tracing::debug!(flow = %D::FLOW, step = self.step, "advanced");
        }
        result
    }

    /// Moves back one step without validating the step being left.
    pub fn retreat(&mut self) {
        if self.step > 1 {
            self.step -= 1;
        }
        self.errors = ValidationResult::new();
    }

    /// Runs the terminal action through `submitter`.
    ///
    /// Only valid on the final step and only once the final step validates. Re-entry while a
    /// submission is running is left to the submitter, which reports `InFlight`.
    pub async fn attempt_submit<S>(
        &mut self,
        draft: &D,
        submitter: &S,
    ) -> Result<SubmissionOutcome, ValidationResult>
    where
        D: Sync,
        S: Submitter<D> + ?Sized,
    {
        if !self.is_final_step() {
            let mut result = ValidationResult::new();
            result.push(format!(
                "Complete step {} of {} before submitting",
                self.step,
                D::total_steps()
            ));
            return Err(result);
        }

        let result = validate_step(self.step, draft);
        if !result.is_empty() {
            self.errors = result.clone();
            return Err(result);
        }
        self.errors = ValidationResult::new();

        Ok(submitter.submit(draft).await)
    }
}
