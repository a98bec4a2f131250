//! Step definitions and the step validation aggregator.
//!
//! Every flow declares a static table of [`StepDefinition`]s. Aggregation runs the step's
//! validator, which pushes messages in a fixed declaration order, so the same draft always
//! produces the same ordered error list. An empty list is the only signal to advance.

pub mod registration;
pub mod report;

use crate::draft::{Flow, FormDraft};

/// Ordered, human-readable error messages for one validation attempt.
///
/// Recomputed on every attempt and never stored by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult(Vec<String>);

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Pushes `message` when `ok` is false.
    pub fn require(&mut self, ok: bool, message: &str) {
        if !ok {
            self.push(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.0
    }

    pub fn into_errors(self) -> Vec<String> {
        self.0
    }
}

/// Static, process-wide description of one step.
pub struct StepDefinition<D: 'static> {
    /// 1-based position within the flow.
    pub index: usize,
    pub label: &'static str,
    /// Field names the step requires, in validation order.
    pub required_fields: &'static [&'static str],
    pub validate: fn(&D, &mut ValidationResult),
}

impl<D> std::fmt::Debug for StepDefinition<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDefinition")
            .field("index", &self.index)
            .field("label", &self.label)
            .field("required_fields", &self.required_fields)
            .finish()
    }
}

/// A draft type that drives a multi-step flow.
pub trait FlowDraft: Sized + 'static {
    const FLOW: Flow;

    fn steps() -> &'static [StepDefinition<Self>];

    /// Hook run after the machine moves onto `step`. Used for derived defaults.
    fn on_enter_step(&mut self, _step: usize, _calling_code: &str) {}

    fn total_steps() -> usize {
        Self::steps().len()
    }
}

/// Runs the validators registered for `step` against `draft`.
///
/// Steps are 1-based. An index outside the flow yields a single error rather than a panic.
pub fn validate_step<D: FlowDraft>(step: usize, draft: &D) -> ValidationResult {
    let mut result = ValidationResult::new();
    match step.checked_sub(1).and_then(|i| D::steps().get(i)) {
        Some(definition) => (definition.validate)(draft, &mut result),
        None => result.push(format!("Step {} does not exist in the {} flow", step, D::FLOW)),
    }
    result
}

/// First step (1-based) whose validation fails, with its errors.
pub fn first_failing_step<D: FlowDraft>(draft: &D) -> Option<(usize, ValidationResult)> {
    D::steps().iter().find_map(|definition| {
        let result = validate_step(definition.index, draft);
        (!result.is_empty()).then_some((definition.index, result))
    })
}

/// Whether every step of the flow passes, including conditionally-required fields.
pub fn all_steps_valid<D: FlowDraft>(draft: &D) -> bool {
    first_failing_step(draft).is_none()
}

impl FormDraft {
    pub fn total_steps(&self) -> usize {
        match self {
            FormDraft::Registration(_) => crate::draft::RegistrationDraft::total_steps(),
            FormDraft::Report(_) => crate::draft::ReportDraft::total_steps(),
        }
    }

    pub fn step_labels(&self) -> Vec<&'static str> {
        match self {
            FormDraft::Registration(_) => labels::<crate::draft::RegistrationDraft>(),
            FormDraft::Report(_) => labels::<crate::draft::ReportDraft>(),
        }
    }

    pub fn validate_step(&self, step: usize) -> ValidationResult {
        match self {
            FormDraft::Registration(draft) => validate_step(step, draft),
            FormDraft::Report(draft) => validate_step(step, draft),
        }
    }
}

fn labels<D: FlowDraft>() -> Vec<&'static str> {
    D::steps().iter().map(|s| s.label).collect()
}
