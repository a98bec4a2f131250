//! Report flow: report type, symptoms, details.

use super::{FlowDraft, StepDefinition, ValidationResult};
use crate::draft::{Flow, ReportDraft};
use crate::validation::required_non_empty;

static REPORT_STEPS: [StepDefinition<ReportDraft>; 3] = [
    StepDefinition {
        index: 1,
        label: "Type",
        required_fields: &["reportType"],
        validate: validate_type,
    },
    StepDefinition {
        index: 2,
        label: "Symptoms",
        required_fields: &["symptoms|customSymptom"],
        validate: validate_symptoms,
    },
    StepDefinition {
        index: 3,
        label: "Details",
        required_fields: &["description"],
        validate: validate_details,
    },
];

impl FlowDraft for ReportDraft {
    const FLOW: Flow = Flow::Report;

    fn steps() -> &'static [StepDefinition<Self>] {
        &REPORT_STEPS
    }
}

fn validate_type(d: &ReportDraft, r: &mut ValidationResult) {
    r.require(
        d.report_type.is_some(),
        "Select whether you are reporting your own or observed symptoms",
    );
}

// Neither field is mandatory on its own; both empty fails.
fn validate_symptoms(d: &ReportDraft, r: &mut ValidationResult) {
    let any_checked = d.symptoms.iter().any(|s| required_non_empty(s));
    r.require(
        any_checked || required_non_empty(&d.custom_symptom),
        "Select or describe at least one symptom",
    );
}

fn validate_details(d: &ReportDraft, r: &mut ValidationResult) {
    r.require(required_non_empty(&d.description), "Description is required");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::ReportType;
    use crate::steps::validate_step;

    fn symptoms_draft(symptoms: &[&str], custom: &str) -> ReportDraft {
        ReportDraft {
            report_type: Some(ReportType::SelfReported),
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            custom_symptom: custom.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn symptom_step_fails_when_both_empty() {
        let result = validate_step(2, &symptoms_draft(&[], ""));
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].contains("symptom"));
    }

    #[test]
    fn symptom_step_passes_with_checkbox_only() {
        assert!(validate_step(2, &symptoms_draft(&["Fever"], "")).is_empty());
    }

    #[test]
    fn symptom_step_passes_with_custom_only() {
        assert!(validate_step(2, &symptoms_draft(&[], "rash")).is_empty());
    }

    #[test]
    fn blank_custom_symptom_does_not_count() {
        assert!(!validate_step(2, &symptoms_draft(&[], "   ")).is_empty());
    }

    #[test]
    fn type_and_details_steps_require_their_fields() {
        let draft = ReportDraft::default();
        assert!(!validate_step(1, &draft).is_empty());
        assert_eq!(validate_step(3, &draft).errors(), &["Description is required"]);
    }
}
