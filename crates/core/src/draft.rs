//! In-memory form drafts.
//!
//! A draft is owned by the screen (or CLI invocation) that created it and is discarded on
//! navigation away or after a successful submission. Nothing here is persisted.
//!
//! [`FormDraft`] is a discriminated union keyed by flow, so each variant's field set is fixed
//! at compile time and there is no stringly-keyed field access.

use crate::constants::OTHER_ROLE;
use crate::validation::normalise_contact_input;
use serde::{Deserialize, Serialize};

/// Which multi-step flow a draft belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Registration,
    Report,
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Registration => f.write_str("registration"),
            Flow::Report => f.write_str("report"),
        }
    }
}

/// Resident registration fields across the personal, verification and credentials steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationDraft {
    pub first_name: String,
    pub last_name: String,
    pub middle_initial: String,
    /// Subscriber digits only, as left by [`RegistrationDraft::set_contact_input`].
    pub contact_number: String,
    pub email: String,
    pub region: String,
    pub municipality: String,
    pub barangay: String,
    pub community_role: String,
    /// Free-text role; only meaningful when `community_role` is the "Other (Specify)" sentinel.
    pub custom_role: String,

    pub id_type: String,
    /// Opaque local URI of the captured ID document.
    pub valid_id_uri: Option<String>,
    /// Opaque local URI of the captured selfie.
    pub selfie_uri: Option<String>,

    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub agreed_to_policy: bool,
}

impl RegistrationDraft {
    /// Feeds raw keyboard input through the contact-number widget filter.
    ///
    /// Rejected keystrokes leave the current value untouched.
    pub fn set_contact_input(&mut self, text: &str) {
        if let Some(cleaned) = normalise_contact_input(text) {
            self.contact_number = cleaned;
        }
    }

    pub fn wants_custom_role(&self) -> bool {
        self.community_role == OTHER_ROLE
    }

    /// The role that ends up on the user record.
    pub fn effective_role(&self) -> &str {
        if self.wants_custom_role() {
            self.custom_role.trim()
        } else {
            self.community_role.trim()
        }
    }
}

/// Whose symptoms a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// "I'm experiencing symptoms myself."
    #[serde(rename = "self")]
    SelfReported,
    /// Symptoms observed in someone else.
    Observed,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::SelfReported => "self",
            ReportType::Observed => "observed",
        }
    }
}

/// Symptom report fields across the type, symptoms and details steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportDraft {
    pub report_type: Option<ReportType>,
    pub symptoms: Vec<String>,
    pub custom_symptom: String,
    pub description: String,
    /// Optional photo evidence, as an opaque local URI.
    pub proof_image_uri: Option<String>,
}

impl ReportDraft {
    /// Checkbox behaviour: adds the symptom if absent, removes it if present.
    pub fn toggle_symptom(&mut self, symptom: &str) {
        if let Some(pos) = self.symptoms.iter().position(|s| s == symptom) {
            self.symptoms.remove(pos);
        } else {
            self.symptoms.push(symptom.to_string());
        }
    }

    /// Checkbox symptoms followed by the custom symptom, if any.
    pub fn all_symptoms(&self) -> Vec<String> {
        let mut all = self.symptoms.clone();
        let custom = self.custom_symptom.trim();
        if !custom.is_empty() {
            all.push(custom.to_string());
        }
        all
    }
}

/// Draft for whichever flow is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum FormDraft {
    Registration(RegistrationDraft),
    Report(ReportDraft),
}

impl FormDraft {
    pub fn flow(&self) -> Flow {
        match self {
            FormDraft::Registration(_) => Flow::Registration,
            FormDraft::Report(_) => Flow::Report,
        }
    }
}
