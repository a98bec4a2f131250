//! Registration flow: personal details, document verification, credentials.

use super::{FlowDraft, StepDefinition, ValidationResult};
use crate::draft::{Flow, RegistrationDraft};
use crate::validation::{
    conditional_required, password_strength, passwords_match, phone_local_10_digit,
    required_non_empty, valid_email,
};
use sentinel_types::ContactNumber;

static REGISTRATION_STEPS: [StepDefinition<RegistrationDraft>; 3] = [
    StepDefinition {
        index: 1,
        label: "Personal",
        required_fields: &[
            "firstName",
            "lastName",
            "contactNumber",
            "email",
            "region",
            "municipality",
            "barangay",
            "communityRole",
            "customRole",
        ],
        validate: validate_personal,
    },
    StepDefinition {
        index: 2,
        label: "Verification",
        required_fields: &["idType", "validIdUri", "selfieUri"],
        validate: validate_verification,
    },
    StepDefinition {
        index: 3,
        label: "Credentials",
        required_fields: &["username", "password", "confirmPassword", "agreedToPolicy"],
        validate: validate_credentials,
    },
];

/// Step on which the username default is derived.
const CREDENTIALS_STEP: usize = 3;

impl FlowDraft for RegistrationDraft {
    const FLOW: Flow = Flow::Registration;

    fn steps() -> &'static [StepDefinition<Self>] {
        &REGISTRATION_STEPS
    }

    fn on_enter_step(&mut self, step: usize, calling_code: &str) {
        if step != CREDENTIALS_STEP || !self.username.is_empty() {
            return;
        }
        if let Ok(number) = ContactNumber::parse(&self.contact_number) {
            self.username = number.international_form(calling_code);
        }
    }
}

fn validate_personal(d: &RegistrationDraft, r: &mut ValidationResult) {
    r.require(required_non_empty(&d.first_name), "First Name is required");
    r.require(required_non_empty(&d.last_name), "Last Name is required");
    r.require(
        phone_local_10_digit(&d.contact_number),
        "Valid contact number is required",
    );
    if !required_non_empty(&d.email) {
        r.push("Email is required");
    } else if !valid_email(&d.email) {
        r.push("Valid email is required");
    }
    r.require(required_non_empty(&d.region), "Region is required");
    r.require(required_non_empty(&d.municipality), "Municipality is required");
    r.require(required_non_empty(&d.barangay), "Barangay is required");
    r.require(
        required_non_empty(&d.community_role),
        "Community role is required",
    );
    r.require(
        conditional_required(&d.custom_role, d, RegistrationDraft::wants_custom_role),
        "Please specify your community role",
    );
}

fn validate_verification(d: &RegistrationDraft, r: &mut ValidationResult) {
    r.require(required_non_empty(&d.id_type), "ID Type is required");
    r.require(
        d.valid_id_uri.as_deref().is_some_and(required_non_empty),
        "Valid ID is required",
    );
    r.require(
        d.selfie_uri.as_deref().is_some_and(required_non_empty),
        "Selfie is required",
    );
}

fn validate_credentials(d: &RegistrationDraft, r: &mut ValidationResult) {
    r.require(required_non_empty(&d.username), "Username is required");
    if d.password.is_empty() {
        r.push("Password is required");
    } else if !password_strength(&d.password).is_strong() {
        r.push("Password does not meet the strength requirements");
    }
    r.require(!d.confirm_password.is_empty(), "Confirm Password is required");
    if !d.password.is_empty()
        && !d.confirm_password.is_empty()
        && !passwords_match(&d.password, &d.confirm_password)
    {
        r.push("Passwords do not match");
    }
    r.require(d.agreed_to_policy, "You must agree to the terms and policy");
}
