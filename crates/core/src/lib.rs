//! # Sentinel Core
//!
//! Core business logic for the Sentinel community health-reporting client.
//!
//! This crate contains the form and submission logic behind resident registration and
//! symptom reporting:
//! - Field validators and per-step validation aggregation
//! - The step state machine that gates advancing and submitting
//! - Async submission controllers that upload images, geocode, and persist records
//! - Sign-in, the announcements feed, the AI health guide and health QR codes
//!
//! **No transport concerns**: HTTP clients for the hosted collaborators live in
//! `sentinel-services`; the core only sees the traits in [`collaborators`].

pub mod announcements;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod draft;
pub mod error;
pub mod guide;
pub mod machine;
pub mod qr;
pub mod records;
pub mod session;
pub mod steps;
pub mod submission;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{CoreConfig, GuideSettings};
pub use draft::{Flow, FormDraft, RegistrationDraft, ReportDraft, ReportType};
pub use error::{
    CollaboratorError, CollaboratorResult, FailureKind, SentinelError, SentinelResult,
    SubmissionFailure,
};
pub use machine::StepMachine;
pub use qr::{IssuedQrCode, QrCodes, UserQrCode};
pub use records::RecordId;
pub use session::{sign_in, Session};
pub use steps::{FlowDraft, ValidationResult};
pub use submission::{RegistrationController, ReportController, SubmissionOutcome, Submitter};
