//! Error taxonomy for the Sentinel core.
//!
//! Three layers:
//! - [`CollaboratorError`]: what an external collaborator call fails with (code + message).
//! - [`FailureKind`] / [`SubmissionFailure`]: the classified, user-facing result of a failed
//!   terminal action. Nothing leaves a controller unclassified.
//! - [`SentinelError`]: programming and configuration errors inside the core itself.

use crate::constants::{
    DUPLICATE_EMAIL_MESSAGE, NETWORK_ERROR_MESSAGE, UNKNOWN_ERROR_MESSAGE,
};
use serde::{Deserialize, Serialize};

/// Failure reported by an external collaborator.
///
/// `code` carries the collaborator's machine-readable error code when it has one (for example
/// `auth/email-already-in-use`, `EMAIL_EXISTS`, `unavailable`, `OVER_QUERY_LIMIT`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub code: Option<String>,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Result alias for collaborator calls.
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// User-visible failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Local input problem; recoverable by editing fields.
    Validation,
    /// Business-rule conflict such as an already-registered phone or email.
    Duplicate,
    /// Camera or location access denied.
    Permission,
    /// Collaborator unreachable.
    Network,
    /// Anything else.
    Unknown,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Validation => "ValidationError",
            FailureKind::Duplicate => "DuplicateError",
            FailureKind::Permission => "PermissionError",
            FailureKind::Network => "NetworkError",
            FailureKind::Unknown => "UnknownError",
        };
        f.write_str(s)
    }
}

/// A classified failure with the message the user should see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct SubmissionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SubmissionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Joins step errors into one validation failure.
    pub fn validation(errors: &[String]) -> Self {
        Self::new(FailureKind::Validation, errors.join("; "))
    }

    /// Classifies a collaborator error and picks the message shown to the user.
    ///
    /// Unknown failures are logged with the raw collaborator message and replaced by a
    /// generic one.
    pub fn from_collaborator(err: &CollaboratorError) -> Self {
        let kind = classify(err);
        let message = match kind {
            FailureKind::Network => NETWORK_ERROR_MESSAGE.to_string(),
            FailureKind::Duplicate => DUPLICATE_EMAIL_MESSAGE.to_string(),
            FailureKind::Permission | FailureKind::Validation => err.message.clone(),
            FailureKind::Unknown => {
                tracing::error!(code = ?err.code, "unclassified collaborator failure: {}", err.message);
                UNKNOWN_ERROR_MESSAGE.to_string()
            }
        };
        Self { kind, message }
    }
}

const NETWORK_CODES: &[&str] = &["unavailable", "network-request-failed", "deadline-exceeded"];
const DUPLICATE_CODES: &[&str] = &["email-already-in-use", "email_exists", "already-exists"];
const PERMISSION_CODES: &[&str] = &["permission-denied", "permission_denied"];
const VALIDATION_CODES: &[&str] = &[
    "weak-password",
    "weak_password",
    "invalid-email",
    "invalid_email",
    "invalid-image",
    "too-large",
];

/// Maps a collaborator error onto the failure taxonomy.
///
/// Codes are compared case-insensitively and may carry a provider prefix
/// (`auth/email-already-in-use`). When no code matches, the message is inspected for
/// well-known substrings.
pub fn classify(err: &CollaboratorError) -> FailureKind {
    if let Some(code) = err.code.as_deref() {
        let lowered = code.to_ascii_lowercase();
        let head = lowered.split(':').next().unwrap_or_default();
        let code = head.rsplit('/').next().unwrap_or_default().trim();

        if NETWORK_CODES.contains(&code) {
            return FailureKind::Network;
        }
        if DUPLICATE_CODES.contains(&code) {
            return FailureKind::Duplicate;
        }
        if PERMISSION_CODES.contains(&code) {
            return FailureKind::Permission;
        }
        if VALIDATION_CODES.contains(&code) {
            return FailureKind::Validation;
        }
    }

    let message = err.message.to_ascii_lowercase();
    if message.contains("backend") || message.contains("network") || message.contains("unavailable")
    {
        FailureKind::Network
    } else if message.contains("already in use") || message.contains("already registered") {
        FailureKind::Duplicate
    } else if message.contains("permission") {
        FailureKind::Permission
    } else {
        FailureKind::Unknown
    }
}

/// Errors raised by the core itself (configuration, misuse).
#[derive(Debug, thiserror::Error)]
pub enum SentinelError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
}

pub type SentinelResult<T> = std::result::Result<T, SentinelError>;
