//! Signed-in resident.
//!
//! A [`Session`] is obtained from [`sign_in`] and passed explicitly to whatever needs the
//! current user (the report controller, the announcements feed, the health guide).

use crate::collaborators::{IdentityAuth, IdentityDirectory};
use crate::error::{FailureKind, SubmissionFailure};
use crate::records::{RecordId, UserRecord, UserStatus};
use crate::validation::normalise_contact_input;
use sentinel_types::ContactNumber;

pub const USER_NOT_FOUND_MESSAGE: &str = "User not found";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    uid: String,
    record_id: RecordId,
    user: UserRecord,
}

impl Session {
    pub fn new(uid: impl Into<String>, record_id: RecordId, user: UserRecord) -> Self {
        Self {
            uid: uid.into(),
            record_id,
            user,
        }
    }

    /// Identity-provider account id.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Id of the user document in the store.
    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    pub fn user(&self) -> &UserRecord {
        &self.user
    }

    pub fn status(&self) -> UserStatus {
        self.user.status
    }

    /// Pending and rejected residents are signed in but cannot use the app yet.
    pub fn is_approved(&self) -> bool {
        self.user.status == UserStatus::Approved
    }

    pub fn display_name(&self) -> String {
        self.user.display_name()
    }
}

/// Signs a resident in by contact number and password.
///
/// The contact number accepts the same raw input the registration widget does, so
/// `0917 123 4567` and `9171234567` both resolve to the same account.
pub async fn sign_in(
    directory: &dyn IdentityDirectory,
    auth: &dyn IdentityAuth,
    contact_input: &str,
    password: &str,
) -> Result<Session, SubmissionFailure> {
    let contact = normalise_contact_input(contact_input)
        .and_then(|digits| ContactNumber::parse(digits).ok())
        .ok_or_else(|| {
            SubmissionFailure::new(FailureKind::Validation, "Valid contact number is required")
        })?;
    if password.is_empty() {
        return Err(SubmissionFailure::new(
            FailureKind::Validation,
            "Password is required",
        ));
    }

    let entry = directory
        .find_by_phone(&contact.trunk_form())
        .await
        .map_err(|e| SubmissionFailure::from_collaborator(&e))?
        .ok_or_else(|| SubmissionFailure::new(FailureKind::Unknown, USER_NOT_FOUND_MESSAGE))?;

    let auth_session = auth
        .sign_in(&entry.user.email, password)
        .await
        .map_err(|e| SubmissionFailure::from_collaborator(&e))?;

    tracing::info!(uid = %auth_session.uid, status = %entry.user.status, "signed in");
    Ok(Session::new(auth_session.uid, entry.record_id, entry.user))
}
