//! Async submission controllers.
//!
//! A controller runs a flow's terminal side-effecting action against its collaborators and
//! publishes the lifecycle as a [`SubmissionOutcome`] through a `watch` channel the UI layer
//! subscribes to.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──submit──▶ InFlight ──▶ Success(record id)
//!   ▲                  │
//!   └──reset── Failure ◀┘        (submit from Failure starts a fresh attempt)
//! ```
//!
//! `InFlight` is the mutual-exclusion guard: a second `submit` while one is running is
//! rejected without touching any collaborator. A `Success` is final for the controller;
//! submitting again returns the existing success instead of registering twice.
//!
//! Every attempt restarts the sequence from the top. Nothing from a previous attempt (such as
//! an upload that completed before a later step failed) is resumed.

use crate::collaborators::{
    DocumentStore, Geocoder, IdentityAuth, IdentityDirectory, ImageHost, LocationSensor,
};
use crate::config::CoreConfig;
use crate::constants::{DUPLICATE_CONTACT_MESSAGE, UNKNOWN_ERROR_MESSAGE};
use crate::draft::{RegistrationDraft, ReportDraft};
use crate::error::{CollaboratorError, FailureKind, SentinelError, SubmissionFailure};
use crate::records::{
    Address, Documents, RecordId, ReportRecord, ReportStatus, UserRecord, UserStatus,
};
use crate::session::Session;
use crate::steps::{first_failing_step, FlowDraft};
use async_trait::async_trait;
use chrono::Utc;
use sentinel_types::{ContactNumber, EmailAddress};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Lifecycle of a flow's terminal action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionOutcome {
    #[default]
    Idle,
    InFlight,
    Success(RecordId),
    Failure(SubmissionFailure),
}

impl SubmissionOutcome {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionOutcome::InFlight)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success(_))
    }

    pub fn failure(&self) -> Option<&SubmissionFailure> {
        match self {
            SubmissionOutcome::Failure(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Message recorded when an attempt's future is dropped before it settles.
pub const INTERRUPTED_MESSAGE: &str = "Submission was interrupted";

/// Shared outcome state for one controller.
#[derive(Debug)]
pub struct OutcomeCell {
    tx: watch::Sender<SubmissionOutcome>,
}

impl Default for OutcomeCell {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SubmissionOutcome::Idle);
        Self { tx }
    }

    pub fn current(&self) -> SubmissionOutcome {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionOutcome> {
        self.tx.subscribe()
    }

    /// "Try Again": moves a failure back to `Idle`. Other states are left alone.
    pub fn reset(&self) -> bool {
        self.tx.send_if_modified(|outcome| {
            if matches!(outcome, SubmissionOutcome::Failure(_)) {
                *outcome = SubmissionOutcome::Idle;
                true
            } else {
                false
            }
        })
    }

    /// Atomically moves `Idle`/`Failure` to `InFlight`.
    ///
    /// Returns the current outcome unchanged when an attempt is running or has succeeded.
    fn begin(&self) -> Result<Attempt<'_>, SubmissionOutcome> {
        let started = self.tx.send_if_modified(|outcome| match outcome {
            SubmissionOutcome::InFlight | SubmissionOutcome::Success(_) => false,
            _ => {
                *outcome = SubmissionOutcome::InFlight;
                true
            }
        });

        if started {
            Ok(Attempt {
                cell: self,
                id: Uuid::new_v4(),
                settled: false,
            })
        } else {
            Err(self.current())
        }
    }
}

/// One in-flight attempt. Settles the cell exactly once, even if dropped mid-flight.
struct Attempt<'a> {
    cell: &'a OutcomeCell,
    id: Uuid,
    settled: bool,
}

impl Attempt<'_> {
    fn settle(mut self, result: Result<RecordId, SubmissionFailure>) -> SubmissionOutcome {
        let outcome = match result {
            Ok(id) => {
                tracing::info!(attempt = %self.id, record = %id, "submission succeeded");
                SubmissionOutcome::Success(id)
            }
            Err(failure) => {
                tracing::warn!(attempt = %self.id, kind = %failure.kind, "submission failed: {}", failure.message);
                SubmissionOutcome::Failure(failure)
            }
        };
        self.settled = true;
        self.cell.tx.send_replace(outcome.clone());
        outcome
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(attempt = %self.id, "submission dropped before settling");
            self.cell.tx.send_replace(SubmissionOutcome::Failure(SubmissionFailure::new(
                FailureKind::Unknown,
                INTERRUPTED_MESSAGE,
            )));
        }
    }
}

/// The terminal action of a flow.
#[async_trait]
pub trait Submitter<D: FlowDraft + Sync>: Send + Sync {
    /// Runs one attempt and returns the outcome it settled on.
    async fn submit(&self, draft: &D) -> SubmissionOutcome;

    fn outcome(&self) -> SubmissionOutcome;

    fn subscribe(&self) -> watch::Receiver<SubmissionOutcome>;

    /// "Try Again" after a failure.
    fn reset(&self) -> bool;
}

fn recheck<D: FlowDraft>(draft: &D) -> Result<(), SubmissionFailure> {
    match first_failing_step(draft) {
        Some((_, errors)) => Err(SubmissionFailure::validation(errors.errors())),
        None => Ok(()),
    }
}

fn collaborator_failure(attempt: Uuid, step: &str, err: &CollaboratorError) -> SubmissionFailure {
    tracing::debug!(%attempt, step, code = ?err.code, "collaborator call failed: {}", err.message);
    SubmissionFailure::from_collaborator(err)
}

fn serialise_failure(attempt: Uuid, err: serde_json::Error) -> SubmissionFailure {
    let err = SentinelError::Serialization(err);
    tracing::error!(%attempt, "{}", err);
    SubmissionFailure::new(FailureKind::Unknown, UNKNOWN_ERROR_MESSAGE)
}

// ============================================================================
// REGISTRATION
// ============================================================================

/// Registers a resident: uniqueness check, parallel document uploads, account creation,
/// then a `pending` user record.
pub struct RegistrationController {
    cfg: Arc<CoreConfig>,
    directory: Arc<dyn IdentityDirectory>,
    images: Arc<dyn ImageHost>,
    auth: Arc<dyn IdentityAuth>,
    store: Arc<dyn DocumentStore>,
    outcome: OutcomeCell,
}

impl RegistrationController {
    pub fn new(
        cfg: Arc<CoreConfig>,
        directory: Arc<dyn IdentityDirectory>,
        images: Arc<dyn ImageHost>,
        auth: Arc<dyn IdentityAuth>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            cfg,
            directory,
            images,
            auth,
            store,
            outcome: OutcomeCell::new(),
        }
    }

    async fn run(&self, attempt: Uuid, draft: &RegistrationDraft) -> Result<RecordId, SubmissionFailure> {
        recheck(draft)?;
        let contact = ContactNumber::parse(&draft.contact_number)
            .map_err(|e| SubmissionFailure::new(FailureKind::Validation, e.to_string()))?;
        let email = EmailAddress::parse(&draft.email)
            .map_err(|e| SubmissionFailure::new(FailureKind::Validation, e.to_string()))?;
        let (valid_id_ref, selfie_ref) = match (&draft.valid_id_uri, &draft.selfie_uri) {
            (Some(id), Some(selfie)) => (id.as_str(), selfie.as_str()),
            _ => {
                return Err(SubmissionFailure::new(
                    FailureKind::Validation,
                    "Both identity images are required",
                ))
            }
        };
        let trunk = contact.trunk_form();

        tracing::debug!(%attempt, "checking contact number uniqueness");
        let registered = self
            .directory
            .contact_registered(&trunk)
            .await
            .map_err(|e| collaborator_failure(attempt, "contact_registered", &e))?;
        if registered {
            return Err(SubmissionFailure::new(
                FailureKind::Duplicate,
                DUPLICATE_CONTACT_MESSAGE,
            ));
        }

        tracing::debug!(%attempt, "uploading identity documents");
        let (id_upload, selfie_upload) = tokio::join!(
            self.images.upload(valid_id_ref),
            self.images.upload(selfie_ref),
        );
        let (valid_id_url, selfie_url) = match (id_upload, selfie_upload) {
            (Ok(id_url), Ok(selfie_url)) => (id_url, selfie_url),
            (Ok(orphan), Err(e)) | (Err(e), Ok(orphan)) => {
                // No compensating delete; the completed upload stays on the image host.
                tracing::warn!(%attempt, orphan = %orphan, "discarding completed upload after sibling failed");
                return Err(collaborator_failure(attempt, "upload", &e));
            }
            (Err(e), Err(_)) => return Err(collaborator_failure(attempt, "upload", &e)),
        };

        tracing::debug!(%attempt, "creating identity account");
        let uid = self
            .auth
            .create_account(email.as_str(), &draft.password)
            .await
            .map_err(|e| collaborator_failure(attempt, "create_account", &e))?;

        let record = UserRecord {
            uid,
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            middle_initial: draft.middle_initial.trim().to_string(),
            contact_number: trunk,
            email: email.as_str().to_string(),
            address: Address {
                region: draft.region.trim().to_string(),
                municipality: draft.municipality.trim().to_string(),
                barangay: draft.barangay.trim().to_string(),
            },
            community_role: draft.effective_role().to_string(),
            documents: Documents {
                id_type: draft.id_type.clone(),
                valid_id_url,
                selfie_url,
            },
            status: UserStatus::Pending,
            created_at: Utc::now(),
            read_announcements: Vec::new(),
        };
        let fields = serde_json::to_value(&record).map_err(|e| serialise_failure(attempt, e))?;

        tracing::debug!(%attempt, "persisting user record");
        self.store
            .create_record(self.cfg.users_collection(), fields)
            .await
            .map_err(|e| collaborator_failure(attempt, "create_record", &e))
    }
}

#[async_trait]
impl Submitter<RegistrationDraft> for RegistrationController {
    async fn submit(&self, draft: &RegistrationDraft) -> SubmissionOutcome {
        let attempt = match self.outcome.begin() {
            Ok(attempt) => attempt,
            Err(current) => {
                tracing::warn!(?current, "registration submit ignored");
                return current;
            }
        };
        tracing::info!(attempt = %attempt.id, "registration submission started");
        let result = self.run(attempt.id, draft).await;
        attempt.settle(result)
    }

    fn outcome(&self) -> SubmissionOutcome {
        self.outcome.current()
    }

    fn subscribe(&self) -> watch::Receiver<SubmissionOutcome> {
        self.outcome.subscribe()
    }

    fn reset(&self) -> bool {
        self.outcome.reset()
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// Submits a symptom report for the signed-in resident: optional proof upload, current
/// position, reverse geocoding, then a `pending` report record.
pub struct ReportController {
    cfg: Arc<CoreConfig>,
    session: Session,
    images: Arc<dyn ImageHost>,
    location: Arc<dyn LocationSensor>,
    geocoder: Arc<dyn Geocoder>,
    store: Arc<dyn DocumentStore>,
    outcome: OutcomeCell,
}

impl ReportController {
    pub fn new(
        cfg: Arc<CoreConfig>,
        session: Session,
        images: Arc<dyn ImageHost>,
        location: Arc<dyn LocationSensor>,
        geocoder: Arc<dyn Geocoder>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            cfg,
            session,
            images,
            location,
            geocoder,
            store,
            outcome: OutcomeCell::new(),
        }
    }

    async fn run(&self, attempt: Uuid, draft: &ReportDraft) -> Result<RecordId, SubmissionFailure> {
        recheck(draft)?;
        let report_type = draft.report_type.ok_or_else(|| {
            SubmissionFailure::new(FailureKind::Validation, "Report type is required")
        })?;

        let proof_image_url = match draft
            .proof_image_uri
            .as_deref()
            .filter(|uri| !uri.trim().is_empty())
        {
            Some(uri) => {
                tracing::debug!(%attempt, "uploading proof image");
                self.images
                    .upload(uri)
                    .await
                    .map_err(|e| collaborator_failure(attempt, "upload", &e))?
            }
            None => String::new(),
        };

        let position = self
            .location
            .current_position()
            .await
            .map_err(|e| collaborator_failure(attempt, "current_position", &e))?;

        let address = self
            .geocoder
            .reverse_geocode(position)
            .await
            .map_err(|e| collaborator_failure(attempt, "reverse_geocode", &e))?;

        let record = ReportRecord {
            user_id: self.session.uid().to_string(),
            user_name: self.session.user().display_name(),
            report_type,
            symptoms: draft.symptoms.clone(),
            custom_symptom: draft.custom_symptom.trim().to_string(),
            description: draft.description.trim().to_string(),
            location: address.formatted_address,
            barangay: address.barangay,
            proof_image_url,
            latitude: position.latitude,
            longitude: position.longitude,
            status: ReportStatus::Pending,
            created_at: Utc::now(),
        };
        let fields = serde_json::to_value(&record).map_err(|e| serialise_failure(attempt, e))?;

        tracing::debug!(%attempt, "persisting report record");
        self.store
            .create_record(self.cfg.reports_collection(), fields)
            .await
            .map_err(|e| collaborator_failure(attempt, "create_record", &e))
    }
}

#[async_trait]
impl Submitter<ReportDraft> for ReportController {
    async fn submit(&self, draft: &ReportDraft) -> SubmissionOutcome {
        let attempt = match self.outcome.begin() {
            Ok(attempt) => attempt,
            Err(current) => {
                tracing::warn!(?current, "report submit ignored");
                return current;
            }
        };
        tracing::info!(attempt = %attempt.id, user = %self.session.uid(), "report submission started");
        let result = self.run(attempt.id, draft).await;
        attempt.settle(result)
    }

    fn outcome(&self) -> SubmissionOutcome {
        self.outcome.current()
    }

    fn subscribe(&self) -> watch::Receiver<SubmissionOutcome> {
        self.outcome.subscribe()
    }

    fn reset(&self) -> bool {
        self.outcome.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{NETWORK_ERROR_MESSAGE, USERS_COLLECTION};
    use crate::testing::*;
    use std::sync::atomic::Ordering;

    struct Harness {
        directory: Arc<FakeDirectory>,
        images: Arc<FakeImageHost>,
        auth: Arc<FakeAuth>,
        store: Arc<FakeStore>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                directory: Arc::new(FakeDirectory::default()),
                images: Arc::new(FakeImageHost::default()),
                auth: Arc::new(FakeAuth::default()),
                store: Arc::new(FakeStore::default()),
            }
        }

        fn controller(&self) -> RegistrationController {
            RegistrationController::new(
                Arc::new(CoreConfig::default()),
                self.directory.clone(),
                self.images.clone(),
                self.auth.clone(),
                self.store.clone(),
            )
        }
    }

    #[tokio::test]
    async fn registration_end_to_end_persists_pending_record() {
        let h = Harness::new();
        let controller = h.controller();
        let draft = complete_registration();

        let outcome = controller.submit(&draft).await;
        let SubmissionOutcome::Success(record_id) = outcome else {
            panic!("expected success, got {outcome:?}");
        };

        let docs = h.store.documents(USERS_COLLECTION);
        assert_eq!(docs.len(), 1);
        let (id, fields) = &docs[0];
        assert_eq!(id, &record_id);
        assert_eq!(fields["status"], "pending");
        assert_eq!(fields["contactNumber"], "09171234567");
        assert_eq!(fields["uid"], "uid-1");
        assert_eq!(fields["documents"]["validIdUrl"], "https://img.example/file:///id.jpg");
        assert_eq!(fields["documents"]["selfieUrl"], "https://img.example/file:///selfie.jpg");
        assert_eq!(h.images.calls.load(Ordering::SeqCst), 2);
        assert_eq!(controller.outcome(), SubmissionOutcome::Success(record_id));
    }

    #[tokio::test]
    async fn duplicate_contact_fails_before_any_upload() {
        let h = Harness::new();
        h.directory.insert("09171234567", test_user());
        let controller = h.controller();

        let outcome = controller.submit(&complete_registration()).await;
        let failure = outcome.failure().expect("expected failure");
        assert_eq!(failure.kind, FailureKind::Duplicate);
        assert_eq!(failure.message, DUPLICATE_CONTACT_MESSAGE);
        assert_eq!(h.images.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.auth.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreadable_directory_match_still_counts_as_duplicate() {
        let h = Harness::new();
        h.directory.insert_unreadable("09171234567");
        let controller = h.controller();

        let outcome = controller.submit(&complete_registration()).await;
        let failure = outcome.failure().expect("expected failure");
        assert_eq!(failure.kind, FailureKind::Duplicate);
        assert_eq!(failure.message, DUPLICATE_CONTACT_MESSAGE);
        assert_eq!(h.images.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.auth.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn identity_uploads_are_in_flight_together() {
        let h = Harness::new();
        let gate = h.images.hold();
        let controller = Arc::new(h.controller());

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit(&complete_registration()).await })
        };

        // Neither upload can finish until permits are added, so both must start first.
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while h.images.calls.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("second upload started while the first was still pending");
        assert_eq!(gate.available_permits(), 0);
        assert_eq!(h.auth.create_calls.load(Ordering::SeqCst), 0);

        gate.add_permits(2);
        let outcome = task.await.expect("task completes");
        assert!(outcome.is_success());
        assert_eq!(h.auth.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_email_creates_no_user_record() {
        let h = Harness::new();
        *h.auth.create_error.lock().unwrap() = Some(CollaboratorError::with_code(
            "auth/email-already-in-use",
            "Firebase: Error (auth/email-already-in-use).",
        ));
        let controller = h.controller();

        let outcome = controller.submit(&complete_registration()).await;
        assert_eq!(outcome.failure().map(|f| f.kind), Some(FailureKind::Duplicate));
        assert_eq!(h.store.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_failed_upload_stops_before_account_creation() {
        let h = Harness::new();
        h.images.fail_for("file:///selfie.jpg", CollaboratorError::with_code("invalid-image", "Failed to upload image"));
        let controller = h.controller();

        let outcome = controller.submit(&complete_registration()).await;
        let failure = outcome.failure().expect("expected failure");
        assert_eq!(failure.kind, FailureKind::Validation);
        assert_eq!(h.images.calls.load(Ordering::SeqCst), 2, "both uploads are attempted");
        assert_eq!(h.auth.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.store.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_outage_maps_to_network_error() {
        let h = Harness::new();
        *h.store.create_error.lock().unwrap() =
            Some(CollaboratorError::with_code("unavailable", "Could not reach backend"));
        let controller = h.controller();

        let outcome = controller.submit(&complete_registration()).await;
        let failure = outcome.failure().expect("expected failure");
        assert_eq!(failure.kind, FailureKind::Network);
        assert_eq!(failure.message, NETWORK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn invalid_draft_is_rechecked_without_side_effects() {
        let h = Harness::new();
        let controller = h.controller();
        let mut draft = complete_registration();
        draft.confirm_password = "Different123!".into();

        let outcome = controller.submit(&draft).await;
        let failure = outcome.failure().expect("expected failure");
        assert_eq!(failure.kind, FailureKind::Validation);
        assert!(failure.message.contains("Passwords do not match"));
        assert_eq!(h.directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retry_after_failure_starts_fresh_attempt() {
        let h = Harness::new();
        *h.store.create_error.lock().unwrap() = Some(CollaboratorError::with_code("unavailable", "down"));
        let controller = h.controller();
        let draft = complete_registration();

        assert!(controller.submit(&draft).await.failure().is_some());
        assert!(controller.reset());
        assert_eq!(controller.outcome(), SubmissionOutcome::Idle);

        *h.store.create_error.lock().unwrap() = None;
        assert!(controller.submit(&draft).await.is_success());
        assert_eq!(h.images.calls.load(Ordering::SeqCst), 4, "uploads are redone, not resumed");
        assert_eq!(h.directory.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn success_is_not_resubmitted() {
        let h = Harness::new();
        let controller = h.controller();
        let draft = complete_registration();

        let first = controller.submit(&draft).await;
        let second = controller.submit(&draft).await;
        assert_eq!(first, second);
        assert_eq!(h.store.create_calls.load(Ordering::SeqCst), 1);
        assert!(!controller.reset(), "reset only applies to failures");
    }

    #[tokio::test]
    async fn concurrent_submit_is_rejected_while_in_flight() {
        let h = Harness::new();
        let gate = h.images.hold();
        let controller = Arc::new(h.controller());
        let draft = complete_registration();

        let first = {
            let controller = controller.clone();
            let draft = draft.clone();
            tokio::spawn(async move { controller.submit(&draft).await })
        };

        let mut rx = controller.subscribe();
        rx.wait_for(|o| o.is_in_flight()).await.expect("controller alive");

        let second = controller.submit(&draft).await;
        assert_eq!(second, SubmissionOutcome::InFlight);
        assert_eq!(h.directory.calls.load(Ordering::SeqCst), 1);

        gate.add_permits(2);
        let outcome = first.await.expect("task completes");
        assert!(outcome.is_success());
    }

    #[test]
    fn serialisation_errors_are_unknown_failures() {
        let err = serde_json::from_str::<u8>("not json").unwrap_err();
        let failure = serialise_failure(Uuid::new_v4(), err);
        assert_eq!(failure.kind, FailureKind::Unknown);
        assert_eq!(failure.message, UNKNOWN_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn dropped_attempt_settles_as_failure() {
        let h = Harness::new();
        let _gate = h.images.hold();
        let controller = h.controller();
        let draft = complete_registration();

        {
            let fut = controller.submit(&draft);
            let _ = tokio::time::timeout(std::time::Duration::from_millis(20), fut).await;
        }

        let failure = controller.outcome().failure().cloned().expect("settled as failure");
        assert_eq!(failure.message, INTERRUPTED_MESSAGE);
        assert!(controller.reset());
    }

    fn report_controller(
        images: Arc<FakeImageHost>,
        location: Arc<FakeLocation>,
        store: Arc<FakeStore>,
    ) -> ReportController {
        ReportController::new(
            Arc::new(CoreConfig::default()),
            test_session(),
            images,
            location,
            Arc::new(FakeGeocoder::default()),
            store,
        )
    }

    #[tokio::test]
    async fn report_submission_geocodes_and_persists() {
        let images = Arc::new(FakeImageHost::default());
        let store = Arc::new(FakeStore::default());
        let controller = report_controller(
            images.clone(),
            Arc::new(FakeLocation::at(14.68, 121.1)),
            store.clone(),
        );
        let mut draft = complete_report();
        draft.proof_image_uri = Some("file:///proof.jpg".into());

        assert!(controller.submit(&draft).await.is_success());

        let docs = store.documents("symptomReports");
        assert_eq!(docs.len(), 1);
        let fields = &docs[0].1;
        assert_eq!(fields["status"], "pending");
        assert_eq!(fields["userId"], "uid-1");
        assert_eq!(fields["userName"], "Juan Dela Cruz");
        assert_eq!(fields["reportType"], "self");
        assert_eq!(fields["barangay"], "Batasan Hills");
        assert_eq!(fields["latitude"], 14.68);
        assert_eq!(fields["proofImageUrl"], "https://img.example/file:///proof.jpg");
        assert_eq!(images.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn report_without_proof_skips_upload() {
        let images = Arc::new(FakeImageHost::default());
        let store = Arc::new(FakeStore::default());
        let controller = report_controller(
            images.clone(),
            Arc::new(FakeLocation::at(14.68, 121.1)),
            store.clone(),
        );

        assert!(controller.submit(&complete_report()).await.is_success());
        assert_eq!(images.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.documents("symptomReports")[0].1["proofImageUrl"], "");
    }

    #[tokio::test]
    async fn denied_location_is_permission_failure() {
        let store = Arc::new(FakeStore::default());
        let controller = report_controller(
            Arc::new(FakeImageHost::default()),
            Arc::new(FakeLocation::denied()),
            store.clone(),
        );

        let outcome = controller.submit(&complete_report()).await;
        assert_eq!(outcome.failure().map(|f| f.kind), Some(FailureKind::Permission));
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 0);
    }
}
