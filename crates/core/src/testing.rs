//! In-memory collaborators and fixture drafts for unit tests.

use crate::announcements::{
    Announcement, AnnouncementKind, AnnouncementSink, AnnouncementSource, AnnouncementStore,
    Priority, Subscription,
};
use crate::collaborators::{
    AuthSession, ChatModel, ChatRequest, Coordinates, DirectoryEntry, DocumentStore,
    GeocodedAddress, Geocoder, IdentityAuth, IdentityDirectory, ImageHost, LocationSensor,
};
use crate::draft::{RegistrationDraft, ReportDraft, ReportType};
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::records::{
    Address, Documents, RecordId, ReportRecord, ReportStatus, StoredDocument, UserRecord,
    UserStatus,
};
use crate::session::Session;
use crate::steps::FlowDraft;
use crate::submission::{OutcomeCell, SubmissionOutcome, Submitter};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Semaphore};

pub fn complete_registration() -> RegistrationDraft {
    RegistrationDraft {
        first_name: "Juan".into(),
        last_name: "Dela Cruz".into(),
        middle_initial: "S".into(),
        contact_number: "9171234567".into(),
        email: "juan@example.ph".into(),
        region: "NCR".into(),
        municipality: "Quezon City".into(),
        barangay: "Batasan Hills".into(),
        community_role: "Resident".into(),
        custom_role: String::new(),
        id_type: "National ID".into(),
        valid_id_uri: Some("file:///id.jpg".into()),
        selfie_uri: Some("file:///selfie.jpg".into()),
        username: "+639171234567".into(),
        password: "Password123!".into(),
        confirm_password: "Password123!".into(),
        agreed_to_policy: true,
    }
}

pub fn complete_report() -> ReportDraft {
    ReportDraft {
        report_type: Some(ReportType::SelfReported),
        symptoms: vec!["Fever".into()],
        custom_symptom: String::new(),
        description: "Fever since yesterday".into(),
        proof_image_uri: None,
    }
}

pub fn test_user() -> UserRecord {
    UserRecord {
        uid: "uid-1".into(),
        first_name: "Juan".into(),
        last_name: "Dela Cruz".into(),
        middle_initial: "S".into(),
        contact_number: "09171234567".into(),
        email: "juan@example.ph".into(),
        address: Address {
            region: "NCR".into(),
            municipality: "Quezon City".into(),
            barangay: "Batasan Hills".into(),
        },
        community_role: "Resident".into(),
        documents: Documents {
            id_type: "National ID".into(),
            valid_id_url: "https://img.example/id.jpg".into(),
            selfie_url: "https://img.example/selfie.jpg".into(),
        },
        status: UserStatus::Pending,
        created_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        read_announcements: Vec::new(),
    }
}

pub fn test_session() -> Session {
    Session::new("uid-1", RecordId::new("user-doc-1"), test_user())
}

pub fn report_record(
    report_type: ReportType,
    symptoms: &[&str],
    custom: &str,
    created_at: DateTime<Utc>,
) -> ReportRecord {
    ReportRecord {
        user_id: "uid-1".into(),
        user_name: "Juan Dela Cruz".into(),
        report_type,
        symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
        custom_symptom: custom.into(),
        description: "test".into(),
        location: "Batasan Hills, Quezon City".into(),
        barangay: "Batasan Hills".into(),
        proof_image_url: String::new(),
        latitude: 14.68,
        longitude: 121.1,
        status: ReportStatus::Pending,
        created_at,
    }
}

pub fn announcement(id: &str) -> Announcement {
    Announcement {
        id: id.into(),
        title: format!("Announcement {id}"),
        message: "Stay safe".into(),
        kind: AnnouncementKind::HealthAdvisory,
        priority: Priority::Medium,
        created_by: "rhu-admin".into(),
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    entries: Mutex<HashMap<String, DirectoryEntry>>,
    /// Numbers held by documents that are not readable as a user record.
    unreadable: Mutex<HashSet<String>>,
    pub calls: AtomicUsize,
}

impl FakeDirectory {
    pub fn insert(&self, trunk_phone: &str, user: UserRecord) {
        let mut entries = self.entries.lock().unwrap();
        let record_id = RecordId::new(format!("user-doc-{}", entries.len() + 1));
        entries.insert(trunk_phone.to_string(), DirectoryEntry { record_id, user });
    }

    pub fn insert_unreadable(&self, trunk_phone: &str) {
        self.unreadable.lock().unwrap().insert(trunk_phone.to_string());
    }
}

#[async_trait]
impl IdentityDirectory for FakeDirectory {
    async fn find_by_phone(&self, normalised_phone: &str) -> CollaboratorResult<Option<DirectoryEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.lock().unwrap().get(normalised_phone).cloned())
    }

    async fn contact_registered(&self, normalised_phone: &str) -> CollaboratorResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.lock().unwrap().contains_key(normalised_phone)
            || self.unreadable.lock().unwrap().contains(normalised_phone))
    }
}

#[derive(Default)]
pub struct FakeAuth {
    pub create_calls: AtomicUsize,
    pub sign_in_calls: AtomicUsize,
    pub create_error: Mutex<Option<CollaboratorError>>,
    pub sign_in_error: Mutex<Option<CollaboratorError>>,
    pub signed_in_as: Mutex<Option<String>>,
}

#[async_trait]
impl IdentityAuth for FakeAuth {
    async fn create_account(&self, _email: &str, _password: &str) -> CollaboratorResult<String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        match self.create_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok("uid-1".into()),
        }
    }

    async fn sign_in(&self, email: &str, _password: &str) -> CollaboratorResult<AuthSession> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.sign_in_error.lock().unwrap().clone() {
            return Err(err);
        }
        *self.signed_in_as.lock().unwrap() = Some(email.to_string());
        Ok(AuthSession {
            uid: "uid-1".into(),
            id_token: Some("token".into()),
        })
    }
}

#[derive(Default)]
pub struct FakeStore {
    docs: Mutex<Vec<(String, RecordId, serde_json::Value)>>,
    pub create_calls: AtomicUsize,
    pub create_error: Mutex<Option<CollaboratorError>>,
}

impl FakeStore {
    pub fn documents(&self, collection: &str) -> Vec<(RecordId, serde_json::Value)> {
        self.docs
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _, _)| c == collection)
            .map(|(_, id, fields)| (id.clone(), fields.clone()))
            .collect()
    }

    pub fn seed(&self, collection: &str, fields: serde_json::Value) -> RecordId {
        let mut docs = self.docs.lock().unwrap();
        let id = RecordId::new(format!("doc-{}", docs.len() + 1));
        docs.push((collection.to_string(), id.clone(), fields));
        id
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn create_record(&self, collection: &str, fields: serde_json::Value) -> CollaboratorResult<RecordId> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.create_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.seed(collection, fields))
    }

    async fn find_where(
        &self,
        collection: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> CollaboratorResult<Vec<StoredDocument>> {
        Ok(self
            .documents(collection)
            .into_iter()
            .filter(|(_, fields)| fields.get(field) == Some(value))
            .map(|(id, fields)| StoredDocument { id, fields })
            .collect())
    }

    async fn replace_record(
        &self,
        collection: &str,
        id: &RecordId,
        fields: serde_json::Value,
    ) -> CollaboratorResult<()> {
        let mut docs = self.docs.lock().unwrap();
        match docs.iter_mut().find(|(c, existing, _)| c == collection && existing == id) {
            Some(slot) => slot.2 = fields,
            None => docs.push((collection.to_string(), id.clone(), fields)),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeImageHost {
    pub calls: AtomicUsize,
    failures: Mutex<HashMap<String, CollaboratorError>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeImageHost {
    pub fn fail_for(&self, uri: &str, err: CollaboratorError) {
        self.failures.lock().unwrap().insert(uri.to_string(), err);
    }

    /// Blocks every upload until permits are added to the returned semaphore.
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(&self, local_image_ref: &str) -> CollaboratorResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }
        let failure = self.failures.lock().unwrap().get(local_image_ref).cloned();
        match failure {
            Some(err) => Err(err),
            None => Ok(format!("https://img.example/{local_image_ref}")),
        }
    }
}

pub struct FakeLocation(Option<Coordinates>);

impl FakeLocation {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self(Some(Coordinates { latitude, longitude }))
    }

    pub fn denied() -> Self {
        Self(None)
    }
}

#[async_trait]
impl LocationSensor for FakeLocation {
    async fn current_position(&self) -> CollaboratorResult<Coordinates> {
        self.0.ok_or_else(|| {
            CollaboratorError::with_code("permission-denied", "Location permission denied")
        })
    }
}

#[derive(Default)]
pub struct FakeGeocoder;

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn reverse_geocode(&self, _at: Coordinates) -> CollaboratorResult<GeocodedAddress> {
        Ok(GeocodedAddress {
            formatted_address: "Batasan Hills, Quezon City, Metro Manila".into(),
            barangay: "Batasan Hills".into(),
            region: "Metro Manila".into(),
            municipality: "Quezon City".into(),
        })
    }
}

pub struct FakeChat {
    reply: CollaboratorResult<String>,
    last: Mutex<Option<ChatRequest>>,
}

impl FakeChat {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            last: Mutex::new(None),
        }
    }

    pub fn failing(err: CollaboratorError) -> Self {
        Self {
            reply: Err(err),
            last: Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn complete(&self, request: &ChatRequest) -> CollaboratorResult<String> {
        *self.last.lock().unwrap() = Some(request.clone());
        self.reply.clone()
    }
}

#[derive(Default)]
pub struct FakeAnnouncementSource {
    sinks: Arc<Mutex<HashMap<usize, AnnouncementSink>>>,
    next: AtomicUsize,
}

impl FakeAnnouncementSource {
    pub fn emit(&self, snapshot: Vec<Announcement>) {
        for sink in self.sinks.lock().unwrap().values() {
            sink(snapshot.clone());
        }
    }

    pub fn active(&self) -> usize {
        self.sinks.lock().unwrap().len()
    }
}

impl AnnouncementSource for FakeAnnouncementSource {
    fn subscribe(&self, sink: AnnouncementSink) -> Subscription {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        self.sinks.lock().unwrap().insert(id, sink);
        let sinks = Arc::clone(&self.sinks);
        Subscription::new(move || {
            sinks.lock().unwrap().remove(&id);
        })
    }
}

pub struct FakeAnnouncementStore {
    read: Mutex<Vec<String>>,
    fail: bool,
    pub mark_calls: AtomicUsize,
}

impl FakeAnnouncementStore {
    pub fn with_read(ids: &[&str]) -> Self {
        Self {
            read: Mutex::new(ids.iter().map(|s| s.to_string()).collect()),
            fail: false,
            mark_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            read: Mutex::new(Vec::new()),
            fail: true,
            mark_calls: AtomicUsize::new(0),
        }
    }

    fn outage() -> CollaboratorError {
        CollaboratorError::with_code("unavailable", "Could not reach backend")
    }
}

#[async_trait]
impl AnnouncementStore for FakeAnnouncementStore {
    async fn read_announcements(&self, _user: &RecordId) -> CollaboratorResult<Vec<String>> {
        if self.fail {
            return Err(Self::outage());
        }
        Ok(self.read.lock().unwrap().clone())
    }

    async fn mark_read(&self, _user: &RecordId, announcement_id: &str) -> CollaboratorResult<()> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Self::outage());
        }
        self.read.lock().unwrap().push(announcement_id.to_string());
        Ok(())
    }
}

/// Submitter that always succeeds and counts calls.
#[derive(Default)]
pub struct FakeSubmitter {
    calls: AtomicUsize,
    outcome: OutcomeCell,
}

impl FakeSubmitter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<D: FlowDraft + Sync> Submitter<D> for FakeSubmitter {
    async fn submit(&self, _draft: &D) -> SubmissionOutcome {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        SubmissionOutcome::Success(RecordId::new(format!("fake-{n}")))
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
