//! Announcements feed.
//!
//! Health-office announcements arrive as whole snapshots (newest first) from an
//! [`AnnouncementSource`]. The feed keeps the last snapshot, the signed-in resident's read ids
//! and a pending in-app notification, and publishes every change through a `watch` channel.
//! The notification closes itself once [`CoreConfig::notification_ttl`] has passed.
//!
//! Subscriptions are explicit: [`AnnouncementSource::subscribe`] returns a [`Subscription`]
//! whose drop (or [`Subscription::dispose`]) stops delivery.

use crate::config::CoreConfig;
use crate::error::{CollaboratorResult, SentinelError, SentinelResult, SubmissionFailure};
use crate::records::{RecordId, StoredDocument};
use crate::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementKind {
    HealthAdvisory,
    OutbreakAlert,
    MedicalSupplies,
    WaterAdvisory,
    VaccinationDrive,
    #[serde(other)]
    Other,
}

impl AnnouncementKind {
    pub fn label(&self) -> &'static str {
        match self {
            AnnouncementKind::HealthAdvisory => "Health Advisory",
            AnnouncementKind::OutbreakAlert => "Outbreak Alert",
            AnnouncementKind::MedicalSupplies => "Medical Supplies",
            AnnouncementKind::WaterAdvisory => "Water Advisory",
            AnnouncementKind::VaccinationDrive => "Vaccination Drive",
            AnnouncementKind::Other => "Announcement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    /// Document id; not part of the stored fields.
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Announcement {
    pub fn from_document(doc: StoredDocument) -> SentinelResult<Self> {
        let mut announcement: Announcement =
            serde_json::from_value(doc.fields).map_err(SentinelError::Deserialization)?;
        announcement.id = doc.id.as_str().to_string();
        Ok(announcement)
    }
}

/// Receives every snapshot, newest first.
pub type AnnouncementSink = Box<dyn Fn(Vec<Announcement>) + Send + Sync>;

/// Handle for a live subscription. Dropping it unsubscribes.
pub struct Subscription {
    disposer: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(disposer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            disposer: Some(Box::new(disposer)),
        }
    }

    pub fn dispose(mut self) {
        self.run_disposer();
    }

    fn run_disposer(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_disposer();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.disposer.is_some())
            .finish()
    }
}

/// Live stream of announcement snapshots.
pub trait AnnouncementSource: Send + Sync {
    fn subscribe(&self, sink: AnnouncementSink) -> Subscription;
}

/// Per-user read markers.
#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    async fn read_announcements(&self, user: &RecordId) -> CollaboratorResult<Vec<String>>;

    /// Adds `announcement_id` to the user's read set. Adding an id twice is harmless.
    async fn mark_read(&self, user: &RecordId, announcement_id: &str) -> CollaboratorResult<()>;
}

/// Everything the UI renders for the announcements tab and the notification banner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    pub announcements: Vec<Announcement>,
    pub read: HashSet<String>,
    pub latest_notification: Option<Announcement>,
    /// When `latest_notification` was raised.
    pub notified_at: Option<Instant>,
    /// Number of snapshots applied so far.
    pub snapshots: u64,
}

/// Folds a new snapshot into `state`. Returns true when a notification was raised.
///
/// A notification is raised for the first non-empty snapshot and whenever the newest id
/// changes.
pub fn apply_snapshot(state: &mut FeedState, snapshot: Vec<Announcement>) -> bool {
    let raised = match snapshot.first() {
        Some(newest) => {
            let previous = state.announcements.first().map(|a| a.id.as_str());
            if previous != Some(newest.id.as_str()) {
                state.latest_notification = Some(newest.clone());
                state.notified_at = Some(Instant::now());
                true
            } else {
                false
            }
        }
        None => false,
    };
    state.announcements = snapshot;
    state.snapshots += 1;
    raised
}

/// The pending notification, unless it was raised `ttl` or more ago.
pub fn visible_notification(state: &FeedState, ttl: Duration) -> Option<&Announcement> {
    let raised = state.notified_at?;
    if raised.elapsed() >= ttl {
        return None;
    }
    state.latest_notification.as_ref()
}

/// Unread announcements in `state`, capped at `cap`.
pub fn unread_count(state: &FeedState, cap: usize) -> usize {
    state
        .announcements
        .iter()
        .filter(|a| !state.read.contains(&a.id))
        .count()
        .min(cap)
}

/// Announcements for one signed-in resident.
pub struct AnnouncementFeed {
    cfg: Arc<CoreConfig>,
    user: RecordId,
    store: Arc<dyn AnnouncementStore>,
    state: Arc<watch::Sender<FeedState>>,
    subscription: Option<Subscription>,
}

impl AnnouncementFeed {
    /// Loads the user's read ids and starts listening to `source`.
    ///
    /// A failure to load read ids is logged and treated as "nothing read yet".
    pub async fn attach(
        cfg: Arc<CoreConfig>,
        session: &Session,
        source: &dyn AnnouncementSource,
        store: Arc<dyn AnnouncementStore>,
    ) -> Self {
        let user = session.record_id().clone();
        let read = match store.read_announcements(&user).await {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                tracing::warn!(user = %user, "failed to load read announcements: {}", e);
                HashSet::new()
            }
        };

        let (tx, _rx) = watch::channel(FeedState {
            read,
            ..FeedState::default()
        });
        let state = Arc::new(tx);

        let sink_state = Arc::clone(&state);
        let subscription = source.subscribe(Box::new(move |snapshot| {
            let count = snapshot.len();
            sink_state.send_modify(|s| {
                if apply_snapshot(s, snapshot) {
                    tracing::info!(count, "new announcement");
                }
            });
        }));

        Self {
            cfg,
            user,
            store,
            state,
            subscription: Some(subscription),
        }
    }

    pub fn announcements(&self) -> Vec<Announcement> {
        self.state.borrow().announcements.clone()
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.state.borrow().read.contains(id)
    }

    pub fn unread_count(&self) -> usize {
        unread_count(&self.state.borrow(), self.cfg.unread_cap())
    }

    /// The notification banner content while it is still showing.
    pub fn latest_notification(&self) -> Option<Announcement> {
        visible_notification(&self.state.borrow(), self.cfg.notification_ttl()).cloned()
    }

    /// Closes the notification banner.
    pub fn dismiss(&self) {
        self.state.send_if_modified(|s| {
            s.notified_at = None;
            s.latest_notification.take().is_some()
        });
    }

    /// Persists the read marker, then records it locally.
    pub async fn mark_read(&self, announcement_id: &str) -> Result<(), SubmissionFailure> {
        if self.is_read(announcement_id) {
            return Ok(());
        }
        self.store
            .mark_read(&self.user, announcement_id)
            .await
            .map_err(|e| SubmissionFailure::from_collaborator(&e))?;
        self.state
            .send_modify(|s| {
                s.read.insert(announcement_id.to_string());
            });
        Ok(())
    }

    pub fn changes(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Stops listening. The last snapshot stays readable.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.dispose();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }
}
