//! Cloud Firestore over the REST API.
//!
//! One [`Firestore`] client backs four core collaborators: the user directory, the document
//! store, the per-user announcement read markers, and the announcement stream. The stream is a
//! polling task; the returned [`Subscription`] aborts it.

pub mod value;

use crate::error::transport_error;
use crate::firebase_auth::TokenSlot;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use sentinel_core::announcements::{
    Announcement, AnnouncementSink, AnnouncementSource, AnnouncementStore, Subscription,
};
use sentinel_core::collaborators::{DirectoryEntry, DocumentStore, IdentityDirectory};
use sentinel_core::records::{StoredDocument, UserRecord};
use sentinel_core::{CollaboratorError, CollaboratorResult, CoreConfig, RecordId};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const READ_ANNOUNCEMENTS_FIELD: &str = "readAnnouncements";
const CONTACT_NUMBER_FIELD: &str = "contactNumber";
const CREATED_AT_FIELD: &str = "createdAt";

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Value,
}

impl RawDocument {
    fn into_stored(self) -> StoredDocument {
        let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
        StoredDocument {
            id: RecordId::new(id),
            fields: value::decode_fields(&self.fields),
        }
    }
}

#[derive(Deserialize)]
struct QueryRow {
    document: Option<RawDocument>,
}

/// Maps a Firestore error response. `status` values such as `UNAVAILABLE` or
/// `PERMISSION_DENIED` become kebab-case codes.
fn firestore_error(status: u16, body: &str) -> CollaboratorError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.status.is_empty() => {
            let code = envelope.error.status.to_ascii_lowercase().replace('_', "-");
            CollaboratorError::with_code(code, envelope.error.message)
        }
        _ if status == 503 => CollaboratorError::with_code(
            "unavailable",
            "Could not reach Cloud Firestore backend",
        ),
        Ok(envelope) => CollaboratorError::new(envelope.error.message),
        Err(_) => CollaboratorError::new(format!("Firestore request failed with status {status}")),
    }
}

#[derive(Clone)]
pub struct Firestore {
    client: Client,
    base_url: String,
    database: String,
    api_key: String,
    token: TokenSlot,
    cfg: Arc<CoreConfig>,
    poll_interval: Duration,
}

impl Firestore {
    pub fn new(
        client: Client,
        base_url: &str,
        project_id: &str,
        api_key: &str,
        token: TokenSlot,
        cfg: Arc<CoreConfig>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            database: format!("projects/{project_id}/databases/(default)"),
            api_key: api_key.to_string(),
            token,
            cfg,
            poll_interval,
        }
    }

    fn documents_url(&self) -> String {
        format!("{}/v1/{}/documents", self.base_url, self.database)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url(), collection, id)
    }

    async fn send(&self, request: RequestBuilder) -> CollaboratorResult<Value> {
        let mut request = request.query(&[("key", self.api_key.as_str())]);
        if let Some(token) = self.token.read().await.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(transport_error)?;
            return Err(firestore_error(status.as_u16(), &body));
        }
        response.json().await.map_err(transport_error)
    }

    pub async fn create_document(&self, collection: &str, fields: &Value) -> CollaboratorResult<RecordId> {
        let map = fields
            .as_object()
            .ok_or_else(|| CollaboratorError::new("document fields must be a JSON object"))?;
        let url = format!("{}/{}", self.documents_url(), collection);
        let body = json!({ "fields": value::encode_fields(map) });

        let created = self.send(self.client.post(&url).json(&body)).await?;
        let doc: RawDocument = serde_json::from_value(created)
            .map_err(|e| CollaboratorError::new(format!("Invalid response from Firestore: {e}")))?;
        Ok(doc.into_stored().id)
    }

    pub async fn get_document(&self, collection: &str, id: &str) -> CollaboratorResult<StoredDocument> {
        let raw = self.send(self.client.get(self.document_url(collection, id))).await?;
        let doc: RawDocument = serde_json::from_value(raw)
            .map_err(|e| CollaboratorError::new(format!("Invalid response from Firestore: {e}")))?;
        Ok(doc.into_stored())
    }

    /// Overwrites one top-level field, leaving the rest of the document untouched.
    pub async fn patch_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        new_value: &Value,
    ) -> CollaboratorResult<()> {
        let mut fields = serde_json::Map::new();
        fields.insert(field.to_string(), value::encode_field(field, new_value));
        let body = json!({ "fields": fields });
        let request = self
            .client
            .patch(self.document_url(collection, id))
            .query(&[("updateMask.fieldPaths", field)])
            .json(&body);
        self.send(request).await.map(|_| ())
    }

    async fn run_query(&self, structured_query: Value) -> CollaboratorResult<Vec<StoredDocument>> {
        let url = format!("{}:runQuery", self.documents_url());
        let body = json!({ "structuredQuery": structured_query });
        let rows = self.send(self.client.post(&url).json(&body)).await?;
        let rows: Vec<QueryRow> = serde_json::from_value(rows)
            .map_err(|e| CollaboratorError::new(format!("Invalid response from Firestore: {e}")))?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.document.map(RawDocument::into_stored))
            .collect())
    }

    /// All documents of `collection`, newest `order_field` first.
    pub async fn list_ordered(&self, collection: &str, order_field: &str) -> CollaboratorResult<Vec<StoredDocument>> {
        self.run_query(json!({
            "from": [{ "collectionId": collection }],
            "orderBy": [{ "field": { "fieldPath": order_field }, "direction": "DESCENDING" }]
        }))
        .await
    }

    async fn announcement_snapshot(&self) -> CollaboratorResult<Vec<Announcement>> {
        let docs = self
            .list_ordered(self.cfg.announcements_collection(), CREATED_AT_FIELD)
            .await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                match Announcement::from_document(doc) {
                    Ok(announcement) => Some(announcement),
                    Err(e) => {
                        tracing::warn!(%id, "skipping invalid announcement: {}", e);
                        None
                    }
                }
            })
            .collect())
    }
}

#[async_trait]
impl DocumentStore for Firestore {
    async fn create_record(&self, collection: &str, fields: Value) -> CollaboratorResult<RecordId> {
        let id = self.create_document(collection, &fields).await?;
        tracing::debug!(collection, %id, "created document");
        Ok(id)
    }

    async fn find_where(
        &self,
        collection: &str,
        field: &str,
        equals: &Value,
    ) -> CollaboratorResult<Vec<StoredDocument>> {
        self.run_query(json!({
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": value::encode_field(field, equals)
                }
            }
        }))
        .await
    }

    /// A PATCH without an update mask replaces every field and creates missing documents.
    async fn replace_record(&self, collection: &str, id: &RecordId, fields: Value) -> CollaboratorResult<()> {
        let map = fields
            .as_object()
            .ok_or_else(|| CollaboratorError::new("document fields must be a JSON object"))?;
        let body = json!({ "fields": value::encode_fields(map) });
        let request = self
            .client
            .patch(self.document_url(collection, id.as_str()))
            .json(&body);
        self.send(request).await?;
        tracing::debug!(collection, %id, "replaced document");
        Ok(())
    }
}

impl Firestore {
    async fn users_with_contact(&self, normalised_phone: &str) -> CollaboratorResult<Vec<StoredDocument>> {
        self.find_where(
            self.cfg.users_collection(),
            CONTACT_NUMBER_FIELD,
            &Value::String(normalised_phone.to_string()),
        )
        .await
    }
}

#[async_trait]
impl IdentityDirectory for Firestore {
    /// A match that cannot be read as a user record is an error, not a miss.
    async fn find_by_phone(&self, normalised_phone: &str) -> CollaboratorResult<Option<DirectoryEntry>> {
        let Some(doc) = self.users_with_contact(normalised_phone).await?.into_iter().next() else {
            return Ok(None);
        };
        match serde_json::from_value::<UserRecord>(doc.fields) {
            Ok(user) => Ok(Some(DirectoryEntry {
                record_id: doc.id,
                user,
            })),
            Err(e) => {
                tracing::warn!(id = %doc.id, "unreadable user document: {}", e);
                Err(CollaboratorError::new(format!("Invalid user record {}", doc.id)))
            }
        }
    }

    async fn contact_registered(&self, normalised_phone: &str) -> CollaboratorResult<bool> {
        Ok(!self.users_with_contact(normalised_phone).await?.is_empty())
    }
}

fn read_ids(doc: &StoredDocument) -> Vec<String> {
    doc.fields
        .get(READ_ANNOUNCEMENTS_FIELD)
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

#[async_trait]
impl AnnouncementStore for Firestore {
    async fn read_announcements(&self, user: &RecordId) -> CollaboratorResult<Vec<String>> {
        let doc = self
            .get_document(self.cfg.users_collection(), user.as_str())
            .await?;
        Ok(read_ids(&doc))
    }

    async fn mark_read(&self, user: &RecordId, announcement_id: &str) -> CollaboratorResult<()> {
        let mut ids = self.read_announcements(user).await?;
        if ids.iter().any(|id| id == announcement_id) {
            return Ok(());
        }
        ids.push(announcement_id.to_string());
        self.patch_field(
            self.cfg.users_collection(),
            user.as_str(),
            READ_ANNOUNCEMENTS_FIELD,
            &json!(ids),
        )
        .await
    }
}

impl AnnouncementSource for Firestore {
    /// Polls the announcements collection every `poll_interval`, starting immediately.
    ///
    /// Must be called from within a Tokio runtime.
    fn subscribe(&self, sink: AnnouncementSink) -> Subscription {
        let store = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.poll_interval);
            loop {
                ticker.tick().await;
                match store.announcement_snapshot().await {
                    Ok(snapshot) => sink(snapshot),
                    Err(e) => tracing::warn!(code = ?e.code, "announcement poll failed: {}", e),
                }
            }
        });
        Subscription::new(move || handle.abort())
    }
}
