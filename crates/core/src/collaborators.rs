//! Narrow interfaces to external collaborators.
//!
//! Each trait is one hosted service's slice of functionality as the core needs it. Concrete
//! HTTP implementations live in the `sentinel-services` crate; tests use in-memory fakes.
//! Every call is asynchronous and fails with a [`CollaboratorError`] that the controllers
//! classify before anything reaches the user.

use crate::error::CollaboratorResult;
use crate::records::{RecordId, StoredDocument, UserRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A user-directory hit: the stored user plus its document id.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub record_id: RecordId,
    pub user: UserRecord,
}

/// Lookup of registered residents.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Finds the user whose stored contact number equals `normalised_phone` (trunk form).
    async fn find_by_phone(&self, normalised_phone: &str) -> CollaboratorResult<Option<DirectoryEntry>>;

    /// Whether any stored document carries `normalised_phone`, whatever else it contains.
    async fn contact_registered(&self, normalised_phone: &str) -> CollaboratorResult<bool>;
}

/// Signed-in identity returned by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub uid: String,
    pub id_token: Option<String>,
}

/// Email/password identity provider.
#[async_trait]
pub trait IdentityAuth: Send + Sync {
    /// Creates an account and returns its unique id. Fails on duplicate email or weak password.
    async fn create_account(&self, email: &str, password: &str) -> CollaboratorResult<String>;

    /// Fails on invalid credentials.
    async fn sign_in(&self, email: &str, password: &str) -> CollaboratorResult<AuthSession>;
}

/// Schemaless document persistence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document and returns the generated id. Fails on connectivity.
    async fn create_record(&self, collection: &str, fields: serde_json::Value) -> CollaboratorResult<RecordId>;

    /// Equality query on a single top-level field.
    async fn find_where(
        &self,
        collection: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> CollaboratorResult<Vec<StoredDocument>>;

    /// Writes `fields` as the whole content of document `id`, creating it if absent.
    async fn replace_record(
        &self,
        collection: &str,
        id: &RecordId,
        fields: serde_json::Value,
    ) -> CollaboratorResult<()>;
}

/// Image hosting.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads the image behind an opaque local reference and returns its hosted URL.
    /// Fails on invalid or oversized input.
    async fn upload(&self, local_image_ref: &str) -> CollaboratorResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Result of reverse geocoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodedAddress {
    pub formatted_address: String,
    /// Best guess at the barangay; empty when the geocoder has no matching component.
    pub barangay: String,
    pub region: String,
    pub municipality: String,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Fails on quota exhaustion or network trouble.
    async fn reverse_geocode(&self, at: Coordinates) -> CollaboratorResult<GeocodedAddress>;
}

#[async_trait]
pub trait LocationSensor: Send + Sync {
    /// Fails if location permission is denied.
    async fn current_position(&self) -> CollaboratorResult<Coordinates>;
}

/// One chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_message: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Large-language-model chat completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the generated text. Fails on quota, auth or network problems.
    async fn complete(&self, request: &ChatRequest) -> CollaboratorResult<String>;
}
