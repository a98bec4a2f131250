//! # Sentinel Services
//!
//! HTTP implementations of the collaborator traits defined in `sentinel-core`:
//! - Firebase Authentication (account creation, password sign-in)
//! - Cloud Firestore (user directory, record store, announcements)
//! - Cloudinary (image uploads)
//! - Google Geocoding (reverse geocoding)
//! - OpenAI (chat completions for the health guide)
//!
//! Every call failure is returned as a `CollaboratorError` carrying the provider's code so the
//! core can classify it.

pub mod cloudinary;
pub mod config;
pub mod error;
pub mod firebase_auth;
pub mod firestore;
pub mod geocoding;
pub mod location;
pub mod openai;


pub use cloudinary::CloudinaryHost;
pub use config::{Endpoints, ServicesConfig};
pub use error::{ServiceError, ServiceResult};
pub use firebase_auth::{FirebaseAuth, TokenSlot};
pub use firestore::Firestore;
pub use geocoding::GoogleGeocoder;
pub use location::FixedLocation;
pub use openai::OpenAiChat;

use sentinel_core::CoreConfig;
use std::sync::Arc;

/// Every hosted collaborator, sharing one HTTP client and one ID-token slot.
#[derive(Clone)]
pub struct Collaborators {
    pub auth: Arc<FirebaseAuth>,
    pub firestore: Arc<Firestore>,
    pub images: Arc<CloudinaryHost>,
    pub geocoder: Arc<GoogleGeocoder>,
    pub chat: Arc<OpenAiChat>,
}

impl Collaborators {
    /// Builds the collaborators from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Client` if the HTTP client cannot be built.
    pub fn connect(cfg: &ServicesConfig, core: Arc<CoreConfig>) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .user_agent(concat!("sentinel/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let token = TokenSlot::default();
        let endpoints = &cfg.endpoints;

        tracing::debug!(project = %cfg.firebase_project_id, "connecting collaborators");
        if cfg.openai_api_key.is_none() {
            tracing::warn!("SENTINEL_OPENAI_API_KEY is missing or a placeholder; the health guide will be unavailable");
        }

        Ok(Self {
            auth: Arc::new(FirebaseAuth::new(
                client.clone(),
                &endpoints.identity_toolkit,
                &cfg.firebase_api_key,
                token.clone(),
            )),
            firestore: Arc::new(Firestore::new(
                client.clone(),
                &endpoints.firestore,
                &cfg.firebase_project_id,
                &cfg.firebase_api_key,
                token,
                core,
                cfg.poll_interval,
            )),
            images: Arc::new(CloudinaryHost::new(
                client.clone(),
                &endpoints.cloudinary,
                &cfg.cloudinary_cloud_name,
                &cfg.cloudinary_upload_preset,
                cfg.max_upload_bytes,
            )),
            geocoder: Arc::new(GoogleGeocoder::new(
                client.clone(),
                &endpoints.geocoding,
                &cfg.google_maps_api_key,
            )),
            chat: Arc::new(OpenAiChat::new(
                client,
                &endpoints.openai,
                cfg.openai_api_key.clone(),
            )),
        })
    }
}
