//! Service configuration.
//!
//! Resolved once at startup from `SENTINEL_*` environment variables. Each variable has a small
//! `*_from_env_value` parser so the rules can be tested without touching the process
//! environment.

use crate::{ServiceError, ServiceResult};
use std::time::Duration;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shortest value accepted as a real OpenAI key.
const OPENAI_KEY_MIN_LEN: usize = 20;

/// Base URLs of the hosted services. Overridden in tests to point at a mock server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub identity_toolkit: String,
    pub firestore: String,
    pub cloudinary: String,
    pub geocoding: String,
    pub openai: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            identity_toolkit: "https://identitytoolkit.googleapis.com".into(),
            firestore: "https://firestore.googleapis.com".into(),
            cloudinary: "https://api.cloudinary.com".into(),
            geocoding: "https://maps.googleapis.com".into(),
            openai: "https://api.openai.com".into(),
        }
    }
}

impl Endpoints {
    /// Every service at one base URL.
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            identity_toolkit: base.clone(),
            firestore: base.clone(),
            cloudinary: base.clone(),
            geocoding: base.clone(),
            openai: base,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServicesConfig {
    pub firebase_api_key: String,
    pub firebase_project_id: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
    pub google_maps_api_key: String,
    /// `None` when the key is missing or still a placeholder.
    pub openai_api_key: Option<String>,
    pub max_upload_bytes: u64,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub endpoints: Endpoints,
}

impl ServicesConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidConfig` if a required variable is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> ServiceResult<Self> {
        let var = |name: &str| std::env::var(name).ok();
        Ok(Self {
            firebase_api_key: required_from_env_value(
                "SENTINEL_FIREBASE_API_KEY",
                var("SENTINEL_FIREBASE_API_KEY"),
            )?,
            firebase_project_id: required_from_env_value(
                "SENTINEL_FIREBASE_PROJECT_ID",
                var("SENTINEL_FIREBASE_PROJECT_ID"),
            )?,
            cloudinary_cloud_name: required_from_env_value(
                "SENTINEL_CLOUDINARY_CLOUD_NAME",
                var("SENTINEL_CLOUDINARY_CLOUD_NAME"),
            )?,
            cloudinary_upload_preset: required_from_env_value(
                "SENTINEL_CLOUDINARY_UPLOAD_PRESET",
                var("SENTINEL_CLOUDINARY_UPLOAD_PRESET"),
            )?,
            google_maps_api_key: required_from_env_value(
                "SENTINEL_GOOGLE_MAPS_API_KEY",
                var("SENTINEL_GOOGLE_MAPS_API_KEY"),
            )?,
            openai_api_key: openai_key_from_env_value(var("SENTINEL_OPENAI_API_KEY")),
            max_upload_bytes: max_upload_bytes_from_env_value(var("SENTINEL_MAX_UPLOAD_BYTES"))?,
            poll_interval: poll_interval_from_env_value(var("SENTINEL_ANNOUNCEMENT_POLL_SECS"))?,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            endpoints: Endpoints::default(),
        })
    }
}

/// Trimmed value of a required variable.
pub fn required_from_env_value(name: &str, value: Option<String>) -> ServiceResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::InvalidConfig(format!("{name} is not set")))
}

/// The OpenAI key, or `None` when it is empty, a `your_...` placeholder, or too short to be
/// real.
pub fn openai_key_from_env_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.contains("your_") && v.len() >= OPENAI_KEY_MIN_LEN)
}

/// Upload size limit in bytes. Defaults to 10 MiB.
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> ServiceResult<u64> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
        Some(v) => match v.parse::<u64>() {
            Ok(0) => Err(ServiceError::InvalidConfig(
                "SENTINEL_MAX_UPLOAD_BYTES must be greater than zero".into(),
            )),
            Ok(n) => Ok(n),
            Err(e) => Err(ServiceError::InvalidConfig(format!(
                "SENTINEL_MAX_UPLOAD_BYTES must be a number of bytes: {e}"
            ))),
        },
    }
}

/// Announcement polling interval. Defaults to 30 seconds.
pub fn poll_interval_from_env_value(value: Option<String>) -> ServiceResult<Duration> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)),
        Some(v) => v
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ServiceError::InvalidConfig(
                    "SENTINEL_ANNOUNCEMENT_POLL_SECS must be a positive number of seconds".into(),
                )
            }),
    }
}
