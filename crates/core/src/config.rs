//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the controllers as
//! `Arc<CoreConfig>`. Nothing in the core reads environment variables while a flow is running.

use crate::constants::{
    ANNOUNCEMENTS_COLLECTION, DEFAULT_CALLING_CODE, DEFAULT_GUIDE_LOOKBACK_DAYS,
    DEFAULT_GUIDE_MAX_TOKENS, DEFAULT_GUIDE_MODEL, DEFAULT_GUIDE_TEMPERATURE,
    DEFAULT_NOTIFICATION_TTL_SECS, DEFAULT_UNREAD_CAP, SYMPTOM_REPORTS_COLLECTION,
    USERS_COLLECTION, USER_QR_CODES_COLLECTION,
};
use std::time::Duration;
use crate::{SentinelError, SentinelResult};

/// Settings for the AI health guide.
#[derive(Clone, Debug, PartialEq)]
pub struct GuideSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub lookback: chrono::Duration,
}

impl Default for GuideSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_GUIDE_MODEL.to_string(),
            max_tokens: DEFAULT_GUIDE_MAX_TOKENS,
            temperature: DEFAULT_GUIDE_TEMPERATURE,
            lookback: chrono::Duration::days(DEFAULT_GUIDE_LOOKBACK_DAYS),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    users_collection: String,
    reports_collection: String,
    announcements_collection: String,
    qr_codes_collection: String,
    calling_code: String,
    unread_cap: usize,
    notification_ttl: Duration,
    guide: GuideSettings,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `SentinelError::InvalidConfig` if a collection name is blank or the calling
    /// code is not `+` followed by digits.
    pub fn new(
        users_collection: String,
        reports_collection: String,
        announcements_collection: String,
        calling_code: String,
        guide: GuideSettings,
    ) -> SentinelResult<Self> {
        for (label, name) in [
            ("users collection", &users_collection),
            ("reports collection", &reports_collection),
            ("announcements collection", &announcements_collection),
        ] {
            if name.trim().is_empty() {
                return Err(SentinelError::InvalidConfig(format!("{label} cannot be empty")));
            }
        }

        validate_calling_code(&calling_code)?;

        if !(0.0..=2.0).contains(&guide.temperature) {
            return Err(SentinelError::InvalidConfig(
                "guide temperature must be between 0.0 and 2.0".into(),
            ));
        }

        Ok(Self {
            users_collection,
            reports_collection,
            announcements_collection,
            qr_codes_collection: USER_QR_CODES_COLLECTION.to_string(),
            calling_code,
            unread_cap: DEFAULT_UNREAD_CAP,
            notification_ttl: Duration::from_secs(DEFAULT_NOTIFICATION_TTL_SECS),
            guide,
        })
    }

    pub fn users_collection(&self) -> &str {
        &self.users_collection
    }

    pub fn reports_collection(&self) -> &str {
        &self.reports_collection
    }

    pub fn announcements_collection(&self) -> &str {
        &self.announcements_collection
    }

    pub fn qr_codes_collection(&self) -> &str {
        &self.qr_codes_collection
    }

    pub fn calling_code(&self) -> &str {
        &self.calling_code
    }

    pub fn unread_cap(&self) -> usize {
        self.unread_cap
    }

    /// How long a new-announcement notification stays up unless dismissed.
    pub fn notification_ttl(&self) -> Duration {
        self.notification_ttl
    }

    pub fn guide(&self) -> &GuideSettings {
        &self.guide
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            users_collection: USERS_COLLECTION.to_string(),
            reports_collection: SYMPTOM_REPORTS_COLLECTION.to_string(),
            announcements_collection: ANNOUNCEMENTS_COLLECTION.to_string(),
            qr_codes_collection: USER_QR_CODES_COLLECTION.to_string(),
            calling_code: DEFAULT_CALLING_CODE.to_string(),
            unread_cap: DEFAULT_UNREAD_CAP,
            notification_ttl: Duration::from_secs(DEFAULT_NOTIFICATION_TTL_SECS),
            guide: GuideSettings::default(),
        }
    }
}

fn validate_calling_code(code: &str) -> SentinelResult<()> {
    let digits = code.strip_prefix('+').ok_or_else(|| {
        SentinelError::InvalidConfig("calling code must start with '+'".into())
    })?;
    if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SentinelError::InvalidConfig(
            "calling code must be '+' followed by 1-3 digits".into(),
        ));
    }
    Ok(())
}

/// Parse the guide model from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default model.
pub fn guide_model_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_GUIDE_MODEL.to_string())
}
