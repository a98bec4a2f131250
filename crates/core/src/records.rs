//! Records persisted through the document-store collaborator.
//!
//! The client creates these once and never mutates them afterwards. Status transitions
//! (pending to approved/verified/rejected) happen out-of-band by a reviewer.
//!
//! Field names follow the hosted schema (camelCase), so a record serialises straight into the
//! document body the store expects.

use crate::draft::ReportType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier generated by the document store for a created record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as returned by a store query.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: RecordId,
    pub fields: serde_json::Value,
}

/// Review state of a registered resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UserStatus::Pending => "pending",
            UserStatus::Approved => "approved",
            UserStatus::Rejected => "rejected",
        })
    }
}

/// Review state of a symptom report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub region: String,
    pub municipality: String,
    pub barangay: String,
}

/// Identity documents uploaded during registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Documents {
    pub id_type: String,
    pub valid_id_url: String,
    pub selfie_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Identity-provider account id.
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_initial: String,
    /// Trunk form, `0` followed by 10 digits.
    pub contact_number: String,
    pub email: String,
    pub address: Address,
    #[serde(default)]
    pub community_role: String,
    pub documents: Documents,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_announcements: Vec<String>,
}

impl UserRecord {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub user_id: String,
    pub user_name: String,
    pub report_type: ReportType,
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub custom_symptom: String,
    pub description: String,
    /// Human-readable address from reverse geocoding.
    pub location: String,
    pub barangay: String,
    /// Empty when no proof image was attached.
    #[serde(default)]
    pub proof_image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

/// Parses report documents, skipping any that no longer match the schema.
pub(crate) fn readable_reports(docs: Vec<StoredDocument>) -> Vec<ReportRecord> {
    docs.into_iter()
        .filter_map(|doc| match serde_json::from_value(doc.fields) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(id = %doc.id, "skipping unreadable report: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_record_serialises_with_hosted_field_names() {
        let record = UserRecord {
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
                valid_id_url: "https://img/id.jpg".into(),
                selfie_url: "https://img/selfie.jpg".into(),
            },
            status: UserStatus::Pending,
            created_at: DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
            read_announcements: vec![],
        };

        let value = serde_json::to_value(&record).expect("serialise user");
        assert_eq!(value["contactNumber"], json!("09171234567"));
        assert_eq!(value["documents"]["validIdUrl"], json!("https://img/id.jpg"));
        assert_eq!(value["status"], json!("pending"));
        assert!(value.get("readAnnouncements").is_none());
        assert_eq!(record.display_name(), "Juan Dela Cruz");
    }

    #[test]
    fn report_record_round_trips_report_type() {
        let value = json!({
            "userId": "uid-1",
            "userName": "Juan Dela Cruz",
            "reportType": "observed",
            "symptoms": ["Fever"],
            "description": "neighbour has fever",
            "location": "Batasan Hills, Quezon City",
            "barangay": "Batasan Hills",
            "latitude": 14.68,
            "longitude": 121.1,
            "status": "verified",
            "createdAt": "2026-01-02T03:04:05Z"
        });
        let record: ReportRecord = serde_json::from_value(value).expect("parse report");
        assert_eq!(record.report_type, ReportType::Observed);
        assert_eq!(record.status, ReportStatus::Verified);
        assert!(record.custom_symptom.is_empty());
        assert!(record.proof_image_url.is_empty());
    }
}
