//! Health QR codes.
//!
//! A resident has at most one QR code document. It snapshots the resident's profile and
//! every symptom report they have filed, so a health worker scanning the code sees the same
//! picture the resident did when it was generated. Regenerating refreshes the snapshot but
//! keeps the code's id and creation time.

use crate::collaborators::DocumentStore;
use crate::config::CoreConfig;
use crate::constants::UNKNOWN_ERROR_MESSAGE;
use crate::error::{FailureKind, SentinelError, SubmissionFailure};
use crate::records::{readable_reports, RecordId, ReportRecord, StoredDocument, UserRecord};
use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of the random tail of a QR id.
const QR_ID_RANDOM_LEN: usize = 6;

/// Stored content of a health QR code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQrCode {
    /// What the QR image encodes, e.g. `QR-LZ3K9F2A-7Q1X0B`.
    pub qr_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_data: UserRecord,
    #[serde(default)]
    pub symptom_reports: Vec<ReportRecord>,
}

/// A QR code together with the id of the document that holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedQrCode {
    pub record_id: RecordId,
    pub code: UserQrCode,
}

impl IssuedQrCode {
    fn from_document(doc: StoredDocument) -> Result<Self, serde_json::Error> {
        Ok(Self {
            code: serde_json::from_value(doc.fields)?,
            record_id: doc.id,
        })
    }
}

/// Builds a QR id from the generation time and some entropy.
///
/// The format is `QR-<millis in base 36>-<6 base-36 chars>`, upper case.
pub fn new_qr_id(now: DateTime<Utc>, entropy: u128) -> String {
    let millis = u128::try_from(now.timestamp_millis()).unwrap_or(0);
    let mut rest = entropy;
    let tail: String = (0..QR_ID_RANDOM_LEN)
        .map(|_| {
            let digit = BASE36_DIGITS[(rest % 36) as usize] as char;
            rest /= 36;
            digit
        })
        .collect();
    format!("QR-{}-{}", base36(millis), tail)
}

fn base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36_DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    digits.iter().rev().collect()
}

/// Reads and writes health QR codes.
pub struct QrCodes {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn DocumentStore>,
}

impl QrCodes {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self { cfg, store }
    }

    /// The signed-in resident's QR code, if one was generated before.
    pub async fn current(&self, session: &Session) -> Result<Option<IssuedQrCode>, SubmissionFailure> {
        self.find_one("userId", session.uid()).await
    }

    /// Resolves a scanned QR id.
    pub async fn lookup(&self, qr_id: &str) -> Result<Option<IssuedQrCode>, SubmissionFailure> {
        self.find_one("qrId", qr_id.trim()).await
    }

    /// Returns the existing code, generating one on first use.
    pub async fn load_or_generate(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<IssuedQrCode, SubmissionFailure> {
        match self.current(session).await? {
            Some(issued) => Ok(issued),
            None => self.generate(session, now).await,
        }
    }

    /// Writes a fresh snapshot of the resident's profile and reports.
    ///
    /// An existing code keeps its QR id and creation time. A report lookup failure is logged
    /// and produces a code with no reports.
    pub async fn generate(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<IssuedQrCode, SubmissionFailure> {
        let reports = self.reports_for(session).await;

        let uid = serde_json::Value::String(session.uid().to_string());
        let existing = self
            .store
            .find_where(self.cfg.qr_codes_collection(), "userId", &uid)
            .await
            .map_err(|e| SubmissionFailure::from_collaborator(&e))?
            .into_iter()
            .next();

        let (record_id, qr_id, created_at) = match existing {
            Some(doc) => {
                let record_id = doc.id.clone();
                match IssuedQrCode::from_document(doc) {
                    Ok(issued) => (Some(record_id), issued.code.qr_id, issued.code.created_at),
                    Err(e) => {
                        tracing::warn!(id = %record_id, "replacing unreadable QR code: {}", e);
                        (Some(record_id), new_qr_id(now, Uuid::new_v4().as_u128()), now)
                    }
                }
            }
            None => (None, new_qr_id(now, Uuid::new_v4().as_u128()), now),
        };

        let code = UserQrCode {
            qr_id,
            user_id: session.uid().to_string(),
            created_at,
            updated_at: now,
            user_data: session.user().clone(),
            symptom_reports: reports,
        };
        let fields = serde_json::to_value(&code).map_err(|e| {
            let err = SentinelError::Serialization(e);
            tracing::error!(uid = %session.uid(), "{}", err);
            SubmissionFailure::new(FailureKind::Unknown, UNKNOWN_ERROR_MESSAGE)
        })?;

        let collection = self.cfg.qr_codes_collection();
        let record_id = match record_id {
            Some(id) => {
                self.store
                    .replace_record(collection, &id, fields)
                    .await
                    .map_err(|e| SubmissionFailure::from_collaborator(&e))?;
                id
            }
            None => self
                .store
                .create_record(collection, fields)
                .await
                .map_err(|e| SubmissionFailure::from_collaborator(&e))?,
        };

        tracing::info!(qr = %code.qr_id, reports = code.symptom_reports.len(), "QR code generated");
        Ok(IssuedQrCode { record_id, code })
    }

    async fn reports_for(&self, session: &Session) -> Vec<ReportRecord> {
        let uid = serde_json::Value::String(session.uid().to_string());
        match self
            .store
            .find_where(self.cfg.reports_collection(), "userId", &uid)
            .await
        {
            Ok(docs) => readable_reports(docs),
            Err(e) => {
                tracing::warn!(uid = %session.uid(), "failed to load reports for QR code: {}", e);
                Vec::new()
            }
        }
    }

    async fn find_one(&self, field: &str, value: &str) -> Result<Option<IssuedQrCode>, SubmissionFailure> {
        let docs = self
            .store
            .find_where(
                self.cfg.qr_codes_collection(),
                field,
                &serde_json::Value::String(value.to_string()),
            )
            .await
            .map_err(|e| SubmissionFailure::from_collaborator(&e))?;

        Ok(docs.into_iter().find_map(|doc| {
            let id = doc.id.clone();
            IssuedQrCode::from_document(doc)
                .map_err(|e| tracing::warn!(%id, "skipping unreadable QR code: {}", e))
                .ok()
        }))
    }
}
