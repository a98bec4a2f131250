//! AI health guide.
//!
//! Builds a system prompt from the resident's recent symptom reports, asks a chat model, and
//! splits the reply into free text plus structured disease estimates. The guide never fails
//! outward on collaborator trouble: the user gets a fallback message telling them to consult a
//! healthcare professional.

use crate::collaborators::{ChatModel, ChatRequest, DocumentStore};
use crate::config::CoreConfig;
use crate::draft::ReportType;
use crate::error::{CollaboratorError, SentinelError, SentinelResult};
use crate::records::{readable_reports, ReportRecord};
use crate::session::Session;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

pub const GREETING: &str = "Hello! I'm your AI Health Guide. I can help you understand your symptom patterns and provide general health information. Think of me as a helpful guide, not a medical professional. How can I assist you today?";

const FALLBACK_PREFIX: &str = "Unable to process your request. ";
const FALLBACK_SUFFIX: &str = " Consult a healthcare professional for medical advice.";

/// Symptoms the resident reported within the look-back window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomHistory {
    /// How many reports mentioned each symptom.
    pub frequency: BTreeMap<String, usize>,
    /// De-duplicated, newest report first.
    pub self_reported: Vec<String>,
    pub observed: Vec<String>,
}

impl SymptomHistory {
    pub fn from_reports(reports: &[ReportRecord], now: DateTime<Utc>, lookback: Duration) -> Self {
        let cutoff = now - lookback;
        let mut recent: Vec<&ReportRecord> =
            reports.iter().filter(|r| r.created_at >= cutoff).collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut history = SymptomHistory::default();
        for report in recent {
            let custom = report.custom_symptom.trim();
            let symptoms = report
                .symptoms
                .iter()
                .map(String::as_str)
                .chain((!custom.is_empty()).then_some(custom));

            for symptom in symptoms {
                *history.frequency.entry(symptom.to_string()).or_default() += 1;
                let bucket = match report.report_type {
                    ReportType::SelfReported => &mut history.self_reported,
                    ReportType::Observed => &mut history.observed,
                };
                if !bucket.iter().any(|s| s == symptom) {
                    bucket.push(symptom.to_string());
                }
            }
        }
        history
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }
}

pub fn build_system_prompt(history: &SymptomHistory) -> String {
    let context = if history.self_reported.is_empty() {
        String::new()
    } else {
        let frequency = history
            .frequency
            .iter()
            .map(|(symptom, count)| format!("{symptom} (reported {count}x)"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("User's self-reported symptoms from the past week with frequency: {frequency}. ")
    };

    format!(
        "You are a health information guide assistant. {context}When analyzing symptoms, \
         provide possible diseases with realistic confidence percentages (50-85%) and severity \
         levels. Format each disease EXACTLY as: \"DISEASE: [Disease Name] | CONFIDENCE: [X]% | \
         SEVERITY: [Low/Medium/High/Critical]\". Provide 2-4 most likely conditions. Provide \
         brief, helpful guidance (max 200 words). Remember to mention you're a guide to help \
         users understand their symptoms, not a medical professional. Encourage consulting \
         healthcare providers for proper diagnosis."
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Unspecified,
}

impl Severity {
    fn parse(word: &str) -> Self {
        match word.to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Unspecified,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
            Severity::Unspecified => "Unspecified",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

/// High at 70 and above, Medium at 40 and above.
pub fn confidence_band(confidence: u8) -> ConfidenceBand {
    if confidence >= 70 {
        ConfidenceBand::High
    } else if confidence >= 40 {
        ConfidenceBand::Medium
    } else {
        ConfidenceBand::Low
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseEstimate {
    pub name: String,
    /// Percentage, clamped to 100.
    pub confidence: u8,
    pub severity: Severity,
}

impl DiseaseEstimate {
    pub fn band(&self) -> ConfidenceBand {
        confidence_band(self.confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideReply {
    /// Text shown to the user with the structured disease lines removed.
    pub content: String,
    pub diseases: Vec<DiseaseEstimate>,
    /// Set when `content` is the fallback message rather than model output.
    pub fallback: bool,
}

fn disease_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)DISEASE:\s*([^|]+?)\s*\|\s*CONFIDENCE:\s*(\d+)%\s*\|\s*SEVERITY:\s*(\w+)")
            .expect("disease pattern is a valid regex")
    })
}

fn disease_line() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| Regex::new(r"(?i)DISEASE:[^\n]*").expect("disease line is a valid regex"))
}

/// `digits` always matched `\d+`, so the only parse failure is overflow.
fn clamp_percentage(digits: &str) -> u8 {
    digits.parse::<u8>().map_or(100, |value| value.min(100))
}

/// Extracts `DISEASE: .. | CONFIDENCE: ..% | SEVERITY: ..` lines from a model reply.
pub fn parse_reply(text: &str) -> GuideReply {
    let diseases = disease_pattern()
        .captures_iter(text)
        .map(|caps| DiseaseEstimate {
            name: caps[1].trim().to_string(),
            confidence: clamp_percentage(&caps[2]),
            severity: Severity::parse(&caps[3]),
        })
        .collect();

    let content = disease_line().replace_all(text, "").trim().to_string();
    GuideReply {
        content,
        diseases,
        fallback: false,
    }
}

/// The message shown when the chat model call fails.
pub fn fallback_message(err: &CollaboratorError) -> String {
    let code = err.code.as_deref().unwrap_or_default().to_ascii_lowercase();
    let message = err.message.to_ascii_lowercase();
    let mentions = |needle: &str| code.contains(needle) || message.contains(needle);

    let cause = if mentions("not configured") || mentions("not-configured") {
        err.message.trim_end_matches('.').to_string() + "."
    } else if mentions("api key") || mentions("invalid_api_key") {
        "Invalid API key.".to_string()
    } else if mentions("network") || mentions("fetch") {
        "Network connection issue.".to_string()
    } else if mentions("quota") || mentions("rate limit") || mentions("rate_limit") {
        "Service temporarily unavailable.".to_string()
    } else {
        "Please try again.".to_string()
    };
    format!("{FALLBACK_PREFIX}{cause}{FALLBACK_SUFFIX}")
}

/// Question-answering over the resident's recent symptom history.
pub struct HealthGuide {
    cfg: Arc<CoreConfig>,
    chat: Arc<dyn ChatModel>,
    store: Arc<dyn DocumentStore>,
}

impl HealthGuide {
    pub fn new(cfg: Arc<CoreConfig>, chat: Arc<dyn ChatModel>, store: Arc<dyn DocumentStore>) -> Self {
        Self { cfg, chat, store }
    }

    /// Loads the resident's reports from the look-back window.
    ///
    /// Documents that do not parse are skipped. A failed query yields an empty history.
    pub async fn load_history(&self, session: &Session, now: DateTime<Utc>) -> SymptomHistory {
        let uid = serde_json::Value::String(session.uid().to_string());
        let docs = match self
            .store
            .find_where(self.cfg.reports_collection(), "userId", &uid)
            .await
        {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(uid = %session.uid(), "failed to load symptom history: {}", e);
                return SymptomHistory::default();
            }
        };

        let reports = readable_reports(docs);

        SymptomHistory::from_reports(&reports, now, self.cfg.guide().lookback)
    }

    /// Asks the guide a question.
    ///
    /// # Errors
    ///
    /// Returns `SentinelError::InvalidInput` for an empty message. Chat model failures are not
    /// errors; they produce a fallback reply.
    pub async fn ask(&self, history: &SymptomHistory, message: &str) -> SentinelResult<GuideReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SentinelError::InvalidInput("message must not be empty".into()));
        }

        let settings = self.cfg.guide();
        let request = ChatRequest {
            model: settings.model.clone(),
            system_prompt: build_system_prompt(history),
            user_message: message.to_string(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        };

        match self.chat.complete(&request).await {
            Ok(text) => {
                let reply = parse_reply(&text);
                tracing::debug!(diseases = reply.diseases.len(), "guide replied");
                Ok(reply)
            }
            Err(e) => {
                tracing::error!(code = ?e.code, "guide request failed: {}", e.message);
                Ok(GuideReply {
                    content: fallback_message(&e),
                    diseases: Vec::new(),
                    fallback: true,
                })
            }
        }
    }
}
