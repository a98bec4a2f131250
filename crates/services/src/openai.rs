//! OpenAI chat completions.

use crate::error::transport_error;
use async_trait::async_trait;
use reqwest::Client;
use sentinel_core::collaborators::{ChatModel, ChatRequest};
use sentinel_core::{CollaboratorError, CollaboratorResult};
use serde::{Deserialize, Serialize};

pub const NOT_CONFIGURED_CODE: &str = "not-configured";

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    code: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

pub struct OpenAiChat {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiChat {
    /// `api_key` is `None` when no usable key is configured; every call then fails with
    /// code `not-configured`.
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

fn completion_text(response: CompletionResponse) -> CollaboratorResult<String> {
    if let Some(error) = response.error {
        let code = error.code.or(error.kind);
        let message = if error.message.is_empty() {
            "API request failed".to_string()
        } else {
            error.message
        };
        return Err(CollaboratorError {
            code,
            message,
        });
    }
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| CollaboratorError::new("Invalid response from AI service"))
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, request: &ChatRequest) -> CollaboratorResult<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CollaboratorError::with_code(NOT_CONFIGURED_CODE, "API key not configured")
        })?;

        let body = CompletionBody {
            model: &request.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system_prompt,
                },
                Message {
                    role: "user",
                    content: &request.user_message,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        // Error responses carry the same envelope with an `error` object.
        let parsed: CompletionResponse = response.json().await.map_err(transport_error)?;
        completion_text(parsed)
    }
}
