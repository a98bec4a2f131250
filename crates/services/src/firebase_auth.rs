//! Firebase Authentication over the Identity Toolkit REST API.

use crate::error::transport_error;
use async_trait::async_trait;
use reqwest::Client;
use sentinel_core::collaborators::{AuthSession, IdentityAuth};
use sentinel_core::{CollaboratorError, CollaboratorResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Latest ID token, shared with the Firestore client so its requests run as the signed-in user.
pub type TokenSlot = Arc<RwLock<Option<String>>>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct FirebaseAuth {
    client: Client,
    base_url: String,
    api_key: String,
    token: TokenSlot,
}

impl FirebaseAuth {
    pub fn new(client: Client, base_url: &str, api_key: &str, token: TokenSlot) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            token,
        }
    }

    async fn call(&self, method: &str, email: &str, password: &str) -> CollaboratorResult<AccountResponse> {
        let url = format!("{}/v1/accounts:{}", self.base_url, method);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(transport_error)?;
            return Err(auth_error(status.as_u16(), &body));
        }

        let account: AccountResponse = response.json().await.map_err(transport_error)?;
        if let Some(token) = &account.id_token {
            *self.token.write().await = Some(token.clone());
        }
        Ok(account)
    }
}

/// The REST API reports failures as `{"error": {"message": "EMAIL_EXISTS"}}`. The message is
/// the machine-readable code, sometimes followed by ` : <detail>`.
fn auth_error(status: u16, body: &str) -> CollaboratorError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = envelope.error.message;
            let code = message.split(':').next().unwrap_or_default().trim().to_string();
            let readable = match code.as_str() {
                "EMAIL_EXISTS" => "The email address is already in use by another account.".to_string(),
                "WEAK_PASSWORD" => "Password should be at least 6 characters.".to_string(),
                "INVALID_EMAIL" => "The email address is badly formatted.".to_string(),
                "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
                    "Invalid contact number or password.".to_string()
                }
                _ => message.clone(),
            };
            CollaboratorError::with_code(code, readable)
        }
        Err(_) if status == 503 => {
            CollaboratorError::with_code("unavailable", "Authentication service unavailable")
        }
        Err(_) => CollaboratorError::new(format!("authentication failed with status {status}")),
    }
}

#[async_trait]
impl IdentityAuth for FirebaseAuth {
    async fn create_account(&self, email: &str, password: &str) -> CollaboratorResult<String> {
        let account = self.call("signUp", email, password).await?;
        tracing::info!(uid = %account.local_id, "created account");
        Ok(account.local_id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> CollaboratorResult<AuthSession> {
        let account = self.call("signInWithPassword", email, password).await?;
        Ok(AuthSession {
            uid: account.local_id,
            id_token: account.id_token,
        })
    }
}
