//! Firebase Authentication over its REST API (email + password accounts).

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::session::{classify_provider_error, AuthError, IdentityProvider, Session};

pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    /// Seconds, as a string.
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct FirebaseIdentityProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FirebaseIdentityProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!("{}/v1/accounts:{method}", self.base_url);
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
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            warn!(method, status = status.as_u16(), %message, "Identity provider rejected request");
            return Err(classify_provider_error(&message));
        }

        let parsed: PasswordResponse = response.json().await?;
        let expires_at = parsed
            .expires_in
            .as_deref()
            .and_then(|secs| secs.parse::<i64>().ok())
            .map(|secs| Utc::now() + Duration::seconds(secs));
        Ok(Session {
            user_id: parsed.local_id,
            email: if parsed.email.is_empty() {
                email.to_string()
            } else {
                parsed.email
            },
            id_token: parsed.id_token,
            expires_at,
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.password_call("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.password_call("signInWithPassword", email, password).await
    }
}
