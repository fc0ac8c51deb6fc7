//! Session boundary: who is signed in, and the identity provider behind it.
//!
//! Every sign-in gets its own session, keyed by the provider's ID token.
//! Clients present that token as `Authorization: Bearer <token>`; each
//! session's state lives in a `watch` channel, so subscribers see the present
//! state first (signed out included) and then every change.

pub mod firebase;
pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::state::AppState;

pub use firebase::FirebaseIdentityProvider;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub id_token: String,
    /// `None` when the provider did not say.
    #[serde(skip_serializing)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("La contraseña debe tener al menos 6 caracteres.")]
    WeakPassword,

    #[error("Este correo ya está registrado.")]
    EmailAlreadyInUse,

    #[error("Correo o contraseña incorrectos.")]
    InvalidCredentials,

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Identity provider unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

/// Maps a provider error code (e.g. `WEAK_PASSWORD : Password should be...`)
/// onto an `AuthError`. Only the leading code is significant.
pub fn classify_provider_error(message: &str) -> AuthError {
    let code = message.split(':').next().unwrap_or_default().trim();
    match code {
        "WEAK_PASSWORD" => AuthError::WeakPassword,
        "EMAIL_EXISTS" => AuthError::EmailAlreadyInUse,
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
            AuthError::InvalidCredentials
        }
        _ => AuthError::Provider(message.to_string()),
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Password sessions hold no server-side state to revoke.
    async fn sign_out(&self, _session: &Session) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

type SessionTable = HashMap<String, watch::Sender<Option<Session>>>;

/// Live sessions, one per signed-in client.
#[derive(Clone)]
pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    sessions: Arc<RwLock<SessionTable>>,
}

impl SessionContext {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The session behind `token`, if it exists and has not expired.
    pub async fn current(&self, token: &str) -> Option<Session> {
        let session = {
            let sessions = self.sessions.read().await;
            let session = sessions.get(token)?.borrow().clone();
            session
        }?;
        if session.is_expired(Utc::now()) {
            debug!(user_id = %session.user_id, "Session expired");
            self.end(token).await;
            return None;
        }
        Some(session)
    }

    /// The returned receiver reports the session's current state on its first
    /// `changed()`, then its sign-out. An unknown token reports "no session".
    pub async fn subscribe(&self, token: &str) -> watch::Receiver<Option<Session>> {
        let mut rx = match self.sessions.read().await.get(token) {
            Some(tx) => tx.subscribe(),
            None => watch::channel(None).1,
        };
        rx.mark_changed();
        rx
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.provider.sign_up(email, password).await?;
        info!(user_id = %session.user_id, "Account created");
        self.start(session.clone()).await;
        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.provider.sign_in(email, password).await?;
        info!(user_id = %session.user_id, "Signed in");
        self.start(session.clone()).await;
        Ok(session)
    }

    /// Ends the session behind `token`. Unknown tokens are a no-op.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let session = {
            let sessions = self.sessions.read().await;
            let session = sessions.get(token).and_then(|tx| tx.borrow().clone());
            session
        };
        if let Some(session) = session {
            self.provider.sign_out(&session).await?;
            info!(user_id = %session.user_id, "Signed out");
        }
        self.end(token).await;
        Ok(())
    }

    async fn start(&self, session: Session) {
        let token = session.id_token.clone();
        let (tx, _rx) = watch::channel(Some(session));
        self.sessions.write().await.insert(token, tx);
    }

    async fn end(&self, token: &str) {
        if let Some(tx) = self.sessions.write().await.remove(token) {
            tx.send_replace(None);
        }
    }
}

/// Rejects requests with 401 unless they carry the bearer token of a live
/// session. The session is handed to downstream handlers as an extension.
///
/// Only mounted when an identity provider is configured.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = state.session.as_ref().ok_or(AppError::AuthDisabled)?;
    let token = bearer_token(request.headers()).map(str::to_string);
    let session = match token {
        Some(token) => ctx.current(&token).await,
        None => None,
    };
    let Some(session) = session else {
        debug!(path = %request.uri().path(), "Rejected request without session");
        return Err(AppError::Unauthorized);
    };
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;

    /// Accepts any password of six or more characters; one token per email.
    pub(crate) struct StaticProvider;

    #[async_trait]
    impl IdentityProvider for StaticProvider {
        async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            self.sign_in(email, password).await
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            if password.len() < 6 {
                return Err(AuthError::InvalidCredentials);
            }
            Ok(Session {
                user_id: format!("uid-{email}"),
                email: email.to_string(),
                id_token: format!("token-{email}"),
                expires_at: None,
            })
        }
    }

    /// Hands out sessions that are already expired.
    struct ExpiredProvider;

    #[async_trait]
    impl IdentityProvider for ExpiredProvider {
        async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            self.sign_in(email, password).await
        }

        async fn sign_in(&self, email: &str, _password: &str) -> Result<Session, AuthError> {
            Ok(Session {
                user_id: "uid".to_string(),
                email: email.to_string(),
                id_token: "stale".to_string(),
                expires_at: Some(Utc::now() - Duration::seconds(1)),
            })
        }
    }

    #[test]
    fn test_classify_provider_error_codes() {
        assert!(matches!(
            classify_provider_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthError::WeakPassword
        ));
        assert!(matches!(
            classify_provider_error("EMAIL_EXISTS"),
            AuthError::EmailAlreadyInUse
        ));
        assert!(matches!(
            classify_provider_error("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            classify_provider_error("EMAIL_NOT_FOUND"),
            AuthError::InvalidCredentials
        ));
        match classify_provider_error("TOO_MANY_ATTEMPTS_TRY_LATER") {
            AuthError::Provider(msg) => assert_eq!(msg, "TOO_MANY_ATTEMPTS_TRY_LATER"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer  abc "));
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_subscribe_unknown_token_reports_no_session_immediately() {
        let ctx = SessionContext::new(Arc::new(StaticProvider));
        let mut rx = ctx.subscribe("nobody").await;
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_subscriber_sees_session_then_sign_out() {
        let ctx = SessionContext::new(Arc::new(StaticProvider));
        let session = ctx.sign_in("ana@example.com", "secret1").await.unwrap();

        let mut rx = ctx.subscribe(&session.id_token).await;
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|s| s.email.clone()),
            Some("ana@example.com".to_string())
        );

        ctx.sign_out(&session.id_token).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
        assert!(ctx.current(&session.id_token).await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_independent_per_client() {
        let ctx = SessionContext::new(Arc::new(StaticProvider));
        let ana = ctx.sign_in("ana@example.com", "secret1").await.unwrap();
        let bob = ctx.sign_in("bob@example.com", "secret2").await.unwrap();

        assert!(ctx.current("").await.is_none());
        assert!(ctx.current("token-eve@example.com").await.is_none());

        ctx.sign_out(&ana.id_token).await.unwrap();
        assert!(ctx.current(&ana.id_token).await.is_none());
        assert_eq!(
            ctx.current(&bob.id_token).await.map(|s| s.email),
            Some("bob@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_sign_in_creates_no_session() {
        let ctx = SessionContext::new(Arc::new(StaticProvider));
        let err = ctx.sign_in("ana@example.com", "123").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(ctx.current("token-ana@example.com").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let ctx = SessionContext::new(Arc::new(ExpiredProvider));
        let session = ctx.sign_in("ana@example.com", "secret1").await.unwrap();
        let mut rx = ctx.subscribe(&session.id_token).await;
        rx.borrow_and_update();

        assert!(ctx.current(&session.id_token).await.is_none());
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn test_session_serialization_hides_token() {
        let session = Session {
            user_id: "u1".to_string(),
            email: "a@b.c".to_string(),
            id_token: "secret".to_string(),
            expires_at: None,
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["userId"], "u1");
        assert!(value.get("idToken").is_none());
    }
}
