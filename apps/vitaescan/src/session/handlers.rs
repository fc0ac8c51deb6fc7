use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::session::{bearer_token, Session, SessionContext};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Bearer token for later requests; only present on sign-up and login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl SessionSummary {
    fn issued(session: Session) -> Self {
        Self {
            signed_in: true,
            email: Some(session.email),
            token: Some(session.id_token),
        }
    }
}

impl From<Option<Session>> for SessionSummary {
    fn from(session: Option<Session>) -> Self {
        Self {
            signed_in: session.is_some(),
            email: session.map(|s| s.email),
            token: None,
        }
    }
}

fn context(state: &AppState) -> Result<&SessionContext, AppError> {
    state.session.as_ref().ok_or(AppError::AuthDisabled)
}

/// POST /api/v1/auth/signup
pub async fn handle_sign_up(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<Json<SessionSummary>, AppError> {
    let session = context(&state)?.sign_up(&req.email, &req.password).await?;
    Ok(Json(SessionSummary::issued(session)))
}

/// POST /api/v1/auth/login
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<Json<SessionSummary>, AppError> {
    let session = context(&state)?.sign_in(&req.email, &req.password).await?;
    Ok(Json(SessionSummary::issued(session)))
}

/// POST /api/v1/auth/logout
///
/// Ends the caller's own session only.
pub async fn handle_sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let ctx = context(&state)?;
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    ctx.sign_out(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/session
pub async fn handle_current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<SessionSummary> {
    let current = match (state.session.as_ref(), bearer_token(&headers)) {
        (Some(ctx), Some(token)) => ctx.current(token).await,
        _ => None,
    };
    Json(current.into())
}
