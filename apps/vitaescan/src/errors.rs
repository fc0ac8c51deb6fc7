use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::report::ReportError;
use crate::session::AuthError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Authentication is not configured")]
    AuthDisabled,

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::AuthDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AUTH_DISABLED",
                self.to_string(),
            ),
            AppError::Analysis(e) => {
                tracing::error!("Analysis error: {e:?}");
                let (status, code) = match e {
                    AnalysisError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "ANALYSIS_TIMEOUT"),
                    AnalysisError::Connection(_) => (StatusCode::BAD_GATEWAY, "ANALYSIS_UNREACHABLE"),
                    AnalysisError::Server { .. } => (StatusCode::BAD_GATEWAY, "ANALYSIS_SERVER_ERROR"),
                    AnalysisError::Format => (StatusCode::BAD_GATEWAY, "ANALYSIS_FORMAT_ERROR"),
                    AnalysisError::Http(_) => (StatusCode::BAD_GATEWAY, "ANALYSIS_ERROR"),
                };
                (status, code, e.to_string())
            }
            AppError::Auth(e) => match e {
                AuthError::WeakPassword => (StatusCode::BAD_REQUEST, "WEAK_PASSWORD", e.to_string()),
                AuthError::EmailAlreadyInUse => (StatusCode::CONFLICT, "EMAIL_IN_USE", e.to_string()),
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", e.to_string())
                }
                AuthError::Provider(_) | AuthError::Http(_) => {
                    tracing::error!("Identity provider error: {e:?}");
                    (
                        StatusCode::BAD_GATEWAY,
                        "AUTH_PROVIDER_ERROR",
                        "The identity provider could not complete the request".to_string(),
                    )
                }
            },
            AppError::Report(e) => {
                tracing::error!("Report error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPORT_ERROR",
                    "The report could not be generated".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
