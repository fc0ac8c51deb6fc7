use anyhow::anyhow;
use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;

use crate::errors::AppError;
use crate::models::candidate::ReportRequest;
use crate::report::generate_report;
use crate::report::sink::DownloadSink;

/// POST /api/v1/reports
///
/// Renders the comparison report for `req` and returns it as a PDF attachment.
pub async fn handle_generate_report(Json(req): Json<ReportRequest>) -> Result<Response, AppError> {
    let generated_on = Local::now().date_naive();

    let saved = tokio::task::spawn_blocking(move || {
        let mut sink = DownloadSink::new();
        generate_report(&req, generated_on, &mut sink)?;
        Ok::<_, AppError>(sink.into_saved())
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("report task failed: {e}")))??
    .ok_or_else(|| AppError::Internal(anyhow!("report was not saved")))?;

    let disposition = format!("attachment; filename=\"{}\"", saved.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        saved.bytes,
    )
        .into_response())
}
