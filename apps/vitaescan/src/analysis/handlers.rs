use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Extension, Json,
};
use serde::Serialize;
use tracing::info;

use crate::analysis::intake::{FileIntake, PendingFile};
use crate::analysis::ranking::{rank_candidates, RankedCandidate};
use crate::analysis::workflow::AnalysisOutcome;
use crate::errors::AppError;
use crate::session::Session;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub outcome: AnalysisOutcome,
    pub ranking: Vec<RankedCandidate>,
}

#[derive(Serialize)]
pub struct AnalysisStatus {
    pub analyzing: bool,
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {e}"))
}

/// POST /api/v1/analyze
///
/// Multipart body: one `job_description` text part and any number of
/// `files` parts. Non-PDF parts reject the whole submission; repeated
/// filenames are kept once.
pub async fn handle_analyze(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut job_description = String::new();
    let mut incoming = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().unwrap_or_default().to_string();

        match name.as_str() {
            "job_description" => {
                job_description = field.text().await.map_err(multipart_error)?;
            }
            "files" => {
                let bytes = field.bytes().await.map_err(multipart_error)?;
                let file_name = file_name.unwrap_or_else(|| format!("cv_{}.pdf", incoming.len() + 1));
                incoming.push(PendingFile::new(file_name, content_type, bytes));
            }
            _ => {}
        }
    }

    let mut intake = FileIntake::new();
    let report = intake.add(incoming);
    if let Some(message) = report.rejection_message() {
        return Err(AppError::Validation(message));
    }
    info!(
        user_id = session.as_ref().map(|Extension(s)| s.user_id.as_str()).unwrap_or("anonymous"),
        files = intake.files().len(),
        "Analysis requested"
    );
    if report.duplicates > 0 {
        info!(duplicates = report.duplicates, "Skipped repeated résumé filenames");
    }

    let outcome = state
        .workflow
        .analyze(&job_description, intake.files())
        .await?;
    let ranking = rank_candidates(&outcome.results);

    Ok(Json(AnalyzeResponse { outcome, ranking }))
}

/// GET /api/v1/analyze/status
pub async fn handle_analysis_status(State(state): State<AppState>) -> Json<AnalysisStatus> {
    Json(AnalysisStatus {
        analyzing: state.workflow.is_analyzing(),
    })
}
