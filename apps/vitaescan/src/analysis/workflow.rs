//! Analysis Workflow — validates a submission, runs it and tracks the
//! "analyzing" indicator.
//!
//! Flow: validate description → validate file list → mark in flight →
//!       client.analyze → derive job title → clear in-flight mark.
//!
//! The in-flight mark is an RAII guard, so every exit path (success,
//! transport error, server error, bad response) clears it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::client::AnalysisClient;
use crate::analysis::intake::PendingFile;
use crate::errors::AppError;
use crate::models::candidate::CandidateResult;

/// Characters of the job description kept for the report title.
pub const JOB_TITLE_MAX_CHARS: usize = 30;

pub const EMPTY_DESCRIPTION_MESSAGE: &str = "Por favor, ingresa una descripción del puesto.";
pub const NO_FILES_MESSAGE: &str = "Por favor, sube al menos un CV.";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub job_title: String,
    pub results: Vec<CandidateResult>,
}

#[derive(Clone)]
pub struct AnalysisWorkflow {
    client: AnalysisClient,
    in_flight: Arc<AtomicUsize>,
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AnalysisWorkflow {
    pub fn new(client: AnalysisClient) -> Self {
        Self {
            client,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// True while at least one analysis request is outstanding.
    pub fn is_analyzing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    fn begin(&self) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(self.in_flight.clone())
    }

    pub async fn analyze(
        &self,
        job_description: &str,
        files: &[PendingFile],
    ) -> Result<AnalysisOutcome, AppError> {
        validate_submission(job_description, files)?;

        let _guard = self.begin();
        let results = self
            .client
            .analyze(job_description, files)
            .await
            .map_err(|e| {
                warn!(error = %e, "Analysis request failed");
                AppError::from(e)
            })?;

        info!(results = results.len(), "Analysis completed");

        Ok(AnalysisOutcome {
            job_title: derive_job_title(job_description),
            results,
        })
    }
}

/// Rejects a blank description or an empty file list before anything is sent.
pub fn validate_submission(job_description: &str, files: &[PendingFile]) -> Result<(), AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(EMPTY_DESCRIPTION_MESSAGE.to_string()));
    }
    if files.is_empty() {
        return Err(AppError::Validation(NO_FILES_MESSAGE.to_string()));
    }
    Ok(())
}

/// First 30 characters of the description as typed, with `...` when cut.
pub fn derive_job_title(job_description: &str) -> String {
    let mut title: String = job_description.chars().take(JOB_TITLE_MAX_CHARS).collect();
    if job_description.chars().count() > JOB_TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}
