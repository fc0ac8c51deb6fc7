/// Analysis Client — the single point of entry for calls to the remote analysis API.
///
/// One multipart POST per batch: a `job_description` text part plus one `files`
/// part per résumé. No retries; the caller decides what to do with a failure.
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::intake::{PendingFile, PDF_MIME};
use crate::models::candidate::CandidateResult;

pub const DEFAULT_ANALYSIS_URL: &str = "https://vitaescan-backend.onrender.com/analyze";
/// Analysis of a large batch can take minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Error de conexión: el servicio de análisis no responde.")]
    Connection(#[source] reqwest::Error),

    #[error("El análisis superó el tiempo de espera de {secs} segundos.")]
    Timeout { secs: u64 },

    #[error("Error del Servidor: {}", server_detail(.status, .detail))]
    Server { status: u16, detail: Option<String> },

    #[error("El formato de respuesta de la IA no es válido.")]
    Format,

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),
}

fn server_detail(status: &u16, detail: &Option<String>) -> String {
    detail
        .clone()
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    results: Option<Vec<CandidateResult>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl AnalysisClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submits the batch and returns the per-résumé results in service order.
    pub async fn analyze(
        &self,
        job_description: &str,
        files: &[PendingFile],
    ) -> Result<Vec<CandidateResult>, AnalysisError> {
        let mut form = Form::new().text("job_description", job_description.to_string());
        for file in files {
            let part = Part::bytes(file.bytes.to_vec())
                .file_name(file.name.clone())
                .mime_str(PDF_MIME)
                .map_err(AnalysisError::Http)?;
            form = form.part("files", part);
        }

        info!(
            files = files.len(),
            endpoint = %self.endpoint,
            "Submitting résumés for analysis"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = extract_detail(&body);
            warn!(status = status.as_u16(), detail = ?detail, "Analysis service returned an error");
            return Err(AnalysisError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let results = parse_results(&body)?;
        debug!(results = results.len(), "Analysis response parsed");
        Ok(results)
    }

    fn classify(&self, error: reqwest::Error) -> AnalysisError {
        if error.is_timeout() {
            AnalysisError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else if error.is_connect() {
            AnalysisError::Connection(error)
        } else {
            AnalysisError::Http(error)
        }
    }
}

/// A body without a `results` array is a format error, whatever else it holds.
fn parse_results(body: &str) -> Result<Vec<CandidateResult>, AnalysisError> {
    let parsed: AnalyzeResponse = serde_json::from_str(body).map_err(|e| {
        warn!("Analysis response is not valid JSON: {e}");
        AnalysisError::Format
    })?;
    parsed.results.ok_or(AnalysisError::Format)
}

/// Pulls the human-readable `detail` out of an error body. String details are
/// returned verbatim; structured ones (validation lists) as compact JSON.
fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
