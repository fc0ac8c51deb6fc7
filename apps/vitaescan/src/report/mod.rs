// Candidate comparison report: layout, pagination and PDF output.
// Rendering is CPU-bound; handlers run it inside tokio::task::spawn_blocking.

pub mod canvas;
pub mod filename;
pub mod font_metrics;
pub mod generator;
pub mod handlers;
pub mod pdf;
#[cfg(test)]
pub mod recording;
pub mod sink;
pub mod table;

use thiserror::Error;

pub use generator::generate_report;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF serialization failed: {0}")]
    Serialize(String),
}
