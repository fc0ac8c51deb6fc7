// Résumé intake, the remote analysis call and the ranked view of its results.

pub mod client;
pub mod handlers;
pub mod intake;
pub mod ranking;
pub mod workflow;

pub use client::{AnalysisClient, AnalysisError};
pub use workflow::AnalysisWorkflow;
