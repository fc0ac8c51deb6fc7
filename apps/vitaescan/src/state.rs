use crate::analysis::AnalysisWorkflow;
use crate::config::Config;
use crate::session::SessionContext;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub workflow: AnalysisWorkflow,
    /// `None` when no identity provider is configured.
    pub session: Option<SessionContext>,
}
