pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::report::handlers as report;
use crate::session::{handlers as session, require_session};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let mut protected = Router::new()
        .route(
            "/api/v1/analyze",
            post(analysis::handle_analyze)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes())),
        )
        .route("/api/v1/analyze/status", get(analysis::handle_analysis_status))
        .route("/api/v1/reports", post(report::handle_generate_report));

    if state.session.is_some() {
        protected =
            protected.route_layer(middleware::from_fn_with_state(state.clone(), require_session));
    }

    Router::new()
        .route("/health", get(health::health_handler))
        // Session API
        .route("/api/v1/auth/signup", post(session::handle_sign_up))
        .route("/api/v1/auth/login", post(session::handle_sign_in))
        .route("/api/v1/auth/logout", post(session::handle_sign_out))
        .route("/api/v1/auth/session", get(session::handle_current_session))
        .merge(protected)
        .with_state(state)
}
