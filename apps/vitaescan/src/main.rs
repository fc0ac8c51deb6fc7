mod analysis;
mod config;
mod errors;
mod models;
mod report;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::{AnalysisClient, AnalysisWorkflow};
use crate::config::Config;
use crate::routes::build_router;
use crate::session::{FirebaseIdentityProvider, SessionContext};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting VitaeScan v{}", env!("CARGO_PKG_VERSION"));

    // Analysis service client
    let client = AnalysisClient::new(
        config.analysis_api_url.clone(),
        Duration::from_secs(config.analysis_timeout_secs),
    )?;
    info!(
        "Analysis client initialized (endpoint: {}, timeout: {}s)",
        client.endpoint(),
        config.analysis_timeout_secs
    );
    let workflow = AnalysisWorkflow::new(client);

    // Identity provider
    let session = match &config.firebase_api_key {
        Some(key) => {
            info!("Firebase identity provider initialized");
            Some(SessionContext::new(Arc::new(FirebaseIdentityProvider::new(
                key.clone(),
            ))))
        }
        None => {
            warn!("FIREBASE_API_KEY not set; analysis and report routes are open");
            None
        }
    };

    let state = AppState {
        config: config.clone(),
        workflow,
        session,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the deployed frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
