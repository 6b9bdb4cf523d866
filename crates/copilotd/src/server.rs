//! HTTP server for copilotd

use anyhow::Result;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::CopilotConfig;
use crate::orchestrator::Orchestrator;
use crate::rag::RagService;
use crate::routes;

/// Application state shared across handlers
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub rag: Arc<RagService>,
    pub data_dir: PathBuf,
    pub block_sensitive: bool,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, rag: Arc<RagService>, config: &CopilotConfig) -> Self {
        Self {
            orchestrator,
            rag,
            data_dir: config.retrieval.data_dir.clone(),
            block_sensitive: config.policy.block_sensitive,
            start_time: Instant::now(),
        }
    }
}

/// All routes with tracing and a whole-request timeout
pub fn app(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::knowledge_routes())
        .merge(routes::ask_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server
pub async fn run(state: AppState, config: &CopilotConfig) -> Result<()> {
    let app = app(
        Arc::new(state),
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down gracefully");
        })
        .await?;
    Ok(())
}
