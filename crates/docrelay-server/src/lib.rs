// Server mode - document relay HTTP server
//
// Features:
// - Axum HTTP server (HTTP/1.1, HTTP/2)
// - Upload relay to the automation webhook
// - Result ingestion into a bounded in-memory store
// - Optional ERP forwarding
// - Structured logging with tracing
// - Graceful shutdown

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use docrelay_config::RuntimeConfig;
use docrelay_core::ApiResponse;
use docrelay_erp::ErpService;
use docrelay_store::ResultStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

mod handlers;
mod init;
pub mod relay;

pub use init::{init_state, init_tracing};
use relay::WebhookRelay;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub store: ResultStore,
    pub relay: Arc<WebhookRelay>,
    /// Present only when ERP forwarding is enabled in the configuration
    pub erp: Option<Arc<ErpService>>,
    pub static_dir: PathBuf,
    pub max_body_bytes: usize,
}

/// Error type that implements IntoResponse
pub(crate) struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request error: {:?}", self.error);
        } else {
            warn!("Rejected request: {}", self.error);
        }
        (
            self.status,
            Json(ApiResponse::<()>::error(self.error.to_string())),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.into(),
        }
    }
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }
}

/// Build the HTTP router for the given state
pub fn build_router(state: AppState) -> Router {
    let index = ServeFile::new(state.static_dir.join("index.html"));
    let assets = ServeDir::new(&state.static_dir);
    let max_body_bytes = state.max_body_bytes;

    Router::new()
        .route_service("/", index)
        .nest_service("/static", assets)
        .route("/upload", post(handlers::upload))
        .route("/webhook", post(handlers::webhook))
        .route("/webhook-test", post(handlers::webhook))
        .route("/results", get(handlers::results))
        .route("/health", get(handlers::health_check))
        .route("/erp/status", get(handlers::erp_status))
        .route("/erp/send", post(handlers::erp_send))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

/// Entry point for server mode (loads config automatically)
pub async fn run() -> Result<()> {
    let config = RuntimeConfig::load().context("Failed to load configuration")?;
    run_with_config(config).await
}

/// Entry point for server mode with pre-loaded configuration (for CLI usage)
pub async fn run_with_config(config: RuntimeConfig) -> Result<()> {
    init_tracing(&config);

    let addr = config.server.listen_addr.clone();
    let state = init_state(&config).await?;
    info!(
        max_results = state.store.capacity(),
        max_body_bytes = state.max_body_bytes,
        static_dir = %state.static_dir.display(),
        "Result store ready"
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;

    info!("docrelay listening on http://{}", addr);
    info!("Routes:");
    info!("  GET  http://{}/             - Upload page", addr);
    info!("  POST http://{}/upload       - Document upload relay", addr);
    info!("  POST http://{}/webhook      - Processing result callback", addr);
    info!("  GET  http://{}/results      - Recent results", addr);
    info!("  GET  http://{}/health       - Health check", addr);
    info!("  GET  http://{}/erp/status   - ERP integration status", addr);
    info!("  POST http://{}/erp/send     - Manual ERP send", addr);
    info!("Press Ctrl+C or send SIGTERM to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");

    Ok(())
}
