// Initialization utilities for server mode
//
// Logging/tracing setup and the shared application state

use anyhow::{Context, Result};
use docrelay_config::{LogFormat, RuntimeConfig};
use docrelay_erp::ErpService;
use docrelay_store::ResultStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::relay::WebhookRelay;
use crate::AppState;

/// Initialize tracing/logging from RuntimeConfig
pub fn init_tracing(config: &RuntimeConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = match config.server.log_format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
}

/// Build the application state, connecting to the ERP system when enabled
pub async fn init_state(config: &RuntimeConfig) -> Result<AppState> {
    let erp = if config.erp.enabled {
        let service = ErpService::connect(&config.erp).await;
        info!(enabled = service.is_enabled(), "ERP integration initialized");
        Some(service)
    } else {
        None
    };
    AppState::new(config, erp)
}

impl AppState {
    /// State from configuration and an already constructed ERP service
    pub fn new(config: &RuntimeConfig, erp: Option<ErpService>) -> Result<Self> {
        let relay = WebhookRelay::new(&config.relay).context("Failed to build webhook client")?;
        info!(
            webhook_url = %relay.webhook_url(),
            timeout_secs = config.relay.timeout_secs,
            "Upload relay configured"
        );

        Ok(Self {
            store: ResultStore::new(config.store.max_results),
            relay: Arc::new(relay),
            erp: erp.map(Arc::new),
            static_dir: PathBuf::from(&config.server.static_dir),
            max_body_bytes: config.relay.max_file_size_bytes(),
        })
    }
}
