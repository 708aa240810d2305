// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

/// Upper bound for `store.max_results`
pub const MAX_STORED_RESULTS: usize = 100_000;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_server_config(&config.server)?;
    validate_store_config(&config.store)?;
    validate_relay_config(&config.relay)?;
    validate_erp_config(&config.erp)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.listen_addr.is_empty() {
        bail!("server.listen_addr must not be empty");
    }

    // Basic validation that it looks like an address
    if !config.listen_addr.contains(':') {
        bail!("server.listen_addr must be in format 'host:port'");
    }

    if config.static_dir.is_empty() {
        bail!("server.static_dir must not be empty");
    }

    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<()> {
    if config.max_results == 0 {
        bail!("store.max_results must be greater than 0");
    }

    if config.max_results > MAX_STORED_RESULTS {
        bail!(
            "store.max_results must be at most {}, got {}",
            MAX_STORED_RESULTS,
            config.max_results
        );
    }

    if config.max_results > 10_000 {
        warn!(
            max_results = config.max_results,
            "store.max_results is very large; every /results call copies the whole history"
        );
    }

    Ok(())
}

fn validate_relay_config(config: &RelayConfig) -> Result<()> {
    if !is_http_url(&config.webhook_url) {
        bail!("relay.webhook_url must start with http:// or https://");
    }

    if config.max_file_size_mb == 0 {
        bail!("relay.max_file_size_mb must be greater than 0");
    }

    if config.timeout_secs == 0 {
        bail!("relay.timeout_secs must be greater than 0");
    }

    if config.max_file_size_mb > 1024 {
        // Uploads are buffered in memory before relaying
        warn!(
            max_file_size_mb = config.max_file_size_mb,
            "relay.max_file_size_mb is very large; may cause memory issues"
        );
    }

    Ok(())
}

fn validate_erp_config(config: &ErpConfig) -> Result<()> {
    if config.timeout_secs == 0 {
        bail!("erp.timeout_secs must be greater than 0");
    }

    if config.enabled && !is_http_url(&config.base_url) {
        bail!("erp.base_url must start with http:// or https://");
    }

    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
