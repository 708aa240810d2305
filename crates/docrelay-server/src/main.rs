use anyhow::{Context, Result};
use clap::Parser;
use docrelay_config::RuntimeConfig;
use std::path::PathBuf;

/// Relay document uploads to an automation webhook and collect the results
#[derive(Parser)]
#[command(name = "docrelay")]
#[command(version)]
#[command(about = "Relay document uploads to an automation webhook and collect the results", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP listen port (overrides config file)
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Directory holding index.html and static assets
    #[arg(short, long, value_name = "DIR")]
    static_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load().context("Failed to load configuration")?
    };

    // CLI flags have the highest priority
    apply_cli_overrides(&mut config, &cli);
    config.validate().context("Invalid configuration")?;

    // run_with_config also calls init_tracing, which is idempotent
    docrelay_server::init_tracing(&config);
    display_startup_info(&config);

    docrelay_server::run_with_config(config).await
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(port) = cli.port {
        config.server.listen_addr = format!("0.0.0.0:{}", port);
    }

    if let Some(level) = &cli.log_level {
        config.server.log_level = level.clone();
    }

    if let Some(dir) = &cli.static_dir {
        config.server.static_dir = dir.to_string_lossy().to_string();
    }
}

fn display_startup_info(config: &RuntimeConfig) {
    use tracing::info;

    info!("╭─────────────────────────────────────────────────");
    info!("│ docrelay v{}", env!("CARGO_PKG_VERSION"));
    info!("├─────────────────────────────────────────────────");
    info!("│ Listen address: http://{}", config.server.listen_addr);
    info!("│ Webhook: {}", config.relay.webhook_url);
    info!("│ Max file size: {} MB", config.relay.max_file_size_mb);
    info!("│ Stored results: {}", config.store.max_results);
    info!("│ Static files: {}", config.server.static_dir);
    info!("│ Log level: {}", config.server.log_level);
    info!(
        "│ ERP integration: {}",
        if config.erp.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    if config.erp.enabled {
        info!("│   - Base URL: {}", config.erp.base_url);
        info!("│   - Auto-send: {}", config.erp.auto_send);
        info!("│   - Mapped document types: {}", config.erp.mapping.len());
    }

    info!("╰─────────────────────────────────────────────────");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_take_priority() {
        let cli = Cli::parse_from(["docrelay", "--port", "9090", "-v", "debug", "--static-dir", "/srv/ui"]);
        let mut config = RuntimeConfig::default();
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.server.listen_addr, "0.0.0.0:9090");
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.static_dir, "/srv/ui");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::parse_from(["docrelay"]);
        let mut config = RuntimeConfig::default();
        apply_cli_overrides(&mut config, &cli);
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
    }
}
