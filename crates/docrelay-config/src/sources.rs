// Configuration source loading
//
// Priority order:
// 1. Environment variables (DOCRELAY_* prefix, then legacy names)
// 2. Config file path from DOCRELAY_CONFIG
// 3. Inline config content from DOCRELAY_CONFIG_CONTENT
// 4. Default config files (./config.toml, ./.docrelay.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use tracing::info;

/// Load configuration using native environment/file access.
pub fn load_config() -> Result<RuntimeConfig> {
    let config = load_from_file()?.unwrap_or_default();
    finish(config, &StdEnvSource)
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let config = read_toml(path.as_ref())?;
    finish(config, &StdEnvSource)
}

fn finish<E: EnvSource>(mut config: RuntimeConfig, env: &E) -> Result<RuntimeConfig> {
    env_overrides::apply_env_overrides(&mut config, env)?;
    config.settle_erp();
    config.validate()?;
    Ok(config)
}

fn load_from_file() -> Result<Option<RuntimeConfig>> {
    if let Ok(path) = env::var(format!("{}CONFIG", ENV_PREFIX)) {
        return read_toml(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var(format!("{}CONFIG_CONTENT", ENV_PREFIX)) {
        let config = RuntimeConfig::from_toml_str(&content)
            .context("Failed to parse inline config from DOCRELAY_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in &["./config.toml", "./.docrelay.toml"] {
        let path = Path::new(path);
        if path.exists() {
            return read_toml(path).map(Some);
        }
    }

    info!("No config file found, using defaults");
    Ok(None)
}

fn read_toml(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = RuntimeConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}
