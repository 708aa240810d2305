// docrelay-config - Runtime configuration for the relay server
//
// Supports configuration from multiple sources:
// 1. CLI flags (applied by the binary, highest priority)
// 2. Environment variables (DOCRELAY_* prefix, then legacy unprefixed names)
// 3. Config file path from DOCRELAY_CONFIG env var
// 4. Config file contents from DOCRELAY_CONFIG_CONTENT env var
// 5. Default config file locations (./config.toml, ./.docrelay.toml)
// 6. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvError, EnvSource, ENV_PREFIX};

/// Main runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub relay: RelayConfig,
    pub erp: ErpConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Directory holding index.html and the UI assets
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            static_dir: "static".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = std::convert::Infallible;

    /// Anything other than `json` selects the human-readable format.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        })
    }
}

/// Result history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub max_results: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { max_results: 20 }
    }
}

/// Upload relay to the automation webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub webhook_url: String,
    pub max_file_size_mb: usize,
    pub timeout_secs: u64,
    /// Forwarded to the workflow as the `executionMode` form field
    pub execution_mode: String,
}

impl RelayConfig {
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:5678/webhook/document-ai".to_string(),
            max_file_size_mb: 50,
            timeout_secs: 30,
            execution_mode: "production".to_string(),
        }
    }
}

/// ERP forwarding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ErpConfig {
    pub enabled: bool,
    pub auto_send: bool,
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
    /// Field mapping per document type
    pub mapping: HashMap<String, DocumentTypeMapping>,
}

impl ErpConfig {
    pub fn has_credentials(&self) -> bool {
        !self.base_url.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            auto_send: false,
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 30,
            mapping: HashMap::new(),
        }
    }
}

/// How one document type lands in the ERP system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentTypeMapping {
    pub target_object: String,
    /// source field -> ERP field
    pub fields: HashMap<String, String>,
}

impl RuntimeConfig {
    /// Load configuration from the default sources (file discovery + env).
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration with an explicit file path (CLI --config flag).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Parse a TOML document on top of the built-in defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Turn off ERP forwarding when credentials are missing.
    pub(crate) fn settle_erp(&mut self) {
        if self.erp.enabled && !self.erp.has_credentials() {
            tracing::warn!("ERP integration enabled without base_url/username/password, disabling");
            self.erp.enabled = false;
        }
    }
}
