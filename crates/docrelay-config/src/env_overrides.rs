use super::RuntimeConfig;
use anyhow::Result;

pub const ENV_PREFIX: &str = "DOCRELAY_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    /// Get an environment variable with the DOCRELAY_ prefix applied
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the DOCRELAY_ prefix
    /// Used for the legacy deployment variables (N8N_WEBHOOK_URL, ONEC_*, ...)
    fn get_raw(&self, key: &str) -> Option<String>;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Apply environment-variable overrides to the runtime config.
///
/// Legacy unprefixed names are applied first so DOCRELAY_* values win.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    apply_legacy_overrides(config, env)?;

    // Server configuration (listen addr, log level/format, UI assets)
    if let Some(addr) = env.get("LISTEN_ADDR") {
        config.server.listen_addr = addr;
    }
    if let Some(level) = env.get("LOG_LEVEL") {
        config.server.log_level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.server.log_format = format.parse().unwrap_or(config.server.log_format);
    }
    if let Some(dir) = env.get("STATIC_DIR") {
        config.server.static_dir = dir;
    }

    // Result history
    if let Some(val) = get_env_usize(env, "MAX_RESULTS")? {
        config.store.max_results = val;
    }

    // Upload relay
    if let Some(url) = env.get("WEBHOOK_URL") {
        config.relay.webhook_url = url;
    }
    if let Some(val) = get_env_usize(env, "MAX_FILE_SIZE_MB")? {
        config.relay.max_file_size_mb = val;
    }
    if let Some(val) = get_env_u64(env, "RELAY_TIMEOUT_SECS")? {
        config.relay.timeout_secs = val;
    }

    // ERP forwarding
    if let Some(val) = get_env_bool(env, "ERP_ENABLED")? {
        config.erp.enabled = val;
    }
    if let Some(val) = get_env_bool(env, "ERP_AUTO_SEND")? {
        config.erp.auto_send = val;
    }
    if let Some(url) = env.get("ERP_BASE_URL") {
        config.erp.base_url = url;
    }
    if let Some(user) = env.get("ERP_USERNAME") {
        config.erp.username = user;
    }
    if let Some(password) = env.get("ERP_PASSWORD") {
        config.erp.password = password;
    }
    if let Some(val) = get_env_u64(env, "ERP_TIMEOUT_SECS")? {
        config.erp.timeout_secs = val;
    }

    Ok(())
}

fn apply_legacy_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    if let Some(url) = non_empty(env.get_raw("N8N_WEBHOOK_URL")) {
        config.relay.webhook_url = url;
    }
    if let Some(port) = non_empty(env.get_raw("SERVER_PORT")) {
        let port: u16 = parse_value("SERVER_PORT", port, "a port number")?;
        config.server.listen_addr = format!("0.0.0.0:{}", port);
    }
    if let Some(mb) = non_empty(env.get_raw("MAX_FILE_SIZE_MB")) {
        config.relay.max_file_size_mb = parse_value("MAX_FILE_SIZE_MB", mb, "an integer")?;
    }
    if let Some(max) = non_empty(env.get_raw("MAX_RESPONSES")) {
        config.store.max_results = parse_value("MAX_RESPONSES", max, "an integer")?;
    }
    if let Some(dir) = non_empty(env.get_raw("STATIC_DIR")) {
        config.server.static_dir = dir;
    }

    if let Some(url) = non_empty(env.get_raw("ONEC_BASE_URL")) {
        config.erp.base_url = url;
    }
    if let Some(user) = non_empty(env.get_raw("ONEC_USERNAME")) {
        config.erp.username = user;
    }
    if let Some(password) = non_empty(env.get_raw("ONEC_PASSWORD")) {
        config.erp.password = password;
    }
    if let Some(timeout) = non_empty(env.get_raw("ONEC_TIMEOUT")) {
        config.erp.timeout_secs = parse_value("ONEC_TIMEOUT", timeout, "an integer")?;
    }
    if let Some(enabled) = non_empty(env.get_raw("ONEC_ENABLED")) {
        config.erp.enabled = parse_bool("ONEC_ENABLED", enabled)?;
    }
    if let Some(auto_send) = non_empty(env.get_raw("ONEC_AUTO_SEND")) {
        config.erp.auto_send = parse_bool("ONEC_AUTO_SEND", auto_send)?;
    }

    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    env.get(key)
        .map(|raw| parse_value(&format!("{}{}", ENV_PREFIX, key), raw, "an integer"))
        .transpose()
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    env.get(key)
        .map(|raw| parse_value(&format!("{}{}", ENV_PREFIX, key), raw, "an integer"))
        .transpose()
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    env.get(key)
        .map(|raw| parse_bool(&format!("{}{}", ENV_PREFIX, key), raw))
        .transpose()
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: String, expected: &'static str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        EnvError::InvalidValue {
            key: key.to_string(),
            value: raw,
            expected,
        }
        .into()
    })
}

fn parse_bool(key: &str, raw: String) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "no" | "off" => Ok(false),
        _ => Err(EnvError::InvalidValue {
            key: key.to_string(),
            value: raw,
            expected: "a boolean",
        }
        .into()),
    }
}
