//! Engine configuration loader.
//!
//! Reads `flowcheck.toml` and deserializes it into [`EngineConfig`], then
//! applies `FLOWCHECK_*` environment overrides. Falls back to defaults when
//! the file is missing or malformed.

use std::path::Path;

use flowcheck_types::{ConfigError, EngineConfig};

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "flowcheck.toml";

pub const ENV_VERBOSE: &str = "FLOWCHECK_VERBOSE";
pub const ENV_RETRY_TIMEOUT_MS: &str = "FLOWCHECK_RETRY_TIMEOUT_MS";
pub const ENV_RETRY_INTERVAL_MS: &str = "FLOWCHECK_RETRY_INTERVAL_MS";

/// Load engine configuration from `path`, then apply environment overrides.
///
/// - If the file does not exist, starts from [`EngineConfig::default()`].
/// - If the file cannot be read or parsed, logs a warning and starts from the default.
/// - Invalid override values are logged and ignored as a whole.
///
/// The result is not validated; `FlowRunner::new` rejects an unusable retry policy.
pub fn load_engine_config(path: &Path) -> EngineConfig {
    let mut config = read_config_file(path);
    if let Err(err) = apply_env_overrides(&mut config, |key| std::env::var(key).ok()) {
        tracing::warn!("Ignoring environment overrides: {err}");
    }
    config
}

fn read_config_file(path: &Path) -> EngineConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return EngineConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return EngineConfig::default();
        }
    };

    match parse_engine_config(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("{err} ({}), using defaults", path.display());
            EngineConfig::default()
        }
    }
}

/// Parse TOML text into an [`EngineConfig`].
pub fn parse_engine_config(content: &str) -> Result<EngineConfig, ConfigError> {
    toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
}

/// Apply `FLOWCHECK_*` overrides read through `lookup`.
///
/// All present values are parsed before any is applied, so an invalid value
/// leaves `config` untouched.
pub fn apply_env_overrides(
    config: &mut EngineConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let verbose = lookup(ENV_VERBOSE)
        .map(|value| parse_flag(ENV_VERBOSE, &value))
        .transpose()?;
    let timeout_ms = lookup(ENV_RETRY_TIMEOUT_MS)
        .map(|value| parse_millis(ENV_RETRY_TIMEOUT_MS, &value))
        .transpose()?;
    let interval_ms = lookup(ENV_RETRY_INTERVAL_MS)
        .map(|value| parse_millis(ENV_RETRY_INTERVAL_MS, &value))
        .transpose()?;

    if let Some(verbose) = verbose {
        config.verbose = verbose;
    }
    if let Some(timeout_ms) = timeout_ms {
        config.retry.timeout_ms = timeout_ms;
    }
    if let Some(interval_ms) = interval_ms {
        config.retry.interval_ms = interval_ms;
    }
    Ok(())
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid_env(key, value)),
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| invalid_env(key, value))
}

fn invalid_env(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    }
}
