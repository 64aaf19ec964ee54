//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without validating it.
pub fn read_config_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply the deployment environment variables on top of `config`.
///
/// `lookup` returns the raw value of a variable, if set.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup("API_KEY") {
        config.upstream.api_key = key;
    }
    if let Some(port) = parse_var::<u16, _>(&lookup, "PORT")? {
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level.to_lowercase();
    }
    if let Some(secs) = parse_var(&lookup, "CONNECT_TIMEOUT_S")? {
        config.upstream.connect_timeout_secs = secs;
    }
    if let Some(ttl) = parse_var(&lookup, "CACHE_TTL_S")? {
        config.cache.ttl_secs = ttl;
    }
    if let Some(max) = parse_var(&lookup, "CACHE_MAX_ITEMS")? {
        config.cache.max_items = max;
    }
    if let Some(enabled) = parse_flag(&lookup, "RATE_LIMIT_ENABLED")? {
        config.rate_limit.enabled = enabled;
    }
    if let Some(limit) = parse_var(&lookup, "RATE_LIMIT_DEFAULT")? {
        config.rate_limit.default_per_minute = limit;
    }
    if let Some(limit) = parse_var(&lookup, "RATE_LIMIT_GET_WEATHER")? {
        config.rate_limit.weather_per_minute = limit;
    }
    if let Some(enabled) = parse_flag(&lookup, "ADD_SECURITY_HEADERS")? {
        config.security.enable_headers = enabled;
    }
    Ok(())
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
    }
}

fn parse_flag<F>(lookup: &F, var: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Env { var, value }),
        },
    }
}
