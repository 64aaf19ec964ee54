//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bounds ordered, coefficients in range)
//! - Validate addresses and upstream URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }

    check_url(&mut errors, "upstream.weather_url", &config.upstream.weather_url);
    check_url(&mut errors, "upstream.geocoding_url", &config.upstream.geocoding_url);
    check_positive(&mut errors, "upstream.connect_timeout_secs", config.upstream.connect_timeout_secs);
    check_positive(
        &mut errors,
        "upstream.autocomplete_timeout_secs",
        config.upstream.autocomplete_timeout_secs,
    );

    let est = &config.estimator;
    check_positive(&mut errors, "estimator.min_timeout_secs", est.min_timeout_secs);
    check_positive(&mut errors, "estimator.max_timeout_secs", est.max_timeout_secs);
    check_positive(&mut errors, "estimator.default_timeout_secs", est.default_timeout_secs);
    if est.min_timeout_secs > est.max_timeout_secs {
        errors.push(ValidationError::new(
            "estimator.max_timeout_secs",
            format!(
                "must be >= min_timeout_secs ({} < {})",
                est.max_timeout_secs, est.min_timeout_secs
            ),
        ));
    }
    check_unit_interval(&mut errors, "estimator.alpha", est.alpha);
    check_unit_interval(&mut errors, "estimator.beta", est.beta);
    if !(est.failure_multiplier.is_finite() && est.failure_multiplier >= 1.0) {
        errors.push(ValidationError::new("estimator.failure_multiplier", "must be >= 1"));
    }
    if !(est.failure_variance_penalty_secs.is_finite() && est.failure_variance_penalty_secs >= 0.0) {
        errors.push(ValidationError::new(
            "estimator.failure_variance_penalty_secs",
            "must be >= 0",
        ));
    }

    if config.cache.max_items == 0 {
        errors.push(ValidationError::new("cache.max_items", "must be > 0"));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.default_per_minute == 0 {
            errors.push(ValidationError::new("rate_limit.default_per_minute", "must be > 0"));
        }
        if config.rate_limit.weather_per_minute == 0 {
            errors.push(ValidationError::new("rate_limit.weather_per_minute", "must be > 0"));
        }
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("'{}' is not a valid filter", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: f64) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(ValidationError::new(field, format!("must be a positive number, got {value}")));
    }
}

fn check_unit_interval(errors: &mut Vec<ValidationError>, field: &'static str, value: f64) {
    if !(value > 0.0 && value <= 1.0) {
        errors.push(ValidationError::new(field, format!("must be in (0, 1], got {value}")));
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {e}"))),
    }
}
