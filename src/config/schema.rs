//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the weather gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, inbound deadline).
    pub listener: ListenerConfig,

    /// Upstream weather provider.
    pub upstream: UpstreamConfig,

    /// Adaptive timeout estimator.
    pub estimator: EstimatorConfig,

    /// Response cache.
    pub cache: CacheConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Response hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Hard deadline for a whole inbound request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Upstream weather provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Provider API key. Usually injected through the `API_KEY` environment variable.
    pub api_key: String,

    /// Current weather endpoint.
    pub weather_url: String,

    /// Direct geocoding endpoint used by autocomplete.
    pub geocoding_url: String,

    /// Language of weather descriptions.
    pub language: String,

    /// TCP connect timeout in seconds. The read deadline comes from the estimator.
    pub connect_timeout_secs: f64,

    /// Fixed deadline for autocomplete lookups in seconds.
    pub autocomplete_timeout_secs: f64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            weather_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            geocoding_url: "https://api.openweathermap.org/geo/1.0/direct".to_string(),
            language: "fr".to_string(),
            connect_timeout_secs: 3.0,
            autocomplete_timeout_secs: 2.0,
        }
    }
}

/// Adaptive timeout estimator configuration.
///
/// Fixed once the estimator is built.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Floor for any computed timeout, in seconds.
    pub min_timeout_secs: f64,

    /// Ceiling for any computed timeout, in seconds.
    pub max_timeout_secs: f64,

    /// Initial smoothed latency, in seconds.
    pub default_timeout_secs: f64,

    /// Idle time after which learned variance is considered stale.
    pub idle_reset_secs: u64,

    /// Weight of a new sample in the smoothed mean.
    pub alpha: f64,

    /// Weight of a new deviation in the smoothed variance.
    pub beta: f64,

    /// Timeout multiplier applied when a call gets no response.
    pub failure_multiplier: f64,

    /// Variance added when a call gets no response, in seconds.
    pub failure_variance_penalty_secs: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_timeout_secs: 1.0,
            max_timeout_secs: 10.0,
            default_timeout_secs: 3.0,
            idle_reset_secs: 600,
            alpha: 0.125,
            beta: 0.25,
            failure_multiplier: 2.0,
            failure_variance_penalty_secs: 0.5,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time to live of a cached weather report, in seconds.
    pub ttl_secs: u64,

    /// Maximum number of cached reports.
    pub max_items: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 120,
            max_items: 600,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests per minute per client on every route.
    pub default_per_minute: u32,

    /// Requests per minute per client on `/get_weather`.
    pub weather_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_per_minute: 120,
            weather_per_minute: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add security headers to every response.
    pub enable_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
        }
    }
}
