//! Upstream weather provider client.
//!
//! # Responsibilities
//! - Issue current-weather lookups under the adaptive deadline
//! - Map provider status codes to gateway errors
//! - Serve autocomplete suggestions from the geocoding endpoint
//!
//! # Design Decisions
//! - Only the header stage is guarded: any status received is a network success
//!   for the estimator, even 401 or 503
//! - Autocomplete uses a fixed short deadline and degrades to an empty list
//! - One attempt per client request, never retried

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use crate::config::UpstreamConfig;
use crate::error::GatewayError;
use crate::resilience::estimator::TimeoutEstimator;
use crate::resilience::timeouts::{guarded, CallError};
use crate::weather::types::{GeocodingEntry, ProviderWeather, Suggestion, WeatherQuery, WeatherReport};

const AUTOCOMPLETE_LIMIT: &str = "5";
const AUTOCOMPLETE_MIN_CHARS: usize = 2;

/// Client for the weather provider, sharing the process-wide estimator.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    config: UpstreamConfig,
    estimator: Arc<TimeoutEstimator>,
}

impl WeatherClient {
    /// Build the client. The connect timeout is fixed; the read deadline is adaptive.
    pub fn new(config: UpstreamConfig, estimator: Arc<TimeoutEstimator>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs_f64(config.connect_timeout_secs))
            .user_agent(concat!("weather-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config,
            estimator,
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    /// Current weather for `query`.
    pub async fn current(&self, query: &WeatherQuery) -> Result<WeatherReport, GatewayError> {
        if !self.has_api_key() {
            return Err(GatewayError::MissingApiKey);
        }

        let request = self
            .http
            .get(&self.config.weather_url)
            .query(&[
                ("appid", self.config.api_key.as_str()),
                ("units", "metric"),
                ("lang", self.config.language.as_str()),
            ])
            .query(&query.location_params());

        let response = match guarded(&*self.estimator, request.send()).await {
            Ok(response) => response,
            Err(CallError::TimedOut(deadline)) => {
                tracing::warn!(
                    deadline_ms = deadline.as_millis() as u64,
                    "Weather provider did not answer in time"
                );
                return Err(GatewayError::UpstreamTimeout);
            }
            Err(CallError::Transport(e)) => {
                tracing::error!(error = %e, "Weather provider connection error");
                return Err(GatewayError::UpstreamConnection);
            }
        };

        match response.status() {
            StatusCode::NOT_FOUND => return Err(GatewayError::CityNotFound),
            StatusCode::UNAUTHORIZED => {
                tracing::error!("Weather provider rejected the API key");
                return Err(GatewayError::UpstreamUnauthorized);
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(GatewayError::UpstreamBusy),
            status if !status.is_success() => {
                tracing::warn!(status = status.as_u16(), "Weather provider error");
                return Err(GatewayError::UpstreamUnavailable(status.as_u16()));
            }
            _ => {}
        }

        let payload: ProviderWeather = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Weather provider sent an undecodable body");
            GatewayError::InvalidUpstreamResponse
        })?;

        let report = WeatherReport::from(payload);
        if !report.is_complete() {
            tracing::warn!(city = %report.city, "Weather provider response lacks city or temperature");
            return Err(GatewayError::UnexpectedUpstreamResponse);
        }

        Ok(report)
    }

    /// Up to five place suggestions for a partial name. Failures yield no suggestions.
    pub async fn autocomplete(&self, query: &str) -> Vec<Suggestion> {
        let query = query.trim();
        if query.chars().count() < AUTOCOMPLETE_MIN_CHARS {
            return Vec::new();
        }

        match self.fetch_suggestions(query).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(error = %e, "Autocomplete lookup failed");
                Vec::new()
            }
        }
    }

    async fn fetch_suggestions(&self, query: &str) -> Result<Vec<Suggestion>, reqwest::Error> {
        let entries: Vec<GeocodingEntry> = self
            .http
            .get(&self.config.geocoding_url)
            .query(&[
                ("q", query),
                ("limit", AUTOCOMPLETE_LIMIT),
                ("appid", self.config.api_key.as_str()),
            ])
            .timeout(Duration::from_secs_f64(self.config.autocomplete_timeout_secs))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(entries.into_iter().map(Suggestion::from).collect())
    }
}
