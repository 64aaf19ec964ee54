//! Route handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::resilience::estimator::EstimatorSnapshot;
use crate::weather::{Suggestion, WeatherQuery, WeatherReport};

#[derive(Debug, Default, Deserialize)]
pub struct WeatherParams {
    pub city: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AutocompleteParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct GatewayStats {
    pub version: &'static str,
    pub uptime_secs: u64,
    pub cache_entries: usize,
    pub estimator: EstimatorSnapshot,
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// Estimator snapshot and cache size, rounded for humans.
pub async fn stats(State(state): State<AppState>) -> Json<GatewayStats> {
    Json(GatewayStats {
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        cache_entries: state.cache.len(),
        estimator: state.estimator.snapshot().rounded(),
    })
}

pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<WeatherReport>, GatewayError> {
    let query = WeatherQuery::from_params(
        params.city.as_deref(),
        params.lat.as_deref(),
        params.lon.as_deref(),
    )
    .ok_or(GatewayError::InvalidQuery)?;

    if !state.weather.has_api_key() {
        return Err(GatewayError::MissingApiKey);
    }

    let key = query.cache_key();
    if let Some(mut report) = state.cache.get(&key) {
        report.cached = true;
        return Ok(Json(report));
    }

    let report = state.weather.current(&query).await?;
    state.cache.insert(key, report.clone());
    Ok(Json(report))
}

pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Json<Vec<Suggestion>> {
    Json(state.weather.autocomplete(&params.q).await)
}
