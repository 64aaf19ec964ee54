//! Gateway error taxonomy and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to gateway clients.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Neither a valid city nor valid coordinates were supplied.
    #[error("Provide a valid city name or valid coordinates.")]
    InvalidQuery,

    /// The provider API key is not configured.
    #[error("Service misconfigured (missing API key).")]
    MissingApiKey,

    /// Provider answered 404.
    #[error("City not found.")]
    CityNotFound,

    /// Provider rejected our credentials (401).
    #[error("Server-side configuration error.")]
    UpstreamUnauthorized,

    /// Provider is throttling us (429).
    #[error("Weather service temporarily overloaded. Try again.")]
    UpstreamBusy,

    /// Provider answered with a server error or another unexpected status.
    #[error("Weather service unavailable (provider error {0}).")]
    UpstreamUnavailable(u16),

    /// No response within the adaptive deadline.
    #[error("The weather service is taking too long to respond.")]
    UpstreamTimeout,

    /// Connection-level failure before any response.
    #[error("Could not connect to the weather service.")]
    UpstreamConnection,

    /// Provider body could not be decoded.
    #[error("Invalid response from the weather service.")]
    InvalidUpstreamResponse,

    /// Provider body decoded but lacks required fields.
    #[error("Unexpected response from the weather service.")]
    UnexpectedUpstreamResponse,

    /// Client exceeded its request budget.
    #[error("Rate limit exceeded.")]
    RateLimited,
}

impl GatewayError {
    /// HTTP status returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidQuery => StatusCode::BAD_REQUEST,
            GatewayError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::CityNotFound => StatusCode::NOT_FOUND,
            GatewayError::UpstreamBusy => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::UpstreamUnauthorized
            | GatewayError::UpstreamUnavailable(_)
            | GatewayError::UpstreamConnection
            | GatewayError::InvalidUpstreamResponse
            | GatewayError::UnexpectedUpstreamResponse => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
