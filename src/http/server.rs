//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, access log, security headers, rate limits, deadline)
//! - Build the upstream client around the shared estimator
//! - Bind server to listener and shut down gracefully

use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::http::request::{access_log_middleware, ShortRequestId};
use crate::resilience::estimator::TimeoutEstimator;
use crate::security::{rate_limit_middleware, security_headers_middleware, RateLimiter};
use crate::weather::{ResponseCache, WeatherClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub weather: Arc<WeatherClient>,
    pub cache: Arc<ResponseCache>,
    pub estimator: Arc<TimeoutEstimator>,
    pub started_at: Instant,
}

/// HTTP server for the weather gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server around the process-wide estimator.
    pub fn new(config: GatewayConfig, estimator: Arc<TimeoutEstimator>) -> Result<Self, reqwest::Error> {
        let weather = Arc::new(WeatherClient::new(config.upstream.clone(), estimator.clone())?);
        let cache = Arc::new(ResponseCache::new(&config.cache));

        let state = AppState {
            weather,
            cache,
            estimator,
            started_at: Instant::now(),
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut weather_route = get(handlers::get_weather);
        if config.rate_limit.enabled {
            let limiter = Arc::new(RateLimiter::per_minute(
                "get_weather",
                config.rate_limit.weather_per_minute,
            ));
            weather_route =
                weather_route.route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        }

        let mut router = Router::new()
            .route("/health", get(handlers::health))
            .route("/stats", get(handlers::stats))
            .route("/get_weather", weather_route)
            .route("/autocomplete", get(handlers::autocomplete))
            .with_state(state);

        if config.rate_limit.enabled {
            let limiter = Arc::new(RateLimiter::per_minute(
                "default",
                config.rate_limit.default_per_minute,
            ));
            router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        }
        if config.security.enable_headers {
            router = router.layer(middleware::from_fn(security_headers_middleware));
        }

        router
            .layer(middleware::from_fn(access_log_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(ShortRequestId))
            .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs)))
    }

    /// Run the server until a shutdown signal is received.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            api_key_configured = self.state.weather.has_api_key(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Shared handler state (estimator, cache, upstream client).
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
