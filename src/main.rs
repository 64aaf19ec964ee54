//! Weather Gateway (v1)
//!
//! A small JSON gateway in front of a weather provider, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                   WEATHER GATEWAY                     │
//!                      │                                                       │
//!   Client Request     │  ┌──────────┐   ┌───────────┐   ┌──────────────┐     │
//!   ───────────────────┼─▶│   http   │──▶│ security  │──▶│   handlers   │     │
//!                      │  │ req id / │   │ rate limit│   │  validation  │     │
//!                      │  │ access   │   │ + headers │   └──────┬───────┘     │
//!                      │  └──────────┘   └───────────┘          │             │
//!                      │                                        ▼             │
//!                      │                 ┌───────────┐   ┌──────────────┐     │
//!                      │                 │  weather  │◀──│   weather    │     │
//!                      │                 │   cache   │   │    client    │     │
//!                      │                 └───────────┘   └──────┬───────┘     │
//!                      │                                        │             │
//!                      │  ┌──────────────────────────────┐      ▼             │
//!                      │  │ resilience                   │  guarded call ─────┼──▶ Provider
//!                      │  │ estimator: timeout ⇄ samples │◀─────┘             │
//!                      │  └──────────────────────────────┘                    │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use weather_gateway::config::load_config;
use weather_gateway::lifecycle::{signals, Shutdown};
use weather_gateway::observability::{logging, metrics};
use weather_gateway::{HttpServer, TimeoutEstimator};

#[derive(Parser)]
#[command(name = "weather-gateway")]
#[command(about = "Weather API gateway with adaptive upstream timeouts", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Environment variables override it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("weather-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    if config.upstream.api_key.is_empty() {
        tracing::warn!("API_KEY is not set; /get_weather will answer 500 until it is configured");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        min_timeout_secs = config.estimator.min_timeout_secs,
        max_timeout_secs = config.estimator.max_timeout_secs,
        default_timeout_secs = config.estimator.default_timeout_secs,
        idle_reset_secs = config.estimator.idle_reset_secs,
        rate_limit_enabled = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // One estimator for the whole process, injected wherever upstream calls are made.
    let estimator = Arc::new(TimeoutEstimator::new(config.estimator.clone()));
    metrics::record_estimator(&estimator.snapshot());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, estimator)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::trigger_on_signal(shutdown);

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
