//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by method, path, status
//! - `gateway_request_duration_seconds` (histogram): inbound latency
//! - `gateway_upstream_calls_total` (counter): guarded calls by outcome
//! - `gateway_upstream_latency_seconds` (histogram): guarded call latency
//! - `gateway_cache_hits_total` / `gateway_cache_misses_total` (counters)
//! - `gateway_rate_limited_total` (counter): rejections by scope
//! - `gateway_estimator_*_seconds` (gauges): estimator state after each update
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::estimator::EstimatorSnapshot;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "path" => path.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_call(outcome: &'static str, latency: Duration) {
    counter!("gateway_upstream_calls_total", "outcome" => outcome).increment(1);
    histogram!("gateway_upstream_latency_seconds", "outcome" => outcome)
        .record(latency.as_secs_f64());
}

pub fn record_estimator(snapshot: &EstimatorSnapshot) {
    gauge!("gateway_estimator_smoothed_rtt_seconds").set(snapshot.smoothed_rtt);
    gauge!("gateway_estimator_rtt_variance_seconds").set(snapshot.rtt_variance);
    gauge!("gateway_estimator_timeout_seconds").set(snapshot.current_timeout);
}

pub fn record_cache_lookup(hit: bool) {
    if hit {
        counter!("gateway_cache_hits_total").increment(1);
    } else {
        counter!("gateway_cache_misses_total").increment(1);
    }
}

pub fn record_cache_size(size: usize) {
    gauge!("gateway_cache_entries").set(size as f64);
}

pub fn record_rate_limited(scope: &'static str) {
    counter!("gateway_rate_limited_total", "scope" => scope).increment(1);
}
