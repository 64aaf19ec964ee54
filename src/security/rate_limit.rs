//! Per-client rate limiting.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::GatewayError;
use crate::observability::metrics;
use crate::resilience::clock::{Clock, SystemClock};

/// Number of tracked clients above which idle buckets are dropped.
const PRUNE_THRESHOLD: usize = 10_000;

/// A simple token bucket rate limiter.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn refill(&mut self, now: Instant, capacity: f64, refill_rate: f64) {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self, now: Instant, capacity: f64, refill_rate: f64) -> bool {
        self.refill(now, capacity, refill_rate);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Requests-per-minute limiter keyed by client.
#[derive(Debug)]
pub struct RateLimiter<C: Clock = SystemClock> {
    scope: &'static str,
    buckets: Mutex<HashMap<String, TokenBucket>>,
    capacity: f64,
    refill_per_sec: f64,
    clock: C,
}

impl RateLimiter<SystemClock> {
    pub fn per_minute(scope: &'static str, requests: u32) -> Self {
        Self::with_clock(scope, requests, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Allow bursts of `requests`, refilled evenly over a minute.
    pub fn with_clock(scope: &'static str, requests: u32, clock: C) -> Self {
        let capacity = f64::from(requests.max(1));
        Self {
            scope,
            buckets: Mutex::new(HashMap::new()),
            capacity,
            refill_per_sec: capacity / 60.0,
            clock,
        }
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    /// Take one token for `client`. Returns `false` when the client is over its limit.
    pub fn check(&self, client: &str) -> bool {
        let now = self.clock.now();
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);

        if buckets.len() >= PRUNE_THRESHOLD && !buckets.contains_key(client) {
            let (capacity, rate) = (self.capacity, self.refill_per_sec);
            buckets.retain(|_, bucket| {
                bucket.refill(now, capacity, rate);
                bucket.tokens < capacity
            });
        }

        let capacity = self.capacity;
        buckets
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::new(capacity, now))
            .try_acquire(now, capacity, self.refill_per_sec)
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Middleware rejecting clients over the limiter's budget with 429.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if limiter.check(&client) {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, scope = limiter.scope(), "Rate limit exceeded");
        metrics::record_rate_limited(limiter.scope());
        GatewayError::RateLimited.into_response()
    }
}
