//! Request identification and access logging.
//!
//! # Responsibilities
//! - Keep a client-supplied `X-Request-Id`, or mint a short one
//! - Emit one structured access line per request
//! - Attach the request ID to every log event raised while handling it
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - IDs are the first 12 hex digits of a UUID v4: short enough to grep, unique enough per day

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Instrument;
use uuid::Uuid;

use crate::observability::metrics;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const SHORT_ID_LEN: usize = 12;

/// Generates 12-character hexadecimal request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortRequestId;

impl MakeRequestId for ShortRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().simple().to_string();
        HeaderValue::from_str(&id[..SHORT_ID_LEN])
            .ok()
            .map(RequestId::new)
    }
}

/// Extension trait to read the request ID from a request.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Log one line per request and record request metrics.
pub async fn access_log_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let span = tracing::info_span!("request", request_id = %request_id);
    let response = next.run(request).instrument(span.clone()).await;

    let status = response.status().as_u16();
    span.in_scope(|| {
        tracing::info!(
            method = %method,
            path = %path,
            status,
            duration_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
    });
    metrics::record_request(method.as_str(), &route, status, start);

    response
}
