//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines, one access line per request)
//!     → Metrics endpoint (Prometheus scrape)
//!     → /stats (estimator snapshot for humans)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Metrics are cheap and optional (no recorder = no-op)

pub mod logging;
pub mod metrics;
