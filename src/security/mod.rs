//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (global per-IP budget, stricter budget on /get_weather)
//!     → handler
//!     → headers.rs (nosniff, referrer policy, frame denial, permissions policy)
//! ```
//!
//! # Design Decisions
//! - In-memory state only; limits are per instance
//! - No trust in client input: queries are validated before any upstream call

pub mod headers;
pub mod rate_limit;

pub use headers::security_headers_middleware;
pub use rate_limit::{rate_limit_middleware, RateLimiter};
