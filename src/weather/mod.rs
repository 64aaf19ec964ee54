//! Weather lookup subsystem.
//!
//! # Data Flow
//! ```text
//! /get_weather?city=... | lat=...&lon=...
//!     → types.rs (validate into WeatherQuery, derive cache key)
//!     → cache.rs (fresh report? serve it)
//!     → client.rs (guarded provider call, status mapping)
//!     → cache.rs (store successful report)
//! ```

pub mod cache;
pub mod client;
pub mod types;

pub use cache::ResponseCache;
pub use client::WeatherClient;
pub use types::{Suggestion, WeatherQuery, WeatherReport};
