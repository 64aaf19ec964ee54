//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, access log)
//!     → security (rate limits, response headers)
//!     → handlers.rs (validate, cache, guarded upstream call)
//!     → JSON response (errors as {"error": ...})
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::{RequestIdExt, ShortRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
