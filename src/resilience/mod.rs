//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → estimator.rs (how long may this call take?)
//!     → timeouts.rs (enforce that deadline, classify the outcome)
//!     → estimator.rs (learn from elapsed time and outcome)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - The deadline adapts to observed latency instead of being a constant
//! - No retries: a failed call is reported once and the client gets an error
//! - Time is read through clock.rs so the model is testable without waiting

pub mod clock;
pub mod estimator;
pub mod timeouts;

pub use clock::{Clock, ManualClock, SystemClock};
pub use estimator::{EstimatorMode, EstimatorSnapshot, TimeoutEstimator};
pub use timeouts::{guarded, CallError, CallOutcome};
