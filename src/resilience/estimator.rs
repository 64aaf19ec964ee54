//! Adaptive request timeout estimation.
//!
//! # Responsibilities
//! - Decide how long the next upstream call may take before it is abandoned
//! - Learn from every settled call (Jacobson smoothing on success, Karn's rule on failure)
//! - Widen uncertainty after long idle gaps without forgetting what was learned
//!
//! # Model
//! ```text
//! timeout = clamp(smoothed_rtt + 4 * rtt_variance, min_timeout, max_timeout)
//!
//! success:  diff = latency - smoothed_rtt
//!           smoothed_rtt += alpha * diff
//!           rtt_variance += beta * (|diff| - rtt_variance)
//! failure:  timeout = min(max_timeout, timeout * 2), rtt_variance += 0.5
//! idle gap: rtt_variance = max(rtt_variance * 2, 1.0), timeout never lowered
//! ```
//!
//! # Design Decisions
//! - One estimator per process, shared through `Arc`; it blends every destination
//! - A single mutex guards the whole state; critical sections are arithmetic only
//! - Logging happens after the lock is released

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::EstimatorConfig;
use crate::resilience::clock::{Clock, SystemClock};

/// Variance assumed before any sample has been observed.
pub const INITIAL_VARIANCE: f64 = 0.5;

/// Number of deviations added on top of the mean.
const DEVIATION_FACTOR: f64 = 4.0;

/// Lower bound of the variance right after an idle gap.
const DECAY_VARIANCE_FLOOR: f64 = 1.0;

/// Whether the estimator currently trusts its learned statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorMode {
    /// Normal smoothing in effect.
    Active,
    /// Uncertainty was widened after an idle gap; cleared by the next successful sample.
    Decayed,
}

/// Point-in-time copy of the estimator state, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimatorSnapshot {
    pub smoothed_rtt: f64,
    pub rtt_variance: f64,
    pub current_timeout: f64,
    pub idle_seconds: f64,
    pub mode: EstimatorMode,
}

impl EstimatorSnapshot {
    /// Round values for display (milliseconds, idle time to a tenth of a second).
    pub fn rounded(self) -> Self {
        Self {
            smoothed_rtt: round_to(self.smoothed_rtt, 3),
            rtt_variance: round_to(self.rtt_variance, 3),
            current_timeout: round_to(self.current_timeout, 3),
            idle_seconds: round_to(self.idle_seconds, 1),
            mode: self.mode,
        }
    }
}

#[derive(Debug)]
struct EstimatorState {
    smoothed_rtt: f64,
    rtt_variance: f64,
    current_timeout: f64,
    last_activity_at: Instant,
    mode: EstimatorMode,
}

/// Thread-safe RTO estimator.
#[derive(Debug)]
pub struct TimeoutEstimator<C: Clock = SystemClock> {
    config: EstimatorConfig,
    idle_reset: Duration,
    clock: C,
    state: Mutex<EstimatorState>,
}

impl TimeoutEstimator<SystemClock> {
    /// Create an estimator driven by the system clock.
    pub fn new(config: EstimatorConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> TimeoutEstimator<C> {
    /// Create an estimator reading time from `clock`.
    pub fn with_clock(config: EstimatorConfig, clock: C) -> Self {
        let smoothed_rtt = config.default_timeout_secs;
        let rtt_variance = INITIAL_VARIANCE;
        let current_timeout = clamp_timeout(&config, smoothed_rtt, rtt_variance);
        let state = EstimatorState {
            smoothed_rtt,
            rtt_variance,
            current_timeout,
            last_activity_at: clock.now(),
            mode: EstimatorMode::Active,
        };

        Self {
            idle_reset: Duration::from_secs(config.idle_reset_secs),
            config,
            clock,
            state: Mutex::new(state),
        }
    }

    /// Timeout to apply to the next upstream call.
    ///
    /// If the estimator sat idle for longer than the reset threshold, the
    /// network path may have changed, so the variance is widened first.
    pub fn get_timeout(&self) -> Duration {
        let now = self.clock.now();
        let (timeout, decayed_after) = {
            let mut state = self.lock();
            let idle = now.saturating_duration_since(state.last_activity_at);
            let decayed_after = if idle > self.idle_reset {
                state.rtt_variance = (state.rtt_variance * 2.0).max(DECAY_VARIANCE_FLOOR);
                // A failure penalty may sit above the recomputed value; keep it.
                state.current_timeout = state.current_timeout.max(clamp_timeout(
                    &self.config,
                    state.smoothed_rtt,
                    state.rtt_variance,
                ));
                state.last_activity_at = now;
                state.mode = EstimatorMode::Decayed;
                Some(idle)
            } else {
                None
            };
            (state.current_timeout, decayed_after)
        };

        if let Some(idle) = decayed_after {
            tracing::info!(
                idle_secs = idle.as_secs(),
                timeout_secs = timeout,
                "Idle gap exceeded reset threshold, widening timeout"
            );
        }

        secs_to_duration(timeout)
    }

    /// Feed the outcome of a settled call back into the model.
    ///
    /// `success` means a response was received from the peer, whatever its
    /// status. An HTTP 404 or 503 still proves the path is reachable and its
    /// latency is a valid sample. Only calls that produced no response at all
    /// (transport error, deadline expiry) are failures; their elapsed time is
    /// ignored and the timeout is backed off instead.
    pub fn update(&self, observed_latency: Duration, success: bool) {
        let now = self.clock.now();
        let latency = observed_latency.as_secs_f64();
        let penalized_timeout = {
            let mut state = self.lock();
            if now > state.last_activity_at {
                state.last_activity_at = now;
            }

            if success {
                let diff = latency - state.smoothed_rtt;
                state.smoothed_rtt += self.config.alpha * diff;
                state.rtt_variance += self.config.beta * (diff.abs() - state.rtt_variance);
                state.current_timeout =
                    clamp_timeout(&self.config, state.smoothed_rtt, state.rtt_variance);
                state.mode = EstimatorMode::Active;
                None
            } else {
                state.current_timeout = (state.current_timeout * self.config.failure_multiplier)
                    .min(self.config.max_timeout_secs);
                state.rtt_variance += self.config.failure_variance_penalty_secs;
                Some(state.current_timeout)
            }
        };

        if let Some(timeout) = penalized_timeout {
            tracing::debug!(
                latency_secs = latency,
                timeout_secs = timeout,
                "Upstream call failed, backing off timeout"
            );
        }
    }

    /// Current state, unrounded.
    pub fn snapshot(&self) -> EstimatorSnapshot {
        let now = self.clock.now();
        let state = self.lock();
        EstimatorSnapshot {
            smoothed_rtt: state.smoothed_rtt,
            rtt_variance: state.rtt_variance,
            current_timeout: state.current_timeout,
            idle_seconds: now
                .saturating_duration_since(state.last_activity_at)
                .as_secs_f64(),
            mode: state.mode,
        }
    }

    // The state is plain numbers, so a panic elsewhere cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, EstimatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn clamp_timeout(config: &EstimatorConfig, smoothed_rtt: f64, rtt_variance: f64) -> f64 {
    let raw = smoothed_rtt + DEVIATION_FACTOR * rtt_variance;
    raw.max(config.min_timeout_secs).min(config.max_timeout_secs)
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
