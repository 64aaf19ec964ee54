//! Timeout enforcement for upstream calls.
//!
//! # Responsibilities
//! - Ask the estimator for a deadline before each upstream call
//! - Abandon the call when the deadline passes
//! - Report elapsed time and outcome back to the estimator
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; elapsed time is read from Tokio's clock
//! - The wrapped future should resolve as soon as a response is received
//!   (headers), so body decoding errors never count as network failures
//! - `Ok` from the wrapped future is a network success regardless of status;
//!   only `Err` and deadline expiry are failures
//! - Timeout errors are distinct from transport errors
//! - A call dropped mid-flight is still reported, as a failure

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::observability::metrics;
use crate::resilience::clock::Clock;
use crate::resilience::estimator::TimeoutEstimator;

/// Why a guarded call produced no response.
#[derive(Debug, thiserror::Error)]
pub enum CallError<E> {
    /// The estimator's deadline expired first.
    #[error("no response within {0:?}")]
    TimedOut(Duration),

    /// The call failed before any response was received.
    #[error("transport error: {0}")]
    Transport(E),
}

/// Outcome label used in logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Responded,
    TransportError,
    TimedOut,
    /// The caller stopped waiting (client gone, outer deadline) before the call settled.
    Abandoned,
}

impl CallOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CallOutcome::Responded => "responded",
            CallOutcome::TransportError => "transport_error",
            CallOutcome::TimedOut => "timed_out",
            CallOutcome::Abandoned => "abandoned",
        }
    }

    fn is_success(self) -> bool {
        matches!(self, CallOutcome::Responded)
    }
}

/// An in-flight guarded call. Reports itself as abandoned if dropped unsettled.
struct PendingCall<'a, C: Clock> {
    estimator: &'a TimeoutEstimator<C>,
    deadline: Duration,
    start: Instant,
    settled: bool,
}

impl<'a, C: Clock> PendingCall<'a, C> {
    fn begin(estimator: &'a TimeoutEstimator<C>) -> Self {
        Self {
            deadline: estimator.get_timeout(),
            estimator,
            start: Instant::now(),
            settled: false,
        }
    }

    fn settle(&mut self, outcome: CallOutcome) {
        self.settled = true;
        self.report(outcome);
    }

    fn report(&self, outcome: CallOutcome) {
        let elapsed = self.start.elapsed();
        self.estimator.update(elapsed, outcome.is_success());

        let snapshot = self.estimator.snapshot();
        metrics::record_upstream_call(outcome.as_str(), elapsed);
        metrics::record_estimator(&snapshot);

        tracing::debug!(
            outcome = outcome.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            deadline_ms = self.deadline.as_millis() as u64,
            next_timeout_secs = snapshot.current_timeout,
            "Guarded upstream call settled"
        );
    }
}

impl<C: Clock> Drop for PendingCall<'_, C> {
    fn drop(&mut self) {
        if !self.settled {
            self.report(CallOutcome::Abandoned);
        }
    }
}

/// Run `call` under the estimator's current deadline and feed the result back.
///
/// Every call is reported exactly once, including when the returned future is
/// dropped before the call settles.
pub async fn guarded<C, F, T, E>(
    estimator: &TimeoutEstimator<C>,
    call: F,
) -> Result<T, CallError<E>>
where
    C: Clock,
    F: Future<Output = Result<T, E>>,
{
    let mut pending = PendingCall::begin(estimator);
    let deadline = pending.deadline;

    let (outcome, result) = match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => (CallOutcome::Responded, Ok(value)),
        Ok(Err(e)) => (CallOutcome::TransportError, Err(CallError::Transport(e))),
        Err(_) => (CallOutcome::TimedOut, Err(CallError::TimedOut(deadline))),
    };
    pending.settle(outcome);

    result
}
