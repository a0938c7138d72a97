//! Time-bounded retry loop for groups of checks and queries.
//!
//! An attempt is re-run with the same input until it succeeds or the time
//! budget is spent. Elapsed time is the measured duration of each attempt
//! plus the sleep interval, which is added as requested rather than measured
//! after waking. Under scheduler jitter the loop may therefore run slightly
//! more or fewer attempts than wall time alone would allow.

use std::time::Duration;

use flowcheck_types::{EngineError, RetryConfig};

use crate::clock::Clock;

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Timeout and pause of the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    timeout: Duration,
    interval: Duration,
}

impl RetryPolicy {
    /// `interval` must be non-zero so the loop always terminates.
    pub fn new(timeout: Duration, interval: Duration) -> Result<Self, EngineError> {
        if interval.is_zero() {
            return Err(EngineError::InvalidRetryConfig(
                "interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self { timeout, interval })
    }

    pub fn from_config(config: &RetryConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Self::new(config.timeout(), config.interval())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let config = RetryConfig::default();
        Self {
            timeout: config.timeout(),
            interval: config.interval(),
        }
    }
}

// ---------------------------------------------------------------------------
// Attempt state
// ---------------------------------------------------------------------------

/// State that must look the same at the start of every attempt.
///
/// Side effects of an attempt that is going to be retried (counter bumps,
/// buffered records) are rolled back before the next attempt runs, so only
/// the final attempt's effects survive.
pub trait AttemptState {
    type Checkpoint;

    fn checkpoint(&self) -> Self::Checkpoint;

    fn restore(&mut self, checkpoint: &Self::Checkpoint);
}

// ---------------------------------------------------------------------------
// retry
// ---------------------------------------------------------------------------

/// How a retry loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    /// Number of attempts made (at least 1).
    pub attempts: u32,
}

/// Run `attempt` until it succeeds or the time budget is exhausted.
///
/// `state` is restored to its pre-loop checkpoint before every attempt. After
/// a failed attempt the loop sleeps for the interval if the elapsed time plus
/// that interval still fits the timeout; otherwise the last failure is final.
pub fn retry<S, T, E, F>(clock: &dyn Clock, policy: &RetryPolicy, state: &mut S, mut attempt: F) -> RetryOutcome<T, E>
where
    S: AttemptState,
    F: FnMut(&mut S, u32) -> Result<T, E>,
{
    let baseline = state.checkpoint();
    let mut elapsed = Duration::ZERO;
    let mut attempts = 0;

    loop {
        attempts += 1;
        state.restore(&baseline);

        let started = clock.now();
        let result = attempt(state, attempts);
        elapsed += clock.now().saturating_sub(started);

        match result {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts,
                };
            }
            Err(_) if elapsed + policy.interval <= policy.timeout => {
                tracing::trace!(
                    attempt = attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "attempt failed, sleeping before retry"
                );
                clock.sleep(policy.interval);
                elapsed += policy.interval;
            }
            Err(err) => {
                return RetryOutcome {
                    result: Err(err),
                    attempts,
                };
            }
        }
    }
}
