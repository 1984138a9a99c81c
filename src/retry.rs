//! Bounded retries with exponential backoff, jitter, and per-attempt timeouts.
//!
//! An attempt fails when the operation returns an [`AgentError`] or outlives the
//! attempt timeout. After a failed attempt `n` the executor sleeps
//! `base * 2^n + base * U(0,1)` before trying again. Cancellation is observed
//! during attempts and during backoff sleeps and is never retried.

use crate::concurrency::CancellationSignal;
use crate::error::{AgentError, AgentExhaustedError, RetryError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Retry budget for one agent call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
    /// Unit of the exponential backoff.
    pub backoff_base: Duration,
    /// Add `U(0,1) * backoff_base` to each delay.
    pub jitter: bool,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

    pub fn new(max_attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            attempt_timeout,
            backoff_base: Self::DEFAULT_BACKOFF_BASE,
            jitter: true,
        }
    }

    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Delay after the `attempt`-th failure (1-based), given a jitter sample in `[0, 1)`.
    pub fn backoff_delay(&self, attempt: u32, jitter_sample: f64) -> Duration {
        let exponent = attempt.min(16);
        let exponential = self.backoff_base.saturating_mul(1u32 << exponent);
        if self.jitter {
            exponential + self.backoff_base.mul_f64(jitter_sample.clamp(0.0, 1.0))
        } else {
            exponential
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Duration::from_secs(300))
    }
}

/// Runs an operation under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `operation` until it succeeds, the budget is spent, or `cancel` fires.
    pub async fn execute<F, Fut, T>(
        &self,
        label: &str,
        cancel: &CancellationSignal,
        mut operation: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(operation = %label, attempt, "Cancelled during attempt");
                    return Err(RetryError::Cancelled);
                }
                result = timeout(self.policy.attempt_timeout, operation()) => result,
            };

            let error = match outcome {
                Ok(Ok(value)) => {
                    debug!(operation = %label, attempt, "Attempt succeeded");
                    return Ok(value);
                }
                Ok(Err(err)) => err,
                Err(_) => AgentError::Timeout(self.policy.attempt_timeout),
            };

            if attempt >= self.policy.max_attempts {
                warn!(
                    operation = %label,
                    attempts = attempt,
                    error = %error,
                    "Retries exhausted"
                );
                return Err(RetryError::Exhausted(AgentExhaustedError {
                    operation: label.to_string(),
                    attempts: attempt,
                    last_error: error,
                }));
            }

            let sample: f64 = rand::rng().random();
            let delay = self.policy.backoff_delay(attempt, sample);
            warn!(
                operation = %label,
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Attempt failed, backing off"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(operation = %label, attempt, "Cancelled during backoff");
                    return Err(RetryError::Cancelled);
                }
                _ = sleep(delay) => {}
            }
        }
    }
}
