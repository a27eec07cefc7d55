//! Retrying outcome-producing operations with exponential backoff

use crate::Outcome;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry policy for fallible operations
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included; 0 behaves as 1
    pub max_attempts: u32,
    /// Initial delay before first retry (milliseconds)
    pub initial_delay_millis: u64,
    /// Maximum delay cap (milliseconds)
    pub max_delay_millis: u64,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_millis: 1000,
            max_delay_millis: 30000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Calculate delay for a given attempt (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        let delay = self.initial_delay_millis as f64
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let capped = delay.min(self.max_delay_millis as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Run `op` until it succeeds, the attempts run out, or `token` is cancelled.
///
/// Cancellation is never retried. Once attempts run out, the last failure is
/// returned with a message recording how many attempts were made.
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    mut op: F,
) -> Outcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Outcome<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        if token.is_cancelled() {
            return Outcome::cancelled();
        }

        let outcome = crate::pending::settle(op(attempt), token).await;
        if outcome.is_success() || outcome.is_cancelled() {
            return outcome;
        }
        if attempt >= attempts {
            tracing::debug!(attempts, errors = outcome.errors().len(), "retries exhausted");
            return outcome.with_message(format!("gave up after {attempts} attempts"));
        }

        let delay = policy.delay_for_attempt(attempt);
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "attempt failed, retrying");
        tokio::select! {
            biased;
            _ = token.cancelled() => return Outcome::cancelled(),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
