//! Resilience primitives applied to every external call.
//!
//! Two composable wrappers: `with_timeout` bounds a single call, and
//! `with_retry` re-invokes a failed call with exponential backoff. A call
//! that creates an external side effect is never blindly retried; its
//! stage checks idempotency first.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::PipelineError;

/// Race a collaborator call against a deadline.
///
/// On expiry the result is abandoned (the underlying provider call is not
/// cancelled) and a `Timeout` carrying the operation name is raised.
pub async fn with_timeout<T, F>(
    operation: &str,
    limit: Duration,
    call: F,
) -> Result<T, PipelineError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(PipelineError::Provider {
            operation: operation.to_string(),
            message: format!("{e:#}"),
        }),
        Err(_) => Err(PipelineError::Timeout {
            operation: operation.to_string(),
            limit,
        }),
    }
}

/// Re-invoke a failed call with exponential backoff, surfacing the final
/// error once attempts are exhausted.
pub async fn with_retry<T, F, Fut>(
    operation: &str,
    policy: &RetryPolicy,
    mut call: F,
) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if policy.should_retry(attempt) => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Poll an async provider job until it settles, bounded by an overall
/// deadline. `poll` returns `Some` when the job reaches a terminal state.
pub async fn poll_until<T, F, Fut>(
    operation: &str,
    overall: Duration,
    interval: Duration,
    mut poll: F,
) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, PipelineError>>,
{
    let bounded = tokio::time::timeout(overall, async {
        loop {
            if let Some(value) = poll().await? {
                return Ok(value);
            }
            tokio::time::sleep(interval).await;
        }
    });

    match bounded.await {
        Ok(result) => result,
        Err(_) => Err(PipelineError::Timeout {
            operation: operation.to_string(),
            limit: overall,
        }),
    }
}

/// Retry policy for failed collaborator calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including first try)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay between retries in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Backoff multiplier (delay *= multiplier after each retry)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Calculate delay for a specific attempt (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::from_millis(self.initial_delay_ms);
        }

        let delay =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);

        let capped = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(capped)
    }

    /// Check if we should retry based on attempt count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
