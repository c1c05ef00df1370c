//! Exponential backoff retry for listing calls
//!
//! Listing pages are idempotent: re-fetching the same page with the same
//! continuation token yields the same entries. Retry is therefore applied at
//! page-fetch granularity, never around a loop that has already yielded pages.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Retry policy with exponential backoff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff duration in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff duration in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    8
}

fn default_initial_backoff() -> u64 {
    100
}

fn default_max_backoff() -> u64 {
    10_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before retrying after the given zero-based failed attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .initial_backoff_ms
            .saturating_mul(1u64 << attempt.min(32));
        Duration::from_millis(exp.min(self.max_backoff_ms))
    }
}

/// Run `op`, retrying transient errors with exponential backoff
///
/// Non-retryable errors return immediately; after `max_attempts` transient
/// failures the final error is returned unchanged.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if !err.is_retryable() || attempt >= policy.max_attempts {
                    return Err(err);
                }
                let delay = policy.delay(attempt - 1);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "listing call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
