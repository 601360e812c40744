//! Bounded retry for idempotent reads against a flaky backend
//!
//! Writes are never retried here: a write that timed out may have been
//! applied, so write paths go through precondition-checked transactions
//! instead.

use std::future::Future;
use std::time::Duration;

use crate::StoreError;

#[derive(Debug, Clone, Copy)]
pub struct ReadRetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ReadRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(25),
        }
    }
}

impl ReadRetryPolicy {
    pub fn no_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// Linear backoff: base, 2x base, 3x base...
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Run a read, retrying transient failures up to the policy's attempt limit
pub async fn with_read_retry<T, F, Fut>(
    policy: ReadRetryPolicy,
    operation: &'static str,
    mut read: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match read().await {
            Err(err) if err.is_transient() && attempt < max_attempts => {
                tracing::warn!(
                    operation,
                    attempt,
                    error = %err,
                    "Transient store failure on read, retrying"
                );
                let delay = policy.delay_for(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
            result => return result,
        }
    }
}
