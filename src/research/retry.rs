// src/research/retry.rs
// Bounded exponential-backoff retry around a single async operation

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Retry budget for one provider call
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping
/// `base_delay * 2^(attempt - 1)` plus a little jitter between attempts,
/// then re-raise the last failure. Provider-switch decisions belong to the
/// caller; this wraps exactly one operation.
pub async fn with_backoff<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                let backoff = policy.base_delay * 2u32.saturating_pow(attempt - 1);
                let jitter = Duration::from_millis(rand::random::<u64>() % 100);
                warn!(
                    "Attempt {}/{} failed ({}), retrying after {:?}...",
                    attempt,
                    max_attempts,
                    e,
                    backoff + jitter
                );
                sleep(backoff + jitter).await;
            }
            Err(e) => return Err(e),
        }
    }
}
