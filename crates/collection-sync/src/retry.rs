//! Retry Policy
//!
//! Limited automatic retry with exponential backoff. Only idempotent
//! single-item content edits are retried; reorders never are, because the
//! order they carry may be stale by the time a retry would land.

use std::future::Future;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Timer used between attempts (gloo timers in the browser, immediate in tests)
pub trait Delay {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Resolves immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateDelay;

impl Delay for ImmediateDelay {
    fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(futures::future::ready(()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// No retries at all
    pub fn never() -> Self {
        Self { max_retries: 0, base_backoff_ms: 0 }
    }

    /// Wait before retry number `retry` (1-based): base, 2*base, 4*base, ...
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.base_backoff_ms.saturating_mul(factor))
    }

    /// Run `attempt` until it succeeds, fails permanently, or retries run out
    ///
    /// `retryable` is false for anything that is not an idempotent edit, in
    /// which case exactly one attempt is made.
    pub async fn run<T, F, Fut>(&self, delay: &dyn Delay, retryable: bool, mut attempt: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let mut retries = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if retryable && err.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    let wait = self.backoff(retries);
                    debug!("retry {}/{} in {:?} after: {}", retries, self.max_retries, wait, err);
                    delay.sleep(wait).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
