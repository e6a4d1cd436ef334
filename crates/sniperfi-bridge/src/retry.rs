//! Retry with exponential backoff for idempotent engine reads
//!
//! Only transient failures (timeouts, engine process errors) are retried.
//! Writes (transfer, buy) never go through this path.

use crate::{Error, Result};
use rand::Rng;
use sniperfi_params::defaults::MAX_READ_RETRIES;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first one
    pub max_attempts: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_READ_RETRIES + 1,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Allow `retries` retries after the first attempt
    pub fn with_max_retries(self, retries: u32) -> Self {
        self.with_max_attempts(retries.saturating_add(1))
    }

    /// Override the attempt count (at least one attempt is always made)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    fn next_backoff(&self, backoff: Duration) -> Duration {
        std::cmp::min(
            Duration::from_millis((backoff.as_millis() as f64 * self.backoff_multiplier) as u64),
            self.max_backoff,
        )
    }
}

fn jitter_duration(duration: Duration) -> Duration {
    let millis = duration.as_millis() as u64;
    if millis == 0 {
        return duration;
    }
    let jitter = rand::thread_rng().gen_range(0.8..1.2);
    let jittered = (millis as f64 * jitter) as u64;
    Duration::from_millis(jittered.max(1))
}

/// Run `operation` until it succeeds, fails permanently or attempts run out
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T>> + Send,
{
    let mut attempt = 0;
    let mut backoff = policy.initial_backoff;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if !e.is_transient() || attempt >= policy.max_attempts {
                    return Err(e);
                }

                warn!(
                    "{} failed (attempt {}), retrying in {:?}: {}",
                    label, attempt, backoff, e
                );

                tokio::time::sleep(jitter_duration(backoff)).await;
                backoff = policy.next_backoff(backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default();
        let mut backoff = policy.initial_backoff;
        for _ in 0..10 {
            backoff = policy.next_backoff(backoff);
        }
        assert_eq!(backoff, policy.max_backoff);
    }

    #[test]
    fn test_jitter_bounds() {
        for _ in 0..100 {
            let jittered = jitter_duration(Duration::from_millis(1000));
            assert!(jittered >= Duration::from_millis(800));
            assert!(jittered <= Duration::from_millis(1200));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let value = with_retry(&RetryPolicy::default(), "balance", move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::Process("rpc unavailable".into()))
                } else {
                    Ok(7u64)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_gives_up_after_three_retries() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let err = with_retry(&RetryPolicy::default(), "balance", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::Process("rpc unavailable".into()))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Process(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_READ_RETRIES + 1);
        assert_eq!(RetryPolicy::no_retry().with_max_retries(2).max_attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_protocol_errors_are_not_retried() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let err = with_retry(&RetryPolicy::default(), "list", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::Protocol("garbage".into()))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Protocol(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
