//! Retry policy for rate-limited upstream services
//!
//! Provides:
//! - Classification of failures into transient (rate-limit-class) vs. fatal
//! - Linear backoff scaled by attempt count
//! - Exhausted retries degrade to "feature unavailable" instead of an error

use crate::config::RetryConfig;
use crate::errors::Result;
use std::future::Future;
use std::time::Duration;

/// Bounded retry with linear backoff.
///
/// Fatal failures propagate on the first occurrence; only rate-limit-class
/// failures (see [`crate::errors::AppError::is_rate_limited`]) are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts before giving up
    max_attempts: u32,

    /// Base delay; attempt `n` (0-indexed) waits `base_delay * (n + 1)`
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Build from configuration
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.base_delay_secs))
    }

    /// Run `op` until it succeeds, fails fatally, or attempts are exhausted.
    ///
    /// - `Ok(Some(value))` — the operation succeeded.
    /// - `Ok(None)` — every attempt was rate-limited; the caller should treat
    ///   the feature as unavailable rather than abort.
    /// - `Err(e)` — the operation failed with a non-retryable error.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        for attempt in 0..self.max_attempts {
            match op().await {
                Ok(value) => return Ok(Some(value)),
                Err(e) if e.is_rate_limited() => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Upstream rate limited, backing off"
                    );
                    // No wait after the final attempt
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(self.base_delay * (attempt + 1)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        tracing::warn!(
            max_attempts = self.max_attempts,
            "Rate limit persisted through all attempts"
        );
        Ok(None)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rate_limited() -> AppError {
        AppError::RateLimited {
            service: "test".into(),
            message: "quota".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failures() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = policy
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(rate_limited())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, Some("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two waits: 2s after attempt 0, 4s after attempt 1
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_fallback() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let calls = AtomicU32::new(0);

        let result: Option<&str> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited()) }
            })
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_propagates_immediately() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<Option<&str>> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(AppError::Internal {
                        message: "broken".into(),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_linearly() {
        let policy = RetryPolicy::new(4, Duration::from_secs(1));
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Option<()> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited()) }
            })
            .await
            .unwrap();

        assert_eq!(result, None);
        // Waits of 1s, 2s, 3s between the four attempts
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }
}
