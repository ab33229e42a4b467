//! Retry policy for a single provider's upload.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::UploadError;

/// Default number of attempts per provider.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Default ceiling on any single backoff.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

// ============================================================================
// Retry Outcome
// ============================================================================

/// Result of running an operation under a [`RetryPolicy`].
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// Final result: the first success, or the last error.
    pub result: Result<T, UploadError>,
    /// Number of times the operation ran.
    pub tries: u32,
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Exponential backoff with jitter, bounded attempt count.
///
/// Only [`UploadError::is_retryable`] failures are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, before jitter.
    pub base_delay: Duration,
    /// Maximum delay between attempts.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt count and default delays.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the delay ceiling.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Backoff after the 0-indexed failed attempt `attempt`, with a fixed jitter factor.
    pub fn delay_with_factor(&self, attempt: u32, factor: f64) -> Duration {
        let exp = f64::from(2u32.saturating_pow(attempt));
        let secs = self.base_delay.as_secs_f64() * exp * factor.max(0.0);
        Duration::try_from_secs_f64(secs).map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Backoff after the 0-indexed failed attempt `attempt`, jittered in `[0.5, 1.5]`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = rand::thread_rng().gen_range(0.5..=1.5);
        self.delay_with_factor(attempt, factor)
    }

    /// Wait after a rate limit carrying `Retry-After: retry_after` seconds.
    ///
    /// Never shorter than the host asked for nor than the computed backoff.
    /// `factor` in `[1.0, 1.5]` spreads callers that hit the same limit.
    /// Capped at `max_delay`.
    pub fn rate_limit_delay(&self, attempt: u32, retry_after: u64, factor: f64) -> Duration {
        let requested = Duration::from_secs(retry_after).mul_f64(factor.max(1.0));
        requested
            .max(self.delay_with_factor(attempt, factor))
            .min(self.max_delay)
    }

    /// Runs `op` until it succeeds, fails non-retryably, or attempts run out.
    ///
    /// `op` receives the 0-indexed attempt number. A host-provided
    /// `Retry-After` raises the wait to at least that long, still capped at
    /// `max_delay`.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, UploadError>>,
    {
        let mut attempt = 0;
        loop {
            let result = op(attempt).await;
            let tries = attempt + 1;

            let err = match result {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        tries,
                    };
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                debug!(attempt, error = %err, "Non-retryable failure");
                return RetryOutcome {
                    result: Err(err),
                    tries,
                };
            }

            if tries >= self.max_attempts {
                warn!(attempts = tries, error = %err, "Retries exhausted");
                return RetryOutcome {
                    result: Err(err),
                    tries,
                };
            }

            let delay = match err {
                UploadError::RateLimited {
                    retry_after: Some(secs),
                } => self.rate_limit_delay(attempt, secs, rand::thread_rng().gen_range(1.0..=1.5)),
                _ => self.delay_for_attempt(attempt),
            };
            debug!(attempt, delay = ?delay, error = %err, "Retrying after backoff");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RejectCause;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant() -> RetryPolicy {
        RetryPolicy::new(3).with_base_delay(Duration::ZERO)
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_with_factor(0, 1.0), Duration::from_secs(2));
        assert_eq!(policy.delay_with_factor(1, 1.0), Duration::from_secs(4));
        assert_eq!(policy.delay_with_factor(2, 1.0), Duration::from_secs(8));
        assert_eq!(policy.delay_with_factor(1, 0.5), Duration::from_secs(2));
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = RetryPolicy::new(10).with_base_delay(Duration::from_secs(10));
        assert_eq!(policy.delay_with_factor(5, 1.5), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let delay = policy.delay_for_attempt(1);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_secs(6));
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_rate_limits() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome = instant()
            .execute(|_| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(UploadError::RateLimited { retry_after: None })
                    } else {
                        Ok("https://i.ibb.co/x.png")
                    }
                }
            })
            .await;

        assert_eq!(outcome.result.unwrap(), "https://i.ibb.co/x.png");
        assert_eq!(outcome.tries, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_short_circuits() {
        let outcome: RetryOutcome<()> = instant()
            .execute(|_| async {
                Err(UploadError::rejected(RejectCause::Credential, "bad key"))
            })
            .await;

        assert_eq!(outcome.tries, 1);
        assert!(outcome.result.unwrap_err().is_credential_problem());
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let outcome: RetryOutcome<()> = instant()
            .execute(|_| async { Err(UploadError::Unavailable("HTTP 502".into())) })
            .await;

        assert_eq!(outcome.tries, 3);
        assert!(matches!(outcome.result, Err(UploadError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let outcome: RetryOutcome<()> = RetryPolicy::no_retry()
            .execute(|_| async { Err(UploadError::Unavailable("timeout".into())) })
            .await;
        assert_eq!(outcome.tries, 1);
    }

    #[test]
    fn test_rate_limit_delay_respects_retry_after() {
        let policy = RetryPolicy::new(3).with_base_delay(Duration::from_secs(1));

        assert_eq!(policy.rate_limit_delay(0, 5, 1.0), Duration::from_secs(5));
        assert_eq!(policy.rate_limit_delay(0, 5, 1.5), Duration::from_millis(7500));
        // Backoff wins when it is longer than the requested wait.
        assert_eq!(policy.rate_limit_delay(3, 1, 1.0), Duration::from_secs(8));
        assert_eq!(policy.rate_limit_delay(0, 600, 1.5), Duration::from_secs(30));
    }

    #[test]
    fn test_rate_limit_delay_is_spread() {
        let policy = RetryPolicy::default();
        let spread: std::collections::BTreeSet<Duration> = [1.0, 1.2, 1.4]
            .into_iter()
            .map(|factor| policy.rate_limit_delay(0, 10, factor))
            .collect();
        assert_eq!(spread.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_between_attempts() {
        let base = Duration::from_millis(100);
        let policy = RetryPolicy::new(4)
            .with_base_delay(base)
            .with_max_delay(Duration::from_secs(10));
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorder = calls.clone();

        let outcome = policy
            .execute(|_| {
                let recorder = recorder.clone();
                async move {
                    let mut calls = recorder.lock().unwrap();
                    calls.push(tokio::time::Instant::now());
                    if calls.len() <= 3 {
                        Err(UploadError::Unavailable("HTTP 503".into()))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(outcome.result.is_ok());
        assert_eq!(outcome.tries, 4);

        let calls = calls.lock().unwrap();
        for (n, pair) in calls.windows(2).enumerate() {
            let gap = pair[1] - pair[0];
            let nominal = base * 2u32.pow(u32::try_from(n).unwrap());
            assert!(gap >= nominal / 2, "gap {n} too short: {gap:?}");
            assert!(
                gap <= nominal * 3 / 2 + Duration::from_millis(1),
                "gap {n} too long: {gap:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_is_capped() {
        let policy = RetryPolicy::new(2).with_max_delay(Duration::from_secs(1));
        let start = tokio::time::Instant::now();

        let outcome: RetryOutcome<()> = policy
            .execute(|_| async {
                Err(UploadError::RateLimited {
                    retry_after: Some(600),
                })
            })
            .await;

        assert_eq!(outcome.tries, 2);
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
