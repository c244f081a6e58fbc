//! Configuration types shared across crates

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Retry configuration for upstream REST operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that performs exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff to wait before retry number `retry` (0-based), capped at `max_backoff`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(retry as i32);
        let millis = self.initial_backoff.as_millis() as f64 * factor as f64;
        Duration::from_millis(millis.min(self.max_backoff.as_millis() as f64) as u64)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent. The last error is returned.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation: &str,
        is_retryable: impl Fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if retry < self.max_retries && is_retryable(&err) => {
                    let delay = self.backoff_for(retry);
                    tracing::warn!(
                        operation,
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// How a registry's `count` maps onto readable indices.
///
/// Deployed registries disagree on whether the last counted slot is
/// populated, so the boundary is configured rather than guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountBound {
    /// Read indices `0..count`.
    #[default]
    Exact,
    /// Read indices `0..count - 1`.
    SkipLast,
}

impl CountBound {
    /// Number of indices to read for a registry reporting `count`.
    pub fn readable(&self, count: u64) -> u64 {
        match self {
            Self::Exact => count,
            Self::SkipLast => count.saturating_sub(1),
        }
    }
}

impl std::str::FromStr for CountBound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "skip-last" | "skip_last" => Ok(Self::SkipLast),
            other => Err(format!("expected 'exact' or 'skip-last', got '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<u32, String> = policy
            .run("flaky", |_| true, || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_permanent_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<(), String> = policy
            .run("permanent", |e: &String| e != "permanent", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("permanent".to_string())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 2,
            ..RetryPolicy::default()
        };

        let result: Result<(), String> = policy
            .run("down", |_| true, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("down".to_string())
            })
            .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_count_bound_readable() {
        assert_eq!(CountBound::Exact.readable(4), 4);
        assert_eq!(CountBound::SkipLast.readable(4), 3);
        assert_eq!(CountBound::SkipLast.readable(0), 0);
    }

    #[test]
    fn test_count_bound_parse() {
        assert_eq!("exact".parse::<CountBound>(), Ok(CountBound::Exact));
        assert_eq!("Skip-Last".parse::<CountBound>(), Ok(CountBound::SkipLast));
        assert!("inclusive".parse::<CountBound>().is_err());
    }
}
