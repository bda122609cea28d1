//! Bounded retry with exponential backoff and jitter.
//!
//! Only errors for which [`WeatherError::is_retryable`] holds are retried:
//! transport failures and transient provider statuses (408, 429, 5xx).
//! Everything else, including malformed responses, surfaces immediately.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, future::Future, sync::Arc, time::Duration};

use crate::error::Result;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;
pub const DEFAULT_MAX_DELAY_SECS: f64 = 60.0;

/// Abstraction over waiting, so tests can observe delays without sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync + Debug {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<S: Sleeper + ?Sized> Sleeper for Arc<S> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of calls, including the first one.
    pub max_attempts: u32,
    /// Base delay in seconds; doubles after every failed attempt.
    pub backoff_factor: f64,
    /// Upper bound in seconds on any single delay, jitter included.
    pub max_delay_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            backoff_factor,
            ..Self::default()
        }
    }

    /// Delay to wait after the `failed`-th failed attempt (1-based), given a
    /// jitter sample in `[0, 1)`.
    ///
    /// Never exceeds `max_delay_secs`. A cap that is negative, NaN or too
    /// large for a `Duration` falls back to [`DEFAULT_MAX_DELAY_SECS`].
    pub fn delay_for_attempt(&self, failed: u32, jitter: f64) -> Duration {
        let cap = match Duration::try_from_secs_f64(self.max_delay_secs) {
            Ok(cap) => cap,
            Err(_) => Duration::from_secs_f64(DEFAULT_MAX_DELAY_SECS),
        };

        let exp = 2f64.powi(failed.saturating_sub(1).min(30) as i32);
        let secs = self.backoff_factor.max(0.0) * exp + jitter.clamp(0.0, 1.0);
        match Duration::try_from_secs_f64(secs) {
            Ok(delay) => delay.min(cap),
            Err(_) => cap,
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// `max_attempts` calls have been made.
    pub async fn run<T, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        label: &str,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("{label} succeeded on attempt {attempt}/{max_attempts}");
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_retryable() => {
                    tracing::debug!("{label} failed with non-retryable error: {err}");
                    return Err(err);
                }
                Err(err) if attempt >= max_attempts => {
                    tracing::error!(
                        "{label}: all {max_attempts} attempts failed, last error: {err}"
                    );
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.delay_for_attempt(attempt, jitter());
                    let secs = delay.as_secs_f64();
                    tracing::warn!(
                        "{label} failed ({err}). \
                         Retrying in {secs:.2}s (attempt {attempt}/{max_attempts})"
                    );
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn jitter() -> f64 {
    rand::thread_rng().gen_range(0.0..1.0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::WeatherError;
    use std::sync::{
        Mutex,
        atomic::{AtomicU32, Ordering},
    };

    /// Records requested delays instead of waiting.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSleeper {
        pub(crate) delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    impl RecordingSleeper {
        pub(crate) fn count(&self) -> usize {
            self.delays.lock().unwrap().len()
        }
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff_factor, 1.0);
        assert_eq!(policy.max_delay_secs, 60.0);
    }

    #[test]
    fn delay_doubles_per_failure() {
        let policy = RetryPolicy::new(5, 1.0);
        assert_eq!(policy.delay_for_attempt(1, 0.0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(2, 0.0), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(3, 0.0), Duration::from_secs(4));
    }

    #[test]
    fn jitter_is_added_on_top() {
        let policy = RetryPolicy::new(3, 0.5);
        assert_eq!(
            policy.delay_for_attempt(2, 0.25),
            Duration::from_secs_f64(1.25)
        );
    }

    #[test]
    fn huge_backoff_factor_is_capped() {
        let cap = Duration::from_secs(60);
        for factor in [1e20, f64::MAX, f64::INFINITY] {
            let policy = RetryPolicy::new(3, factor);
            assert_eq!(policy.delay_for_attempt(1, 0.5), cap, "{factor}");
            assert_eq!(policy.delay_for_attempt(30, 0.5), cap, "{factor}");
        }
    }

    #[test]
    fn nan_backoff_factor_means_jitter_only() {
        let policy = RetryPolicy::new(3, f64::NAN);
        assert_eq!(
            policy.delay_for_attempt(1, 0.5),
            Duration::from_secs_f64(0.5)
        );
    }

    #[test]
    fn custom_cap_applies_and_unusable_cap_falls_back() {
        let policy = RetryPolicy {
            max_delay_secs: 2.5,
            ..RetryPolicy::default()
        };
        assert_eq!(
            policy.delay_for_attempt(3, 0.9),
            Duration::from_secs_f64(2.5)
        );

        for cap in [-1.0, f64::NAN, f64::INFINITY, 1e30] {
            let policy = RetryPolicy {
                backoff_factor: 1e20,
                max_delay_secs: cap,
                ..RetryPolicy::default()
            };
            assert_eq!(
                policy.delay_for_attempt(1, 0.0),
                Duration::from_secs(60),
                "{cap}"
            );
        }
    }

    #[tokio::test]
    async fn huge_backoff_factor_still_retries() {
        let sleeper = RecordingSleeper::default();
        let calls = &AtomicU32::new(0);

        let result = RetryPolicy::new(3, 1e20)
            .run(&sleeper, "test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 1 {
                    Err(WeatherError::Network("connection reset".into()))
                } else {
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        let delays = sleeper.delays.lock().unwrap();
        assert_eq!(*delays, vec![Duration::from_secs(60)]);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let sleeper = RecordingSleeper::default();
        let calls = &AtomicU32::new(0);

        let result = RetryPolicy::default()
            .run(&sleeper, "test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(WeatherError::Network("connection reset".into()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.count(), 2);

        let delays = sleeper.delays.lock().unwrap();
        let secs: Vec<f64> = delays.iter().map(Duration::as_secs_f64).collect();
        assert!((1.0..2.0).contains(&secs[0]), "{secs:?}");
        assert!((2.0..3.0).contains(&secs[1]), "{secs:?}");
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let calls = &AtomicU32::new(0);

        let result: Result<()> = RetryPolicy::default()
            .run(&sleeper, "test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(WeatherError::Network("timeout".into()))
            })
            .await;

        assert!(matches!(result, Err(WeatherError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.count(), 2);
    }

    #[tokio::test]
    async fn non_retryable_error_is_returned_immediately() {
        let sleeper = RecordingSleeper::default();
        let calls = &AtomicU32::new(0);

        let result: Result<()> = RetryPolicy::default()
            .run(&sleeper, "test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(WeatherError::MalformedResponse("nope".into()))
            })
            .await;

        assert!(matches!(result, Err(WeatherError::MalformedResponse(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sleeper.count(), 0);
    }

    #[tokio::test]
    async fn zero_attempts_still_calls_once() {
        let sleeper = RecordingSleeper::default();
        let result = RetryPolicy::new(0, 1.0)
            .run(&sleeper, "test", || async { Ok("ok") })
            .await;
        assert_eq!(result.unwrap(), "ok");
    }
}
