//! Retry with exponential backoff
//!
//! The policy is an explicit state machine: [`RetryState`] records how many
//! attempts have been made and the delay before the next one, and answers
//! each failure with a [`RetryDecision`]. [`retry_with_backoff`] drives it,
//! sleeping through a [`Sleeper`] so the schedule can be observed in tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Backoff parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            ..Self::default()
        }
    }

    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempts: 0,
            next_delay: self.initial_delay,
        }
    }

    /// Nominal delays between consecutive attempts
    pub fn schedule(&self) -> Vec<Duration> {
        let mut state = self.start();
        let mut delays = Vec::new();
        state.begin_attempt();
        while let RetryDecision::RetryAfter(delay) = state.record_failure(true) {
            delays.push(delay);
            state.begin_attempt();
        }
        delays
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Progress through a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
    next_delay: Duration,
}

impl RetryState {
    /// Attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay that will precede the next retry
    pub fn next_delay(&self) -> Duration {
        self.next_delay
    }

    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    pub fn record_failure(&mut self, transient: bool) -> RetryDecision {
        if !transient || self.attempts >= self.policy.max_attempts {
            return RetryDecision::GiveUp;
        }
        let delay = self.next_delay;
        self.next_delay = delay.saturating_mul(self.policy.multiplier);
        RetryDecision::RetryAfter(delay)
    }
}

/// Final failure with the number of attempts made
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct RetryError<E> {
    pub error: E,
    pub attempts: u32,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Waits between attempts
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration) -> BoxFuture<'_, ()>;
}

/// Real timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, delay: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(delay))
    }
}

/// Records requested delays and returns immediately
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) -> BoxFuture<'_, ()> {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(delay);
        }
        Box::pin(std::future::ready(()))
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out
///
/// `op` receives the 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: Retryable + std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut state = policy.start();
    loop {
        let attempt = state.begin_attempt();
        let error = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match state.record_failure(error.is_transient()) {
            RetryDecision::RetryAfter(delay) => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Attempt failed, retrying"
                );
                sleeper.sleep(delay).await;
            }
            RetryDecision::GiveUp => {
                return Err(RetryError {
                    error,
                    attempts: state.attempts(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Failure {
        Flaky,
        Fatal,
    }

    impl std::fmt::Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Retryable for Failure {
        fn is_transient(&self) -> bool {
            matches!(self, Failure::Flaky)
        }
    }

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.schedule(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );

        let longer = RetryPolicy::new(4, Duration::from_millis(1000));
        assert_eq!(
            longer.schedule(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );
        assert!(RetryPolicy::new(0, Duration::from_millis(5)).schedule().is_empty());
    }

    #[test]
    fn test_state_transitions() {
        let mut state = RetryPolicy::default().start();
        assert_eq!(state.attempts(), 0);

        state.begin_attempt();
        assert_eq!(
            state.record_failure(true),
            RetryDecision::RetryAfter(Duration::from_millis(1000))
        );
        assert_eq!(state.next_delay(), Duration::from_millis(2000));

        state.begin_attempt();
        assert_eq!(state.record_failure(false), RetryDecision::GiveUp);
        assert_eq!(state.attempts(), 2);
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let result = retry_with_backoff(&RetryPolicy::default(), &sleeper, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(Failure::Flaky)
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let sleeper = RecordingSleeper::new();

        let result: Result<(), _> =
            retry_with_backoff(&RetryPolicy::default(), &sleeper, |_| async {
                Err(Failure::Fatal)
            })
            .await;

        assert_eq!(
            result,
            Err(RetryError {
                error: Failure::Fatal,
                attempts: 1
            })
        );
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_error_and_attempts() {
        let sleeper = RecordingSleeper::new();

        let result: Result<(), _> =
            retry_with_backoff(&RetryPolicy::default(), &sleeper, |_| async {
                Err(Failure::Flaky)
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.error, Failure::Flaky);
        assert_eq!(err.to_string(), "Flaky (after 3 attempt(s))");
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_waits() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(1000)).await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }
}
