use async_trait::async_trait;
use common::Result;
use common::config::RetryConfig;
use std::time::Duration;
use tracing::{info, warn};

use crate::utils::time::{Sleeper, uniform_delay};

/// One unit of fallible work driven by [`RetryPolicy::execute`].
#[async_trait]
pub trait Retryable: Send {
    type Output: Send;

    async fn attempt(&mut self, attempt: u32) -> Result<Self::Output>;

    /// Runs after the backoff sleep that follows a failed attempt, before the next one.
    async fn before_retry(&mut self, failed_attempt: u32);
}

#[derive(Debug)]
pub enum RetryOutcome<T> {
    Success(T),
    Exhausted { attempts: u32 },
}

/// Jittered exponential backoff: `initial_delay * 2^attempt + U(0, jitter_max)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub jitter_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_secs_f64(config.initial_delay_secs),
            jitter_max: Duration::from_secs_f64(config.jitter_max_secs),
        }
    }

    /// Wait after the failed attempt with 0-based index `attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.mul_f64(2f64.powi(attempt as i32));
        base + uniform_delay(0.0, self.jitter_max.as_secs_f64())
    }

    pub async fn execute<R, S>(&self, sleeper: &S, operation: &mut R) -> RetryOutcome<R::Output>
    where
        R: Retryable,
        S: Sleeper + ?Sized,
    {
        let mut attempt = 0;

        loop {
            match operation.attempt(attempt).await {
                Ok(value) => return RetryOutcome::Success(value),
                Err(e) => {
                    let attempts = attempt + 1;
                    warn!(attempt = attempts, max_attempts = self.max_attempts, error = %e, "Attempt failed");

                    if attempts >= self.max_attempts {
                        return RetryOutcome::Exhausted { attempts };
                    }

                    let delay = self.backoff_delay(attempt);
                    info!(delay_secs = delay.as_secs_f64(), "Backing off before retry");
                    sleeper.sleep(delay).await;
                    operation.before_retry(attempt).await;
                    attempt = attempts;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Error;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    struct Flaky {
        failures_left: u32,
        calls: u32,
        retries_prepared: Vec<u32>,
    }

    #[async_trait]
    impl Retryable for Flaky {
        type Output = &'static str;

        async fn attempt(&mut self, _attempt: u32) -> Result<Self::Output> {
            self.calls += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(Error::RateLimit);
            }
            Ok("ok")
        }

        async fn before_retry(&mut self, failed_attempt: u32) {
            self.retries_prepared.push(failed_attempt);
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_secs(30),
            jitter_max: Duration::from_secs(10),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failure() {
        let sleeper = RecordingSleeper::default();
        let mut op = Flaky { failures_left: 1, calls: 0, retries_prepared: vec![] };

        let outcome = policy().execute(&sleeper, &mut op).await;
        assert!(matches!(outcome, RetryOutcome::Success("ok")));
        assert_eq!(op.calls, 2);
        assert_eq!(op.retries_prepared, vec![0]);
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let mut op = Flaky { failures_left: u32::MAX, calls: 0, retries_prepared: vec![] };

        let outcome = policy().execute(&sleeper, &mut op).await;
        assert!(matches!(outcome, RetryOutcome::Exhausted { attempts: 3 }));
        assert_eq!(op.calls, 3);

        // No backoff follows the final attempt.
        let slept = sleeper.slept.lock().unwrap();
        assert_eq!(slept.len(), 2);
        assert!(slept[0] >= Duration::from_secs(30) && slept[0] <= Duration::from_secs(40));
        assert!(slept[1] >= Duration::from_secs(60) && slept[1] <= Duration::from_secs(70));
    }

    #[test]
    fn test_backoff_without_jitter_doubles() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_secs(30),
            jitter_max: Duration::ZERO,
        };
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(30));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(60));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(120));
    }
}
