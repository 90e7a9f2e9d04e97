use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Source of blocking waits, swapped for a recording fake in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Uniform random delay in `[min_secs, max_secs]` seconds.
pub fn uniform_delay(min_secs: f64, max_secs: f64) -> Duration {
    let min_secs = min_secs.max(0.0);
    if max_secs <= min_secs {
        return Duration::from_secs_f64(min_secs);
    }
    Duration::from_secs_f64(rand::rng().random_range(min_secs..=max_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_delay_within_bounds() {
        for _ in 0..100 {
            let delay = uniform_delay(3.0, 7.0).as_secs_f64();
            assert!((3.0..=7.0).contains(&delay));
        }
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(uniform_delay(2.0, 2.0), Duration::from_secs(2));
        assert_eq!(uniform_delay(0.0, 0.0), Duration::ZERO);
    }
}
