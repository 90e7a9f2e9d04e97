pub mod retry;
pub mod time;

pub use retry::{RetryOutcome, RetryPolicy, Retryable};
pub use time::{Sleeper, TokioSleeper, uniform_delay};
