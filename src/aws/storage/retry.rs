use std::time::Duration;

use super::Error;

const BASE_DELAY: Duration = Duration::from_millis(30);
const MAX_DELAY: Duration = Duration::from_secs(20);

/// Fixed retry budget shared by every call of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: BASE_DELAY,
            max_delay: MAX_DELAY,
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// `attempt` counts the retries already done, 0 after the first failure.
    pub fn should_retry(&self, attempt: u32, error: &Error) -> bool {
        attempt < self.max_retries && error.is_retryable()
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }
}
