// file: src/generation/rate_limit.rs
// description: request pacing and retry backoff for generative calls
// reference: https://docs.rs/tokio/latest/tokio/time

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Enforces a minimum interval between any two requests that share it.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// `requests_per_minute == 0` disables spacing.
    pub fn new(requests_per_minute: u32) -> Self {
        let min_interval = if requests_per_minute == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(60) / requests_per_minute
        };

        Self::with_interval(min_interval)
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the next request is allowed and claims the slot.
    /// Returns how long the caller was held back.
    pub async fn acquire(&self) -> Duration {
        let mut last_request = self.last_request.lock().await;

        let waited = match *last_request {
            Some(last) => {
                let ready_at = last + self.min_interval;
                ready_at.saturating_duration_since(Instant::now())
            }
            None => Duration::ZERO,
        };

        if !waited.is_zero() {
            debug!("Rate limiter holding request for {:?}", waited);
            sleep(waited).await;
        }

        *last_request = Some(Instant::now());
        waited
    }
}

/// Linear pacing before each attempt and doubled backoff after a transient
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Paid before attempt `attempt` (1-based), including the first.
    pub fn pre_request_delay(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Paid after a transient failure on attempt `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * attempt * 2
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(2000))
    }
}
