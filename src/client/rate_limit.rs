//! Sliding-window rate limiting
//!
//! The limiter keeps the instants of recent calls. Once the window is full the
//! oldest instant is evicted, and if it is younger than the interval the caller
//! sleeps until it has aged out, plus a small margin for clock skew.

use crate::config::RateLimitConfig;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Sliding-window limiter: at most `capacity` calls in any `interval`
#[derive(Debug)]
pub struct RateLimiter {
    window: VecDeque<Instant>,
    capacity: usize,
    interval: Duration,
    margin: Duration,
    max_sleep: Duration,
}

impl RateLimiter {
    /// Creates a limiter
    ///
    /// # Arguments
    /// * `capacity` - Calls allowed per window (clamped to at least 1)
    /// * `interval` - Window length
    /// * `margin` - Extra wait added to every limiter sleep
    /// * `max_sleep` - Upper bound on a single sleep
    pub fn new(capacity: usize, interval: Duration, margin: Duration, max_sleep: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            interval,
            margin,
            max_sleep,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.window_size,
            config.interval(),
            config.margin(),
            config.max_sleep(),
        )
    }

    /// Waits until one more call is permitted, then records it
    ///
    /// Returns the delay that was applied (zero when under budget). Calls are
    /// only ever delayed, never refused.
    pub async fn acquire(&mut self) -> Duration {
        let delay = self.admit(Instant::now());

        if !delay.is_zero() {
            tracing::info!("Rate limit reached. Sleeping for {:?}", delay);
            sleep(delay).await;
        }

        // Record the release instant so the window reflects when calls really went out
        self.window.push_back(Instant::now());
        tracing::trace!("Rate limit window size: {}", self.window.len());
        delay
    }

    /// Number of calls currently remembered
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Evicts the oldest instant once the window is full and computes the wait
    fn admit(&mut self, now: Instant) -> Duration {
        if self.window.len() + 1 < self.capacity {
            return Duration::ZERO;
        }

        let Some(oldest) = self.window.pop_front() else {
            return Duration::ZERO;
        };

        let span = now.saturating_duration_since(oldest);
        tracing::debug!("Rate limit window full, oldest call {:?} ago", span);

        if span >= self.interval {
            return Duration::ZERO;
        }

        (self.interval - span + self.margin).min(self.max_sleep)
    }
}
