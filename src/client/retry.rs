//! Retry wrapper for remote calls
//!
//! This is the single place where the rate limiter is consulted: every attempt,
//! including retries, acquires the limiter first. Rate-limit rejections and
//! connection resets are retried after a fixed delay, without limit; all other
//! failures are returned to the caller unchanged.

use crate::client::{ApiError, ErrorKind, RateLimiter};
use crate::config::RateLimitConfig;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Fixed-delay retry policy for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.retry_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

/// Runs `call` until it succeeds or fails with a non-transient error
///
/// # Arguments
/// * `limiter` - Acquired before every attempt
/// * `policy` - Delay applied after each transient failure
/// * `target` - Method name or URL, for logging
/// * `call` - Produces a fresh attempt of the same remote invocation
pub async fn call_with_retry<T, F, Fut>(
    limiter: &mut RateLimiter,
    policy: &RetryPolicy,
    target: &str,
    mut call: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut retries: u32 = 0;

    loop {
        limiter.acquire().await;
        tracing::debug!("Making rate-limited call to {}", target);

        let err = match call().await {
            Ok(value) => {
                if retries > 0 {
                    tracing::debug!("{} succeeded after {} retries", target, retries);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        match err.kind() {
            ErrorKind::RateLimited => {
                tracing::info!("Rate limited. Sleeping for {:?}", policy.delay);
            }
            ErrorKind::ConnectionReset => {
                tracing::warn!("Connection reset by peer. Sleeping for {:?}", policy.delay);
            }
            ErrorKind::Other => return Err(err),
        }

        retries += 1;
        sleep(policy.delay).await;
    }
}
