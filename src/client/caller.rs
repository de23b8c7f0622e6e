use crate::client::retry::{call_with_retry, RetryPolicy};
use crate::client::{ApiError, ApiRequest, Page, RateLimiter, SlackApi};
use crate::config::RateLimitConfig;
use std::sync::Arc;

/// Counters for remote traffic made through one [`ApiCaller`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallStats {
    /// Successful API method calls
    pub calls: u64,

    /// Attempts, including retried ones
    pub attempts: u64,

    /// Successful downloads
    pub downloads: u64,
}

/// Rate-limited, retrying front door to a [`SlackApi`]
///
/// One caller exists per process; every remote call goes through it so that the
/// limiter sees all traffic.
pub struct ApiCaller {
    api: Arc<dyn SlackApi>,
    limiter: RateLimiter,
    policy: RetryPolicy,
    stats: CallStats,
}

impl ApiCaller {
    pub fn new(api: Arc<dyn SlackApi>, limiter: RateLimiter, policy: RetryPolicy) -> Self {
        Self {
            api,
            limiter,
            policy,
            stats: CallStats::default(),
        }
    }

    pub fn from_config(api: Arc<dyn SlackApi>, config: &RateLimitConfig) -> Self {
        Self::new(
            api,
            RateLimiter::from_config(config),
            RetryPolicy::from_config(config),
        )
    }

    /// Calls one API method, retrying transient failures
    pub async fn call(&mut self, request: &ApiRequest) -> Result<Page, ApiError> {
        let api: &dyn SlackApi = self.api.as_ref();
        let attempts = &mut self.stats.attempts;

        let data = call_with_retry(&mut self.limiter, &self.policy, request.method(), || {
            *attempts += 1;
            api.call(request)
        })
        .await?;

        self.stats.calls += 1;
        Ok(Page::new(data))
    }

    /// Downloads the bytes behind `url`, retrying transient failures
    pub async fn download(&mut self, url: &str) -> Result<Vec<u8>, ApiError> {
        let api: &dyn SlackApi = self.api.as_ref();
        let attempts = &mut self.stats.attempts;

        let bytes = call_with_retry(&mut self.limiter, &self.policy, url, || {
            *attempts += 1;
            api.download(url)
        })
        .await?;

        self.stats.downloads += 1;
        Ok(bytes)
    }

    pub fn stats(&self) -> CallStats {
        self.stats
    }
}
