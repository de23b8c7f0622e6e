//! Client module for rate-limited remote calls
//!
//! This module contains everything between the crawl logic and the network:
//! - The [`SlackApi`] seam and its HTTP implementation
//! - Sliding-window rate limiting
//! - Retry of transient failures with explicit error kinds
//! - Cursor and page-number pagination

mod api;
mod caller;
mod error;
pub mod pagination;
mod rate_limit;
pub mod retry;
mod slack;

pub use api::{ApiRequest, Continuation, Page, SlackApi};
pub use caller::{ApiCaller, CallStats};
pub use error::{is_connection_reset, ApiError, ErrorKind};
pub use pagination::{fetch_all, Pager, Paginated};
pub use rate_limit::RateLimiter;
pub use retry::{call_with_retry, RetryPolicy};
pub use slack::{build_http_client, check_envelope, SlackHttpClient};
