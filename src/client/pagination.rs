//! Pagination helper for Web API methods
//!
//! Provides the generic "fetch all pages" loop used for every paginated method:
//! - [`Pager`] yields one page at a time so callers can persist as they go
//! - [`fetch_all`] drains a pager into a flat item list plus every raw page
//!
//! Termination happens exactly when a page carries no continuation. There is
//! no iteration cap; transient failures are absorbed by the retry wrapper.

use crate::client::{ApiCaller, ApiError, ApiRequest, Continuation, Page};
use serde_json::Value;
use tracing::{debug, info};

/// Result of draining a paginated method
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paginated {
    /// Concatenation of every page's extracted items, in page order
    pub items: Vec<Value>,

    /// Every raw response, in fetch order
    pub pages: Vec<Value>,
}

/// Cursor-following page stream over one request
#[derive(Debug, Clone)]
pub struct Pager {
    request: ApiRequest,
    next: Option<Continuation>,
    exhausted: bool,
    fetched: usize,
}

impl Pager {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            next: None,
            exhausted: false,
            fetched: 0,
        }
    }

    /// Fetches the next page, or returns `None` once the continuation ran out
    pub async fn next_page(&mut self, caller: &mut ApiCaller) -> Result<Option<Page>, ApiError> {
        if self.exhausted {
            return Ok(None);
        }

        let request = self.request.with_continuation(self.next.as_ref());
        info!(
            "Getting next of {} with {:?}",
            self.request.method(),
            self.next
        );

        let page = caller.call(&request).await?;
        self.fetched += 1;
        self.next = page.continuation();
        self.exhausted = self.next.is_none();

        debug!(
            "Page {} of {} received, more pages: {}",
            self.fetched,
            self.request.method(),
            !self.exhausted
        );

        Ok(Some(page))
    }

    /// Number of pages fetched so far
    pub fn pages_fetched(&self) -> usize {
        self.fetched
    }

    pub fn request(&self) -> &ApiRequest {
        &self.request
    }
}

/// Fetches every page of `request`
///
/// # Arguments
/// * `caller` - Rate-limited, retrying caller
/// * `request` - First-page request; the continuation parameter is managed here
/// * `extract_key` - When set, the array under this key in each page is collected
///
/// # Returns
/// Flattened items and the raw page list
pub async fn fetch_all(
    caller: &mut ApiCaller,
    request: ApiRequest,
    extract_key: Option<&str>,
) -> Result<Paginated, ApiError> {
    let mut pager = Pager::new(request);
    let mut result = Paginated::default();

    while let Some(page) = pager.next_page(caller).await? {
        if let Some(key) = extract_key {
            result.items.extend(page.items(key).iter().cloned());
        }
        result.pages.push(page.into_data());
    }

    debug!(
        "Pagination of {} completed after {} pages, {} items",
        pager.request().method(),
        result.pages.len(),
        result.items.len()
    );

    Ok(result)
}
