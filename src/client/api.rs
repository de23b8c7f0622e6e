//! The remote API seam
//!
//! Crawl logic only ever talks to [`SlackApi`]; the HTTP details live in
//! [`crate::client::SlackHttpClient`].

use crate::client::ApiError;
use async_trait::async_trait;
use serde_json::Value;

/// The ability to call Web API methods and fetch private file URLs
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Invokes one API method and returns its decoded, successful response
    async fn call(&self, request: &ApiRequest) -> Result<Value, ApiError>;

    /// Fetches the bytes behind an authenticated URL
    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

/// One API method invocation with its form parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiRequest {
    method: String,
    params: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Vec::new(),
        }
    }

    /// Adds or replaces a parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_param(key.into(), value.into());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a copy of this request positioned at `continuation`
    pub fn with_continuation(&self, continuation: Option<&Continuation>) -> Self {
        let mut request = self.clone();
        match continuation {
            Some(Continuation::Cursor(cursor)) => request.set_param("cursor".into(), cursor.clone()),
            Some(Continuation::Page(page)) => request.set_param("page".into(), page.to_string()),
            None => {}
        }
        request
    }

    fn set_param(&mut self, key: String, value: String) {
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
    }
}

/// Where the next page of a paginated method starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Opaque `response_metadata.next_cursor` token
    Cursor(String),

    /// Page number for methods that page with `paging.page` / `paging.pages`
    Page(u64),
}

/// One successful response of a paginated method
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    data: Value,
}

impl Page {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    /// The array stored under `key`, or an empty slice
    pub fn items(&self, key: &str) -> &[Value] {
        self.data
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The continuation for the following page; `None` ends pagination
    pub fn continuation(&self) -> Option<Continuation> {
        let cursor = self
            .data
            .pointer("/response_metadata/next_cursor")
            .and_then(Value::as_str)
            .filter(|cursor| !cursor.is_empty());
        if let Some(cursor) = cursor {
            return Some(Continuation::Cursor(cursor.to_string()));
        }

        let paging = self.data.get("paging")?;
        let page = paging.get("page").and_then(Value::as_u64)?;
        let pages = paging.get("pages").and_then(Value::as_u64)?;
        (page < pages).then(|| Continuation::Page(page + 1))
    }
}
