//! HTTP implementation of the Slack Web API seam
//!
//! This module handles:
//! - Building the HTTP client with timeouts and a user agent
//! - Form-encoded method calls authenticated with a bearer token
//! - Decoding the `{ "ok": ..., "error": ... }` response envelope
//! - Mapping HTTP and envelope failures onto [`ApiError`] kinds

use crate::client::{ApiError, ApiRequest, SlackApi};
use crate::config::ApiConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Envelope error code Slack uses for rate-limit rejections
const RATE_LIMITED_CODE: &str = "ratelimited";

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!("slack-archiver/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Slack Web API client over HTTP
pub struct SlackHttpClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl SlackHttpClient {
    /// Creates a client for `config.base_url` authenticated with `token`
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ApiError::Transport {
            target: config.base_url.clone(),
            message: e.to_string(),
        })?;

        let client =
            build_http_client(config).map_err(|e| ApiError::from_reqwest(&config.base_url, e))?;

        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> Result<Url, ApiError> {
        self.base_url.join(method).map_err(|e| ApiError::Transport {
            target: method.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl SlackApi for SlackHttpClient {
    async fn call(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let method = request.method();
        let url = self.method_url(method)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .form(request.params())
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(method, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited {
                target: method.to_string(),
            });
        }

        if !status.is_success() {
            return Err(ApiError::Http {
                target: method.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::from_reqwest(method, e))?;

        check_envelope(method, body)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(url, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited {
                target: url.to_string(),
            });
        }

        if !status.is_success() {
            return Err(ApiError::Http {
                target: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_reqwest(url, e))?;
        Ok(bytes.to_vec())
    }
}

/// Accepts a response body whose `ok` flag is true, classifying any other body
pub fn check_envelope(method: &str, body: Value) -> Result<Value, ApiError> {
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(body);
    }

    let code = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error");

    if code == RATE_LIMITED_CODE {
        return Err(ApiError::RateLimited {
            target: method.to_string(),
        });
    }

    Err(ApiError::Api {
        method: method.to_string(),
        code: code.to_string(),
    })
}
