//! HTTP transport for page requests with optional rate limiting
//!
//! The paginator only sees [`PageTransport`]; this module is the `reqwest`
//! implementation used in production.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{clock::DefaultClock, state::{direct::NotKeyed, InMemoryState}, Quota, RateLimiter};
use reqwest::{header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT}, Client};

use crate::infrastructure::page_source::RequestDescriptor;
use crate::infrastructure::sync_error::TransportError;

/// Status and body of a completed page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one page request. Any received status is `Ok`, including errors.
#[async_trait]
pub trait PageTransport: Send + Sync {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<PageResponse, TransportError>;
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// 0 disables rate limiting
    pub max_requests_per_second: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "catalog-sync/0.2".to_string(),
            timeout_seconds: 30,
            max_requests_per_second: 0,
        }
    }
}

pub struct HttpClient {
    client: Client,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let rate_limiter = NonZeroU32::new(config.max_requests_per_second)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));

        Ok(Self {
            client,
            rate_limiter,
            config,
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[async_trait]
impl PageTransport for HttpClient {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<PageResponse, TransportError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| TransportError::InvalidRequest {
                url: request.url.clone(),
                reason: format!("Invalid header name {name}: {e}"),
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| TransportError::InvalidRequest {
                url: request.url.clone(),
                reason: format!("Invalid value for header {name}: {e}"),
            })?;
            builder = builder.header(header_name, header_value);
        }

        tracing::debug!("Fetching URL: {}", request.url);
        let response = builder.send().await.map_err(|e| classify(&request.url, &e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(&request.url, &e))?;

        tracing::debug!("Fetched: {} ({}, {} bytes)", request.url, status, body.len());
        Ok(PageResponse { status, body })
    }
}

fn classify(url: &str, error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout { url: url.to_string() }
    } else {
        TransportError::Connection {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
