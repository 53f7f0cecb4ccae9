//! HTTP fetcher implementation
//!
//! This module handles all page retrievals for the crawler, including:
//! - Building HTTP clients with the identifying user agent string
//! - Issuing one bounded-timeout GET per URL
//! - Classifying failures as timeout, HTTP status, or transport errors
//!
//! There are no retries here. A URL that fails is skipped for the rest of
//! the run by the coordinator.

use crate::config::UserAgentConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// A successfully retrieved page
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Page body content
    pub body: String,
}

/// Retrieves one page per call
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use apex_spider::config::UserAgentConfig;
/// use apex_spider::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "ApexSpider".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: Some("https://example.com/about".to_string()),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `reqwest`-backed page fetcher
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Fetches a URL
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | HTTP 2xx | `Ok(RawPage)` |
    /// | Any other status | `FetchError::HttpStatus(n)` |
    /// | Timeout (including while reading the body) | `FetchError::Timeout` |
    /// | Connection, TLS, redirect or decode failure | `FetchError::Transport` |
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(classify)?;

        Ok(RawPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}
