use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Apex-Spider
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub scope: ScopeConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub embedder: EmbedderConfig,
    pub index: IndexConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URL the crawl starts from
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Maximum number of pages fetched in one run
    #[serde(rename = "page-budget")]
    pub page_budget: u32,

    /// Maximum number of chunks submitted per page
    #[serde(rename = "max-chunks-per-page")]
    pub max_chunks_per_page: usize,

    /// Paragraphs must be strictly longer than this (in characters)
    #[serde(rename = "min-chunk-length")]
    pub min_chunk_length: usize,

    /// Minimum time between requests to the same origin (milliseconds)
    #[serde(rename = "politeness-delay")]
    pub politeness_delay: u64,

    /// Upper bound of a random extra pause added to the delay (milliseconds)
    #[serde(rename = "politeness-jitter", default)]
    pub politeness_jitter: u64,

    /// Per-request fetch timeout (milliseconds)
    #[serde(rename = "fetch-timeout")]
    pub fetch_timeout: u64,
}

impl CrawlerConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay)
    }

    pub fn politeness_jitter(&self) -> Duration {
        Duration::from_millis(self.politeness_jitter)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout)
    }
}

/// Which URLs may enter the frontier
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Host patterns (e.g., "en.wikipedia.org" or "*.example.org")
    #[serde(rename = "allowed-hosts")]
    pub allowed_hosts: Vec<String>,

    /// Path substrings that mark a URL as out of scope
    #[serde(rename = "excluded-path-markers", default = "default_excluded_markers")]
    pub excluded_path_markers: Vec<String>,
}

fn default_excluded_markers() -> Vec<String> {
    vec![":".to_string()]
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the identifying header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderProvider {
    /// OpenAI-compatible `/embeddings` endpoint
    Http,
    /// Deterministic offline feature hashing
    Hashing,
}

/// Embedding collaborator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedderConfig {
    pub provider: EmbedderProvider,

    /// Base URL of the embeddings API (required for `http`)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model identifier sent with each request
    #[serde(default)]
    pub model: Option<String>,

    /// Fixed dimensionality of every vector
    pub dimensions: usize,

    /// Request timeout (milliseconds)
    #[serde(default = "default_service_timeout")]
    pub timeout: u64,
}

/// Indexing service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Base URL exposing `/add` and `/search`
    pub endpoint: String,

    /// Request timeout (milliseconds)
    #[serde(default = "default_service_timeout")]
    pub timeout: u64,

    /// Number of characters kept in the stored preview
    #[serde(rename = "preview-length", default = "default_preview_length")]
    pub preview_length: usize,
}

fn default_service_timeout() -> u64 {
    10_000
}

fn default_preview_length() -> usize {
    200
}
