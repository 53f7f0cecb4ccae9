//! Apex-Spider: a polite focused crawler that feeds a vector index
//!
//! Starting from a seed URL, this crate walks in-scope pages breadth-first,
//! extracts paragraph-level text chunks, embeds each chunk and submits it to
//! an external indexing service. A visited set and a page budget bound the
//! traversal independently.

pub mod config;
pub mod crawler;
pub mod indexer;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Apex-Spider operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Why a single page retrieval failed
///
/// Fetch failures are recorded and the crawl moves on; they never abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Stable reason label used in logs and crawl reports
    pub fn reason(&self) -> String {
        match self {
            Self::Timeout => "timeout".to_string(),
            Self::HttpStatus(code) => format!("http_status({})", code),
            Self::Transport(_) => "transport".to_string(),
        }
    }
}

/// Errors raised by an embedding provider
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding transport error: {0}")]
    Transport(String),

    #[error("embedding service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode embedding response: {0}")]
    Decode(String),

    #[error("expected {expected}-dimensional embedding, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("cannot embed empty text")]
    EmptyInput,
}

/// Errors raised while talking to the indexing service
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index transport error: {0}")]
    Transport(String),

    #[error("index service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode index response: {0}")]
    Decode(String),
}

/// Failure to submit one chunk; isolated to that chunk
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Result type alias for Apex-Spider operations
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Coordinator};
pub use output::CrawlReport;
pub use state::CrawlState;
pub use crate::url::{normalize_url, ScopeFilter};
