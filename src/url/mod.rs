//! URL handling module for Apex-Spider
//!
//! This module provides URL normalization, origin extraction, host pattern
//! matching, and the scope filter that decides which harvested links may
//! enter the frontier.

mod domain;
mod matcher;
mod normalize;

use crate::config::ScopeConfig;
use ::url::Url;

// Re-export main functions
pub use domain::origin_key;
pub use matcher::HostPattern;
pub use normalize::{normalize_parsed, normalize_url};

/// Pure predicate deciding whether a URL may be crawled
///
/// A URL is in scope iff:
/// 1. It has an HTTP(S) scheme and a non-empty host
/// 2. Its host matches at least one allowed-host pattern
/// 3. Its path contains none of the excluded markers (e.g. `:` for
///    namespace-prefixed wiki pages such as `Category:` or `Talk:`)
///
/// Malformed input is rejected, never an error.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    allowed_hosts: Vec<HostPattern>,
    excluded_path_markers: Vec<String>,
}

impl ScopeFilter {
    pub fn new<I, S>(allowed_hosts: I, excluded_path_markers: Vec<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|p| HostPattern::parse(p.as_ref()))
                .collect(),
            excluded_path_markers,
        }
    }

    pub fn from_config(config: &ScopeConfig) -> Self {
        Self::new(&config.allowed_hosts, config.excluded_path_markers.clone())
    }

    /// Checks a parsed URL against the scope rules
    ///
    /// # Examples
    ///
    /// ```
    /// use apex_spider::url::ScopeFilter;
    /// use url::Url;
    ///
    /// let filter = ScopeFilter::new(["en.wikipedia.org"], vec![":".to_string()]);
    /// let article = Url::parse("https://en.wikipedia.org/wiki/Robot").unwrap();
    /// let talk = Url::parse("https://en.wikipedia.org/wiki/Talk:Robot").unwrap();
    /// assert!(filter.is_in_scope(&article));
    /// assert!(!filter.is_in_scope(&talk));
    /// ```
    pub fn is_in_scope(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_lowercase(),
            _ => return false,
        };

        if !self.allowed_hosts.iter().any(|p| p.matches(&host)) {
            return false;
        }

        let path = url.path();
        !self
            .excluded_path_markers
            .iter()
            .any(|marker| path.contains(marker.as_str()))
    }

    /// Same as [`ScopeFilter::is_in_scope`] for unparsed input
    pub fn is_in_scope_str(&self, candidate: &str) -> bool {
        Url::parse(candidate)
            .map(|url| self.is_in_scope(&url))
            .unwrap_or(false)
    }
}
