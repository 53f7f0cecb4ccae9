//! Crawler module for focused breadth-first crawling
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a bounded timeout
//! - HTML content extraction into text chunks and links
//! - The breadth-first frontier and its visited-set guard
//! - Page budget and per-origin politeness pacing
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use extractor::{make_preview, ContentExtractor, ExtractedPage, HtmlExtractor, TextChunk};
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher, RawPage};
pub use frontier::Frontier;
pub use scheduler::{CrawlBudget, Pacer};
