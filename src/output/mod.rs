//! Output module for crawl reports
//!
//! This module handles:
//! - Recording per-run crawl statistics
//! - Printing a human-readable summary when the crawl finishes

pub mod stats;

pub use stats::{print_report, CrawlReport, StopReason};
