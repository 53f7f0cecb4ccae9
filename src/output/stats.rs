//! Per-run crawl statistics
//!
//! A `CrawlReport` is filled in by the coordinator while it runs and is
//! returned when the crawl reaches `Done`. Fetch failures and chunk failures
//! are counted here rather than silently dropped.

use crate::FetchError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// Every discovered in-scope URL was processed
    FrontierExhausted,
    /// The configured page budget was reached
    BudgetExhausted,
    /// An external stop signal was received
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FrontierExhausted => "frontier exhausted",
            Self::BudgetExhausted => "page budget exhausted",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Fetches issued (successful or not); never exceeds the page budget
    pub fetch_attempts: u32,

    /// Fetches that returned a usable body
    pub pages_fetched: u32,

    /// Failed fetches keyed by reason (`timeout`, `http_status(n)`, `transport`)
    pub fetch_failures: BTreeMap<String, u32>,

    /// Pages that were fetched but yielded no qualifying chunks
    pub pages_without_chunks: u32,

    /// Chunks accepted by the indexing service
    pub chunks_submitted: u64,

    /// Chunks lost to embedding or index failures
    pub chunk_failures: u64,

    /// Harvested links added to the frontier
    pub links_enqueued: u64,

    /// Harvested links rejected by the scope filter
    pub scope_rejections: u64,

    /// Fetched pages dropped because a redirect led out of scope or to a
    /// URL already seen
    pub redirects_skipped: u64,

    /// Distinct URLs ever enqueued (seed included)
    pub urls_visited: usize,

    /// URLs still waiting when the crawl stopped
    pub frontier_remaining: usize,

    pub stop_reason: Option<StopReason>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self {
            fetch_attempts: 0,
            pages_fetched: 0,
            fetch_failures: BTreeMap::new(),
            pages_without_chunks: 0,
            chunks_submitted: 0,
            chunk_failures: 0,
            links_enqueued: 0,
            scope_rejections: 0,
            redirects_skipped: 0,
            urls_visited: 0,
            frontier_remaining: 0,
            stop_reason: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_fetch_failure(&mut self, error: &FetchError) {
        *self.fetch_failures.entry(error.reason()).or_insert(0) += 1;
    }

    /// Total number of failed fetches across all reasons
    pub fn total_fetch_failures(&self) -> u32 {
        self.fetch_failures.values().sum()
    }

    pub fn finish(&mut self, reason: StopReason, urls_visited: usize, frontier_remaining: usize) {
        self.stop_reason = Some(reason);
        self.urls_visited = urls_visited;
        self.frontier_remaining = frontier_remaining;
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}

impl Default for CrawlReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    if let Some(reason) = report.stop_reason {
        println!("  Stopped: {}", reason);
    }
    if let Some(secs) = report.duration_seconds() {
        println!("  Duration: {:.1}s", secs);
    }
    println!("  Fetch attempts: {}", report.fetch_attempts);
    println!("  Pages fetched: {}", report.pages_fetched);
    println!("  Pages without chunks: {}", report.pages_without_chunks);
    println!("  URLs visited: {}", report.urls_visited);
    println!("  Frontier remaining: {}", report.frontier_remaining);
    println!();

    println!("Links:");
    println!("  Enqueued: {}", report.links_enqueued);
    println!("  Out of scope: {}", report.scope_rejections);
    println!("  Redirects skipped: {}", report.redirects_skipped);
    println!();

    println!("Indexing:");
    println!("  Chunks submitted: {}", report.chunks_submitted);
    println!("  Chunk failures: {}", report.chunk_failures);
    println!();

    if !report.fetch_failures.is_empty() {
        println!("Fetch Failures:");
        let mut counts: Vec<_> = report.fetch_failures.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (reason, count) in counts {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    let success_rate = if report.fetch_attempts > 0 {
        (report.pages_fetched as f64 / report.fetch_attempts as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Success Rate: {:.1}% ({} / {} fetches)",
        success_rate, report.pages_fetched, report.fetch_attempts
    );
}
