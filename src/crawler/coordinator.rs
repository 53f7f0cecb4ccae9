//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop. The coordinator exclusively owns
//! the frontier, the visited set, the page budget and the pacer, and drives
//! the fetch → extract → index → harvest cycle one page at a time.

use crate::config::Config;
use crate::crawler::extractor::{ContentExtractor, HtmlExtractor};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher, RawPage};
use crate::crawler::frontier::Frontier;
use crate::crawler::scheduler::{CrawlBudget, Pacer};
use crate::indexer::{build_embedder, ChunkIndexer, HttpIndexClient};
use crate::output::{CrawlReport, StopReason};
use crate::state::CrawlState;
use crate::url::{normalize_parsed, normalize_url, origin_key, ScopeFilter};
use crate::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    scope: ScopeFilter,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn ContentExtractor>,
    indexer: ChunkIndexer,
    frontier: Frontier,
    budget: CrawlBudget,
    pacer: Pacer,
    state: CrawlState,
    cancel: CancellationToken,
    fetch_timeout: Duration,
    max_chunks_per_page: usize,
}

impl Coordinator {
    /// Creates a coordinator from explicit collaborators
    ///
    /// The frontier starts out holding only the normalized start URL.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Retrieves pages
    /// * `extractor` - Splits pages into chunks and links
    /// * `indexer` - Embeds chunks and submits them to the index
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn ContentExtractor>,
        indexer: ChunkIndexer,
    ) -> Result<Self> {
        let seed = normalize_url(&config.crawler.start_url)?;
        let scope = ScopeFilter::from_config(&config.scope);

        if !scope.is_in_scope(&seed) {
            tracing::warn!("Start URL {} is outside the configured scope", seed);
        }

        Ok(Self {
            scope,
            fetcher,
            extractor,
            indexer,
            frontier: Frontier::seeded(seed),
            budget: CrawlBudget::new(config.crawler.page_budget),
            pacer: Pacer::from_config(&config.crawler),
            state: CrawlState::Idle,
            cancel: CancellationToken::new(),
            fetch_timeout: config.crawler.fetch_timeout(),
            max_chunks_per_page: config.crawler.max_chunks_per_page,
        })
    }

    /// Creates a coordinator backed by HTTP fetching, HTML extraction, the
    /// configured embedder and the HTTP indexing service
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.user_agent)?;
        let extractor = HtmlExtractor::new(
            config.crawler.min_chunk_length,
            config.index.preview_length,
        );
        let embedder = build_embedder(&config.embedder)?;
        let sink = HttpIndexClient::new(
            &config.index.endpoint,
            Duration::from_millis(config.index.timeout),
        )?;

        Self::new(
            config,
            Arc::new(fetcher),
            Arc::new(extractor),
            ChunkIndexer::new(embedder, Arc::new(sink)),
        )
    }

    /// Replaces the stop signal with an externally owned token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the crawl when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn budget(&self) -> &CrawlBudget {
        &self.budget
    }

    fn transition(&mut self, next: CrawlState) -> Result<()> {
        self.state = self.state.transition(next)?;
        Ok(())
    }

    /// Runs the main crawl loop until the frontier empties, the budget is
    /// spent, or the crawl is cancelled
    ///
    /// Each iteration:
    /// 1. Checks the stop signal and the budget
    /// 2. Pops the oldest frontier URL
    /// 3. Waits out the politeness delay for that URL's origin
    /// 4. Fetches the page (a failure is recorded and the URL is never retried)
    /// 5. Indexes at most `max-chunks-per-page` chunks
    /// 6. Enqueues in-scope, unseen links
    /// 7. Records the request with the pacer, success or failure
    ///
    /// Fetch and chunk failures never end the crawl. Calling `run` on a
    /// coordinator that already ran returns an invalid-transition error.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.transition(CrawlState::Running)?;

        let mut report = CrawlReport::new();
        let start_time = Instant::now();

        tracing::info!(
            "Starting crawl with budget of {} pages",
            self.budget.remaining()
        );

        let stop = loop {
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            if self.budget.is_exhausted() {
                self.transition(CrawlState::BudgetExhausted)?;
                break StopReason::BudgetExhausted;
            }

            let url = match self.frontier.dequeue() {
                Some(url) => url,
                None => {
                    self.transition(CrawlState::Draining)?;
                    break StopReason::FrontierExhausted;
                }
            };
            self.transition(CrawlState::Running)?;

            let origin = origin_key(&url).unwrap_or_else(|| url.as_str().to_string());

            if !self.wait_for_origin(&origin).await {
                self.frontier.restore(url);
                break StopReason::Cancelled;
            }

            if !self.budget.try_consume() {
                self.frontier.restore(url);
                self.transition(CrawlState::BudgetExhausted)?;
                break StopReason::BudgetExhausted;
            }
            report.fetch_attempts = self.budget.used();

            tracing::debug!("Fetching {}", url);
            let fetched = {
                let cancel = self.cancel.clone();
                let fetcher = Arc::clone(&self.fetcher);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = fetcher.fetch(&url, self.fetch_timeout) => Some(result),
                }
            };

            match fetched {
                None => {
                    self.pacer.record_request(&origin);
                    break StopReason::Cancelled;
                }
                Some(Err(e)) => {
                    tracing::warn!("Failed to fetch {}: {}", url, e);
                    report.record_fetch_failure(&e);
                }
                Some(Ok(page)) => {
                    report.pages_fetched += 1;
                    if self.accept_final_url(&url, &page.url, &mut report) {
                        self.process_page(&url, page, &mut report).await;
                    }
                }
            }

            self.pacer.record_request(&origin);

            if report.fetch_attempts % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = report.fetch_attempts as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} pages fetched, {} in frontier, {} chunks indexed, {:.2} pages/sec",
                    report.fetch_attempts,
                    self.frontier.len(),
                    report.chunks_submitted,
                    rate
                );
            }
        };

        if stop == StopReason::Cancelled {
            tracing::info!("Crawl cancelled, stopping");
        }
        self.transition(CrawlState::Done)?;

        report.finish(stop, self.frontier.visited_len(), self.frontier.len());

        tracing::info!(
            "Crawl completed ({}): {} pages fetched, {} chunks indexed in {:?}",
            stop,
            report.pages_fetched,
            report.chunks_submitted,
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Sleeps until `origin` may be requested again
    ///
    /// Returns `false` if the crawl was cancelled while waiting.
    async fn wait_for_origin(&self, origin: &str) -> bool {
        let wait = match self.pacer.time_until_ready(origin, Instant::now()) {
            Some(wait) => wait,
            None => return true,
        };

        tracing::trace!("Waiting {:?} before next request to {}", wait, origin);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(wait) => true,
        }
    }

    /// Decides whether a page reached through redirects may be processed
    ///
    /// The final URL must be in scope and must not have been seen before.
    /// An accepted redirect target is added to the visited set so that a
    /// later link to it is not fetched again.
    fn accept_final_url(
        &mut self,
        requested: &Url,
        final_url: &Url,
        report: &mut CrawlReport,
    ) -> bool {
        let same = normalize_parsed(final_url.clone())
            .map(|n| n == *requested)
            .unwrap_or(false);
        if same {
            return true;
        }

        if !self.scope.is_in_scope(final_url) {
            tracing::warn!(
                "{} redirected out of scope to {}, skipping",
                requested,
                final_url
            );
            report.redirects_skipped += 1;
            return false;
        }

        if !self.frontier.mark_visited(final_url) {
            tracing::debug!(
                "{} redirected to already seen {}, skipping",
                requested,
                final_url
            );
            report.redirects_skipped += 1;
            return false;
        }

        tracing::debug!("Following redirect from {} to {}", requested, final_url);
        true
    }

    /// Indexes a fetched page's chunks and harvests its links
    async fn process_page(&mut self, requested: &Url, page: RawPage, report: &mut CrawlReport) {
        let extracted = self.extractor.extract(&page);

        if extracted.chunks.is_empty() {
            tracing::debug!("No usable chunks on {}", requested);
            report.pages_without_chunks += 1;
        } else {
            let total = extracted.chunks.len();
            let capped = extracted.chunks.into_iter().take(self.max_chunks_per_page);
            let outcome = self.indexer.index_page(capped).await;

            tracing::debug!(
                "Indexed {}/{} chunks from {} ({} failed)",
                outcome.submitted,
                total,
                requested,
                outcome.failed
            );
            report.chunks_submitted += outcome.submitted as u64;
            report.chunk_failures += outcome.failed as u64;
        }

        let mut enqueued = 0usize;
        for link in extracted.links {
            if !self.scope.is_in_scope(&link) {
                tracing::trace!("Out of scope: {}", link);
                report.scope_rejections += 1;
                continue;
            }
            if self.frontier.try_enqueue(link) {
                enqueued += 1;
            }
        }
        report.links_enqueued += enqueued as u64;

        tracing::debug!(
            "Found {} new links on {}. Frontier size: {}",
            enqueued,
            requested,
            self.frontier.len()
        );
    }
}

/// Runs a complete crawl with the HTTP-backed collaborators
///
/// # Example
///
/// ```no_run
/// use apex_spider::config::load_config;
/// use apex_spider::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("spider.toml"))?;
/// let report = run_crawl(&config, CancellationToken::new()).await?;
/// println!("{} chunks indexed", report.chunks_submitted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, cancel: CancellationToken) -> Result<CrawlReport> {
    let mut coordinator = Coordinator::from_config(config)?.with_cancellation(cancel);
    coordinator.run().await
}
