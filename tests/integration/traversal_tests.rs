//! Frontier behavior tests with deterministic fake collaborators
//!
//! The fetcher serves an in-memory link graph and the extractor reads one
//! link per body line, so these tests exercise traversal order, dedup,
//! budget and cancellation without HTML or sockets.

use crate::common::test_config;
use apex_spider::crawler::{
    ContentExtractor, Coordinator, ExtractedPage, PageFetcher, RawPage, TextChunk,
};
use apex_spider::indexer::{ChunkIndexer, HashingEmbedder, InMemoryIndex};
use apex_spider::output::StopReason;
use apex_spider::{CrawlState, FetchError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

const ROOT: &str = "https://example.org";

/// Serves a link graph and records every fetch
#[derive(Default)]
struct GraphFetcher {
    graph: HashMap<String, Vec<String>>,
    /// When set, every page links to two fresh pages
    unbounded: bool,
    /// Cancelled when this path is fetched
    cancel_on: Option<(String, CancellationToken)>,
    log: Mutex<Vec<String>>,
}

impl GraphFetcher {
    fn new(edges: &[(&str, &[&str])]) -> Self {
        let graph = edges
            .iter()
            .map(|(from, to)| {
                (
                    format!("{}{}", ROOT, from),
                    to.iter().map(|t| format!("{}{}", ROOT, t)).collect(),
                )
            })
            .collect();
        Self {
            graph,
            ..Self::default()
        }
    }

    fn unbounded() -> Self {
        Self {
            unbounded: true,
            ..Self::default()
        }
    }

    fn cancel_on(mut self, path: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((format!("{}{}", ROOT, path), token));
        self
    }

    fn fetched_paths(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.trim_start_matches(ROOT).to_string())
            .collect()
    }
}

#[async_trait]
impl PageFetcher for GraphFetcher {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> Result<RawPage, FetchError> {
        self.log.lock().unwrap().push(url.to_string());

        if let Some((target, token)) = &self.cancel_on {
            if target == url.as_str() {
                token.cancel();
            }
        }

        let links = if self.unbounded {
            let n: u64 = url.path().trim_start_matches("/p").parse().unwrap_or(0);
            vec![
                format!("{}/p{}", ROOT, 2 * n + 1),
                format!("{}/p{}", ROOT, 2 * n + 2),
            ]
        } else {
            match self.graph.get(url.as_str()) {
                Some(links) => links.clone(),
                None => return Err(FetchError::HttpStatus(404)),
            }
        };

        Ok(RawPage {
            url: url.clone(),
            status: 200,
            body: links.join("\n"),
        })
    }
}

/// One link per body line, one chunk per page
struct LineExtractor;

impl ContentExtractor for LineExtractor {
    fn extract(&self, page: &RawPage) -> ExtractedPage {
        ExtractedPage {
            chunks: vec![TextChunk::new(
                page.url.clone(),
                0,
                format!("text of {}", page.url.path()),
                200,
            )],
            links: page.body.lines().filter_map(|l| Url::parse(l).ok()).collect(),
        }
    }
}

fn coordinator(fetcher: Arc<GraphFetcher>, start: &str, budget: u32) -> Coordinator {
    let config = test_config(
        &format!("{}{}", ROOT, start),
        &["example.org"],
        budget,
        5,
        "http://127.0.0.1:9",
    );
    let indexer = ChunkIndexer::new(
        Arc::new(HashingEmbedder::new(16)),
        Arc::new(InMemoryIndex::new()),
    );
    Coordinator::new(&config, fetcher, Arc::new(LineExtractor), indexer).unwrap()
}

#[tokio::test]
async fn test_breadth_first_order() {
    // Depth 0: a; depth 1: b, c; depth 2: d, e, f; depth 3: g
    let fetcher = Arc::new(GraphFetcher::new(&[
        ("/a", &["/b", "/c"]),
        ("/b", &["/d", "/e"]),
        ("/c", &["/f"]),
        ("/d", &["/g"]),
        ("/e", &[]),
        ("/f", &[]),
        ("/g", &[]),
    ]));
    let mut coordinator = coordinator(fetcher.clone(), "/a", 100);

    let report = coordinator.run().await.unwrap();

    assert_eq!(
        fetcher.fetched_paths(),
        vec!["/a", "/b", "/c", "/d", "/e", "/f", "/g"]
    );
    assert_eq!(report.stop_reason, Some(StopReason::FrontierExhausted));
}

#[tokio::test]
async fn test_cycles_never_refetch() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        ("/a", &["/b", "/c", "/a", "/b"]),
        ("/b", &["/a", "/c", "/b?utm_source=feed"]),
        ("/c", &["/a", "/b", "/c#section"]),
    ]));
    let mut coordinator = coordinator(fetcher.clone(), "/a", 100);

    let report = coordinator.run().await.unwrap();

    let fetched = fetcher.fetched_paths();
    let unique: HashSet<_> = fetched.iter().collect();
    assert_eq!(fetched.len(), unique.len());
    assert_eq!(fetched, vec!["/a", "/b", "/c"]);
    assert_eq!(report.urls_visited, 3);
    assert_eq!(report.links_enqueued, 2);
}

#[tokio::test]
async fn test_out_of_scope_links_never_enter_frontier() {
    let mut fetcher = GraphFetcher::new(&[("/a", &["/b"]), ("/b", &[])]);
    fetcher.graph.get_mut(&format!("{}/a", ROOT)).unwrap().extend([
        "https://other.org/x".to_string(),
        "https://other.org/x".to_string(),
        format!("{}/wiki/Talk:Robot", ROOT),
        "ftp://example.org/file".to_string(),
    ]);
    let fetcher = Arc::new(fetcher);
    let mut coordinator = coordinator(fetcher.clone(), "/a", 100);

    let report = coordinator.run().await.unwrap();

    assert_eq!(fetcher.fetched_paths(), vec!["/a", "/b"]);
    assert_eq!(report.scope_rejections, 4);
    assert_eq!(report.urls_visited, 2);
    assert!(!coordinator
        .frontier()
        .has_visited(&Url::parse("https://other.org/x").unwrap()));
}

#[tokio::test]
async fn test_budget_bounds_unbounded_graph() {
    let fetcher = Arc::new(GraphFetcher::unbounded());
    let mut coordinator = coordinator(fetcher.clone(), "/p0", 7);

    let report = coordinator.run().await.unwrap();

    assert_eq!(
        fetcher.fetched_paths(),
        vec!["/p0", "/p1", "/p2", "/p3", "/p4", "/p5", "/p6"]
    );
    assert_eq!(report.fetch_attempts, 7);
    assert_eq!(report.stop_reason, Some(StopReason::BudgetExhausted));
    assert_eq!(coordinator.state(), CrawlState::Done);
    assert!(report.frontier_remaining > 0);
}

#[tokio::test]
async fn test_failures_count_against_budget() {
    // Every link except /a is missing and fails with 404
    let fetcher = Arc::new(GraphFetcher::new(&[(
        "/a",
        &["/x1", "/x2", "/x3", "/x4", "/x5"],
    )]));
    let mut coordinator = coordinator(fetcher.clone(), "/a", 4);

    let report = coordinator.run().await.unwrap();

    assert_eq!(fetcher.fetched_paths().len(), 4);
    assert_eq!(report.fetch_attempts, 4);
    assert_eq!(report.fetch_failures.get("http_status(404)"), Some(&3));
    assert_eq!(report.stop_reason, Some(StopReason::BudgetExhausted));
}

#[tokio::test]
async fn test_cancellation_stops_between_pages() {
    let cancel = CancellationToken::new();
    let fetcher = Arc::new(
        GraphFetcher::new(&[
            ("/a", &["/b", "/c"]),
            ("/b", &["/d"]),
            ("/c", &[]),
            ("/d", &[]),
        ])
        .cancel_on("/b", cancel.clone()),
    );
    let mut coordinator = coordinator(fetcher.clone(), "/a", 100).with_cancellation(cancel);

    let report = coordinator.run().await.unwrap();

    // The in-flight page finishes; nothing after it is fetched
    assert_eq!(fetcher.fetched_paths(), vec!["/a", "/b"]);
    assert_eq!(report.stop_reason, Some(StopReason::Cancelled));
    assert_eq!(coordinator.state(), CrawlState::Done);

    // Frontier and visited set stay consistent: c and d are pending and visited
    assert_eq!(report.frontier_remaining, 2);
    assert_eq!(report.urls_visited, 4);
}

#[tokio::test]
async fn test_cancellation_interrupts_politeness_wait() {
    let cancel = CancellationToken::new();
    let fetcher = Arc::new(GraphFetcher::new(&[("/a", &["/b"]), ("/b", &[])]));
    let mut config = test_config(
        &format!("{}/a", ROOT),
        &["example.org"],
        10,
        5,
        "http://127.0.0.1:9",
    );
    config.crawler.politeness_delay = 60_000;
    let indexer = ChunkIndexer::new(
        Arc::new(HashingEmbedder::new(16)),
        Arc::new(InMemoryIndex::new()),
    );
    let mut coordinator = Coordinator::new(&config, fetcher.clone(), Arc::new(LineExtractor), indexer)
        .unwrap()
        .with_cancellation(cancel.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), coordinator.run())
        .await
        .expect("cancellation should end the politeness wait")
        .unwrap();
    canceller.await.unwrap();

    assert_eq!(fetcher.fetched_paths(), vec!["/a"]);
    assert_eq!(report.stop_reason, Some(StopReason::Cancelled));

    // The page that was waiting is still pending, not lost
    assert_eq!(report.frontier_remaining, 1);
    assert_eq!(report.urls_visited, 2);
    assert_eq!(coordinator.frontier().len(), 1);
}
