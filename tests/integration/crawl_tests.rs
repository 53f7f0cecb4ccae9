//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use crate::common::{html_page, paragraph, test_config, unreachable_uri};
use apex_spider::config::Config;
use apex_spider::crawler::{run_crawl, Coordinator, HtmlExtractor, HttpFetcher};
use apex_spider::indexer::{ChunkIndexer, Embedder, HashingEmbedder, InMemoryIndex, IndexSink};
use apex_spider::output::StopReason;
use apex_spider::CrawlState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Index server that accepts every document
async fn accepting_index() -> MockServer {
    let index = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/add"))
        .respond_with(ResponseTemplate::new(200).set_body_string("saved"))
        .mount(&index)
        .await;
    index
}

/// Real fetcher and extractor, hashing embedder, in-memory index
fn offline_coordinator(config: &Config) -> (Coordinator, Arc<InMemoryIndex>, Arc<HashingEmbedder>) {
    let index = Arc::new(InMemoryIndex::new());
    let embedder = Arc::new(HashingEmbedder::new(config.embedder.dimensions));
    let coordinator = Coordinator::new(
        config,
        Arc::new(HttpFetcher::new(&config.user_agent).expect("http client")),
        Arc::new(HtmlExtractor::new(
            config.crawler.min_chunk_length,
            config.index.preview_length,
        )),
        ChunkIndexer::new(embedder.clone(), index.clone()),
    )
    .expect("coordinator");
    (coordinator, index, embedder)
}

/// Paths requested from `server`, in arrival order
async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_full_crawl_indexes_and_searches() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html_page("home", 2, &[format!("{}/page1", base), "/page2".to_string()]),
    )
    .await;
    mount_page(&server, "/page1", html_page("page1", 3, &[])).await;
    mount_page(&server, "/page2", html_page("page2", 1, &["/page1#top".to_string()])).await;

    let config = test_config(&format!("{}/", base), &["127.0.0.1"], 10, 5, &unreachable_uri());
    let (mut coordinator, index, embedder) = offline_coordinator(&config);

    let report = coordinator.run().await.unwrap();

    assert_eq!(coordinator.state(), CrawlState::Done);
    assert_eq!(report.stop_reason, Some(StopReason::FrontierExhausted));
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.chunks_submitted, 6);
    assert_eq!(report.chunk_failures, 0);
    assert_eq!(report.urls_visited, 3);
    assert_eq!(index.len().await, 6);

    // Searching for a chunk's exact source text finds that chunk
    let vector = embedder.embed(&paragraph("page1", 2)).await.unwrap();
    let hits = index.search(&vector, 3).await.unwrap();
    let expected = format!("{}/page1_2", base);
    assert!(
        hits.iter().any(|h| h.id() == Some(expected.as_str())),
        "expected {} among {:?}",
        expected,
        hits
    );
}

#[tokio::test]
async fn test_budget_stops_breadth_first_crawl() {
    let site = MockServer::start().await;
    let index = accepting_index().await;

    // Reached through "localhost", which is not an allowed host
    let other = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&other)
        .await;
    let out_of_scope = format!("http://localhost:{}/x", other.address().port());

    mount_page(
        &site,
        "/a",
        html_page("a", 1, &["/b".to_string(), "/c".to_string(), out_of_scope]),
    )
    .await;
    mount_page(&site, "/b", html_page("b", 1, &["/d".to_string()])).await;
    mount_page(&site, "/c", html_page("c", 1, &["/e".to_string()])).await;
    mount_page(&site, "/d", html_page("d", 1, &[])).await;
    mount_page(&site, "/e", html_page("e", 1, &[])).await;

    let config = test_config(
        &format!("{}/a", site.uri()),
        &["127.0.0.1"],
        3,
        5,
        &index.uri(),
    );

    let report = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(requested_paths(&site).await, vec!["/a", "/b", "/c"]);
    assert_eq!(report.stop_reason, Some(StopReason::BudgetExhausted));
    assert_eq!(report.fetch_attempts, 3);
    assert_eq!(report.scope_rejections, 1);
    assert_eq!(report.frontier_remaining, 2);
    assert_eq!(report.chunks_submitted, 3);
}

#[tokio::test]
async fn test_transport_failure_is_skipped() {
    let site = MockServer::start().await;
    let dead = unreachable_uri();
    let failing_page = format!("{}/b", dead);

    mount_page(
        &site,
        "/a",
        html_page("a", 1, &[failing_page.clone(), "/c".to_string()]),
    )
    .await;
    mount_page(&site, "/c", html_page("c", 2, &[])).await;

    let config = test_config(
        &format!("{}/a", site.uri()),
        &["127.0.0.1"],
        10,
        5,
        &unreachable_uri(),
    );
    let (mut coordinator, index, _) = offline_coordinator(&config);

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::FrontierExhausted));
    assert_eq!(report.fetch_attempts, 3);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.fetch_failures.get("transport"), Some(&1));
    assert!(coordinator
        .frontier()
        .has_visited(&url::Url::parse(&failing_page).unwrap()));

    let docs = index.documents().await;
    assert_eq!(docs.len(), 3);
    assert!(docs
        .iter()
        .all(|d| !d.url.as_deref().unwrap_or_default().starts_with(&dead)));
}

#[tokio::test]
async fn test_chunk_cap_per_page() {
    let site = MockServer::start().await;
    let index = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/add"))
        .respond_with(ResponseTemplate::new(200))
        .expect(5)
        .mount(&index)
        .await;

    mount_page(&site, "/long", html_page("long", 8, &[])).await;

    let config = test_config(
        &format!("{}/long", site.uri()),
        &["127.0.0.1"],
        5,
        5,
        &index.uri(),
    );

    let report = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.chunks_submitted, 5);
}

#[tokio::test]
async fn test_http_errors_are_recorded() {
    let site = MockServer::start().await;
    let index = accepting_index().await;

    mount_page(
        &site,
        "/a",
        html_page("a", 1, &["/missing".to_string(), "/c".to_string()]),
    )
    .await;
    mount_page(&site, "/c", html_page("c", 1, &[])).await;

    let config = test_config(
        &format!("{}/a", site.uri()),
        &["127.0.0.1"],
        10,
        5,
        &index.uri(),
    );

    let report = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.fetch_failures.get("http_status(404)"), Some(&1));
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(requested_paths(&site).await, vec!["/a", "/missing", "/c"]);
}

#[tokio::test]
async fn test_index_outage_does_not_stop_crawl() {
    let site = MockServer::start().await;
    let index = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/add"))
        .respond_with(ResponseTemplate::new(500).set_body_string("DB Error: locked"))
        .mount(&index)
        .await;

    mount_page(&site, "/a", html_page("a", 2, &["/b".to_string()])).await;
    mount_page(&site, "/b", html_page("b", 2, &[])).await;

    let config = test_config(
        &format!("{}/a", site.uri()),
        &["127.0.0.1"],
        10,
        5,
        &index.uri(),
    );

    let report = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::FrontierExhausted));
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.chunks_submitted, 0);
    assert_eq!(report.chunk_failures, 4);
}

#[tokio::test]
async fn test_pages_without_chunks() {
    let site = MockServer::start().await;
    let index = accepting_index().await;

    mount_page(
        &site,
        "/a",
        "<html><body><p>short</p><a href=\"/b\">b</a></body></html>".to_string(),
    )
    .await;
    mount_page(&site, "/b", html_page("b", 1, &[])).await;

    let config = test_config(
        &format!("{}/a", site.uri()),
        &["127.0.0.1"],
        10,
        5,
        &index.uri(),
    );

    let report = run_crawl(&config, CancellationToken::new()).await.unwrap();

    // Links are still followed from a page with no usable text
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.pages_without_chunks, 1);
    assert_eq!(report.chunks_submitted, 1);
}

#[tokio::test]
async fn test_user_agent_header_is_sent() {
    let site = MockServer::start().await;
    let index = accepting_index().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("a", 1, &[])))
        .expect(1)
        .mount(&site)
        .await;

    let config = test_config(
        &format!("{}/a", site.uri()),
        &["127.0.0.1"],
        1,
        5,
        &index.uri(),
    );

    let report = run_crawl(&config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.pages_fetched, 1);
}

#[tokio::test]
async fn test_politeness_delay_between_same_origin_requests() {
    let site = MockServer::start().await;
    let index = accepting_index().await;

    mount_page(&site, "/a", html_page("a", 1, &["/b".to_string()])).await;
    mount_page(&site, "/b", html_page("b", 1, &["/c".to_string()])).await;
    mount_page(&site, "/c", html_page("c", 1, &[])).await;

    let mut config = test_config(
        &format!("{}/a", site.uri()),
        &["127.0.0.1"],
        10,
        5,
        &index.uri(),
    );
    config.crawler.politeness_delay = 150;

    let started = Instant::now();
    let report = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.pages_fetched, 3);
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_redirect_out_of_scope_is_not_indexed() {
    let site = MockServer::start().await;

    // Same listener, but "localhost" is not an allowed host
    let other = MockServer::start().await;
    mount_page(&other, "/x", html_page("x", 3, &[])).await;
    let foreign = format!("http://localhost:{}/x", other.address().port());

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", foreign.as_str()))
        .mount(&site)
        .await;

    let config = test_config(
        &format!("{}/a", site.uri()),
        &["127.0.0.1"],
        10,
        5,
        &unreachable_uri(),
    );
    let (mut coordinator, index, _) = offline_coordinator(&config);

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::FrontierExhausted));
    assert_eq!(report.redirects_skipped, 1);
    assert_eq!(report.chunks_submitted, 0);
    assert!(index.is_empty().await);
}

#[tokio::test]
async fn test_redirect_target_is_fetched_once() {
    let site = MockServer::start().await;

    mount_page(&site, "/a", html_page("a", 1, &["/old".to_string()])).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&site)
        .await;
    mount_page(
        &site,
        "/new",
        html_page("new", 2, &["/new".to_string(), "/a".to_string()]),
    )
    .await;

    let config = test_config(
        &format!("{}/a", site.uri()),
        &["127.0.0.1"],
        10,
        5,
        &unreachable_uri(),
    );
    let (mut coordinator, index, _) = offline_coordinator(&config);

    let report = coordinator.run().await.unwrap();

    assert_eq!(requested_paths(&site).await, vec!["/a", "/old", "/new"]);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.redirects_skipped, 0);

    let docs = index.documents().await;
    assert_eq!(docs.len(), 3);
    assert!(docs
        .iter()
        .all(|d| !d.url.as_deref().unwrap_or_default().ends_with("/old")));
}
