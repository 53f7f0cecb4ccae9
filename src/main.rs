//! Apex-Spider main entry point
//!
//! This is the command-line interface for the Apex-Spider focused crawler.

use anyhow::Context;
use apex_spider::config::{load_config_with_hash, Config};
use apex_spider::crawler::run_crawl;
use apex_spider::indexer::{build_embedder, Embedder, HttpIndexClient, IndexSink};
use apex_spider::output::print_report;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Apex-Spider: a polite focused crawler that feeds a vector index
///
/// Apex-Spider walks in-scope pages breadth-first from a start URL, splits
/// them into paragraph chunks, embeds each chunk and submits it to an
/// indexing service. Press Ctrl-C to stop a crawl early.
#[derive(Parser, Debug)]
#[command(name = "apex-spider")]
#[command(version = "1.0.0")]
#[command(about = "A polite focused crawler that feeds a vector index", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "search")]
    dry_run: bool,

    /// Override the configured page budget
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    budget: Option<u32>,

    /// Query the index for TEXT instead of crawling
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,

    /// Number of search results to show
    #[arg(short, default_value_t = 5, requires = "search")]
    k: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if let Some(budget) = cli.budget {
        tracing::info!("Overriding page budget: {}", budget);
        config.crawler.page_budget = budget;
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(query) = cli.search.as_deref() {
        handle_search(&config, query, cli.k).await?;
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("apex_spider=info,warn"),
            1 => EnvFilter::new("apex_spider=debug,info"),
            2 => EnvFilter::new("apex_spider=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Apex-Spider Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Page budget: {}", config.crawler.page_budget);
    println!("  Max chunks per page: {}", config.crawler.max_chunks_per_page);
    println!("  Min chunk length: {} chars", config.crawler.min_chunk_length);
    println!(
        "  Politeness delay: {}ms (+ up to {}ms jitter)",
        config.crawler.politeness_delay, config.crawler.politeness_jitter
    );
    println!("  Fetch timeout: {}ms", config.crawler.fetch_timeout);

    println!("\nScope:");
    for host in &config.scope.allowed_hosts {
        println!("  + {}", host);
    }
    for marker in &config.scope.excluded_path_markers {
        println!("  - paths containing {:?}", marker);
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nEmbedder:");
    println!("  Provider: {:?}", config.embedder.provider);
    if let Some(endpoint) = &config.embedder.endpoint {
        println!("  Endpoint: {}", endpoint);
    }
    if let Some(model) = &config.embedder.model {
        println!("  Model: {}", model);
    }
    println!("  Dimensions: {}", config.embedder.dimensions);

    println!("\nIndex:");
    println!("  Endpoint: {}", config.index.endpoint);
    println!("  Preview length: {} chars", config.index.preview_length);

    println!("\n✓ Configuration is valid");
}

/// Handles the --search mode: embeds the query and prints the nearest documents
async fn handle_search(config: &Config, query: &str, k: usize) -> anyhow::Result<()> {
    let embedder = build_embedder(&config.embedder)?;
    let index = HttpIndexClient::new(
        &config.index.endpoint,
        Duration::from_millis(config.index.timeout),
    )?;

    let vector = embedder
        .embed(query)
        .await
        .context("Failed to embed search query")?;
    let hits = index
        .search(&vector, k)
        .await
        .context("Search request failed")?;

    println!("Results for {:?}:", query);
    if hits.is_empty() {
        println!("  (no results)");
    }
    for hit in hits {
        println!("  [{:.4}] {}", hit.score, hit.display_text());
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling from {} within {} allowed host pattern(s)",
        config.crawler.start_url,
        config.scope.allowed_hosts.len()
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current page");
            on_signal.cancel();
        }
    });

    let report = run_crawl(config, cancel).await.context("Crawl failed")?;

    println!();
    print_report(&report);

    Ok(())
}
