mod classify;
mod config;
mod crawler;
mod diff;
mod error;
mod fetch;
mod publish;
mod sitemap;
mod terms;

use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::classify::{PageRecord, UrlClassifier};
use crate::config::IndexerConfig;
use crate::publish::IndexPublisher;
use crate::terms::TermExtractor;

#[derive(Parser)]
#[command(name = "vl_indexer", about = "Search catalogue indexer for data.vlaanderen.be")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// First run: full crawl, every page treated as new, full publish
    Setup,
    /// Periodic run: crawl, diff against the canonical sitemap, publish new pages only
    Update,
}

enum Mode {
    Setup,
    Update,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let cfg = IndexerConfig::load()?;

    let result = match cli.command {
        Commands::Setup => run(&cfg, Mode::Setup).await,
        Commands::Update => run(&cfg, Mode::Update).await,
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run(cfg: &IndexerConfig, mode: Mode) -> anyhow::Result<()> {
    let client = fetch::client(cfg.fetch_timeout_secs)?;
    let publisher = IndexPublisher::new(client.clone(), cfg.elasticsearch_url.clone());

    // Connectivity is a precondition: abort before crawling or touching
    // the canonical file.
    publisher.ping().await?;

    let canonical_path = Path::new(&cfg.sitemap_path);
    let canonical = match mode {
        Mode::Setup => Vec::new(),
        Mode::Update => sitemap::load(canonical_path)?,
    };

    crawler::run(cfg, &client).await?;
    let crawled = sitemap::load(Path::new(&cfg.crawl_sitemap_path))?;

    let outcome = diff::diff(&canonical, crawled);
    sitemap::save(canonical_path, &outcome.merged)?;

    if outcome.new_entries.is_empty() {
        println!("No new pages discovered; index is up to date.");
        return Ok(());
    }

    let classifier = UrlClassifier::new(&cfg.base_url);
    let pages: Vec<PageRecord> = outcome
        .new_entries
        .iter()
        .map(|e| classifier.page_record(e))
        .collect();

    let urls: Vec<String> = outcome.new_entries.iter().map(|e| e.loc.clone()).collect();
    println!("Extracting terms from {} pages...", urls.len());
    let extractor = TermExtractor::new(client.clone(), cfg.ignored_anchors.clone());
    let summary = extractor.extract_all(&urls).await;

    publisher.ensure_index(&cfg.page_index).await?;
    publisher.ensure_index(&cfg.term_index).await?;

    let page_report = publisher
        .publish(&cfg.page_index, &cfg.page_doc_type, &pages)
        .await?;
    let term_report = publisher
        .publish(&cfg.term_index, &cfg.term_doc_type, &summary.terms)
        .await?;

    println!(
        "Pages: {} indexed, {} failed. Terms: {} indexed, {} failed.",
        page_report.succeeded, page_report.failed, term_report.succeeded, term_report.failed
    );
    if !summary.failed_pages.is_empty() {
        println!(
            "{} page(s) could not be fetched and contributed no terms:",
            summary.failed_pages.len()
        );
        for url in &summary.failed_pages {
            println!("  {url}");
        }
    }

    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
