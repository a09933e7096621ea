use std::collections::{HashSet, VecDeque};
use std::path::Path;

use chrono::Utc;
use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::config::IndexerConfig;
use crate::error::Result;
use crate::fetch;
use crate::sitemap::{self, ChangeFreq, SitemapEntry};

/// Walk the site starting at the base URL and write the raw sitemap file.
/// Returning is the completion signal; afterwards the file at
/// `crawl_sitemap_path` is ready to read.
///
/// The walk is breadth-first, one page at a time. Query strings and
/// fragments are stripped, excluded patterns are skipped, and a page whose
/// fetch fails is logged and treated as a leaf.
pub async fn run(cfg: &IndexerConfig, client: &reqwest::Client) -> Result<()> {
    let base = cfg.base();
    let root = format!("{base}/");
    let lastmod = Utc::now().format("%Y-%m-%d").to_string();

    let mut queue: VecDeque<String> = VecDeque::from([root.clone()]);
    let mut visited: HashSet<String> = HashSet::from([root]);
    let mut entries: Vec<SitemapEntry> = Vec::new();

    let pb = ProgressBar::new_spinner();
    info!("Crawling {} (max {} pages)", base, cfg.max_crawl_pages);

    while let Some(url) = queue.pop_front() {
        match fetch::fetch_text(client, &url).await {
            Ok(body) => {
                entries.push(SitemapEntry {
                    loc: url.clone(),
                    lastmod: lastmod.clone(),
                    changefreq: ChangeFreq::Monthly,
                    priority: 0.5,
                });
                if entries.len() >= cfg.max_crawl_pages {
                    warn!("Crawl hit the {} page cap, stopping", cfg.max_crawl_pages);
                    break;
                }
                for link in page_links(base, &body, &cfg.exclude_patterns) {
                    if visited.insert(link.clone()) {
                        queue.push_back(link);
                    }
                }
            }
            Err(e) => warn!("Crawl fetch failed for {}: {}", url, e),
        }
        pb.set_message(format!("{} pages, {} queued", entries.len(), queue.len()));
        pb.tick();
    }

    pb.finish_and_clear();
    info!("Crawl found {} pages", entries.len());
    sitemap::save(Path::new(&cfg.crawl_sitemap_path), &entries)
}

/// Same-domain page links in an HTML body: resolved against the base URL,
/// query strings and fragments stripped, excluded patterns dropped.
fn page_links(base: &str, body: &str, exclude_patterns: &[String]) -> Vec<String> {
    fetch::extract_hrefs(body)
        .into_iter()
        .filter_map(|href| resolve(base, &href))
        .filter(|url| !exclude_patterns.iter().any(|p| url.contains(p.as_str())))
        .collect()
}

fn resolve(base: &str, href: &str) -> Option<String> {
    let href = href.split(['#', '?']).next().unwrap_or_default();
    if href.is_empty() {
        return None;
    }
    if let Some(rest) = href.strip_prefix(base) {
        if rest.is_empty() {
            return Some(format!("{base}/"));
        }
        if rest.starts_with('/') {
            return Some(href.to_string());
        }
        // same prefix but a different host, e.g. data.vlaanderen.beta.org
        return None;
    }
    if href.contains(':') {
        // absolute URL on another domain, mailto:, javascript:, tel:
        return None;
    }
    if href.starts_with('/') {
        return Some(format!("{base}{href}"));
    }
    None
}

// ── Tests ──
