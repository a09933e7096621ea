use std::collections::HashSet;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::fetch;

/// Closed set of term kinds, serialized with the original index vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TermKind {
    #[serde(rename = "Eigenschap")]
    Property,
    #[serde(rename = "Klasse")]
    Class,
    #[serde(rename = "Context")]
    Context,
}

/// Terminology document as published to the search index, derived from one
/// (page URL, fragment identifier) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermRecord {
    pub url: String,
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(rename = "type")]
    pub kind: TermKind,
}

/// What a batch run produced: the records plus the pages whose fetch
/// failed and therefore contributed zero terms.
pub struct ExtractionSummary {
    pub terms: Vec<TermRecord>,
    pub failed_pages: Vec<String>,
}

pub struct TermExtractor {
    client: reqwest::Client,
    ignored_anchors: Vec<String>,
}

impl TermExtractor {
    pub fn new(client: reqwest::Client, ignored_anchors: Vec<String>) -> Self {
        Self {
            client,
            ignored_anchors,
        }
    }

    /// Fetch one page and classify its fragment anchors. Fails with a
    /// Network error when the page cannot be retrieved.
    pub async fn extract_terms(&self, page_url: &str) -> Result<Vec<TermRecord>> {
        let body = fetch::fetch_text(&self.client, page_url).await?;
        Ok(terms_from_body(page_url, &body, &self.ignored_anchors))
    }

    /// Extract terms for a batch of pages, one page at a time in sitemap
    /// order. A failing page yields zero terms and is reported in the
    /// summary; it never aborts the batch. Records are deduplicated on
    /// their canonical URL across the whole batch.
    pub async fn extract_all(&self, page_urls: &[String]) -> ExtractionSummary {
        let pb = ProgressBar::new(page_urls.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
                .unwrap()
                .progress_chars("=> "),
        );

        let mut seen: HashSet<String> = HashSet::new();
        let mut terms = Vec::new();
        let mut failed_pages = Vec::new();

        for url in page_urls {
            match self.extract_terms(url).await {
                Ok(records) => {
                    for record in records {
                        if seen.insert(record.url.clone()) {
                            terms.push(record);
                        }
                    }
                }
                Err(e) => {
                    warn!("Term extraction failed for {}: {}", url, e);
                    failed_pages.push(url.clone());
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!(
            "Extracted {} terms from {} pages ({} pages failed)",
            terms.len(),
            page_urls.len(),
            failed_pages.len()
        );
        ExtractionSummary {
            terms,
            failed_pages,
        }
    }
}

/// Classify every fragment anchor in an HTML body into term records.
/// Targets pointing outside the page and anchors on the ignore-list are
/// skipped.
pub fn terms_from_body(page_url: &str, body: &str, ignored_anchors: &[String]) -> Vec<TermRecord> {
    fetch::extract_hrefs(body)
        .into_iter()
        .filter(|href| href.starts_with('#'))
        .filter(|href| !ignored_anchors.iter().any(|a| a == href))
        .filter_map(|href| term_from_fragment(page_url, &href))
        .collect()
}

/// Build one term record from a raw fragment target.
///
/// `%3A` is the percent-encoded namespace separator and becomes `.`
/// everywhere. `%20` is decoded to a space for the name and keywords only;
/// the canonical URL keeps the raw encoding so the link stays valid.
fn term_from_fragment(page_url: &str, raw: &str) -> Option<TermRecord> {
    let normalized = raw.replace("%3A", ".");
    let frag = normalized.strip_prefix('#')?;
    if frag.is_empty() {
        return None;
    }

    let decoded = frag.replace("%20", " ");
    let mut keywords: Vec<String> = decoded.split('.').map(|s| s.to_string()).collect();

    if frag.contains("jsonld") {
        // A jsonld anchor only occurs on application profile pages; the
        // context document lives under /context/, not behind the anchor.
        let ap_name = application_profile_name(page_url);
        keywords.push(ap_name.clone());
        let last_keyword = keywords.last().cloned().unwrap_or_default();
        let url = if page_url.ends_with('/') {
            // Legacy toolchain generation: profile URLs carry a trailing
            // slash and contexts hang off the site root.
            format!("{}/context/{}.jsonld", site_root(page_url), last_keyword)
        } else {
            format!("{}/context/{}.jsonld", page_url, last_keyword)
        };
        return Some(TermRecord {
            url,
            name: format!("JSON-LD context van {}", ap_name),
            keywords,
            kind: TermKind::Context,
        });
    }

    let is_property = frag
        .chars()
        .next()
        .map(|c| !c.is_uppercase())
        .unwrap_or(true)
        || frag.contains('.');
    let name = frag
        .rsplit('.')
        .next()
        .unwrap_or(frag)
        .replace("%20", " ");

    Some(TermRecord {
        url: format!("{}{}", page_url, normalized),
        name,
        keywords,
        kind: if is_property {
            TermKind::Property
        } else {
            TermKind::Class
        },
    })
}

/// Path segment following the literal `applicatieprofiel` segment of an
/// application profile URL.
fn application_profile_name(url: &str) -> String {
    let mut segments = url.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if segment == "applicatieprofiel" {
            return segments.next().unwrap_or_default().to_string();
        }
    }
    String::new()
}

/// Scheme plus host of a URL, without the path.
fn site_root(url: &str) -> &str {
    match url.find("://") {
        Some(i) => match url[i + 3..].find('/') {
            Some(j) => &url[..i + 3 + j],
            None => url,
        },
        None => url,
    }
}

// ── Tests ──
