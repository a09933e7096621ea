use std::collections::HashSet;

use tracing::info;

use crate::sitemap::SitemapEntry;

/// Result of comparing a fresh crawl against the canonical sitemap.
pub struct DiffOutcome {
    /// Filtered crawled entries whose URL is not yet canonical.
    pub new_entries: Vec<SitemapEntry>,
    /// Canonical with the new entries appended, insertion order preserved.
    pub merged: Vec<SitemapEntry>,
}

/// Compute the newly discovered entries in `crawled` relative to
/// `canonical`. Crawl artifacts are dropped before comparison; membership
/// is exact string equality on the URL. On the very first run `canonical`
/// is empty and every filtered crawled entry is new.
pub fn diff(canonical: &[SitemapEntry], crawled: Vec<SitemapEntry>) -> DiffOutcome {
    let known: HashSet<&str> = canonical.iter().map(|e| e.loc.as_str()).collect();

    let new_entries: Vec<SitemapEntry> = crawled
        .into_iter()
        .filter(|e| !is_crawl_artifact(&e.loc))
        .filter(|e| !known.contains(e.loc.as_str()))
        .collect();

    let mut merged = canonical.to_vec();
    merged.extend(new_entries.iter().cloned());

    info!(
        "Diff: {} canonical, {} new",
        canonical.len(),
        new_entries.len()
    );
    DiffOutcome {
        new_entries,
        merged,
    }
}

/// URLs the crawler emits that are not genuine pages: identifier-namespace
/// resources (`/id/`) and links whose last path segment is a foreign
/// hostname the crawler picked up.
fn is_crawl_artifact(url: &str) -> bool {
    let path = match url.find("://") {
        Some(i) => match url[i + 3..].find('/') {
            Some(j) => &url[i + 3 + j..],
            None => "",
        },
        None => url,
    };
    if path.contains("/id/") {
        return true;
    }
    path.rsplit('/')
        .next()
        .map(|last| last.contains("www."))
        .unwrap_or(false)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sitemap::ChangeFreq;

    fn entry(loc: &str) -> SitemapEntry {
        SitemapEntry {
            loc: loc.to_string(),
            lastmod: "2019-03-01".to_string(),
            changefreq: ChangeFreq::Monthly,
            priority: 0.5,
        }
    }

    #[test]
    fn identical_snapshots_yield_nothing_new() {
        let s = vec![
            entry("https://data.vlaanderen.be/"),
            entry("https://data.vlaanderen.be/ns/adres"),
        ];
        let outcome = diff(&s, s.clone());
        assert!(outcome.new_entries.is_empty());
        assert_eq!(outcome.merged, s);
    }

    #[test]
    fn extra_entry_is_new_and_appended() {
        let s = vec![entry("https://data.vlaanderen.be/")];
        let mut crawled = s.clone();
        crawled.push(entry("https://data.vlaanderen.be/ns/gebouw"));

        let outcome = diff(&s, crawled);
        assert_eq!(outcome.new_entries, vec![entry("https://data.vlaanderen.be/ns/gebouw")]);
        assert_eq!(outcome.merged.len(), 2);
        assert_eq!(outcome.merged[0].loc, "https://data.vlaanderen.be/");
        assert_eq!(outcome.merged[1].loc, "https://data.vlaanderen.be/ns/gebouw");
    }

    #[test]
    fn empty_canonical_takes_all_filtered() {
        let crawled = vec![
            entry("https://data.vlaanderen.be/ns/adres"),
            entry("https://data.vlaanderen.be/id/concept/1"),
        ];
        let outcome = diff(&[], crawled);
        assert_eq!(outcome.new_entries.len(), 1);
        assert_eq!(outcome.merged.len(), 1);
    }

    #[test]
    fn id_namespace_urls_are_filtered() {
        assert!(is_crawl_artifact("https://data.vlaanderen.be/id/adres/42"));
        assert!(!is_crawl_artifact("https://data.vlaanderen.be/ns/adres"));
    }

    #[test]
    fn foreign_hostname_tails_are_filtered() {
        assert!(is_crawl_artifact(
            "https://data.vlaanderen.be/ns/www.example.org"
        ));
        assert!(!is_crawl_artifact("https://data.vlaanderen.be/dumps"));
    }
}
