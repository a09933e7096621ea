use config::Config;
use serde::Deserialize;

use crate::error::Result;

/// Recognized options for a run. Defaults match the data.vlaanderen.be
/// deployment; any field can be overridden via indexer.toml or a
/// VL_-prefixed environment variable.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    #[serde(default = "default_elasticsearch_url")]
    pub elasticsearch_url: String,
    #[serde(default = "default_page_index")]
    pub page_index: String,
    #[serde(default = "default_term_index")]
    pub term_index: String,
    #[serde(default = "default_page_doc_type")]
    pub page_doc_type: String,
    #[serde(default = "default_term_doc_type")]
    pub term_doc_type: String,
    /// Generic section anchors that never become terms.
    #[serde(default = "default_ignored_anchors")]
    pub ignored_anchors: Vec<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// URL substrings the crawler must not descend into.
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
    /// Canonical sitemap, the sole persisted state.
    #[serde(default = "default_sitemap_path")]
    pub sitemap_path: String,
    /// Where the crawler drops the raw sitemap of each run.
    #[serde(default = "default_crawl_sitemap_path")]
    pub crawl_sitemap_path: String,
    #[serde(default = "default_max_crawl_pages")]
    pub max_crawl_pages: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl IndexerConfig {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(config::File::with_name("indexer").required(false))
            .add_source(config::Environment::with_prefix("VL"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Base URL without a trailing slash, for path arithmetic.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn default_elasticsearch_url() -> String {
    "http://localhost:9200".into()
}

fn default_page_index() -> String {
    "data.vlaanderen".into()
}

fn default_term_index() -> String {
    "data.vlaanderen_fis".into()
}

fn default_page_doc_type() -> String {
    "url_list".into()
}

fn default_term_doc_type() -> String {
    "fi_list".into()
}

fn default_ignored_anchors() -> Vec<String> {
    [
        "#abstract",
        "#sotd",
        "#license-and-liability",
        "#conformance-statement",
        "#overview",
        "#classes",
        "#properties",
        "#external",
        "#introduction",
        "#summary",
        "#status",
        "#license",
        "#conformance",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_base_url() -> String {
    "https://data.vlaanderen.be".into()
}

fn default_exclude_patterns() -> Vec<String> {
    // The address and organization registers are datasets, not documentation.
    vec!["adres".into(), "organisatie".into()]
}

fn default_sitemap_path() -> String {
    "data/sitemap.xml".into()
}

fn default_crawl_sitemap_path() -> String {
    "data/crawl-sitemap.xml".into()
}

fn default_max_crawl_pages() -> usize {
    5000
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let cfg: IndexerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.elasticsearch_url, "http://localhost:9200");
        assert_eq!(cfg.page_index, "data.vlaanderen");
        assert_eq!(cfg.term_index, "data.vlaanderen_fis");
        assert_eq!(cfg.base(), "https://data.vlaanderen.be");
        assert!(cfg.ignored_anchors.contains(&"#abstract".to_string()));
    }

    #[test]
    fn base_strips_trailing_slash() {
        let cfg: IndexerConfig =
            serde_json::from_str(r#"{"base_url": "https://example.org/"}"#).unwrap();
        assert_eq!(cfg.base(), "https://example.org");
    }
}
