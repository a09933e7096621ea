use std::path::PathBuf;

use thiserror::Error;

/// Error kinds for a run. Io/Parse on the canonical sitemap are fatal;
/// Network is recovered per page; Index surfaces as failure counts.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed sitemap: {0}")]
    Parse(String),

    #[error("fetch failed for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("search engine rejected request: {0}")]
    Index(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
