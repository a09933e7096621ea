use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{IndexerError, Result};

static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).unwrap());

const USER_AGENT: &str = concat!("vl_indexer/", env!("CARGO_PKG_VERSION"));

/// Shared client with a bounded request timeout; a stuck fetch fails with a
/// Network error instead of hanging the run.
pub fn client(timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Fetch the rendered body of a page as text.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let network = |source| IndexerError::Network {
        url: url.to_string(),
        source,
    };
    let response = client.get(url).send().await.map_err(network)?;
    let response = response.error_for_status().map_err(network)?;
    response.text().await.map_err(network)
}

/// All hyperlink targets in an HTML body, in document order.
pub fn extract_hrefs(body: &str) -> Vec<String> {
    HREF_RE
        .captures_iter(body)
        .map(|caps| caps[1].to_string())
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hrefs_in_document_order() {
        let html = r##"<a href="/ns/adres">adres</a> <a href='#naam'>naam</a>"##;
        assert_eq!(extract_hrefs(html), vec!["/ns/adres", "#naam"]);
    }

    #[test]
    fn no_hrefs_in_plain_text() {
        assert!(extract_hrefs("just some text, no anchors").is_empty());
    }
}
