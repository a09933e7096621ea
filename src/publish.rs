use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::{IndexerError, Result};

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;

/// Outcome of one bulk submission, as reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Build the NDJSON body of a bulk operation: one operation header and one
/// document per record, exactly 2N lines for N records. The records are
/// only read, never mutated.
pub fn bulk_body<T: Serialize>(index: &str, doc_type: &str, records: &[T]) -> Result<String> {
    let mut body = String::new();
    for record in records {
        let header = json!({ "index": { "_index": index, "_type": doc_type } });
        let doc = serde_json::to_string(record)
            .map_err(|e| IndexerError::Index(format!("cannot serialize document: {e}")))?;
        body.push_str(&header.to_string());
        body.push('\n');
        body.push_str(&doc);
        body.push('\n');
    }
    Ok(body)
}

/// Thin client for the search engine's HTTP API.
pub struct IndexPublisher {
    client: reqwest::Client,
    endpoint: String,
}

impl IndexPublisher {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Health check, issued once before first use. A connectivity failure
    /// is a fatal precondition for the run.
    pub async fn ping(&self) -> Result<()> {
        info!("Pinging search engine at {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| {
                error!("Search engine at {} is down: {}", self.endpoint, e);
                IndexerError::Index(format!("search engine unreachable: {e}"))
            })?;
        if !response.status().is_success() {
            error!("Search engine at {} is down: {}", self.endpoint, response.status());
            return Err(IndexerError::Index(format!(
                "ping returned {}",
                response.status()
            )));
        }
        info!("Search engine is up");
        Ok(())
    }

    /// Create an index if it does not exist yet.
    pub async fn ensure_index(&self, index: &str) -> Result<()> {
        let url = format!("{}/{}", self.endpoint, index);
        let response = self.client.put(&url).send().await?;
        if response.status().is_success() {
            info!("Created index {}", index);
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if body.contains("resource_already_exists_exception") {
            return Ok(());
        }
        Err(IndexerError::Index(format!(
            "cannot create index {index}: {body}"
        )))
    }

    /// Submit all records as one bulk operation. Transient failures are
    /// retried with exponential backoff; once retries are exhausted the
    /// whole batch is reported as failed rather than crashing the run.
    pub async fn publish<T: Serialize>(
        &self,
        index: &str,
        doc_type: &str,
        records: &[T],
    ) -> Result<PublishReport> {
        if records.is_empty() {
            return Ok(PublishReport {
                succeeded: 0,
                failed: 0,
            });
        }
        let body = bulk_body(index, doc_type, records)?;

        for attempt in 0..=MAX_RETRIES {
            match self.try_bulk(&body).await {
                Ok(report) => {
                    info!(
                        "Published {} documents to {} ({} failed)",
                        report.succeeded, index, report.failed
                    );
                    return Ok(report);
                }
                Err(e) if attempt < MAX_RETRIES => {
                    let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                    warn!(
                        "Bulk publish to {} failed (attempt {}/{}), backing off {:.1}s: {}",
                        index,
                        attempt + 1,
                        MAX_RETRIES,
                        backoff.as_secs_f64(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    warn!("Bulk publish to {} failed after retries: {}", index, e);
                    return Ok(PublishReport {
                        succeeded: 0,
                        failed: records.len(),
                    });
                }
            }
        }
        unreachable!("retry loop always returns")
    }

    async fn try_bulk(&self, body: &str) -> Result<PublishReport> {
        let response = self
            .client
            .post(format!("{}/_bulk", self.endpoint))
            .header("Content-Type", "application/x-ndjson")
            .body(body.to_string())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(IndexerError::Index(format!(
                "bulk request returned {}",
                response.status()
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| IndexerError::Index(format!("unreadable bulk response: {e}")))?;
        let items = value
            .get("items")
            .and_then(|i| i.as_array())
            .ok_or_else(|| IndexerError::Index("bulk response has no items".to_string()))?;

        let mut succeeded = 0;
        let mut failed = 0;
        for item in items {
            let status = item
                .get("index")
                .and_then(|op| op.get("status"))
                .and_then(|s| s.as_i64())
                .unwrap_or(500);
            if (200..300).contains(&status) {
                succeeded += 1;
            } else {
                failed += 1;
            }
        }
        Ok(PublishReport { succeeded, failed })
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Doc {
        url: String,
        name: String,
    }

    fn docs(n: usize) -> Vec<Doc> {
        (0..n)
            .map(|i| Doc {
                url: format!("https://data.vlaanderen.be/ns/adres#veld{i}"),
                name: format!("veld{i}"),
            })
            .collect()
    }

    #[test]
    fn bulk_body_alternates_header_and_document() {
        let body = bulk_body("data.vlaanderen", "url_list", &docs(3)).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 6);
        for pair in lines.chunks(2) {
            let header: serde_json::Value = serde_json::from_str(pair[0]).unwrap();
            assert_eq!(header["index"]["_index"], "data.vlaanderen");
            assert_eq!(header["index"]["_type"], "url_list");
            let doc: serde_json::Value = serde_json::from_str(pair[1]).unwrap();
            assert!(doc["url"].is_string());
        }
    }

    #[test]
    fn bulk_body_of_nothing_is_empty() {
        let body = bulk_body("data.vlaanderen", "url_list", &docs(0)).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn bulk_body_is_deterministic() {
        let records = docs(2);
        let a = bulk_body("idx", "t", &records).unwrap();
        let b = bulk_body("idx", "t", &records).unwrap();
        assert_eq!(a, b);
    }
}
