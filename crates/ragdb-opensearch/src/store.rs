use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    http::{
        request::JsonBody,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesRefreshParts},
    BulkParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use ragdb_core::config::StoreConfig;
use ragdb_core::error::{Error, Result};
use ragdb_core::traits::IndexStore;
use ragdb_core::types::{BulkReport, Document, ScoredDocument, SearchQuery};

use crate::query::{index_mappings, search_body};

/// Index store client over an OpenSearch-compatible engine.
///
/// Holds one connection-pooled transport for the process's lifetime; the
/// index name is bound at construction. Queries are retried on
/// transport-level failures up to the configured count; bulk insertion is
/// never retried, so a flaky transport cannot duplicate documents.
pub struct OpenSearchStore {
    client: OpenSearch,
    index_name: String,
    max_retries: usize,
}

impl OpenSearchStore {
    /// Connect and verify the cluster responds. Construction is the one
    /// place where an absent backing store fails hard; there is no fallback
    /// to offer without an engine.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let url = config.url().parse().map_err(|e| {
            Error::InvalidConfig(format!("invalid OpenSearch URL '{}': {e}", config.url()))
        })?;
        let pool = SingleNodeConnectionPool::new(url);
        let transport = TransportBuilder::new(pool)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::IndexUnavailable(format!("failed to build transport: {e}")))?;
        let client = OpenSearch::new(transport);

        let store = Self {
            client,
            index_name: config.index.clone(),
            max_retries: config.max_retries,
        };
        store.ping().await?;
        Ok(store)
    }

    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| Error::IndexUnavailable(format!("ping failed: {e}")))?;
        if !response.status_code().is_success() {
            return Err(Error::IndexUnavailable(format!(
                "ping returned {}",
                response.status_code()
            )));
        }
        // Cluster identity is worth one log line at startup; a parse
        // failure here is not.
        if let Ok(response) = self.client.info().send().await {
            if let Ok(cluster) = response.json::<Value>().await {
                info!(
                    cluster = cluster["cluster_name"].as_str().unwrap_or("unknown"),
                    version = cluster["version"]["number"].as_str().unwrap_or("unknown"),
                    "connected to OpenSearch"
                );
            }
        }
        Ok(())
    }

    async fn index_exists(&self) -> Result<bool> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&self.index_name]))
            .send()
            .await
            .map_err(|e| Error::IndexQueryFailed(format!("exists check failed: {e}")))?;
        Ok(response.status_code().is_success())
    }
}

#[async_trait]
impl IndexStore for OpenSearchStore {
    async fn create_index(&self, dimension: usize) -> Result<()> {
        if self.index_exists().await? {
            info!(index = %self.index_name, "deleting existing index before recreate");
            self.delete_index().await?;
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index_name))
            .body(index_mappings(dimension))
            .send()
            .await
            .map_err(|e| Error::IndexQueryFailed(format!("index creation failed: {e}")))?;

        if !response.status_code().is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::IndexQueryFailed(format!("index creation failed: {text}")));
        }
        info!(index = %self.index_name, dimension, "created index with knn mapping");
        Ok(())
    }

    async fn delete_index(&self) -> Result<()> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[&self.index_name]))
            .send()
            .await
            .map_err(|e| Error::IndexQueryFailed(format!("index deletion failed: {e}")))?;

        // Deleting an absent index is a no-op, not a failure.
        if !response.status_code().is_success() && response.status_code().as_u16() != 404 {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::IndexQueryFailed(format!("index deletion failed: {text}")));
        }
        Ok(())
    }

    async fn bulk_insert(&self, docs: &[Document]) -> Result<BulkReport> {
        if docs.is_empty() {
            return Ok(BulkReport::default());
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(docs.len() * 2);
        for doc in docs {
            // The engine assigns document ids.
            body.push(json!({ "index": {} }).into());
            let source = serde_json::to_value(doc).map_err(|e| {
                Error::IndexQueryFailed(format!("failed to serialize document: {e}"))
            })?;
            body.push(source.into());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_name))
            .body(body)
            .send()
            .await
            .map_err(|e| Error::IndexQueryFailed(format!("bulk request failed: {e}")))?;

        if !response.status_code().is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::IndexQueryFailed(format!("bulk insert failed: {text}")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| Error::IndexQueryFailed(format!("failed to parse bulk response: {e}")))?;
        let report = tally_bulk_items(&value, docs.len());

        // Make the batch searchable right away; the documents are already
        // persisted, so a failed refresh only delays visibility.
        if let Err(e) = self.refresh().await {
            warn!("refresh after bulk insert failed: {e}");
        }
        Ok(report)
    }

    async fn search(&self, query: &SearchQuery, top_k: usize) -> Result<Vec<ScoredDocument>> {
        let body = search_body(query, top_k);
        let mut attempt = 0;
        let response = loop {
            let sent = self
                .client
                .search(SearchParts::Index(&[&self.index_name]))
                .body(body.clone())
                .send()
                .await;
            match sent {
                Ok(response) => break response,
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!("search transport error, retrying ({attempt}/{}): {e}", self.max_retries);
                }
                Err(e) => {
                    return Err(Error::IndexQueryFailed(format!("search request failed: {e}")))
                }
            }
        };

        let status = response.status_code();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::IndexQueryFailed(format!("search returned {status}: {text}")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| Error::IndexQueryFailed(format!("failed to parse search response: {e}")))?;
        let hits = parse_hits(&value)?;
        debug!(index = %self.index_name, count = hits.len(), "search completed");
        Ok(hits)
    }

    async fn refresh(&self) -> Result<()> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[&self.index_name]))
            .send()
            .await
            .map_err(|e| Error::IndexQueryFailed(format!("refresh failed: {e}")))?;
        if !response.status_code().is_success() {
            return Err(Error::IndexQueryFailed(format!(
                "refresh returned {}",
                response.status_code()
            )));
        }
        Ok(())
    }
}

/// Count per-item statuses from a bulk response. Items the engine did not
/// report on at all are counted as failed.
fn tally_bulk_items(value: &Value, expected: usize) -> BulkReport {
    let mut report = BulkReport::default();
    if let Some(items) = value["items"].as_array() {
        for item in items {
            let status = item["index"]["status"].as_u64().unwrap_or(0);
            if (200..300).contains(&status) {
                report.indexed += 1;
            } else {
                report.failed += 1;
            }
        }
    }
    report.failed += expected.saturating_sub(report.indexed + report.failed);
    report
}

/// Parse `hits.hits[]` into scored documents. A missing hits section is an
/// empty result, not an error; a malformed `_source` is.
fn parse_hits(value: &Value) -> Result<Vec<ScoredDocument>> {
    let Some(hits) = value["hits"]["hits"].as_array() else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(hits.len());
    for hit in hits {
        let Some(source) = hit.get("_source") else {
            continue;
        };
        let document: Document = serde_json::from_value(source.clone())
            .map_err(|e| Error::IndexQueryFailed(format!("malformed hit source: {e}")))?;
        out.push(ScoredDocument {
            id: hit["_id"].as_str().unwrap_or_default().to_string(),
            score: hit["_score"].as_f64().unwrap_or(0.0) as f32,
            document,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdb_core::types::ContentKind;

    #[test]
    fn parse_hits_preserves_engine_order_and_scores() {
        let response = json!({
            "hits": {
                "total": { "value": 2 },
                "hits": [
                    { "_id": "a", "_score": 8.5,
                      "_source": { "content": "alpha rag", "content_type": "text", "token_count": 3 } },
                    { "_id": "c", "_score": 5.1,
                      "_source": { "content": "gamma rag hybrid", "content_type": "text", "token_count": 4 } }
                ]
            }
        });

        let hits = parse_hits(&response).expect("parse");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert!(hits[0].score > hits[1].score);
        assert_eq!(hits[1].document.content, "gamma rag hybrid");
        assert_eq!(hits[0].document.kind, ContentKind::Text);
    }

    #[test]
    fn parse_hits_empty_and_missing_sections() {
        let empty = json!({ "hits": { "total": { "value": 0 }, "hits": [] } });
        assert!(parse_hits(&empty).expect("parse").is_empty());

        let missing = json!({ "took": 2 });
        assert!(parse_hits(&missing).expect("parse").is_empty());
    }

    #[test]
    fn parse_hits_skips_sourceless_entries() {
        let response = json!({
            "hits": { "hits": [ { "_id": "x", "_score": 1.0 } ] }
        });
        assert!(parse_hits(&response).expect("parse").is_empty());
    }

    #[test]
    fn parse_hits_reads_multimodal_sources() {
        let response = json!({
            "hits": { "hits": [
                { "_id": "img", "_score": 2.0,
                  "_source": { "content": "a chart", "content_type": "image",
                               "metadata": { "caption": "Figure 1" } } }
            ] }
        });
        let hits = parse_hits(&response).expect("parse");
        assert_eq!(hits[0].document.kind, ContentKind::Image { base64_image: None });
        assert_eq!(hits[0].document.metadata.caption.as_deref(), Some("Figure 1"));
    }

    #[test]
    fn bulk_tally_counts_statuses() {
        let response = json!({
            "errors": true,
            "items": [
                { "index": { "status": 201 } },
                { "index": { "status": 201 } },
                { "index": { "status": 400 } }
            ]
        });
        let report = tally_bulk_items(&response, 3);
        assert_eq!(report, BulkReport { indexed: 2, failed: 1 });
    }

    #[test]
    fn bulk_tally_treats_unreported_items_as_failed() {
        let response = json!({ "items": [ { "index": { "status": 200 } } ] });
        let report = tally_bulk_items(&response, 4);
        assert_eq!(report, BulkReport { indexed: 1, failed: 3 });
    }
}
