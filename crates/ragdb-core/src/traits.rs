use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BulkReport, Document, ScoredDocument, SearchQuery};

/// Text-to-vector service with a deployment-fixed output dimension.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text. Fails with `Error::EmbeddingUnavailable` when the
    /// backing service is unreachable or returns a non-success status; no
    /// retry happens at this layer.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts. The default embeds sequentially; implementations
    /// with a native batch API should override it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// A named, schema-fixed document index on a remote search engine.
///
/// The index name is bound at client construction. All operations are
/// read-only except `create_index` / `delete_index` / `bulk_insert`.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Destructively (re)create the index with the given vector dimension.
    /// An existing index of the same name is deleted first, so calling this
    /// twice is idempotent in effect.
    async fn create_index(&self, dimension: usize) -> Result<()>;

    async fn delete_index(&self) -> Result<()>;

    /// Insert documents in one bulk call; the engine assigns ids.
    async fn bulk_insert(&self, docs: &[Document]) -> Result<BulkReport>;

    /// Run one query, returning at most `top_k` hits ordered by engine
    /// score descending. An empty result is valid, not an error.
    async fn search(&self, query: &SearchQuery, top_k: usize) -> Result<Vec<ScoredDocument>>;

    /// Make recently inserted documents visible to search.
    async fn refresh(&self) -> Result<()>;
}
