//! ragdb-retrieval
//!
//! The hybrid retrieval layer: lexical, semantic, hybrid and iterative
//! search over an injected index store, plus the ingestion pipeline and the
//! context formatting exposed to the generation layer.

pub mod context;

use std::collections::HashSet;

use tracing::{error, warn};

use ragdb_core::error::{Error, Result};
use ragdb_core::traits::{Embedder, IndexStore};
use ragdb_core::types::{
    BulkReport, Degradation, Document, ScoredDocument, SearchHit, SearchMode, SearchOutcome,
    SearchQuery,
};

pub use context::format_context;

/// Retrieval facade over one index store and one embedder.
///
/// Both collaborators are injected once and reused for the process's
/// duration; no state is kept between calls. Every search validates
/// `top_k >= 1` and returns at most `top_k` hits.
pub struct HybridRetriever<S: IndexStore> {
    store: S,
    embedder: Box<dyn Embedder>,
}

impl<S: IndexStore> HybridRetriever<S> {
    pub fn new(store: S, embedder: Box<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Keyword search against the content field. An empty result means no
    /// matching terms (or an empty index), never an error.
    pub async fn lexical(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        check_top_k(top_k)?;
        let scored = self
            .store
            .search(&SearchQuery::Match { text: query.to_string() }, top_k)
            .await?;
        Ok(to_hits(scored, query))
    }

    /// Vector similarity search. An embedder failure propagates as
    /// `EmbeddingUnavailable`, so callers can tell it apart from an empty
    /// index.
    pub async fn semantic(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        check_top_k(top_k)?;
        let vector = self.embedder.embed(query).await?;
        let scored = self
            .store
            .search(&SearchQuery::Knn { vector, k: top_k }, top_k)
            .await?;
        Ok(to_hits(scored, query))
    }

    /// One combined should-query over the knn and match clauses; clause
    /// scores are fused by the engine, not merged client-side.
    ///
    /// If the combined path fails for any reason (embedding included), the
    /// search degrades to lexical-only with the same `top_k`; if that fails
    /// too, the outcome is empty with `Degradation::Unavailable`. The only
    /// error this returns is `top_k` validation.
    pub async fn hybrid(&self, query: &str, top_k: usize) -> Result<SearchOutcome> {
        check_top_k(top_k)?;
        let combined = match self.embedder.embed(query).await {
            Ok(vector) => {
                let clause = SearchQuery::Should(vec![
                    SearchQuery::Knn { vector, k: top_k },
                    SearchQuery::Match { text: query.to_string() },
                ]);
                self.store.search(&clause, top_k).await
            }
            Err(e) => Err(e),
        };

        let reason = match combined {
            Ok(scored) => return Ok(SearchOutcome::ok(to_hits(scored, query))),
            Err(e) => e.to_string(),
        };
        warn!("hybrid search failed, falling back to lexical: {reason}");

        match self.lexical(query, top_k).await {
            Ok(hits) => Ok(SearchOutcome::degraded(
                hits,
                Degradation::LexicalFallback { reason },
            )),
            Err(fallback) => {
                error!("lexical fallback failed as well: {fallback}");
                Ok(SearchOutcome::degraded(
                    Vec::new(),
                    Degradation::Unavailable {
                        reason: format!("{reason}; fallback: {fallback}"),
                    },
                ))
            }
        }
    }

    /// Relevance-feedback loop: lexical search on the current query each
    /// step, accumulating hits not seen before (by `(id, content)`
    /// identity) and extending the query with the top hit's title.
    ///
    /// Stops early on an empty step. A failing step returns whatever was
    /// accumulated so far, never an error.
    pub async fn iterative(
        &self,
        query: &str,
        refinement_steps: usize,
        top_k: usize,
    ) -> Result<SearchOutcome> {
        check_top_k(top_k)?;
        let mut accumulated: Vec<SearchHit> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut current_query = query.to_string();

        for step in 0..refinement_steps {
            let hits = match self.lexical(&current_query, top_k).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!("iterative search failed at step {step}: {e}");
                    return Ok(SearchOutcome::degraded(
                        accumulated,
                        Degradation::Unavailable { reason: e.to_string() },
                    ));
                }
            };
            if hits.is_empty() {
                break;
            }
            // Query expansion from the best hit of this round; untitled
            // hits leave the query as-is.
            if let Some(title) = hits[0].document.title.as_deref() {
                current_query = format!("{current_query} {title}");
            }
            for hit in hits {
                if seen.insert(hit.identity()) {
                    accumulated.push(hit);
                }
            }
        }
        Ok(SearchOutcome::ok(accumulated))
    }

    /// Availability-first dispatcher for UI callers: typed failures fold
    /// into an empty, degraded outcome instead of surfacing.
    pub async fn search_mode(&self, mode: SearchMode, query: &str, top_k: usize) -> SearchOutcome {
        let result = match mode {
            SearchMode::Lexical => self.lexical(query, top_k).await.map(SearchOutcome::ok),
            SearchMode::Semantic => self.semantic(query, top_k).await.map(SearchOutcome::ok),
            SearchMode::Hybrid => self.hybrid(query, top_k).await,
        };
        result.unwrap_or_else(|e| {
            warn!("{mode:?} search failed: {e}");
            SearchOutcome::degraded(
                Vec::new(),
                Degradation::Unavailable { reason: e.to_string() },
            )
        })
    }

    /// Embed and insert a batch of documents. Documents that already carry
    /// a vector keep it.
    pub async fn ingest(&self, docs: &[Document]) -> Result<BulkReport> {
        if docs.is_empty() {
            return Ok(BulkReport::default());
        }
        let mut prepared = docs.to_vec();
        let pending: Vec<String> = prepared
            .iter()
            .filter(|d| d.embedding.is_none())
            .map(|d| d.content.clone())
            .collect();
        let mut vectors = self.embedder.embed_batch(&pending).await?.into_iter();
        for doc in prepared.iter_mut().filter(|d| d.embedding.is_none()) {
            doc.embedding = vectors.next();
        }
        self.store.bulk_insert(&prepared).await
    }
}

fn check_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(Error::InvalidConfig("top_k must be >= 1".to_string()));
    }
    Ok(())
}

fn to_hits(scored: Vec<ScoredDocument>, query: &str) -> Vec<SearchHit> {
    scored
        .into_iter()
        .map(|s| SearchHit::from_scored(s, query))
        .collect()
}
