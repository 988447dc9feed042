//! Domain types shared by the index store, the embedder and the retriever.

use serde::{Deserialize, Serialize};

pub type DocId = String;

/// Content kind of an indexed document.
///
/// Serialized through the wire field `content_type`. Each variant carries
/// only the payload that kind actually has: `base64_image` and `table_html`
/// are stored by the engine but never indexed or searched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "content_type", rename_all = "snake_case")]
pub enum ContentKind {
    #[default]
    Text,
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base64_image: Option<String>,
    },
    Table {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table_html: Option<String>,
    },
}

impl ContentKind {
    /// Wire/display label, matching the `content_type` field value.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Image { .. } => "image",
            ContentKind::Table { .. } => "table",
        }
    }
}

/// Optional descriptive fields attached at ingestion time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_text: Option<String>,
}

impl Metadata {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.caption.is_none() && self.image_text.is_none()
    }
}

/// A unit of indexed content.
///
/// Immutable once ingested: there is no update path, re-ingestion recreates
/// the index. Identity is the engine-assigned document id, which lives on
/// [`ScoredDocument`] / [`SearchHit`] rather than here. The `embedding` is
/// populated during ingestion and excluded from search responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(flatten)]
    pub kind: ContentKind,
    #[serde(default)]
    pub token_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Document {
    /// A plain text document with no title or metadata.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: content.into(),
            kind: ContentKind::Text,
            token_count: 0,
            embedding: None,
            metadata: Metadata::default(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A raw hit as returned by the index store, ordered by engine score.
///
/// `score` is on the engine's native scale and is not comparable across
/// search modes without normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub id: DocId,
    pub score: f32,
    pub document: Document,
}

/// A retrieval-layer hit: the stored document plus the query that found it.
///
/// Iterative search accumulates hits across refined queries, so the
/// originating query travels with each hit. Dedup identity is
/// `(id, content)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f32,
    pub document: Document,
    pub query: String,
}

impl SearchHit {
    #[must_use]
    pub fn from_scored(scored: ScoredDocument, query: &str) -> Self {
        Self {
            id: scored.id,
            score: scored.score,
            document: scored.document,
            query: query.to_string(),
        }
    }

    /// Identity key used when deduplicating accumulated results.
    #[must_use]
    pub fn identity(&self) -> (String, String) {
        (self.id.clone(), self.document.content.clone())
    }
}

/// Which retrieval path a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Lexical,
    Semantic,
    Hybrid,
}

impl std::str::FromStr for SearchMode {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lexical" | "keyword" => Ok(SearchMode::Lexical),
            "semantic" | "vector" => Ok(SearchMode::Semantic),
            "hybrid" => Ok(SearchMode::Hybrid),
            other => Err(crate::error::Error::InvalidConfig(format!(
                "unknown search mode '{other}' (expected lexical|semantic|hybrid)"
            ))),
        }
    }
}

/// Why a search outcome carries fewer guarantees than requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// The combined hybrid query failed; hits come from the lexical-only
    /// fallback.
    LexicalFallback { reason: String },
    /// Every search path failed; the hit list is empty or partial.
    Unavailable { reason: String },
}

/// Hits plus an optional degradation marker.
///
/// Keeps "legitimately no results" distinguishable from "search subsystem
/// failed" without forcing UI-level callers to handle errors.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub degraded: Option<Degradation>,
}

impl SearchOutcome {
    #[must_use]
    pub fn ok(hits: Vec<SearchHit>) -> Self {
        Self { hits, degraded: None }
    }

    #[must_use]
    pub fn degraded(hits: Vec<SearchHit>, degradation: Degradation) -> Self {
        Self { hits, degraded: Some(degradation) }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Counts reported by a bulk insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub indexed: usize,
    pub failed: usize,
}

impl BulkReport {
    pub fn absorb(&mut self, other: BulkReport) {
        self.indexed += other.indexed;
        self.failed += other.failed;
    }
}

/// Typed query model translated by the store into its native DSL.
///
/// The store is the only place that knows the engine's wire shapes;
/// everything above it works with these variants.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    /// Lexical match clause against the content field (BM25-family scoring).
    Match { text: String },
    /// Approximate k-NN clause against the embedding field (cosine, per
    /// index configuration).
    Knn { vector: Vec<f32>, k: usize },
    /// Logical OR of clauses; the engine fuses clause scores natively.
    Should(Vec<SearchQuery>),
}
