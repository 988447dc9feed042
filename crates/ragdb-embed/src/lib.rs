//! ragdb-embed
//!
//! Embedder implementations: an Ollama-backed HTTP client for real
//! deployments and a deterministic hash-based fake for tests and offline
//! development.

use async_trait::async_trait;
use ollama_rs::{
    generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest},
    Ollama,
};
use tracing::info;

use ragdb_core::config::EmbeddingConfig;
use ragdb_core::error::{Error, Result};
use ragdb_core::traits::Embedder;

/// Text used to discover the deployment's embedding dimension before index
/// creation.
const DIMENSION_PROBE_TEXT: &str = "Sample text for dimension detection";

/// Client over the Ollama embeddings API.
///
/// The output dimension is fixed by the configured model
/// (`nomic-embed-text` is 768). Any transport or API error maps to
/// `Error::EmbeddingUnavailable`; the retriever's fallback policy decides
/// what to do with it.
pub struct OllamaEmbedder {
    client: Ollama,
    model: String,
}

impl OllamaEmbedder {
    #[must_use]
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            client: Ollama::new(config.host.clone(), config.port),
            model: config.model.clone(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = GenerateEmbeddingsRequest::new(
            self.model.clone(),
            EmbeddingsInput::Single(text.to_string()),
        );
        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("ollama request failed: {e}")))?;
        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingUnavailable("empty embeddings response".to_string()))
    }

    // Ollama's embed API accepts multiple inputs in one request.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = GenerateEmbeddingsRequest::new(
            self.model.clone(),
            EmbeddingsInput::Multiple(texts.to_vec()),
        );
        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("ollama request failed: {e}")))?;
        if response.embeddings.len() != texts.len() {
            return Err(Error::EmbeddingUnavailable(format!(
                "embedding count mismatch: {} inputs, {} vectors",
                texts.len(),
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }
}

/// Deterministic embedder for tests: hashes whitespace tokens into a
/// fixed-size L2-normalized vector. Same input, same vector.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for FakeEmbedder {
    fn default() -> Self {
        // nomic-embed-text's dimension, so fake and real runs agree
        Self::new(768)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}

/// Build the deployment embedder, honoring `APP_USE_FAKE_EMBEDDINGS=1` the
/// way the indexer tooling expects for offline runs.
pub fn default_embedder(config: &EmbeddingConfig) -> Box<dyn Embedder> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        info!("using FakeEmbedder");
        return Box::new(FakeEmbedder::default());
    }
    info!(model = %config.model, "using Ollama embedder at {}:{}", config.host, config.port);
    Box::new(OllamaEmbedder::new(config))
}

/// Embed a fixed sample text and return the vector length. Index creation
/// locks the schema to this dimension.
pub async fn probe_dimension(embedder: &dyn Embedder) -> Result<usize> {
    let sample = embedder.embed(DIMENSION_PROBE_TEXT).await?;
    if sample.is_empty() {
        return Err(Error::EmbeddingUnavailable(
            "embedder returned a zero-length vector".to_string(),
        ));
    }
    Ok(sample.len())
}
