//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env
//! vars, with typed sections for the store, embedder, search and ingestion
//! knobs. A helper expands `~` and `${VAR}` in user-provided paths.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        // APP_OPENSEARCH__HOST=... maps to [opensearch] host; the double
        // underscore keeps keys like timeout_secs intact.
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract a typed section, falling back to its defaults when the key is
    /// absent (a missing config file still yields a runnable local setup).
    pub fn section<T>(&self, key: &str) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        self.figment.extract_inner(key).unwrap_or_default()
    }
}

/// `[opensearch]` section: index store endpoint and transport policy.
///
/// Timeout and retry counts are transport configuration, never hardcoded
/// into retrieval logic.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub index: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9200,
            index: "localrag".to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// `[embedding]` section: embedder endpoint and model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".to_string(),
            port: 11434,
            model: "nomic-embed-text".to_string(),
        }
    }
}

/// `[search]` section: retrieval defaults, caller-overridable per query.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub top_k: usize,
    pub refinement_steps: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { top_k: 20, refinement_steps: 3 }
    }
}

/// `[ingest]` section: chunking and bulk-insert batching.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub batch_size: usize,
    pub max_tokens: usize,
    pub overlap_percent: f32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { batch_size: 100, max_tokens: 500, overlap_percent: 0.2 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
