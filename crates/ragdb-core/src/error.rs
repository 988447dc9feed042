use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Index query failed: {0}")]
    IndexQueryFailed(String),

    #[error("Index store unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
