use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("invalid memory policy: {0}")]
    InvalidPolicy(String),

    #[error("embedding provider error: {0}")]
    Embedding(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },

    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
