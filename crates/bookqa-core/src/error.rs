use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Dense index has not been built")]
    NotBuilt,

    #[error("Lexical index is not ready")]
    IndexNotReady,

    #[error("Corpus is empty")]
    CorpusEmpty,

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Embedder failed: {0}")]
    Embedder(String),

    #[error("Lexical index error: {0}")]
    Lexical(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a failure coming out of an [`crate::traits::Embedder`].
    pub fn embedder(err: anyhow::Error) -> Self {
        Self::Embedder(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
