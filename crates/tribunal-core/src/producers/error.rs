//! Error types for producers.

/// Errors a producer may surface to the scheduler. All of them are
/// non-fatal to the run: the scheduler records them and keeps the
/// sibling tasks' results.
#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error("artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    #[error("inspection failed: {0}")]
    Inspection(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for producer operations.
pub type ProducerResult<T> = std::result::Result<T, ProducerError>;
