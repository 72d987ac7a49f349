//! Domain-level error taxonomy for Tribunal.

/// Tribunal domain errors.
#[derive(Debug, thiserror::Error)]
pub enum TribunalError {
    #[error("invalid rubric: {0}")]
    InvalidRubric(String),

    #[error("unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Tribunal domain operations.
pub type Result<T> = std::result::Result<T, TribunalError>;
