use thiserror::Error;

/// Errors that can occur when publishing or reading audit records.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The sink could not accept the record.
    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),

    /// A required field was not set on the record builder.
    #[error("Incomplete audit record: missing {0}")]
    Incomplete(&'static str),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;
