//! Error types for tabula-introspect

use thiserror::Error;

/// Result type for introspection operations.
pub type IntrospectResult<T> = Result<T, IntrospectError>;

/// Error type for introspection operations.
#[derive(Debug, Error)]
pub enum IntrospectError {
    /// Database error from tokio-postgres.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    /// The catalog did not describe anything usable.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Snapshot cache (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Decode error when reading a catalog column.
    #[error("Decode error for column '{column}': {message}")]
    Decode { column: String, message: String },
    /// Snapshot cache file error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Error raised by tabula itself.
    #[error(transparent)]
    Tabula(#[from] tabula::TabulaError),
}

impl IntrospectError {
    /// Create a decode error.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        IntrospectError::Decode {
            column: column.into(),
            message: message.into(),
        }
    }
}
