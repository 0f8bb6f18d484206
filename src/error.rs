//! Error types for anchorauth

use thiserror::Error;

/// The main error type for anchorauth operations.
///
/// Business-rule mismatches during a decision are never errors; they fold into
/// a deny. Only rights mutation, lookups and storage surface an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorAuthError {
    /// A request was malformed or would break a role invariant.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A role was asked to do something its kind never supports.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A user or entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// LMDB or record encoding failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl AnchorAuthError {
    /// Short machine-readable kind, used by the REST layer.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Configuration(_) => "configuration",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
        }
    }
}

/// Result type alias for anchorauth operations
pub type Result<T> = std::result::Result<T, AnchorAuthError>;

/// Convert any storage-layer error to AnchorAuthError
pub fn err<E: std::error::Error>(e: E) -> AnchorAuthError {
    AnchorAuthError::Storage(e.to_string())
}

pub(crate) fn invalid(msg: impl Into<String>) -> AnchorAuthError {
    AnchorAuthError::Validation(msg.into())
}

pub(crate) fn not_found(msg: impl Into<String>) -> AnchorAuthError {
    AnchorAuthError::NotFound(msg.into())
}
