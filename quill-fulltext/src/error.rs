//! Error types for the full-text overlay.

use quill_core::StoreError;
use quill_index::IndexError;
use thiserror::Error;

/// Result type alias using [`FulltextError`]
pub type Result<T> = std::result::Result<T, FulltextError>;

/// Failures raised by the overlay.
#[derive(Error, Debug)]
pub enum FulltextError {
    /// Bad overlay configuration (missing or conflicting directory keys)
    #[error("configuration error: {0}")]
    Config(String),

    /// A textual sub-pattern that violates the query shape rules
    #[error("invalid text query: {0}")]
    InvalidQuery(String),

    /// Failure in the index store
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Failure in the underlying triple store
    #[error(transparent)]
    Store(#[from] StoreError),
}
