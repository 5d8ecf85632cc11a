//! Error types for the index store.

use thiserror::Error;

/// Result type alias using [`IndexError`]
pub type Result<T> = std::result::Result<T, IndexError>;

/// Failures raised by the index store.
///
/// I/O and engine failures are always surfaced; corrupt-state conditions
/// (such as duplicate documents for one subject) are logged as warnings at
/// the site that can continue, and only reach this type when nothing can.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Bad index configuration (missing directory, unknown analyzer)
    #[error("index configuration error: {0}")]
    Config(String),

    /// Filesystem failure on the index directory
    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure inside the full-text engine
    #[error("full-text engine error: {0}")]
    Engine(#[from] tantivy::TantivyError),

    /// The index directory could not be opened
    #[error("index directory error: {0}")]
    Directory(#[from] tantivy::directory::error::OpenDirectoryError),

    /// A query string that cannot be parsed or yields no searchable terms
    #[error("query parse error: {0}")]
    Query(String),

    /// Stored index state that violates the document invariants
    #[error("corrupt index state: {0}")]
    Corrupt(String),

    /// Stored payload that cannot be encoded or decoded
    #[error("document payload error: {0}")]
    Payload(#[from] serde_json::Error),
}
