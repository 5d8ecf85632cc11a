//! Index store configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the tokenizer used when none is configured.
pub const DEFAULT_ANALYZER: &str = "default";

/// Where the index keeps its segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexLocation {
    /// A directory on disk.
    Disk(PathBuf),
    /// Process memory; discarded on drop. Intended for testing.
    Memory,
}

/// Configuration for opening a [`crate::TextIndex`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub location: IndexLocation,
    /// Name of a registered tokenizer; [`DEFAULT_ANALYZER`] when absent.
    pub analyzer: Option<String>,
}

impl IndexConfig {
    pub fn disk(path: impl Into<PathBuf>) -> Self {
        Self {
            location: IndexLocation::Disk(path.into()),
            analyzer: None,
        }
    }

    pub fn memory() -> Self {
        Self {
            location: IndexLocation::Memory,
            analyzer: None,
        }
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn analyzer_name(&self) -> &str {
        self.analyzer.as_deref().unwrap_or(DEFAULT_ANALYZER)
    }
}
