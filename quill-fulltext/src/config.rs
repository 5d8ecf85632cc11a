//! Overlay configuration and parameter parsing.

use crate::error::{FulltextError, Result};
use quill_index::{IndexConfig, IndexLocation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Parameter key selecting an on-disk index directory.
pub const INDEX_DIR_KEY: &str = "indexdir";

/// Parameter key selecting an in-memory index (`"true"`); for testing.
pub const RAM_DIR_KEY: &str = "useramdir";

/// Parameter key naming the analyzer (a registered tokenizer).
pub const ANALYZER_KEY: &str = "analyzer";

/// Parameter key controlling validation severity for malformed textual
/// sub-patterns: `"true"` (default) fails the query, `"false"` logs and
/// skips.
pub const INCOMPLETE_QUERY_FAIL_KEY: &str = "incompletequeryfail";

/// Configuration for a [`crate::FulltextStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulltextConfig {
    pub location: IndexLocation,
    /// Name of a registered tokenizer; the engine default when absent.
    pub analyzer: Option<String>,
    /// Whether malformed textual sub-patterns fail the query (default) or
    /// are logged and skipped.
    pub incomplete_query_fails: bool,
}

impl FulltextConfig {
    pub fn disk(path: impl Into<PathBuf>) -> Self {
        Self {
            location: IndexLocation::Disk(path.into()),
            analyzer: None,
            incomplete_query_fails: true,
        }
    }

    pub fn memory() -> Self {
        Self {
            location: IndexLocation::Memory,
            analyzer: None,
            incomplete_query_fails: true,
        }
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn incomplete_query_fails(mut self, fails: bool) -> Self {
        self.incomplete_query_fails = fails;
        self
    }

    /// Builds a configuration from string parameters. Exactly one of
    /// [`INDEX_DIR_KEY`] and [`RAM_DIR_KEY`] must select a directory.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let disk = params.get(INDEX_DIR_KEY);
        let ram = params
            .get(RAM_DIR_KEY)
            .is_some_and(|value| value == "true");

        let location = match (disk, ram) {
            (Some(path), false) => IndexLocation::Disk(PathBuf::from(path)),
            (None, true) => IndexLocation::Memory,
            (Some(_), true) => {
                return Err(FulltextError::Config(format!(
                    "'{INDEX_DIR_KEY}' and '{RAM_DIR_KEY}' are mutually exclusive"
                )))
            }
            (None, false) => {
                return Err(FulltextError::Config(format!(
                    "no index set and neither '{INDEX_DIR_KEY}' nor '{RAM_DIR_KEY}' given"
                )))
            }
        };

        let incomplete_query_fails = match params.get(INCOMPLETE_QUERY_FAIL_KEY) {
            Some(value) => value.parse::<bool>().map_err(|_| {
                FulltextError::Config(format!(
                    "'{INCOMPLETE_QUERY_FAIL_KEY}' must be 'true' or 'false', got '{value}'"
                ))
            })?,
            None => true,
        };

        Ok(Self {
            location,
            analyzer: params.get(ANALYZER_KEY).cloned(),
            incomplete_query_fails,
        })
    }

    pub(crate) fn index_config(&self) -> IndexConfig {
        IndexConfig {
            location: self.location.clone(),
            analyzer: self.analyzer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn disk_directory_from_params() {
        let config = FulltextConfig::from_params(&params(&[(INDEX_DIR_KEY, "/tmp/idx")])).unwrap();
        assert_eq!(config.location, IndexLocation::Disk(PathBuf::from("/tmp/idx")));
        assert!(config.incomplete_query_fails);
    }

    #[test]
    fn ram_directory_from_params() {
        let config = FulltextConfig::from_params(&params(&[(RAM_DIR_KEY, "true")])).unwrap();
        assert_eq!(config.location, IndexLocation::Memory);
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(matches!(
            FulltextConfig::from_params(&params(&[])),
            Err(FulltextError::Config(_))
        ));
    }

    #[test]
    fn conflicting_directories_are_an_error() {
        let result =
            FulltextConfig::from_params(&params(&[(INDEX_DIR_KEY, "/x"), (RAM_DIR_KEY, "true")]));
        assert!(matches!(result, Err(FulltextError::Config(_))));
    }

    #[test]
    fn incomplete_query_fail_parses() {
        let config = FulltextConfig::from_params(&params(&[
            (RAM_DIR_KEY, "true"),
            (INCOMPLETE_QUERY_FAIL_KEY, "false"),
        ]))
        .unwrap();
        assert!(!config.incomplete_query_fails);
    }
}
