//! The full-text index side of quill: a synchronized wrapper over a tantivy
//! index plus the per-subject document shape it stores.
//!
//! # Components
//!
//! - [`store::TextIndex`]: handle lifecycle (writer/reader), searching,
//!   single-fact maintenance, and the [`store::WriteScope`] mutation scope
//! - [`document`]: the `ResourceDocument` shape and its pure mapper functions
//! - [`query::TextQuery`]: the resolved query forms handed over by the
//!   interpreter
//! - [`config::IndexConfig`]: directory and analyzer selection
//!
//! The index is a materialized view of the triple store it accompanies:
//! document mutations always rebuild from authoritative facts rather than
//! reverse-engineering tokenized data.

pub mod config;
pub mod document;
pub mod error;
pub mod query;
pub mod store;

pub use config::{IndexConfig, IndexLocation, DEFAULT_ANALYZER};
pub use document::{make_document, ResourceDocument};
pub use error::{IndexError, Result};
pub use query::TextQuery;
pub use store::{snippet_html, ParsedQuery, SearchHit, TextIndex, WriteScope};
