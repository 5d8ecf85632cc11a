//! Full-text search overlay for quill triple stores.
//!
//! `FulltextStore` wraps any [`quill_core::Store`] and keeps a secondary
//! full-text index over its literal objects, one document per subject.
//! Graph-pattern queries that use the reserved vocabulary
//! ([`quill_core::vocab::search`]) are rewritten: the textual sub-patterns
//! are answered from the index, the remaining query is answered by the base
//! store, and the joined rows stream back to the caller with match, score,
//! and snippet bindings.
//!
//! # Components
//!
//! - [`buffer`]: transaction buffer collecting add/remove/clear operations
//! - [`sync`]: applies an optimized buffer to the index, rebuilding shrunken
//!   documents from the authoritative store
//! - [`spec`]: recognition and validation of textual sub-patterns
//! - [`iter`]: the hit-odometer iterator joining index hits with store rows
//! - [`cursor`]: outer-algebra stream transformers
//! - [`store`]: the `FulltextStore`/`FulltextConnection` wrapper pair
//!
//! # Example
//!
//! ```no_run
//! use quill_core::algebra::{StatementPattern, TupleExpr, Var};
//! use quill_core::term::{Resource, Uri, Value};
//! use quill_core::vocab::search;
//! use quill_core::{BindingSet, Statement};
//! use quill_fulltext::{FulltextConfig, FulltextStore};
//! use quill_memory::MemoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FulltextStore::new(MemoryStore::new(), FulltextConfig::memory())?;
//!
//! let mut conn = store.connection()?;
//! conn.add_statement(Statement::new(
//!     Resource::uri("urn:doc:1"),
//!     Uri::new("urn:title"),
//!     Value::literal("an example document"),
//! ))?;
//! conn.commit()?;
//!
//! // ?subject search:matches [ search:query "example" ]
//! let query = TupleExpr::Join(vec![
//!     TupleExpr::Pattern(StatementPattern::new(
//!         Var::free("subject"),
//!         Var::constant(Value::Resource(Resource::uri(search::MATCHES))),
//!         Var::free("match"),
//!     )),
//!     TupleExpr::Pattern(StatementPattern::new(
//!         Var::free("match"),
//!         Var::constant(Value::Resource(Resource::uri(search::QUERY))),
//!         Var::constant(Value::literal("example")),
//!     )),
//! ]);
//! for row in conn.evaluate(&query, &BindingSet::new(), false)? {
//!     println!("{}", row?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod cursor;
pub mod error;
pub mod iter;
pub mod spec;
pub mod store;
pub mod sync;

pub use config::{
    FulltextConfig, ANALYZER_KEY, INCOMPLETE_QUERY_FAIL_KEY, INDEX_DIR_KEY, RAM_DIR_KEY,
};
pub use error::{FulltextError, Result};
pub use spec::{extract_query_specs, ExtractedSpecs, QuerySpec};
pub use store::{FulltextConnection, FulltextStore};
pub use sync::IndexSynchronizer;
