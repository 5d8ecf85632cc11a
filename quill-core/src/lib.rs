//! Core model for the quill workspace.
//!
//! This crate holds everything the other quill crates agree on:
//!
//! - [`term`]: RDF terms (`Uri`, `BNode`, `Resource`, `Literal`, `Value`) and
//!   the string identifier encoding used by the full-text index
//! - [`statement`]: the `Statement` fact type (subject, predicate, object,
//!   optional context)
//! - [`binding`]: `BindingSet`, a solution row mapping variable names to values
//! - [`algebra`]: the tuple-expression query tree walked by the full-text
//!   interpreter and evaluated by stores
//! - [`store`]: the triple-store contract (`Store`, `StoreConnection`,
//!   `ConnectionListener`) consumed by the full-text overlay
//! - [`vocab`]: vocabulary constants, including the reserved full-text
//!   predicates

pub mod algebra;
pub mod binding;
pub mod statement;
pub mod store;
pub mod term;
pub mod vocab;

pub use binding::BindingSet;
pub use statement::Statement;
pub use store::{BindingIter, ConnectionListener, StatementIter, Store, StoreConnection, StoreError};
pub use term::{BNode, Literal, Resource, Uri, Value};
