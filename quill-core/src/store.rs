//! The triple-store contract consumed by the full-text overlay.
//!
//! The overlay needs three things from the store it wraps: pattern scans
//! (`statements`), query evaluation with initial bindings (`evaluate`), and
//! per-fact change notification (`ConnectionListener`). Everything else
//! (storage layout, inference, query parsing) stays behind this seam.

use crate::algebra::TupleExpr;
use crate::binding::BindingSet;
use crate::statement::Statement;
use crate::term::{Resource, Uri, Value};
use std::sync::Arc;
use thiserror::Error;

/// Failures surfaced by a store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("internal store error: {0}")]
    Internal(String),
}

pub type StatementIter<'a> = Box<dyn Iterator<Item = Result<Statement, StoreError>> + 'a>;
pub type BindingIter<'a> = Box<dyn Iterator<Item = Result<BindingSet, StoreError>> + 'a>;

/// Receives per-fact change events from a connection, in call order.
///
/// Implementations must only be notified for effective changes: adding a fact
/// that is already visible, or removing one that is not, stays silent.
pub trait ConnectionListener: Send + Sync {
    fn statement_added(&self, statement: &Statement);
    fn statement_removed(&self, statement: &Statement);
}

/// A transactional connection to a triple store.
pub trait StoreConnection {
    /// Stages a fact for addition. Listeners fire if the fact is new.
    fn add_statement(&mut self, statement: Statement) -> Result<(), StoreError>;

    /// Stages removal of every visible fact matching the pattern; absent
    /// filters are wildcards, an empty `contexts` slice means all contexts.
    /// Returns the number of facts removed.
    fn remove_statements(
        &mut self,
        subject: Option<&Resource>,
        predicate: Option<&Uri>,
        object: Option<&Value>,
        contexts: &[Resource],
    ) -> Result<usize, StoreError>;

    /// Removes all facts, or all facts in the given named contexts.
    fn clear(&mut self, contexts: &[Resource]) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;

    /// Streams facts matching the pattern; absent filters are wildcards.
    ///
    /// Must be callable while a commit is being finalized elsewhere: the
    /// full-text synchronizer re-reads subjects through this method after the
    /// store has applied the transaction.
    fn statements<'a>(
        &'a self,
        subject: Option<&Resource>,
        predicate: Option<&Uri>,
        object: Option<&Value>,
        include_inferred: bool,
    ) -> Result<StatementIter<'a>, StoreError>;

    /// Evaluates a query tree under the given initial bindings.
    fn evaluate<'a>(
        &'a self,
        query: &TupleExpr,
        bindings: &BindingSet,
        include_inferred: bool,
    ) -> Result<BindingIter<'a>, StoreError>;

    /// Registers a listener for subsequent changes through this connection.
    fn add_listener(&mut self, listener: Arc<dyn ConnectionListener>);
}

/// A triple store that can hand out connections.
pub trait Store {
    type Connection: StoreConnection;

    fn connection(&self) -> Result<Self::Connection, StoreError>;
}
