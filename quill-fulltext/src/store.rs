//! The overlay: a store wrapper that keeps a full-text index consistent with
//! its base store and answers textual sub-queries from that index.
//!
//! Writes flow through unchanged; a connection listener on the base store
//! feeds the transaction buffer with the facts that actually changed (literal
//! objects only). On commit the base store commits first, then the buffered
//! operations are applied to the index in one synchronized pass. Queries are
//! inspected for textual sub-patterns; when present, evaluation runs through
//! the textual iterator with the outer algebra preserved.

use crate::buffer::{Operation, TransactionBuffer};
use crate::config::FulltextConfig;
use crate::cursor::{build_cursor, Rows};
use crate::error::{FulltextError, Result};
use crate::spec::extract_query_specs;
use crate::sync::IndexSynchronizer;
use parking_lot::Mutex;
use quill_core::algebra::TupleExpr;
use quill_core::term::{Resource, Uri, Value};
use quill_core::{
    BindingSet, ConnectionListener, Statement, Store, StoreConnection,
};
use quill_index::TextIndex;
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Listener that buffers effective literal changes of the base connection.
/// Disabled while a context clear runs; clears are buffered as one operation.
struct BufferListener {
    buffer: Arc<Mutex<TransactionBuffer>>,
    enabled: AtomicBool,
}

impl BufferListener {
    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl ConnectionListener for BufferListener {
    fn statement_added(&self, statement: &Statement) {
        if self.is_enabled() && statement.has_literal_object() {
            self.buffer.lock().add(statement.clone());
        }
    }

    fn statement_removed(&self, statement: &Statement) {
        if self.is_enabled() && statement.has_literal_object() {
            self.buffer.lock().remove(statement.clone());
        }
    }
}

/// A base store extended with full-text search over its literals.
pub struct FulltextStore<S: Store> {
    inner: S,
    index: Arc<TextIndex>,
    incomplete_query_fails: bool,
}

impl<S: Store> FulltextStore<S> {
    /// Opens (or creates) the index described by `config` and wraps `inner`.
    pub fn new(inner: S, config: FulltextConfig) -> Result<Self> {
        let index = TextIndex::open(&config.index_config())?;
        Ok(Self {
            inner,
            index: Arc::new(index),
            incomplete_query_fails: config.incomplete_query_fails,
        })
    }

    /// Wraps `inner` around an externally managed index.
    pub fn with_index(inner: S, index: Arc<TextIndex>) -> Self {
        Self {
            inner,
            index,
            incomplete_query_fails: true,
        }
    }

    /// Sets the validation severity for malformed textual sub-patterns.
    pub fn incomplete_query_fails(mut self, fails: bool) -> Self {
        self.incomplete_query_fails = fails;
        self
    }

    pub fn index(&self) -> &Arc<TextIndex> {
        &self.index
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// A connection whose transactions keep the index in step with the base
    /// store.
    pub fn connection(&self) -> Result<FulltextConnection<S::Connection>> {
        let mut inner = self.inner.connection()?;
        let buffer = Arc::new(Mutex::new(TransactionBuffer::new()));
        let listener = Arc::new(BufferListener {
            buffer: buffer.clone(),
            enabled: AtomicBool::new(true),
        });
        inner.add_listener(listener.clone());
        Ok(FulltextConnection {
            inner,
            index: self.index.clone(),
            buffer,
            listener,
            incomplete_query_fails: self.incomplete_query_fails,
        })
    }

    /// Rebuilds the whole index from the base store's current facts.
    pub fn reindex(&self) -> Result<()> {
        debug!("reindexing full-text store");
        self.index.clear()?;

        let connection = self.inner.connection()?;
        let mut added: FxHashSet<Statement> = FxHashSet::default();
        for statement in connection.statements(None, None, None, false)? {
            let statement = statement?;
            if statement.has_literal_object() {
                added.insert(statement);
            }
        }
        if added.is_empty() {
            return Ok(());
        }

        let synchronizer = IndexSynchronizer::new(&self.index, &connection);
        synchronizer.apply(vec![Operation::AddRemove {
            added,
            removed: FxHashSet::default(),
        }])
    }
}

/// A transactional connection through the overlay.
pub struct FulltextConnection<C: StoreConnection> {
    inner: C,
    index: Arc<TextIndex>,
    buffer: Arc<Mutex<TransactionBuffer>>,
    listener: Arc<BufferListener>,
    incomplete_query_fails: bool,
}

impl<C: StoreConnection> FulltextConnection<C> {
    pub fn add_statement(&mut self, statement: Statement) -> Result<()> {
        self.inner.add_statement(statement)?;
        Ok(())
    }

    pub fn remove_statements(
        &mut self,
        subject: Option<&Resource>,
        predicate: Option<&Uri>,
        object: Option<&Value>,
        contexts: &[Resource],
    ) -> Result<usize> {
        Ok(self
            .inner
            .remove_statements(subject, predicate, object, contexts)?)
    }

    /// Clears the base store and buffers the matching index clear. Context
    /// removal is handled wholesale, so the per-statement listener is
    /// suspended for the duration.
    pub fn clear(&mut self, contexts: &[Resource]) -> Result<()> {
        self.listener.set_enabled(false);
        let result = self.inner.clear(contexts);
        self.listener.set_enabled(true);
        result?;
        self.buffer.lock().clear(contexts);
        Ok(())
    }

    /// Commits the base store, then applies the buffered operations to the
    /// index. The buffer is drained whether or not the apply succeeds.
    pub fn commit(&mut self) -> Result<()> {
        self.inner.commit()?;

        let operations = {
            let mut buffer = self.buffer.lock();
            buffer.optimize();
            buffer.take_operations()
        };
        if operations.is_empty() {
            return Ok(());
        }
        debug!(
            operations = operations.len(),
            "committing full-text index transaction"
        );

        let synchronizer = IndexSynchronizer::new(&self.index, &self.inner);
        synchronizer.apply(operations)
    }

    /// Rolls the base store back, empties the buffer, and abandons any
    /// uncommitted index state.
    pub fn rollback(&mut self) -> Result<()> {
        self.inner.rollback()?;
        self.buffer.lock().reset();
        self.index.rollback()?;
        Ok(())
    }

    pub fn statements<'a>(
        &'a self,
        subject: Option<&Resource>,
        predicate: Option<&Uri>,
        object: Option<&Value>,
        include_inferred: bool,
    ) -> Result<quill_core::StatementIter<'a>> {
        Ok(self
            .inner
            .statements(subject, predicate, object, include_inferred)?)
    }

    /// Evaluates a query. Textual sub-patterns are answered from the index
    /// and joined with the base store's evaluation of the residual query;
    /// queries without textual sub-patterns are delegated unchanged.
    pub fn evaluate<'a>(
        &'a self,
        query: &TupleExpr,
        bindings: &BindingSet,
        include_inferred: bool,
    ) -> Result<Rows<'a>> {
        let extracted = extract_query_specs(query, bindings, self.incomplete_query_fails)?;

        if !extracted.is_textual() {
            if extracted.pattern_ids.is_empty() {
                let rows = self.inner.evaluate(query, bindings, include_inferred)?;
                return Ok(Box::new(rows.map(|row| row.map_err(FulltextError::from))));
            }
            // Orphaned reserved patterns, tolerated by configuration:
            // substitute them and let the base store answer the rest.
            let residual = query.clone().replace_patterns(&extracted.pattern_ids);
            let rows = self.inner.evaluate(&residual, bindings, include_inferred)?;
            return Ok(Box::new(rows.map(|row| row.map_err(FulltextError::from))));
        }

        build_cursor(
            self.index.as_ref(),
            &self.inner,
            extracted.specs,
            &extracted.pattern_ids,
            query.clone(),
            bindings,
            include_inferred,
        )
    }

    pub fn index(&self) -> &Arc<TextIndex> {
        &self.index
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}
