//! An in-memory triple store implementing the quill store contract.
//!
//! `MemoryStore` keeps committed facts in a shared set; each connection
//! stages adds and removes until `commit`. Listeners receive events only for
//! effective changes: re-adding a visible fact or removing an absent one is
//! silent, so a listener-fed transaction buffer never sees no-ops.

mod eval;

use parking_lot::RwLock;
use quill_core::algebra::TupleExpr;
use quill_core::store::{
    BindingIter, ConnectionListener, StatementIter, Store, StoreConnection, StoreError,
};
use quill_core::term::{Resource, Uri, Value};
use quill_core::{BindingSet, Statement};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::debug;

/// A shared, transactional, in-memory fact set.
#[derive(Clone, Default)]
pub struct MemoryStore {
    committed: Arc<RwLock<FxHashSet<Statement>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed facts.
    pub fn len(&self) -> usize {
        self.committed.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.read().is_empty()
    }
}

impl Store for MemoryStore {
    type Connection = MemoryConnection;

    fn connection(&self) -> Result<Self::Connection, StoreError> {
        Ok(MemoryConnection {
            committed: self.committed.clone(),
            pending_add: FxHashSet::default(),
            pending_remove: FxHashSet::default(),
            listeners: Vec::new(),
        })
    }
}

/// A connection with its own uncommitted change sets.
pub struct MemoryConnection {
    committed: Arc<RwLock<FxHashSet<Statement>>>,
    pending_add: FxHashSet<Statement>,
    pending_remove: FxHashSet<Statement>,
    listeners: Vec<Arc<dyn ConnectionListener>>,
}

impl MemoryConnection {
    fn is_visible(&self, statement: &Statement) -> bool {
        if self.pending_add.contains(statement) {
            return true;
        }
        if self.pending_remove.contains(statement) {
            return false;
        }
        self.committed.read().contains(statement)
    }

    /// The facts this connection sees: committed state plus its own staging.
    fn visible(&self) -> Vec<Statement> {
        let committed = self.committed.read();
        committed
            .iter()
            .filter(|s| !self.pending_remove.contains(*s))
            .chain(self.pending_add.iter())
            .cloned()
            .collect()
    }

    fn notify_added(&self, statement: &Statement) {
        for listener in &self.listeners {
            listener.statement_added(statement);
        }
    }

    fn notify_removed(&self, statement: &Statement) {
        for listener in &self.listeners {
            listener.statement_removed(statement);
        }
    }

    fn remove_visible(&mut self, statement: Statement) {
        // The fact may be staged, committed, or (after a remove/re-add cycle
        // in this transaction) both.
        self.pending_add.remove(&statement);
        if self.committed.read().contains(&statement) {
            self.pending_remove.insert(statement.clone());
        }
        self.notify_removed(&statement);
    }

    fn matches(
        statement: &Statement,
        subject: Option<&Resource>,
        predicate: Option<&Uri>,
        object: Option<&Value>,
        contexts: &[Resource],
    ) -> bool {
        if let Some(subject) = subject {
            if statement.subject() != subject {
                return false;
            }
        }
        if let Some(predicate) = predicate {
            if statement.predicate() != predicate {
                return false;
            }
        }
        if let Some(object) = object {
            if statement.object() != object {
                return false;
            }
        }
        if !contexts.is_empty() {
            match statement.context() {
                Some(context) => contexts.contains(context),
                None => false,
            }
        } else {
            true
        }
    }
}

impl StoreConnection for MemoryConnection {
    fn add_statement(&mut self, statement: Statement) -> Result<(), StoreError> {
        if self.is_visible(&statement) {
            return Ok(());
        }
        self.pending_remove.remove(&statement);
        self.pending_add.insert(statement.clone());
        self.notify_added(&statement);
        Ok(())
    }

    fn remove_statements(
        &mut self,
        subject: Option<&Resource>,
        predicate: Option<&Uri>,
        object: Option<&Value>,
        contexts: &[Resource],
    ) -> Result<usize, StoreError> {
        let matching: Vec<Statement> = self
            .visible()
            .into_iter()
            .filter(|s| Self::matches(s, subject, predicate, object, contexts))
            .collect();
        let count = matching.len();
        for statement in matching {
            self.remove_visible(statement);
        }
        Ok(count)
    }

    fn clear(&mut self, contexts: &[Resource]) -> Result<(), StoreError> {
        let matching: Vec<Statement> = self
            .visible()
            .into_iter()
            .filter(|s| {
                contexts.is_empty() || s.context().is_some_and(|c| contexts.contains(c))
            })
            .collect();
        debug!(removed = matching.len(), "clearing memory store");
        for statement in matching {
            self.remove_visible(statement);
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let mut committed = self.committed.write();
        for statement in self.pending_remove.drain() {
            committed.remove(&statement);
        }
        for statement in self.pending_add.drain() {
            committed.insert(statement);
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.pending_add.clear();
        self.pending_remove.clear();
        Ok(())
    }

    fn statements<'a>(
        &'a self,
        subject: Option<&Resource>,
        predicate: Option<&Uri>,
        object: Option<&Value>,
        _include_inferred: bool,
    ) -> Result<StatementIter<'a>, StoreError> {
        let matching: Vec<Statement> = self
            .visible()
            .into_iter()
            .filter(|s| Self::matches(s, subject, predicate, object, &[]))
            .collect();
        Ok(Box::new(matching.into_iter().map(Ok)))
    }

    fn evaluate<'a>(
        &'a self,
        query: &TupleExpr,
        bindings: &BindingSet,
        _include_inferred: bool,
    ) -> Result<BindingIter<'a>, StoreError> {
        let facts = self.visible();
        let rows = eval::evaluate(&facts, query, bindings);
        Ok(Box::new(rows.into_iter().map(Ok)))
    }

    fn add_listener(&mut self, listener: Arc<dyn ConnectionListener>) {
        self.listeners.push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn fact(s: &str, p: &str, o: &str) -> Statement {
        Statement::new(
            Resource::uri(s.to_owned()),
            Uri::new(p.to_owned()),
            Value::literal(o.to_owned()),
        )
    }

    #[derive(Default)]
    struct RecordingListener {
        added: Mutex<Vec<Statement>>,
        removed: Mutex<Vec<Statement>>,
    }

    impl ConnectionListener for RecordingListener {
        fn statement_added(&self, statement: &Statement) {
            self.added.lock().push(statement.clone());
        }

        fn statement_removed(&self, statement: &Statement) {
            self.removed.lock().push(statement.clone());
        }
    }

    #[test]
    fn commit_publishes_to_other_connections() {
        let store = MemoryStore::new();
        let mut writer = store.connection().unwrap();
        writer.add_statement(fact("urn:s", "urn:p", "v")).unwrap();

        let reader = store.connection().unwrap();
        assert_eq!(reader.statements(None, None, None, false).unwrap().count(), 0);

        writer.commit().unwrap();
        let reader = store.connection().unwrap();
        assert_eq!(reader.statements(None, None, None, false).unwrap().count(), 1);
    }

    #[test]
    fn duplicate_add_is_silent() {
        let store = MemoryStore::new();
        let mut conn = store.connection().unwrap();
        let listener = Arc::new(RecordingListener::default());
        conn.add_listener(listener.clone());

        conn.add_statement(fact("urn:s", "urn:p", "v")).unwrap();
        conn.add_statement(fact("urn:s", "urn:p", "v")).unwrap();
        assert_eq!(listener.added.lock().len(), 1);
    }

    #[test]
    fn remove_of_absent_fact_is_silent() {
        let store = MemoryStore::new();
        let mut conn = store.connection().unwrap();
        let listener = Arc::new(RecordingListener::default());
        conn.add_listener(listener.clone());

        let removed = conn
            .remove_statements(Some(&Resource::uri("urn:missing")), None, None, &[])
            .unwrap();
        assert_eq!(removed, 0);
        assert!(listener.removed.lock().is_empty());
    }

    #[test]
    fn rollback_discards_staging() {
        let store = MemoryStore::new();
        let mut conn = store.connection().unwrap();
        conn.add_statement(fact("urn:s", "urn:p", "v")).unwrap();
        conn.rollback().unwrap();
        conn.commit().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn clear_restricted_to_contexts() {
        let store = MemoryStore::new();
        let mut conn = store.connection().unwrap();
        let c1 = Resource::uri("urn:c1");
        conn.add_statement(Statement::with_context(
            Resource::uri("urn:s"),
            Uri::new("urn:p"),
            Value::literal("in-c1"),
            Some(c1.clone()),
        ))
        .unwrap();
        conn.add_statement(fact("urn:s", "urn:p", "default-graph"))
            .unwrap();
        conn.commit().unwrap();

        let mut conn = store.connection().unwrap();
        conn.clear(std::slice::from_ref(&c1)).unwrap();
        conn.commit().unwrap();

        assert_eq!(store.len(), 1);
    }
}
