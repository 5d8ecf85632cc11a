//! The transaction buffer: operations collected between begin and commit.
//!
//! Operations are kept in insertion order. Adds and removes coalesce into the
//! trailing [`Operation::AddRemove`], whose two sets stay strictly disjoint:
//! adding a fact cancels its pending removal and vice versa, so a fact added
//! and removed in one transaction leaves no trace.

use quill_core::{Resource, Statement};
use rustc_hash::FxHashSet;

/// One buffered index operation.
#[derive(Debug)]
pub enum Operation {
    /// Paired sets of facts to add and remove; always disjoint.
    AddRemove {
        added: FxHashSet<Statement>,
        removed: FxHashSet<Statement>,
    },
    /// Named contexts to clear.
    ClearContext(Vec<Resource>),
    /// Truncate the whole index.
    ClearAll,
}

/// Collects a transaction's operations for a single apply at commit.
#[derive(Debug, Default)]
pub struct TransactionBuffer {
    operations: Vec<Operation>,
}

impl TransactionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn trailing_add_remove(&mut self) -> (&mut FxHashSet<Statement>, &mut FxHashSet<Statement>) {
        if !matches!(self.operations.last(), Some(Operation::AddRemove { .. })) {
            self.operations.push(Operation::AddRemove {
                added: FxHashSet::default(),
                removed: FxHashSet::default(),
            });
        }
        match self.operations.last_mut() {
            Some(Operation::AddRemove { added, removed }) => (added, removed),
            _ => unreachable!("trailing operation is AddRemove by construction"),
        }
    }

    /// Buffers a fact addition, cancelling a pending removal of the same fact.
    pub fn add(&mut self, statement: Statement) {
        let (added, removed) = self.trailing_add_remove();
        removed.remove(&statement);
        added.insert(statement);
    }

    /// Buffers a fact removal, cancelling a pending addition of the same fact.
    pub fn remove(&mut self, statement: Statement) {
        let (added, removed) = self.trailing_add_remove();
        added.remove(&statement);
        removed.insert(statement);
    }

    /// Buffers a clear: of the whole index when `contexts` is empty,
    /// otherwise of the named contexts.
    pub fn clear(&mut self, contexts: &[Resource]) {
        if contexts.is_empty() {
            self.operations.push(Operation::ClearAll);
        } else {
            self.operations
                .push(Operation::ClearContext(contexts.to_vec()));
        }
    }

    /// Collapses the buffer: everything before the last full clear is moot.
    pub fn optimize(&mut self) {
        let last_clear = self
            .operations
            .iter()
            .rposition(|op| matches!(op, Operation::ClearAll));
        if let Some(idx) = last_clear {
            self.operations.drain(..idx);
        }
    }

    /// Empties the buffer without applying anything.
    pub fn reset(&mut self) {
        self.operations.clear();
    }

    /// Drains the buffered operations for apply, leaving the buffer empty.
    pub fn take_operations(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.operations)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
