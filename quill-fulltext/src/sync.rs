//! Applies a transaction buffer to the index.
//!
//! The index is a materialized view of the triple store: whenever a subject's
//! literal set may have shrunk, its document is deleted and rebuilt from the
//! store's current facts instead of being patched in place. Tokenized data
//! cannot be reliably stripped, so re-reading the authoritative state is the
//! only way to keep the facts-to-fields invariant.

use crate::buffer::Operation;
use crate::error::Result;
use quill_core::term::{context_index_id, NULL_CONTEXT_ID};
use quill_core::{Resource, Statement, StoreConnection};
use quill_index::{make_document, TextIndex, WriteScope};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error, warn};

/// Applies buffered operations to one index, reading rebuilt subjects from
/// the underlying store connection (which has already committed the
/// transaction).
pub struct IndexSynchronizer<'a, C: StoreConnection> {
    index: &'a TextIndex,
    connection: &'a C,
}

impl<'a, C: StoreConnection> IndexSynchronizer<'a, C> {
    pub fn new(index: &'a TextIndex, connection: &'a C) -> Self {
        Self { index, connection }
    }

    /// Applies the operations in order, holding the index write scope for the
    /// whole apply. On failure the remaining operations are lost; the error
    /// is surfaced and the index may need a reindex.
    pub fn apply(&self, operations: Vec<Operation>) -> Result<()> {
        let total = operations.len();
        let mut scope = self.index.write_scope();

        for (applied, operation) in operations.into_iter().enumerate() {
            if let Err(err) = self.apply_operation(&mut scope, operation) {
                error!(
                    applied,
                    lost = total - applied,
                    "aborting index apply; remaining buffered operations are lost and the index may be corrupt"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    fn apply_operation(&self, scope: &mut WriteScope<'_>, operation: Operation) -> Result<()> {
        match operation {
            Operation::AddRemove { added, removed } => {
                debug!(
                    adding = added.len(),
                    removing = removed.len(),
                    "applying add/remove operation"
                );
                self.apply_add_remove(scope, added, removed)
            }
            Operation::ClearContext(contexts) => {
                debug!(contexts = contexts.len(), "clearing contexts");
                self.apply_clear_contexts(scope, contexts)
            }
            Operation::ClearAll => scope.clear().map_err(Into::into),
        }
    }

    fn apply_add_remove(
        &self,
        scope: &mut WriteScope<'_>,
        added: FxHashSet<Statement>,
        removed: FxHashSet<Statement>,
    ) -> Result<()> {
        let mut adds_by_subject: FxHashMap<Resource, Vec<Statement>> = FxHashMap::default();
        let mut removed_subjects: FxHashMap<Resource, usize> = FxHashMap::default();
        let mut subjects: FxHashSet<Resource> = FxHashSet::default();

        for statement in added {
            subjects.insert(statement.subject().clone());
            adds_by_subject
                .entry(statement.subject().clone())
                .or_default()
                .push(statement);
        }
        for statement in removed {
            subjects.insert(statement.subject().clone());
            *removed_subjects.entry(statement.subject().clone()).or_default() += 1;
        }

        for subject in subjects {
            match scope.document(&subject)? {
                None => {
                    if let Some(adds) = adds_by_subject.get(&subject) {
                        let document = make_document(&subject, adds);
                        if !document.is_empty() {
                            scope.insert_document(&document)?;
                        }
                    }
                    if let Some(count) = removed_subjects.get(&subject) {
                        warn!(
                            subject = %subject,
                            count,
                            "statements marked for removal for a resource without a document; nothing done"
                        );
                    }
                }
                Some(_) => {
                    // The subject's literal set may have shrunk: rebuild from
                    // the store's current facts plus this transaction's adds.
                    scope.delete_subject(&subject)?;
                    let document = self.rebuilt_document(
                        &subject,
                        adds_by_subject.get(&subject).map(Vec::as_slice).unwrap_or(&[]),
                    )?;
                    if !document.is_empty() {
                        scope.insert_document(&document)?;
                    }
                }
            }
        }

        scope.commit()?;
        Ok(())
    }

    fn apply_clear_contexts(
        &self,
        scope: &mut WriteScope<'_>,
        contexts: Vec<Resource>,
    ) -> Result<()> {
        let cleared_ids: FxHashSet<String> =
            contexts.iter().map(|c| context_index_id(Some(c))).collect();

        // A document survives when some other context of it is neither being
        // cleared nor the default-graph sentinel; it must then be rebuilt
        // from the store after the deletion below.
        let mut survivors: FxHashSet<Resource> = FxHashSet::default();
        for context_id in &cleared_ids {
            for document in scope.documents_in_context(context_id)? {
                let survives = document.contexts().iter().any(|other| {
                    !cleared_ids.contains(other) && other != NULL_CONTEXT_ID
                });
                if survives {
                    survivors.insert(document.resource());
                }
            }
        }

        for context_id in &cleared_ids {
            scope.delete_context(context_id)?;
        }

        for subject in survivors {
            debug!(subject = %subject, "re-adding resource with surviving contexts");
            let document = self.rebuilt_document(&subject, &[])?;
            if !document.is_empty() {
                scope.insert_document(&document)?;
            }
        }

        scope.commit()?;
        Ok(())
    }

    /// Builds a fresh document from the store's current facts for `subject`,
    /// merged with any buffered adds.
    fn rebuilt_document(
        &self,
        subject: &Resource,
        adds: &[Statement],
    ) -> Result<quill_index::ResourceDocument> {
        let mut statements: Vec<Statement> = self
            .connection
            .statements(Some(subject), None, None, false)?
            .collect::<std::result::Result<_, _>>()?;
        statements.extend(adds.iter().cloned());
        Ok(make_document(subject, &statements))
    }
}
