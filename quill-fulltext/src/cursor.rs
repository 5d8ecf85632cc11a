//! Stream transformers preserving the outer algebra around the textual core.
//!
//! The interpreter peels projection, multi-projection, slice, distinct,
//! reduced, and order nodes off the top of the query tree and wraps the core
//! textual iterator in the matching transformer. The core itself always
//! produces rows for the innermost argument.

use crate::error::Result;
use crate::iter::TextQueryIterator;
use crate::spec::QuerySpec;
use quill_core::algebra::{compare_rows, OrderElem, PatternId, ProjectionMap, TupleExpr};
use quill_core::{BindingSet, StoreConnection};
use quill_index::TextIndex;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::sync::Arc;

pub type RowResult = Result<BindingSet>;
pub type Rows<'a> = Box<dyn Iterator<Item = RowResult> + 'a>;

/// Builds the evaluation pipeline for a query with textual sub-patterns:
/// outer algebra nodes become transformers, the rest becomes the core
/// iterator with the recognized patterns substituted away.
pub fn build_cursor<'a, C: StoreConnection>(
    index: &'a TextIndex,
    connection: &'a C,
    specs: Vec<QuerySpec>,
    pattern_ids: &FxHashSet<PatternId>,
    expr: TupleExpr,
    bindings: &BindingSet,
    include_inferred: bool,
) -> Result<Rows<'a>> {
    match expr {
        TupleExpr::Projection { arg, vars } => {
            let inner = build_cursor(
                index,
                connection,
                specs,
                pattern_ids,
                *arg,
                bindings,
                include_inferred,
            )?;
            Ok(Box::new(ProjectionCursor { inner, vars }))
        }
        TupleExpr::MultiProjection { arg, projections } => {
            let inner = build_cursor(
                index,
                connection,
                specs,
                pattern_ids,
                *arg,
                bindings,
                include_inferred,
            )?;
            Ok(Box::new(MultiProjectionCursor {
                inner,
                projections,
                pending: VecDeque::new(),
            }))
        }
        TupleExpr::Slice { arg, offset, limit } => {
            let inner = build_cursor(
                index,
                connection,
                specs,
                pattern_ids,
                *arg,
                bindings,
                include_inferred,
            )?;
            let offset_cursor = OffsetCursor {
                inner,
                remaining: offset,
            };
            Ok(Box::new(LimitCursor {
                inner: Box::new(offset_cursor),
                remaining: limit.unwrap_or(usize::MAX),
            }))
        }
        TupleExpr::Distinct(arg) => {
            let inner = build_cursor(
                index,
                connection,
                specs,
                pattern_ids,
                *arg,
                bindings,
                include_inferred,
            )?;
            Ok(Box::new(DistinctCursor {
                inner,
                seen: FxHashSet::default(),
            }))
        }
        TupleExpr::Reduced(arg) => {
            let inner = build_cursor(
                index,
                connection,
                specs,
                pattern_ids,
                *arg,
                bindings,
                include_inferred,
            )?;
            Ok(Box::new(ReducedCursor { inner, last: None }))
        }
        TupleExpr::Order { arg, by } => {
            let inner = build_cursor(
                index,
                connection,
                specs,
                pattern_ids,
                *arg,
                bindings,
                include_inferred,
            )?;
            Ok(Box::new(OrderCursor {
                inner: Some(inner),
                by,
                sorted: None,
            }))
        }
        core => {
            let residual = core.replace_patterns(pattern_ids);
            let iterator = TextQueryIterator::new(
                index,
                connection,
                specs,
                residual,
                bindings.clone(),
                include_inferred,
            )?;
            Ok(Box::new(iterator))
        }
    }
}

struct ProjectionCursor<'a> {
    inner: Rows<'a>,
    vars: Vec<Arc<str>>,
}

impl Iterator for ProjectionCursor<'_> {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.inner.next()?;
        Some(row.map(|row| row.project(&self.vars)))
    }
}

struct MultiProjectionCursor<'a> {
    inner: Rows<'a>,
    projections: Vec<ProjectionMap>,
    pending: VecDeque<BindingSet>,
}

impl Iterator for MultiProjectionCursor<'_> {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            match self.inner.next()? {
                Ok(row) => {
                    for projection in &self.projections {
                        let mut out = BindingSet::new();
                        for (target, source) in projection {
                            if let Some(value) = row.get(source) {
                                out.insert(target.clone(), value.clone());
                            }
                        }
                        self.pending.push_back(out);
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

struct OffsetCursor<'a> {
    inner: Rows<'a>,
    remaining: usize,
}

impl Iterator for OffsetCursor<'_> {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = self.inner.next()?;
            if self.remaining == 0 || row.is_err() {
                return Some(row);
            }
            self.remaining -= 1;
        }
    }
}

struct LimitCursor<'a> {
    inner: Rows<'a>,
    remaining: usize,
}

impl Iterator for LimitCursor<'_> {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let row = self.inner.next()?;
        if row.is_ok() {
            self.remaining -= 1;
        }
        Some(row)
    }
}

struct DistinctCursor<'a> {
    inner: Rows<'a>,
    seen: FxHashSet<BindingSet>,
}

impl Iterator for DistinctCursor<'_> {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(row) => {
                    if self.seen.insert(row.clone()) {
                        return Some(Ok(row));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

struct ReducedCursor<'a> {
    inner: Rows<'a>,
    last: Option<BindingSet>,
}

impl Iterator for ReducedCursor<'_> {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(row) => {
                    if self.last.as_ref() != Some(&row) {
                        self.last = Some(row.clone());
                        return Some(Ok(row));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// ORDER BY is a blocking transformer: it buffers all input rows on first
/// use, sorts them, then streams. A failed input row ends the stream with
/// that error.
struct OrderCursor<'a> {
    inner: Option<Rows<'a>>,
    by: Vec<OrderElem>,
    sorted: Option<std::vec::IntoIter<BindingSet>>,
}

impl OrderCursor<'_> {
    fn fill(&mut self) -> Result<()> {
        let Some(inner) = self.inner.take() else {
            return Ok(());
        };
        let mut rows = Vec::new();
        for row in inner {
            rows.push(row?);
        }
        rows.sort_by(|a, b| compare_rows(a, b, &self.by));
        self.sorted = Some(rows.into_iter());
        Ok(())
    }
}

impl Iterator for OrderCursor<'_> {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.sorted.is_none() {
            if let Err(err) = self.fill() {
                return Some(Err(err));
            }
        }
        self.sorted.as_mut()?.next().map(Ok)
    }
}

// Used by tests to exercise transformers without an index.
#[cfg(test)]
fn boxed(rows: Vec<RowResult>) -> Rows<'static> {
    Box::new(rows.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::Value;

    fn row(name: &str, value: &str) -> BindingSet {
        BindingSet::new().with(name.to_owned(), Value::literal(value.to_owned()))
    }

    #[test]
    fn limit_and_offset_compose() {
        let rows = vec![Ok(row("x", "1")), Ok(row("x", "2")), Ok(row("x", "3"))];
        let offset = OffsetCursor {
            inner: boxed(rows),
            remaining: 1,
        };
        let mut limited = LimitCursor {
            inner: Box::new(offset),
            remaining: 1,
        };

        let only = limited.next().unwrap().unwrap();
        assert_eq!(only.get("x"), Some(&Value::literal("2")));
        assert!(limited.next().is_none());
    }

    #[test]
    fn distinct_drops_duplicates_anywhere() {
        let rows = vec![Ok(row("x", "a")), Ok(row("x", "b")), Ok(row("x", "a"))];
        let distinct = DistinctCursor {
            inner: boxed(rows),
            seen: FxHashSet::default(),
        };
        assert_eq!(distinct.count(), 2);
    }

    #[test]
    fn reduced_drops_only_consecutive_duplicates() {
        let rows = vec![
            Ok(row("x", "a")),
            Ok(row("x", "a")),
            Ok(row("x", "b")),
            Ok(row("x", "a")),
        ];
        let reduced = ReducedCursor {
            inner: boxed(rows),
            last: None,
        };
        assert_eq!(reduced.count(), 3);
    }

    #[test]
    fn order_sorts_descending() {
        let rows = vec![Ok(row("x", "a")), Ok(row("x", "c")), Ok(row("x", "b"))];
        let order = OrderCursor {
            inner: Some(boxed(rows)),
            by: vec![OrderElem::desc("x")],
            sorted: None,
        };
        let values: Vec<String> = order
            .map(|r| match r.unwrap().get("x").unwrap() {
                Value::Literal(l) => l.label().to_owned(),
                other => panic!("unexpected value: {other}"),
            })
            .collect();
        assert_eq!(values, vec!["c", "b", "a"]);
    }

    #[test]
    fn projection_keeps_only_named_vars() {
        let full = BindingSet::new()
            .with("x", Value::literal("1"))
            .with("y", Value::literal("2"));
        let projection = ProjectionCursor {
            inner: boxed(vec![Ok(full)]),
            vars: vec![Arc::from("x")],
        };
        let only = projection.last().unwrap().unwrap();
        assert_eq!(only.len(), 1);
        assert!(only.contains("x"));
    }

    #[test]
    fn multi_projection_fans_out_rows() {
        let full = BindingSet::new()
            .with("s", Value::literal("subject"))
            .with("o", Value::literal("object"));
        let projections = vec![
            vec![(Arc::from("a"), Arc::from("s"))],
            vec![(Arc::from("a"), Arc::from("o"))],
        ];
        let cursor = MultiProjectionCursor {
            inner: boxed(vec![Ok(full)]),
            projections,
            pending: VecDeque::new(),
        };
        assert_eq!(cursor.count(), 2);
    }
}
