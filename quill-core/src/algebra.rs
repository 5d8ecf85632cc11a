//! The tuple-expression tree walked by the full-text interpreter and
//! evaluated by stores.
//!
//! The algebra is deliberately small: basic graph patterns (`Pattern`,
//! `Join`, `Singleton`) plus the outer modifiers the full-text layer must
//! preserve around a textual core (`Projection`, `MultiProjection`, `Slice`,
//! `Distinct`, `Reduced`, `Order`). Parsing a concrete query language into
//! this tree is a collaborator's job.

use crate::binding::BindingSet;
use crate::term::Value;
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

static NEXT_PATTERN_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a statement-pattern node, so the interpreter can substitute
/// recognized patterns without relying on structural equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(u64);

impl PatternId {
    fn next() -> Self {
        PatternId(NEXT_PATTERN_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// A variable position in a pattern: a name, optionally carrying a constant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Var {
    name: Arc<str>,
    value: Option<Value>,
}

impl Var {
    /// A free variable.
    pub fn free(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// An anonymous constant; the synthesized name only matters for display.
    pub fn constant(value: Value) -> Self {
        Self {
            name: format!("_const_{}", value).into(),
            value: Some(value),
        }
    }

    /// A named variable pre-bound to a value.
    pub fn bound(name: impl Into<Arc<str>>, value: Value) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
        }
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The constant carried by the var, or its binding in `bindings`.
    pub fn resolve<'a>(&'a self, bindings: &'a BindingSet) -> Option<&'a Value> {
        self.value.as_ref().or_else(|| bindings.get(&self.name))
    }
}

/// A subject-predicate-object pattern, optionally restricted to a context.
///
/// A `None` context matches facts in any graph, including the default graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementPattern {
    id: PatternId,
    pub subject: Var,
    pub predicate: Var,
    pub object: Var,
    pub context: Option<Var>,
}

impl StatementPattern {
    pub fn new(subject: Var, predicate: Var, object: Var) -> Self {
        Self {
            id: PatternId::next(),
            subject,
            predicate,
            object,
            context: None,
        }
    }

    pub fn with_context(mut self, context: Var) -> Self {
        self.context = Some(context);
        self
    }

    pub fn id(&self) -> PatternId {
        self.id
    }
}

/// One ORDER BY criterion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderElem {
    pub var: Arc<str>,
    pub ascending: bool,
}

impl OrderElem {
    pub fn asc(var: impl Into<Arc<str>>) -> Self {
        Self {
            var: var.into(),
            ascending: true,
        }
    }

    pub fn desc(var: impl Into<Arc<str>>) -> Self {
        Self {
            var: var.into(),
            ascending: false,
        }
    }
}

/// One projection of a multi-projection: `(target, source)` variable pairs.
pub type ProjectionMap = Vec<(Arc<str>, Arc<str>)>;

/// Compares two solution rows by the given ORDER BY criteria.
/// Unbound variables sort before bound ones.
pub fn compare_rows(a: &BindingSet, b: &BindingSet, by: &[OrderElem]) -> Ordering {
    for elem in by {
        let ordering = match (a.get(&elem.var), b.get(&elem.var)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.total_cmp(y),
        };
        let ordering = if elem.ascending {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// A query tree.
#[derive(Clone, Debug, PartialEq)]
pub enum TupleExpr {
    /// The empty pattern: exactly one, empty, solution. Substituted in place
    /// of patterns answered elsewhere.
    Singleton,
    Pattern(StatementPattern),
    Join(Vec<TupleExpr>),
    Projection {
        arg: Box<TupleExpr>,
        vars: Vec<Arc<str>>,
    },
    MultiProjection {
        arg: Box<TupleExpr>,
        projections: Vec<ProjectionMap>,
    },
    Slice {
        arg: Box<TupleExpr>,
        offset: usize,
        limit: Option<usize>,
    },
    Distinct(Box<TupleExpr>),
    Reduced(Box<TupleExpr>),
    Order {
        arg: Box<TupleExpr>,
        by: Vec<OrderElem>,
    },
}

impl TupleExpr {
    /// Visits every statement pattern in the tree, in tree order.
    pub fn visit_patterns<'a>(&'a self, f: &mut impl FnMut(&'a StatementPattern)) {
        match self {
            TupleExpr::Singleton => {}
            TupleExpr::Pattern(pattern) => f(pattern),
            TupleExpr::Join(args) => {
                for arg in args {
                    arg.visit_patterns(f);
                }
            }
            TupleExpr::Projection { arg, .. }
            | TupleExpr::MultiProjection { arg, .. }
            | TupleExpr::Slice { arg, .. }
            | TupleExpr::Distinct(arg)
            | TupleExpr::Reduced(arg)
            | TupleExpr::Order { arg, .. } => arg.visit_patterns(f),
        }
    }

    /// Replaces every pattern whose id is in `ids` with [`TupleExpr::Singleton`].
    pub fn replace_patterns(self, ids: &FxHashSet<PatternId>) -> TupleExpr {
        match self {
            TupleExpr::Pattern(pattern) if ids.contains(&pattern.id) => TupleExpr::Singleton,
            TupleExpr::Pattern(pattern) => TupleExpr::Pattern(pattern),
            TupleExpr::Singleton => TupleExpr::Singleton,
            TupleExpr::Join(args) => {
                TupleExpr::Join(args.into_iter().map(|a| a.replace_patterns(ids)).collect())
            }
            TupleExpr::Projection { arg, vars } => TupleExpr::Projection {
                arg: Box::new(arg.replace_patterns(ids)),
                vars,
            },
            TupleExpr::MultiProjection { arg, projections } => TupleExpr::MultiProjection {
                arg: Box::new(arg.replace_patterns(ids)),
                projections,
            },
            TupleExpr::Slice { arg, offset, limit } => TupleExpr::Slice {
                arg: Box::new(arg.replace_patterns(ids)),
                offset,
                limit,
            },
            TupleExpr::Distinct(arg) => TupleExpr::Distinct(Box::new(arg.replace_patterns(ids))),
            TupleExpr::Reduced(arg) => TupleExpr::Reduced(Box::new(arg.replace_patterns(ids))),
            TupleExpr::Order { arg, by } => TupleExpr::Order {
                arg: Box::new(arg.replace_patterns(ids)),
                by,
            },
        }
    }
}
