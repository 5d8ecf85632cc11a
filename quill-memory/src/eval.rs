//! A materializing evaluator for the tuple-expression algebra.
//!
//! This is a reference evaluator for an in-memory fact set: patterns scan,
//! joins are nested loops, the outer modifiers apply their standard
//! semantics. It favors clarity over planning; the store is a collaborator,
//! not the product.

use quill_core::algebra::{compare_rows, StatementPattern, TupleExpr, Var};
use quill_core::term::Resource;
use quill_core::{BindingSet, Statement, Value};
use rustc_hash::FxHashSet;

/// Evaluates `expr` over `facts` under the given initial bindings.
pub fn evaluate(facts: &[Statement], expr: &TupleExpr, bindings: &BindingSet) -> Vec<BindingSet> {
    match expr {
        TupleExpr::Singleton => vec![bindings.clone()],
        TupleExpr::Pattern(pattern) => match_pattern(facts, pattern, bindings),
        TupleExpr::Join(args) => {
            let mut rows = vec![bindings.clone()];
            for arg in args {
                rows = rows
                    .iter()
                    .flat_map(|row| evaluate(facts, arg, row))
                    .collect();
                if rows.is_empty() {
                    break;
                }
            }
            rows
        }
        TupleExpr::Projection { arg, vars } => evaluate(facts, arg, bindings)
            .into_iter()
            .map(|row| row.project(vars))
            .collect(),
        TupleExpr::MultiProjection { arg, projections } => evaluate(facts, arg, bindings)
            .into_iter()
            .flat_map(|row| {
                projections.iter().map(move |projection| {
                    let mut out = BindingSet::new();
                    for (target, source) in projection {
                        if let Some(value) = row.get(source) {
                            out.insert(target.clone(), value.clone());
                        }
                    }
                    out
                })
            })
            .collect(),
        TupleExpr::Slice { arg, offset, limit } => {
            let rows = evaluate(facts, arg, bindings);
            let take = limit.unwrap_or(usize::MAX);
            rows.into_iter().skip(*offset).take(take).collect()
        }
        TupleExpr::Distinct(arg) => {
            let mut seen = FxHashSet::default();
            evaluate(facts, arg, bindings)
                .into_iter()
                .filter(|row| seen.insert(row.clone()))
                .collect()
        }
        TupleExpr::Reduced(arg) => {
            let mut out: Vec<BindingSet> = Vec::new();
            for row in evaluate(facts, arg, bindings) {
                if out.last() != Some(&row) {
                    out.push(row);
                }
            }
            out
        }
        TupleExpr::Order { arg, by } => {
            let mut rows = evaluate(facts, arg, bindings);
            rows.sort_by(|a, b| compare_rows(a, b, by));
            rows
        }
    }
}

fn match_pattern(
    facts: &[Statement],
    pattern: &StatementPattern,
    bindings: &BindingSet,
) -> Vec<BindingSet> {
    facts
        .iter()
        .filter_map(|fact| match_one(fact, pattern, bindings))
        .collect()
}

fn match_one(
    fact: &Statement,
    pattern: &StatementPattern,
    bindings: &BindingSet,
) -> Option<BindingSet> {
    let mut row = bindings.clone();

    bind(
        &mut row,
        &pattern.subject,
        &Value::Resource(fact.subject().clone()),
    )?;
    bind(
        &mut row,
        &pattern.predicate,
        &Value::Resource(Resource::Uri(fact.predicate().clone())),
    )?;
    bind(&mut row, &pattern.object, fact.object())?;

    if let Some(context_var) = &pattern.context {
        // A context position never matches the default graph.
        let context = fact.context()?;
        bind(&mut row, context_var, &Value::Resource(context.clone()))?;
    }

    Some(row)
}

/// Checks the var against `value` (constant or prior binding) or binds it.
fn bind(row: &mut BindingSet, var: &Var, value: &Value) -> Option<()> {
    match var.resolve(row) {
        Some(existing) => (existing == value).then_some(()),
        None => {
            row.insert(var.name().clone(), value.clone());
            Some(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::algebra::OrderElem;
    use quill_core::term::Uri;

    fn fact(s: &str, p: &str, o: &str) -> Statement {
        Statement::new(
            Resource::uri(s.to_owned()),
            Uri::new(p.to_owned()),
            Value::literal(o.to_owned()),
        )
    }

    fn uri_var(iri: &str) -> Var {
        Var::constant(Value::Resource(Resource::uri(iri.to_owned())))
    }

    #[test]
    fn pattern_binds_free_vars() {
        let facts = vec![fact("urn:a", "urn:name", "alpha"), fact("urn:b", "urn:name", "beta")];
        let pattern = StatementPattern::new(Var::free("s"), uri_var("urn:name"), Var::free("o"));

        let rows = evaluate(
            &facts,
            &TupleExpr::Pattern(pattern),
            &BindingSet::new(),
        );
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn join_shares_bindings() {
        let facts = vec![
            fact("urn:a", "urn:name", "alpha"),
            fact("urn:a", "urn:kind", "vowel"),
            fact("urn:b", "urn:name", "beta"),
        ];
        let left = StatementPattern::new(Var::free("s"), uri_var("urn:name"), Var::free("n"));
        let right = StatementPattern::new(Var::free("s"), uri_var("urn:kind"), Var::free("k"));

        let rows = evaluate(
            &facts,
            &TupleExpr::Join(vec![TupleExpr::Pattern(left), TupleExpr::Pattern(right)]),
            &BindingSet::new(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("n"), Some(&Value::literal("alpha")));
        assert_eq!(rows[0].get("k"), Some(&Value::literal("vowel")));
    }

    #[test]
    fn initial_bindings_restrict_matches() {
        let facts = vec![fact("urn:a", "urn:name", "alpha"), fact("urn:b", "urn:name", "beta")];
        let pattern = StatementPattern::new(Var::free("s"), uri_var("urn:name"), Var::free("o"));
        let bindings =
            BindingSet::new().with("s", Value::Resource(Resource::uri("urn:b")));

        let rows = evaluate(&facts, &TupleExpr::Pattern(pattern), &bindings);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("o"), Some(&Value::literal("beta")));
    }

    #[test]
    fn order_and_slice_compose() {
        let facts = vec![
            fact("urn:c", "urn:name", "c"),
            fact("urn:a", "urn:name", "a"),
            fact("urn:b", "urn:name", "b"),
        ];
        let pattern = StatementPattern::new(Var::free("s"), uri_var("urn:name"), Var::free("o"));
        let expr = TupleExpr::Slice {
            arg: Box::new(TupleExpr::Order {
                arg: Box::new(TupleExpr::Pattern(pattern)),
                by: vec![OrderElem::asc("o")],
            }),
            offset: 1,
            limit: Some(1),
        };

        let rows = evaluate(&facts, &expr, &BindingSet::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("o"), Some(&Value::literal("b")));
    }

    #[test]
    fn singleton_yields_input_row() {
        let bindings = BindingSet::new().with("x", Value::literal("1"));
        let rows = evaluate(&[], &TupleExpr::Singleton, &bindings);
        assert_eq!(rows, vec![bindings]);
    }
}
