//! Recognition of textual sub-patterns inside a query tree.
//!
//! A textual sub-query is a group of statement patterns sharing a match
//! variable: the object of a `search:matches` pattern. This module finds the
//! groups, validates their shape, and produces one [`QuerySpec`] per valid
//! group. Recognized pattern nodes are recorded by id so the evaluator can
//! substitute them with the empty singleton before handing the residual
//! query to the underlying store.

use crate::error::{FulltextError, Result};
use quill_core::algebra::{PatternId, StatementPattern, TupleExpr};
use quill_core::term::{Resource, Uri, Value};
use quill_core::vocab::{rdf, search};
use quill_core::BindingSet;
use quill_index::TextQuery;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// The extracted configuration of one textual sub-pattern group.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    /// Concrete subject when the matches pattern's subject is bound.
    pub subject: Option<Resource>,
    /// The matches pattern's subject variable, bound to each hit's subject.
    pub match_var: Arc<str>,
    /// The resolved query.
    pub query: TextQuery,
    /// Optional default-field restriction.
    pub property: Option<Uri>,
    /// Variable receiving the hit score, when requested.
    pub score_var: Option<Arc<str>>,
    /// Variable receiving highlighted fragments, when requested.
    pub snippet_var: Option<Arc<str>>,
}

/// The result of walking a query tree.
pub struct ExtractedSpecs {
    /// One spec per valid textual sub-pattern group, in tree order.
    pub specs: Vec<QuerySpec>,
    /// Ids of every recognized reserved-vocabulary pattern, including those
    /// of skipped groups and orphans; all are substituted away.
    pub pattern_ids: FxHashSet<PatternId>,
}

impl ExtractedSpecs {
    pub fn is_textual(&self) -> bool {
        !self.specs.is_empty()
    }
}

#[derive(Default)]
struct PatternGroups<'a> {
    matches: Vec<&'a StatementPattern>,
    query: Vec<&'a StatementPattern>,
    property: Vec<&'a StatementPattern>,
    score: Vec<&'a StatementPattern>,
    snippet: Vec<&'a StatementPattern>,
    range_from: Vec<&'a StatementPattern>,
    range_to: Vec<&'a StatementPattern>,
    geo_lat: Vec<&'a StatementPattern>,
    geo_long: Vec<&'a StatementPattern>,
    geo_tolerance: Vec<&'a StatementPattern>,
    type_marker: Vec<&'a StatementPattern>,
}

impl<'a> PatternGroups<'a> {
    fn classify(&mut self, pattern: &'a StatementPattern) {
        let Some(Value::Resource(Resource::Uri(predicate))) = pattern.predicate.value() else {
            return;
        };
        match predicate.as_str() {
            search::MATCHES => self.matches.push(pattern),
            search::QUERY => self.query.push(pattern),
            search::PROPERTY => self.property.push(pattern),
            search::SCORE => self.score.push(pattern),
            search::SNIPPET => self.snippet.push(pattern),
            search::RANGE_QUERY_FROM => self.range_from.push(pattern),
            search::RANGE_QUERY_TO => self.range_to.push(pattern),
            search::GEO_DEGREES_LAT => self.geo_lat.push(pattern),
            search::GEO_DEGREES_LONG => self.geo_long.push(pattern),
            search::GEO_DEGREES_TOLERANCE => self.geo_tolerance.push(pattern),
            rdf::TYPE => {
                if let Some(Value::Resource(Resource::Uri(object))) = pattern.object.value() {
                    if object.as_str() == search::FULLTEXT_QUERY {
                        self.type_marker.push(pattern);
                    }
                }
            }
            _ => {}
        }
    }

    fn leftover_count(&self) -> usize {
        self.query.len()
            + self.property.len()
            + self.score.len()
            + self.snippet.len()
            + self.range_from.len()
            + self.range_to.len()
            + self.geo_lat.len()
            + self.geo_long.len()
            + self.geo_tolerance.len()
            + self.type_marker.len()
    }
}

/// Takes the single pattern whose subject is the group variable, if any.
/// More than one pattern of the same kind on one group variable is an error.
fn take_pattern<'a>(
    group_var: &str,
    patterns: &mut Vec<&'a StatementPattern>,
) -> std::result::Result<Option<&'a StatementPattern>, String> {
    let mut found: Option<usize> = None;
    for (idx, pattern) in patterns.iter().enumerate() {
        if pattern.subject.name().as_ref() == group_var && pattern.subject.value().is_none() {
            if found.is_some() {
                return Err(format!(
                    "multiple patterns of one kind for match variable '{group_var}'"
                ));
            }
            found = Some(idx);
        }
    }
    Ok(found.map(|idx| patterns.remove(idx)))
}

fn resolved_literal<'a>(
    pattern: Option<&'a StatementPattern>,
    bindings: &'a BindingSet,
) -> Option<&'a str> {
    let value = pattern?.object.resolve(bindings)?;
    value.as_literal().map(|literal| literal.label())
}

/// Walks the query tree and produces the specs of its textual sub-patterns.
///
/// Shape violations are fatal when `incomplete_query_fails` is set;
/// otherwise they are logged and the offending group is skipped, its
/// patterns still substituted away so evaluation proceeds with the residual
/// query alone.
pub fn extract_query_specs(
    expr: &TupleExpr,
    bindings: &BindingSet,
    incomplete_query_fails: bool,
) -> Result<ExtractedSpecs> {
    let mut groups = PatternGroups::default();
    expr.visit_patterns(&mut |pattern| groups.classify(pattern));

    let mut pattern_ids: FxHashSet<PatternId> = FxHashSet::default();
    for pattern in groups
        .matches
        .iter()
        .chain(&groups.query)
        .chain(&groups.property)
        .chain(&groups.score)
        .chain(&groups.snippet)
        .chain(&groups.range_from)
        .chain(&groups.range_to)
        .chain(&groups.geo_lat)
        .chain(&groups.geo_long)
        .chain(&groups.geo_tolerance)
        .chain(&groups.type_marker)
    {
        pattern_ids.insert(pattern.id());
    }

    let fail_or_warn = |message: String| -> Result<()> {
        if incomplete_query_fails {
            Err(FulltextError::InvalidQuery(message))
        } else {
            warn!("{message}");
            Ok(())
        }
    };

    let mut specs = Vec::new();
    let matches_patterns = std::mem::take(&mut groups.matches);

    for matches_pattern in matches_patterns {
        // The subject, when bound, must be a resource.
        let subject = match matches_pattern.subject.resolve(bindings) {
            Some(Value::Resource(resource)) => Some(resource.clone()),
            Some(other) => {
                fail_or_warn(format!(
                    "matches patterns should have resource subjects: {other}"
                ))?;
                continue;
            }
            None => None,
        };

        // The object of matches is the group variable; it must be free.
        if let Some(value) = matches_pattern.object.value() {
            fail_or_warn(format!(
                "matches patterns should have variable objects: {value}"
            ))?;
            continue;
        }
        let group_var = matches_pattern.object.name().clone();
        let match_var = matches_pattern.subject.name().clone();

        let taken = (|| -> std::result::Result<_, String> {
            Ok((
                take_pattern(&group_var, &mut groups.type_marker)?,
                take_pattern(&group_var, &mut groups.query)?,
                take_pattern(&group_var, &mut groups.property)?,
                take_pattern(&group_var, &mut groups.score)?,
                take_pattern(&group_var, &mut groups.snippet)?,
                take_pattern(&group_var, &mut groups.range_from)?,
                take_pattern(&group_var, &mut groups.range_to)?,
                take_pattern(&group_var, &mut groups.geo_lat)?,
                take_pattern(&group_var, &mut groups.geo_long)?,
                take_pattern(&group_var, &mut groups.geo_tolerance)?,
            ))
        })();
        let (
            type_pattern,
            query_pattern,
            property_pattern,
            score_pattern,
            snippet_pattern,
            from_pattern,
            to_pattern,
            lat_pattern,
            long_pattern,
            tolerance_pattern,
        ) = match taken {
            Ok(taken) => taken,
            Err(message) => {
                fail_or_warn(message)?;
                continue;
            }
        };

        // Property restriction, when present, must resolve to a URI.
        let property = match property_pattern {
            None => None,
            Some(pattern) => match pattern.object.resolve(bindings) {
                Some(Value::Resource(Resource::Uri(uri))) => Some(uri.clone()),
                other => {
                    fail_or_warn(format!(
                        "property patterns should have a property URI as object: {}",
                        other.map(|v| v.to_string()).unwrap_or_else(|| "none".into())
                    ))?;
                    continue;
                }
            },
        };

        // The query, in priority order: query literal, range bounds,
        // geographic box.
        let mut query: Option<TextQuery> = None;
        if query_pattern.is_some() {
            if let Some(text) = resolved_literal(query_pattern, bindings) {
                query = Some(TextQuery::raw(text));
            }
        } else if from_pattern.is_some() && to_pattern.is_some() {
            if let (Some(from), Some(to)) = (
                resolved_literal(from_pattern, bindings),
                resolved_literal(to_pattern, bindings),
            ) {
                query = Some(TextQuery::range(from, to));
            }
        } else if lat_pattern.is_some() && long_pattern.is_some() {
            if let (Some(lat), Some(long)) = (
                resolved_literal(lat_pattern, bindings),
                resolved_literal(long_pattern, bindings),
            ) {
                match (lat.parse::<f64>(), long.parse::<f64>()) {
                    (Ok(lat), Ok(long)) => {
                        let tolerance = resolved_literal(tolerance_pattern, bindings)
                            .and_then(|t| t.parse::<f64>().ok())
                            .unwrap_or(0.0);
                        query = Some(TextQuery::GeoBox {
                            lat,
                            long,
                            tolerance,
                        });
                    }
                    _ => {
                        fail_or_warn(format!(
                            "geographic coordinates must be numeric literals: ({lat}, {long})"
                        ))?;
                        continue;
                    }
                }
            }
        }
        let Some(query) = query else {
            fail_or_warn("missing query string for text query specification".to_owned())?;
            continue;
        };

        // Score and snippet receivers must be free variables.
        let score_var = match score_pattern {
            None => None,
            Some(pattern) => {
                if let Some(value) = pattern.object.value() {
                    fail_or_warn(format!(
                        "score patterns should have a variable as object: {value}"
                    ))?;
                    continue;
                }
                Some(pattern.object.name().clone())
            }
        };
        let snippet_var = match snippet_pattern {
            None => None,
            Some(pattern) => {
                if let Some(value) = pattern.object.value() {
                    fail_or_warn(format!(
                        "snippet patterns should have a variable as object: {value}"
                    ))?;
                    continue;
                }
                Some(pattern.object.name().clone())
            }
        };

        if type_pattern.is_none() {
            debug!(
                match_var = %match_var,
                "text query group has no rdf:type, assuming {}",
                search::FULLTEXT_QUERY
            );
        }

        specs.push(QuerySpec {
            subject,
            match_var,
            query,
            property,
            score_var,
            snippet_var,
        });
    }

    // Reserved-vocabulary patterns left over have no matches anchor.
    let leftovers = groups.leftover_count();
    if leftovers > 0 {
        fail_or_warn(format!(
            "{leftovers} text-query pattern(s) without a matches pattern"
        ))?;
    }

    Ok(ExtractedSpecs { specs, pattern_ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::algebra::Var;

    fn uri_const(iri: &str) -> Var {
        Var::constant(Value::Resource(Resource::uri(iri.to_owned())))
    }

    fn lit_const(text: &str) -> Var {
        Var::constant(Value::literal(text.to_owned()))
    }

    fn matches_pattern(subject: Var, match_var: &str) -> StatementPattern {
        StatementPattern::new(subject, uri_const(search::MATCHES), Var::free(match_var))
    }

    fn group_pattern(match_var: &str, predicate: &str, object: Var) -> StatementPattern {
        StatementPattern::new(Var::free(match_var), uri_const(predicate), object)
    }

    #[test]
    fn extracts_a_minimal_group() {
        let expr = TupleExpr::Join(vec![
            TupleExpr::Pattern(matches_pattern(Var::free("s"), "m")),
            TupleExpr::Pattern(group_pattern("m", search::QUERY, lit_const("hello"))),
        ]);

        let extracted = extract_query_specs(&expr, &BindingSet::new(), true).unwrap();
        assert_eq!(extracted.specs.len(), 1);
        assert_eq!(extracted.pattern_ids.len(), 2);

        let spec = &extracted.specs[0];
        assert_eq!(spec.match_var.as_ref(), "s");
        assert_eq!(spec.query, TextQuery::raw("hello"));
        assert!(spec.subject.is_none());
        assert!(spec.score_var.is_none());
    }

    #[test]
    fn full_group_with_score_snippet_property() {
        let expr = TupleExpr::Join(vec![
            TupleExpr::Pattern(matches_pattern(Var::free("s"), "m")),
            TupleExpr::Pattern(group_pattern("m", search::QUERY, lit_const("hello"))),
            TupleExpr::Pattern(group_pattern("m", search::PROPERTY, uri_const("urn:name"))),
            TupleExpr::Pattern(group_pattern("m", search::SCORE, Var::free("sc"))),
            TupleExpr::Pattern(group_pattern("m", search::SNIPPET, Var::free("sn"))),
            TupleExpr::Pattern(group_pattern(
                "m",
                rdf::TYPE,
                uri_const(search::FULLTEXT_QUERY),
            )),
        ]);

        let extracted = extract_query_specs(&expr, &BindingSet::new(), true).unwrap();
        let spec = &extracted.specs[0];
        assert_eq!(spec.property, Some(Uri::new("urn:name")));
        assert_eq!(spec.score_var.as_deref(), Some("sc"));
        assert_eq!(spec.snippet_var.as_deref(), Some("sn"));
        assert_eq!(extracted.pattern_ids.len(), 6);
    }

    #[test]
    fn range_bounds_swap_lexicographically() {
        let expr = TupleExpr::Join(vec![
            TupleExpr::Pattern(matches_pattern(Var::free("s"), "m")),
            TupleExpr::Pattern(group_pattern("m", search::RANGE_QUERY_FROM, lit_const("zz"))),
            TupleExpr::Pattern(group_pattern("m", search::RANGE_QUERY_TO, lit_const("aa"))),
        ]);

        let extracted = extract_query_specs(&expr, &BindingSet::new(), true).unwrap();
        assert_eq!(extracted.specs[0].query, TextQuery::raw("[aa TO zz]"));
    }

    #[test]
    fn geo_group_defaults_tolerance_to_zero() {
        let expr = TupleExpr::Join(vec![
            TupleExpr::Pattern(matches_pattern(Var::free("s"), "m")),
            TupleExpr::Pattern(group_pattern("m", search::GEO_DEGREES_LAT, lit_const("48"))),
            TupleExpr::Pattern(group_pattern("m", search::GEO_DEGREES_LONG, lit_const("11"))),
        ]);

        let extracted = extract_query_specs(&expr, &BindingSet::new(), true).unwrap();
        match &extracted.specs[0].query {
            TextQuery::GeoBox {
                lat,
                long,
                tolerance,
            } => {
                assert_eq!((*lat, *long, *tolerance), (48.0, 11.0, 0.0));
            }
            other => panic!("unexpected query: {other:?}"),
        }
    }

    #[test]
    fn bound_subject_is_captured() {
        let bindings = BindingSet::new().with("s", Value::Resource(Resource::uri("urn:s")));
        let expr = TupleExpr::Join(vec![
            TupleExpr::Pattern(matches_pattern(Var::free("s"), "m")),
            TupleExpr::Pattern(group_pattern("m", search::QUERY, lit_const("hello"))),
        ]);

        let extracted = extract_query_specs(&expr, &bindings, true).unwrap();
        assert_eq!(extracted.specs[0].subject, Some(Resource::uri("urn:s")));
    }

    #[test]
    fn literal_subject_fails_or_warns() {
        let expr = TupleExpr::Join(vec![
            TupleExpr::Pattern(matches_pattern(lit_const("not-a-resource"), "m")),
            TupleExpr::Pattern(group_pattern("m", search::QUERY, lit_const("hello"))),
        ]);

        assert!(matches!(
            extract_query_specs(&expr, &BindingSet::new(), true),
            Err(FulltextError::InvalidQuery(_))
        ));

        let extracted = extract_query_specs(&expr, &BindingSet::new(), false).unwrap();
        assert!(extracted.specs.is_empty());
        assert_eq!(extracted.pattern_ids.len(), 2);
    }

    #[test]
    fn missing_query_string_fails() {
        let expr = TupleExpr::Pattern(matches_pattern(Var::free("s"), "m"));
        assert!(matches!(
            extract_query_specs(&expr, &BindingSet::new(), true),
            Err(FulltextError::InvalidQuery(_))
        ));
    }

    #[test]
    fn orphan_query_pattern_is_detected() {
        let expr = TupleExpr::Pattern(group_pattern("m", search::QUERY, lit_const("hello")));

        assert!(matches!(
            extract_query_specs(&expr, &BindingSet::new(), true),
            Err(FulltextError::InvalidQuery(_))
        ));

        let extracted = extract_query_specs(&expr, &BindingSet::new(), false).unwrap();
        assert!(extracted.specs.is_empty());
        assert_eq!(extracted.pattern_ids.len(), 1);
    }

    #[test]
    fn duplicate_kind_for_one_match_var_fails() {
        let expr = TupleExpr::Join(vec![
            TupleExpr::Pattern(matches_pattern(Var::free("s"), "m")),
            TupleExpr::Pattern(group_pattern("m", search::QUERY, lit_const("a"))),
            TupleExpr::Pattern(group_pattern("m", search::QUERY, lit_const("b"))),
        ]);

        assert!(matches!(
            extract_query_specs(&expr, &BindingSet::new(), true),
            Err(FulltextError::InvalidQuery(_))
        ));
    }

    #[test]
    fn two_groups_two_specs() {
        let expr = TupleExpr::Join(vec![
            TupleExpr::Pattern(matches_pattern(Var::free("a"), "m1")),
            TupleExpr::Pattern(group_pattern("m1", search::QUERY, lit_const("one"))),
            TupleExpr::Pattern(matches_pattern(Var::free("b"), "m2")),
            TupleExpr::Pattern(group_pattern("m2", search::QUERY, lit_const("two"))),
        ]);

        let extracted = extract_query_specs(&expr, &BindingSet::new(), true).unwrap();
        assert_eq!(extracted.specs.len(), 2);
        assert_eq!(extracted.specs[0].match_var.as_ref(), "a");
        assert_eq!(extracted.specs[1].match_var.as_ref(), "b");
    }

    #[test]
    fn non_reserved_patterns_are_untouched() {
        let plain = StatementPattern::new(Var::free("s"), uri_const("urn:name"), Var::free("o"));
        let plain_id = plain.id();
        let expr = TupleExpr::Join(vec![
            TupleExpr::Pattern(plain),
            TupleExpr::Pattern(matches_pattern(Var::free("s"), "m")),
            TupleExpr::Pattern(group_pattern("m", search::QUERY, lit_const("hello"))),
        ]);

        let extracted = extract_query_specs(&expr, &BindingSet::new(), true).unwrap();
        assert!(!extracted.pattern_ids.contains(&plain_id));
    }
}
