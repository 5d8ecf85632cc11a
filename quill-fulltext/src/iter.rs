//! The core textual iterator: cross-product of per-spec hits, joined with
//! the underlying store's evaluation of the residual query.
//!
//! Evaluation is a synchronous lazy pull. The iterator walks the hit
//! cross-product in odometer order; for each permutation it derives the
//! text bindings (match resource, score, snippet), evaluates the residual
//! query against the store with those bindings, and streams the store's rows
//! extended with the derived bindings. At most one store cursor is open at a
//! time.

use crate::error::{FulltextError, Result};
use crate::spec::QuerySpec;
use quill_core::algebra::TupleExpr;
use quill_core::term::{Literal, Uri, Value};
use quill_core::vocab::xsd;
use quill_core::{BindingIter, BindingSet, StoreConnection};
use quill_index::{snippet_html, SearchHit, TextIndex};
use tantivy::snippet::SnippetGenerator;
use tantivy::Searcher;
use tracing::error;

/// Counts through the cross-product of hit lists: one digit per spec, the
/// least-significant (last) digit incrementing fastest, each digit wrapping
/// at its own bound.
pub(crate) struct Odometer {
    bounds: Vec<usize>,
    current: Vec<usize>,
    exhausted: bool,
}

impl Odometer {
    pub(crate) fn new(bounds: Vec<usize>) -> Self {
        // Any empty hit list empties the whole cross-product.
        let exhausted = bounds.iter().any(|&bound| bound == 0);
        let current = vec![0; bounds.len()];
        Self {
            bounds,
            current,
            exhausted,
        }
    }

    /// The next index tuple, or `None` when the cross-product is finished.
    pub(crate) fn next_tuple(&mut self) -> Option<Vec<usize>> {
        if self.exhausted {
            return None;
        }
        let tuple = self.current.clone();
        self.exhausted = true;
        for idx in (0..self.current.len()).rev() {
            self.current[idx] += 1;
            if self.current[idx] < self.bounds[idx] {
                self.exhausted = false;
                break;
            }
            self.current[idx] = 0;
        }
        Some(tuple)
    }
}

/// One spec with its evaluated hits and optional highlighter.
pub(crate) struct PreparedSpec {
    spec: QuerySpec,
    hits: Vec<SearchHit>,
    snippets: Option<SnippetGenerator>,
}

enum IterState {
    Open,
    Exhausted,
}

/// Iterator over the joined text and store bindings.
pub struct TextQueryIterator<'a, C: StoreConnection> {
    index: &'a TextIndex,
    connection: &'a C,
    searcher: Searcher,
    specs: Vec<PreparedSpec>,
    residual: TupleExpr,
    bindings: BindingSet,
    include_inferred: bool,
    odometer: Odometer,
    derived: BindingSet,
    current: Option<BindingIter<'a>>,
    state: IterState,
}

impl<'a, C: StoreConnection> TextQueryIterator<'a, C> {
    /// Evaluates every spec's query against the index and positions the
    /// odometer at the first permutation.
    ///
    /// A spec whose query cannot be parsed contributes an empty hit list,
    /// which empties the whole cross-product; the failure is logged.
    pub fn new(
        index: &'a TextIndex,
        connection: &'a C,
        specs: Vec<QuerySpec>,
        residual: TupleExpr,
        bindings: BindingSet,
        include_inferred: bool,
    ) -> Result<Self> {
        let searcher = index.searcher().map_err(FulltextError::from)?;

        let mut prepared = Vec::with_capacity(specs.len());
        for spec in specs {
            let (hits, snippets) =
                match index.parse_query(&spec.query, spec.property.as_ref()) {
                    Ok(parsed) => {
                        let hits = match &spec.subject {
                            None => index.search(&searcher, parsed.query())?,
                            Some(subject) => {
                                index.search_subject(&searcher, subject, parsed.query())?
                            }
                        };
                        let snippets = if spec.snippet_var.is_some() {
                            Some(index.snippet_generator(&searcher, &parsed)?)
                        } else {
                            None
                        };
                        (hits, snippets)
                    }
                    Err(err) => {
                        error!(
                            query = %spec.query,
                            property = spec.property.as_ref().map(Uri::as_str),
                            %err,
                            "could not evaluate text query"
                        );
                        (Vec::new(), None)
                    }
                };
            prepared.push(PreparedSpec {
                spec,
                hits,
                snippets,
            });
        }

        let odometer = Odometer::new(prepared.iter().map(|p| p.hits.len()).collect());

        Ok(Self {
            index,
            connection,
            searcher,
            specs: prepared,
            residual,
            bindings,
            include_inferred,
            odometer,
            derived: BindingSet::new(),
            current: None,
            state: IterState::Open,
        })
    }

    /// Binds match, score, and snippet variables for one permutation.
    /// `None` means the permutation is discarded (conflicting match
    /// bindings, or a hit whose document cannot be read).
    fn derive_bindings(&self, tuple: &[usize]) -> Option<BindingSet> {
        let mut derived = BindingSet::new();

        for (spec_idx, &hit_idx) in tuple.iter().enumerate() {
            let prepared = &self.specs[spec_idx];
            let hit = prepared.hits[hit_idx];

            let document = match self.index.stored_document(&self.searcher, hit.address) {
                Ok(document) => document,
                Err(err) => {
                    error!(%err, "could not read hit document; skipping permutation");
                    return None;
                }
            };
            let resource = document.resource();
            let resource_value = Value::Resource(resource);

            // Two specs binding the same match variable to different hits
            // cannot contribute a solution.
            if let Some(existing) = derived.get(&prepared.spec.match_var) {
                if existing != &resource_value {
                    return None;
                }
            }
            derived.insert(prepared.spec.match_var.clone(), resource_value);

            if let Some(score_var) = &prepared.spec.score_var {
                if hit.score > 0.0 {
                    derived.insert(
                        score_var.clone(),
                        Value::Literal(Literal::typed(
                            hit.score.to_string(),
                            Uri::new(xsd::FLOAT),
                        )),
                    );
                }
            }

            if let Some(snippet_var) = &prepared.spec.snippet_var {
                if let Some(generator) = &prepared.snippets {
                    let html = match &prepared.spec.property {
                        Some(property) => {
                            snippet_html(generator, document.property_values(property))
                        }
                        None => snippet_html(generator, document.text_values()),
                    };
                    derived.insert(snippet_var.clone(), Value::literal(html));
                }
            }
        }

        Some(derived)
    }
}

impl<C: StoreConnection> Iterator for TextQueryIterator<'_, C> {
    type Item = Result<BindingSet>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Drain the open store cursor first.
            if let Some(cursor) = self.current.as_mut() {
                match cursor.next() {
                    Some(Ok(row)) => return Some(Ok(row.extended(&self.derived))),
                    Some(Err(err)) => return Some(Err(err.into())),
                    None => self.current = None,
                }
                continue;
            }

            if matches!(self.state, IterState::Exhausted) {
                return None;
            }

            // Advance to the next permutation and open its store cursor.
            let Some(tuple) = self.odometer.next_tuple() else {
                self.state = IterState::Exhausted;
                return None;
            };
            let Some(derived) = self.derive_bindings(&tuple) else {
                continue;
            };

            let evaluate_bindings = self.bindings.extended(&derived);
            match self
                .connection
                .evaluate(&self.residual, &evaluate_bindings, self.include_inferred)
            {
                Ok(cursor) => {
                    self.derived = derived;
                    self.current = Some(cursor);
                }
                Err(err) => {
                    self.state = IterState::Exhausted;
                    return Some(Err(err.into()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odometer_counts_least_significant_first() {
        let mut odometer = Odometer::new(vec![2, 3]);
        let mut tuples = Vec::new();
        while let Some(tuple) = odometer.next_tuple() {
            tuples.push(tuple);
        }
        assert_eq!(
            tuples,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2],
            ]
        );
    }

    #[test]
    fn odometer_with_zero_digit_is_empty() {
        let mut odometer = Odometer::new(vec![2, 0, 3]);
        assert!(odometer.next_tuple().is_none());
    }

    #[test]
    fn single_digit_odometer() {
        let mut odometer = Odometer::new(vec![3]);
        let mut count = 0;
        while odometer.next_tuple().is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
    }
}
