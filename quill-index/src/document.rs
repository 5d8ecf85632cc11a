//! The per-subject document shape and the pure functions that maintain it.
//!
//! One document aggregates every literal fact of a single subject:
//!
//! - `id`: the subject's resource identifier, exactly once
//! - `contexts`: each distinct context that contributed an indexed fact
//! - `properties`: one `(predicate, label)` entry per indexed literal fact
//!
//! The aggregated `text` field searched by default-field queries is derived
//! from the property entries at encoding time, so it can never drift from
//! them. Duplicate `(predicate, label)` pairs and duplicate contexts are
//! never added.

use quill_core::term::{context_index_id, Resource, Uri};
use quill_core::Statement;

/// The logical full-text document for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDocument {
    id: String,
    contexts: Vec<String>,
    properties: Vec<(Uri, String)>,
}

impl ResourceDocument {
    /// An empty document for the given subject.
    pub fn new(subject: &Resource) -> Self {
        Self {
            id: subject.index_id(),
            contexts: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The subject this document stands for; inverse of the id encoding.
    pub fn resource(&self) -> Resource {
        Resource::from_index_id(&self.id)
    }

    pub fn contexts(&self) -> &[String] {
        &self.contexts
    }

    pub fn properties(&self) -> &[(Uri, String)] {
        &self.properties
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Number of property entries, i.e. fields that are not id, context, or
    /// the derived text field.
    pub fn property_field_count(&self) -> usize {
        self.properties.len()
    }

    /// Does the document hold this `(predicate, label)` pair?
    pub fn has(&self, predicate: &Uri, label: &str) -> bool {
        self.properties
            .iter()
            .any(|(p, l)| p == predicate && l == label)
    }

    /// The labels recorded for one predicate.
    pub fn property_values<'a>(&'a self, predicate: &'a Uri) -> impl Iterator<Item = &'a str> {
        self.properties
            .iter()
            .filter(move |(p, _)| p == predicate)
            .map(|(_, l)| l.as_str())
    }

    /// Every literal label of the subject, i.e. the aggregated text field.
    pub fn text_values(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(_, l)| l.as_str())
    }

    /// Adds a `(predicate, label)` entry unless it is already present.
    /// Returns whether the document changed.
    pub fn add_property(&mut self, predicate: &Uri, label: &str) -> bool {
        if self.has(predicate, label) {
            return false;
        }
        self.properties.push((predicate.clone(), label.to_owned()));
        true
    }

    /// Records a context identifier unless it is already present.
    pub fn add_context_if_absent(&mut self, context_id: &str) {
        if !self.contexts.iter().any(|c| c == context_id) {
            self.contexts.push(context_id.to_owned());
        }
    }

    /// Drops one `(predicate, label)` entry. Returns whether it was present.
    pub fn remove_property(&mut self, predicate: &Uri, label: &str) -> bool {
        let before = self.properties.len();
        self.properties.retain(|(p, l)| !(p == predicate && l == label));
        self.properties.len() != before
    }
}

/// Builds a fresh document for `subject` from the given facts.
///
/// Facts of other subjects and facts without a literal object are skipped;
/// `(predicate, label)` pairs and contexts are deduplicated.
pub fn make_document(subject: &Resource, statements: &[Statement]) -> ResourceDocument {
    let mut document = ResourceDocument::new(subject);
    for statement in statements {
        if statement.subject() != subject {
            continue;
        }
        let Some(literal) = statement.object().as_literal() else {
            continue;
        };
        document.add_property(statement.predicate(), literal.label());
        document.add_context_if_absent(&context_index_id(statement.context()));
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::term::Value;

    fn subject() -> Resource {
        Resource::uri("urn:s")
    }

    fn literal_fact(p: &str, o: &str, context: Option<&str>) -> Statement {
        Statement::with_context(
            subject(),
            Uri::new(p.to_owned()),
            Value::literal(o.to_owned()),
            context.map(|c| Resource::uri(c.to_owned())),
        )
    }

    #[test]
    fn make_document_skips_non_literals_and_foreign_subjects() {
        let statements = vec![
            literal_fact("urn:p1", "text", None),
            Statement::new(
                subject(),
                Uri::new("urn:ref"),
                Value::Resource(Resource::uri("urn:other")),
            ),
            Statement::new(
                Resource::uri("urn:other"),
                Uri::new("urn:p1"),
                Value::literal("foreign"),
            ),
        ];

        let document = make_document(&subject(), &statements);
        assert_eq!(document.property_field_count(), 1);
        assert!(document.has(&Uri::new("urn:p1"), "text"));
    }

    #[test]
    fn duplicate_pairs_and_contexts_are_not_added() {
        let statements = vec![
            literal_fact("urn:p1", "same", Some("urn:c1")),
            literal_fact("urn:p1", "same", Some("urn:c1")),
            literal_fact("urn:p2", "same", Some("urn:c1")),
        ];

        let document = make_document(&subject(), &statements);
        assert_eq!(document.property_field_count(), 2);
        assert_eq!(document.contexts(), ["urn:c1"]);
    }

    #[test]
    fn null_context_uses_sentinel() {
        let document = make_document(&subject(), &[literal_fact("urn:p1", "v", None)]);
        assert_eq!(document.contexts(), ["null"]);
    }

    #[test]
    fn remove_property_keeps_other_entries() {
        let mut document = make_document(
            &subject(),
            &[
                literal_fact("urn:p1", "a", None),
                literal_fact("urn:p1", "b", None),
            ],
        );
        assert!(document.remove_property(&Uri::new("urn:p1"), "a"));
        assert!(!document.remove_property(&Uri::new("urn:p1"), "a"));
        assert_eq!(document.property_field_count(), 1);
        assert!(document.has(&Uri::new("urn:p1"), "b"));
    }

    #[test]
    fn resource_round_trips_through_id() {
        let bnode = Resource::bnode("b1");
        let document = ResourceDocument::new(&bnode);
        assert_eq!(document.resource(), bnode);
    }

    #[test]
    fn text_values_aggregate_all_properties() {
        let document = make_document(
            &subject(),
            &[
                literal_fact("urn:p1", "one", None),
                literal_fact("urn:p2", "two", None),
            ],
        );
        let text: Vec<&str> = document.text_values().collect();
        assert_eq!(text, ["one", "two"]);
    }
}
