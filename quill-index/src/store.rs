//! The index store: a thin, synchronized wrapper around a tantivy index.
//!
//! `TextIndex` owns the directory, the analyzer choice, and the cached
//! writer/reader handles. All mutation serializes through one mutex; readers
//! are taken from a cached `IndexReader` that is dropped (and reopened on
//! next use) after every visible mutation. A [`WriteScope`] holds the mutex
//! for the duration of a multi-operation apply, so a whole transaction's
//! worth of document changes is one critical section.
//!
//! Physical layout per document:
//! - `id`: raw, stored; the subject identifier, unique per document
//! - `context`: raw, stored, multi-valued
//! - `text`: analyzed, stored; one value per indexed literal
//! - `props`: JSON field analyzed with the same tokenizer; one key per
//!   predicate URI (tantivy schemas are fixed at creation, so the dynamic
//!   predicate fields live inside this one)
//! - `prop_entries`: stored only; JSON `{predicate, label}` payloads from
//!   which the logical document is rebuilt

use crate::config::{IndexConfig, IndexLocation};
use crate::document::ResourceDocument;
use crate::error::{IndexError, Result};
use crate::query::{parse_range, TextQuery};
use parking_lot::{Mutex, MutexGuard};
use quill_core::term::{Resource, Uri};
use quill_core::vocab::geo;
use serde::{Deserialize, Serialize};
use std::ops::Bound;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, RangeQuery, TermQuery};
use std::collections::BTreeMap;
use tantivy::schema::{
    Field, IndexRecordOption, JsonObjectOptions, OwnedValue, Schema, TextFieldIndexing,
    TextOptions, Type, Value as _, STORED, STRING,
};
use tantivy::snippet::SnippetGenerator;
use tantivy::tokenizer::TextAnalyzer;
use tantivy::{
    json_utils::JsonTermWriter, DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, Score,
    Searcher, TantivyDocument, Term,
};
use tracing::{debug, warn};

/// Heap given to the index writer before it flushes a segment.
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Upper bound on characters in one highlighted fragment.
const SNIPPET_MAX_CHARS: usize = 150;

/// Lock file left behind by a crashed writer process.
const WRITER_LOCK_FILE: &str = ".tantivy-writer.lock";

/// One scored search result.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit {
    pub score: Score,
    pub address: DocAddress,
}

/// Stored payload for one property entry.
#[derive(Serialize, Deserialize)]
struct PropEntry {
    predicate: String,
    label: String,
}

#[derive(Clone, Copy)]
struct Fields {
    id: Field,
    context: Field,
    text: Field,
    props: Field,
    prop_entries: Field,
}

#[derive(Default)]
struct Handles {
    writer: Option<IndexWriter>,
    reader: Option<IndexReader>,
}

/// A parsed query, ready to run against the index.
///
/// `shadow` is an equivalent query phrased against the aggregated text field,
/// used for snippet extraction: property-scoped queries target JSON-path
/// terms that a highlighter over raw text cannot match.
pub struct ParsedQuery {
    query: Box<dyn Query>,
    shadow: Box<dyn Query>,
    property: Option<Uri>,
}

impl ParsedQuery {
    pub fn query(&self) -> &dyn Query {
        self.query.as_ref()
    }

    pub fn property(&self) -> Option<&Uri> {
        self.property.as_ref()
    }
}

/// The full-text index for one store, with managed handle lifecycle.
pub struct TextIndex {
    index: Index,
    fields: Fields,
    analyzer: String,
    state: Mutex<Handles>,
}

impl TextIndex {
    /// Acquires the configured directory, creating an empty index when none
    /// exists and breaking a stale writer lock left by a crashed process.
    pub fn open(config: &IndexConfig) -> Result<Self> {
        let analyzer = config.analyzer_name().to_owned();
        let (schema, fields) = build_schema(&analyzer);

        let index = match &config.location {
            IndexLocation::Disk(path) => {
                std::fs::create_dir_all(path)?;
                break_stale_lock(path);
                let directory = MmapDirectory::open(path)?;
                Index::open_or_create(directory, schema)?
            }
            IndexLocation::Memory => Index::create_in_ram(schema),
        };

        if index.tokenizers().get(&analyzer).is_none() {
            return Err(IndexError::Config(format!(
                "unknown analyzer: {analyzer}"
            )));
        }

        Ok(Self {
            index,
            fields,
            analyzer,
            state: Mutex::new(Handles::default()),
        })
    }

    /// An index held entirely in memory.
    pub fn in_memory() -> Result<Self> {
        Self::open(&IndexConfig::memory())
    }

    pub fn analyzer(&self) -> &str {
        &self.analyzer
    }

    // ---- handle lifecycle ----

    /// A searcher over the last committed state. Searchers taken before a
    /// commit stay usable but stale; take a fresh one after mutations.
    pub fn searcher(&self) -> Result<Searcher> {
        let mut handles = self.state.lock();
        let reader = reader_handle(&self.index, &mut handles)?.clone();
        drop(handles);
        Ok(reader.searcher())
    }

    /// Drops the cached reader; the next searcher reopens against the latest
    /// committed state.
    pub fn invalidate_readers(&self) {
        self.state.lock().reader = None;
    }

    /// Flushes the writer and marks cached readers stale.
    pub fn commit(&self) -> Result<()> {
        let mut handles = self.state.lock();
        if let Some(writer) = handles.writer.as_mut() {
            writer.commit()?;
        }
        handles.reader = None;
        Ok(())
    }

    /// Abandons all uncommitted writer state.
    pub fn rollback(&self) -> Result<()> {
        let mut handles = self.state.lock();
        if let Some(writer) = handles.writer.as_mut() {
            writer.rollback()?;
        }
        Ok(())
    }

    /// Truncates the index to empty.
    pub fn clear(&self) -> Result<()> {
        let mut scope = self.write_scope();
        scope.clear()
    }

    /// Opens the mutation scope, serializing against every other writer of
    /// this index. Held for a whole transaction apply.
    pub fn write_scope(&self) -> WriteScope<'_> {
        WriteScope {
            index: self,
            handles: self.state.lock(),
        }
    }

    pub fn num_docs(&self) -> Result<u64> {
        Ok(self.searcher()?.num_docs())
    }

    // ---- single-fact maintenance ----

    /// Indexes one fact: creates the subject's document on its first literal,
    /// otherwise augments the existing document. Duplicate pairs are
    /// silently skipped. Commits and invalidates readers when changed.
    pub fn add_statement(&self, statement: &quill_core::Statement) -> Result<()> {
        let Some(literal) = statement.object().as_literal() else {
            return Ok(());
        };
        let subject = statement.subject();

        let mut scope = self.write_scope();
        match scope.document(subject)? {
            None => {
                let document =
                    crate::document::make_document(subject, std::slice::from_ref(statement));
                scope.insert_document(&document)?;
                scope.commit()
            }
            Some(mut document) => {
                if document.has(statement.predicate(), literal.label()) {
                    return Ok(());
                }
                document.add_property(statement.predicate(), literal.label());
                document.add_context_if_absent(&quill_core::term::context_index_id(
                    statement.context(),
                ));
                scope.delete_subject(subject)?;
                scope.insert_document(&document)?;
                scope.commit()
            }
        }
    }

    /// Removes one fact from its subject's document, deleting the document
    /// when this was its last property.
    pub fn remove_statement(&self, statement: &quill_core::Statement) -> Result<()> {
        let Some(literal) = statement.object().as_literal() else {
            return Ok(());
        };
        let subject = statement.subject();

        let mut scope = self.write_scope();
        let Some(mut document) = scope.document(subject)? else {
            return Ok(());
        };
        if !document.has(statement.predicate(), literal.label()) {
            return Ok(());
        }

        match document.property_field_count() {
            0 => {
                warn!(id = document.id(), "document with zero properties should have been deleted");
                Ok(())
            }
            1 => {
                scope.delete_subject(subject)?;
                scope.commit()
            }
            _ => {
                document.remove_property(statement.predicate(), literal.label());
                scope.delete_subject(subject)?;
                scope.insert_document(&document)?;
                scope.commit()
            }
        }
    }

    // ---- lookups ----

    /// The document for `subject`, if the subject has indexed literals.
    pub fn document(&self, subject: &Resource) -> Result<Option<ResourceDocument>> {
        let searcher = self.searcher()?;
        self.find_document(&searcher, &subject.index_id())
    }

    fn find_document(&self, searcher: &Searcher, id: &str) -> Result<Option<ResourceDocument>> {
        let term = Term::from_field_text(self.fields.id, id);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let top = searcher.search(&query, &TopDocs::with_limit(2))?;
        let Some((_, address)) = top.first() else {
            return Ok(None);
        };
        if top.len() > 1 {
            warn!(id, "multiple documents found for one subject id");
        }
        let stored: TantivyDocument = searcher.doc(*address)?;
        Ok(Some(self.decode_document(&stored)?))
    }

    /// Decodes the stored document at a search hit.
    pub fn stored_document(
        &self,
        searcher: &Searcher,
        address: DocAddress,
    ) -> Result<ResourceDocument> {
        let stored: TantivyDocument = searcher.doc(address)?;
        self.decode_document(&stored)
    }

    // ---- querying ----

    /// Translates a resolved textual query into an engine query.
    ///
    /// Default-field queries go through the engine's query parser against the
    /// aggregated text field. Property-scoped queries are built from analyzer
    /// terms on the predicate's JSON path (the parser grammar cannot name
    /// URI-shaped fields); `[from TO to]` becomes a term range.
    pub fn parse_query(&self, query: &TextQuery, property: Option<&Uri>) -> Result<ParsedQuery> {
        match query {
            TextQuery::Raw(text) => match property {
                None => {
                    let parser = QueryParser::for_index(&self.index, vec![self.fields.text]);
                    let parsed = parser
                        .parse_query(text)
                        .map_err(|e| IndexError::Query(e.to_string()))?;
                    let shadow = parsed.box_clone();
                    Ok(ParsedQuery {
                        query: parsed,
                        shadow,
                        property: None,
                    })
                }
                Some(uri) => {
                    if let Some((from, to)) = parse_range(text) {
                        Ok(ParsedQuery {
                            query: Box::new(self.json_range(uri.as_str(), from, to)),
                            shadow: Box::new(self.text_range(from, to)),
                            property: Some(uri.clone()),
                        })
                    } else {
                        let terms = self.analyze(text)?;
                        if terms.is_empty() {
                            return Err(IndexError::Query(format!(
                                "no searchable terms in query: {text}"
                            )));
                        }
                        Ok(ParsedQuery {
                            query: Box::new(self.json_term_union(uri.as_str(), &terms)),
                            shadow: Box::new(self.text_term_union(&terms)),
                            property: Some(uri.clone()),
                        })
                    }
                }
            },
            TextQuery::GeoBox {
                lat,
                long,
                tolerance,
            } => {
                let lat_bounds = degree_bounds(*lat, *tolerance);
                let long_bounds = degree_bounds(*long, *tolerance);
                let query = BooleanQuery::new(vec![
                    (
                        Occur::Must,
                        Box::new(self.json_range(geo::LAT, &lat_bounds.0, &lat_bounds.1))
                            as Box<dyn Query>,
                    ),
                    (
                        Occur::Must,
                        Box::new(self.json_range(geo::LONG, &long_bounds.0, &long_bounds.1)),
                    ),
                ]);
                let shadow = BooleanQuery::new(vec![
                    (
                        Occur::Should,
                        Box::new(self.text_range(&lat_bounds.0, &lat_bounds.1)) as Box<dyn Query>,
                    ),
                    (
                        Occur::Should,
                        Box::new(self.text_range(&long_bounds.0, &long_bounds.1)),
                    ),
                ]);
                Ok(ParsedQuery {
                    query: Box::new(query),
                    shadow: Box::new(shadow),
                    property: property.cloned(),
                })
            }
        }
    }

    /// All hits for the query, by descending score.
    pub fn search(&self, searcher: &Searcher, query: &dyn Query) -> Result<Vec<SearchHit>> {
        let limit = searcher.num_docs().max(1) as usize;
        let top = searcher.search(query, &TopDocs::with_limit(limit))?;
        Ok(top
            .into_iter()
            .map(|(score, address)| SearchHit { score, address })
            .collect())
    }

    /// Evaluates the query restricted to one subject by conjoining an id
    /// term. At most one hit is expected; more is a corrupt-state warning.
    pub fn search_subject(
        &self,
        searcher: &Searcher,
        subject: &Resource,
        query: &dyn Query,
    ) -> Result<Vec<SearchHit>> {
        let id_term = Term::from_field_text(self.fields.id, &subject.index_id());
        let id_query = TermQuery::new(id_term, IndexRecordOption::Basic);
        let combined = BooleanQuery::new(vec![
            (Occur::Must, Box::new(id_query) as Box<dyn Query>),
            (Occur::Must, query.box_clone()),
        ]);
        let hits = self.search(searcher, &combined)?;
        if hits.len() > 1 {
            warn!(subject = %subject, hits = hits.len(), "more than one document matched a subject-scoped search");
        }
        Ok(hits)
    }

    /// A highlighter bound to the parsed query's text-field terms.
    pub fn snippet_generator(
        &self,
        searcher: &Searcher,
        parsed: &ParsedQuery,
    ) -> Result<SnippetGenerator> {
        let mut generator =
            SnippetGenerator::create(searcher, parsed.shadow.as_ref(), self.fields.text)?;
        generator.set_max_num_chars(SNIPPET_MAX_CHARS);
        Ok(generator)
    }

    // ---- internals ----

    fn analyze(&self, text: &str) -> Result<Vec<String>> {
        let mut analyzer: TextAnalyzer = self
            .index
            .tokenizers()
            .get(&self.analyzer)
            .ok_or_else(|| IndexError::Config(format!("unknown analyzer: {}", self.analyzer)))?;
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while let Some(token) = stream.next() {
            terms.push(token.text.clone());
        }
        Ok(terms)
    }

    fn json_term(&self, path: &str, token: &str) -> Term {
        // The document side stores each predicate URI as a single JSON key
        // (see `encode_document`), so the query side must address it as a
        // single path segment too. `from_field_and_json_path` otherwise
        // splits on every unescaped `.`, so escape them first.
        let escaped_path = path.replace('.', "\\.");
        let mut term = Term::with_capacity(128);
        let mut writer =
            JsonTermWriter::from_field_and_json_path(self.fields.props, &escaped_path, false, &mut term);
        writer.set_str(token);
        term
    }

    fn json_term_union(&self, path: &str, terms: &[String]) -> BooleanQuery {
        let clauses = terms
            .iter()
            .map(|token| {
                (
                    Occur::Should,
                    Box::new(TermQuery::new(
                        self.json_term(path, token),
                        IndexRecordOption::WithFreqs,
                    )) as Box<dyn Query>,
                )
            })
            .collect();
        BooleanQuery::new(clauses)
    }

    fn text_term_union(&self, terms: &[String]) -> BooleanQuery {
        let clauses = terms
            .iter()
            .map(|token| {
                (
                    Occur::Should,
                    Box::new(TermQuery::new(
                        Term::from_field_text(self.fields.text, token),
                        IndexRecordOption::WithFreqs,
                    )) as Box<dyn Query>,
                )
            })
            .collect();
        BooleanQuery::new(clauses)
    }

    fn json_range(&self, path: &str, from: &str, to: &str) -> RangeQuery {
        let field_name = self.index.schema().get_field_name(self.fields.props).to_string();
        RangeQuery::new_term_bounds(
            field_name,
            Type::Json,
            &Bound::Included(self.json_term(path, from)),
            &Bound::Included(self.json_term(path, to)),
        )
    }

    fn text_range(&self, from: &str, to: &str) -> RangeQuery {
        let field_name = self.index.schema().get_field_name(self.fields.text).to_string();
        RangeQuery::new_term_bounds(
            field_name,
            Type::Str,
            &Bound::Included(Term::from_field_text(self.fields.text, from)),
            &Bound::Included(Term::from_field_text(self.fields.text, to)),
        )
    }

    fn encode_document(&self, document: &ResourceDocument) -> Result<TantivyDocument> {
        let mut stored = TantivyDocument::default();
        stored.add_text(self.fields.id, document.id());
        for context in document.contexts() {
            stored.add_text(self.fields.context, context);
        }

        let mut props: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (predicate, label) in document.properties() {
            stored.add_text(self.fields.text, label);
            let entry = serde_json::to_string(&PropEntry {
                predicate: predicate.as_str().to_owned(),
                label: label.clone(),
            })?;
            stored.add_text(self.fields.prop_entries, entry);

            props
                .entry(predicate.as_str().to_owned())
                .or_default()
                .push(label.clone());
        }
        let object: BTreeMap<String, OwnedValue> = props
            .into_iter()
            .map(|(predicate, labels)| {
                let values = labels.into_iter().map(OwnedValue::Str).collect();
                (predicate, OwnedValue::Array(values))
            })
            .collect();
        stored.add_object(self.fields.props, object);
        Ok(stored)
    }

    fn decode_document(&self, stored: &TantivyDocument) -> Result<ResourceDocument> {
        let id = stored
            .get_first(self.fields.id)
            .and_then(|value| value.as_str())
            .ok_or_else(|| IndexError::Corrupt("stored document without an id field".into()))?;

        let mut document = ResourceDocument::new(&Resource::from_index_id(id));
        for value in stored.get_all(self.fields.context) {
            if let Some(context) = value.as_str() {
                document.add_context_if_absent(context);
            }
        }
        for value in stored.get_all(self.fields.prop_entries) {
            if let Some(payload) = value.as_str() {
                let entry: PropEntry = serde_json::from_str(payload)?;
                document.add_property(&Uri::new(entry.predicate), &entry.label);
            }
        }
        Ok(document)
    }
}

/// Exclusive mutation access to the index; holds the index mutex until drop.
pub struct WriteScope<'a> {
    index: &'a TextIndex,
    handles: MutexGuard<'a, Handles>,
}

impl WriteScope<'_> {
    fn searcher(&mut self) -> Result<Searcher> {
        Ok(reader_handle(&self.index.index, &mut self.handles)?.searcher())
    }

    /// The document for `subject` as of the last commit.
    pub fn document(&mut self, subject: &Resource) -> Result<Option<ResourceDocument>> {
        let searcher = self.searcher()?;
        self.index.find_document(&searcher, &subject.index_id())
    }

    /// Every document carrying the given context identifier.
    pub fn documents_in_context(&mut self, context_id: &str) -> Result<Vec<ResourceDocument>> {
        let searcher = self.searcher()?;
        let term = Term::from_field_text(self.index.fields.context, context_id);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let hits = self.index.search(&searcher, &query)?;
        hits.iter()
            .map(|hit| self.index.stored_document(&searcher, hit.address))
            .collect()
    }

    /// Inserts a freshly built document. The caller is responsible for
    /// having deleted any previous document with the same id.
    pub fn insert_document(&mut self, document: &ResourceDocument) -> Result<()> {
        let stored = self.index.encode_document(document)?;
        let writer = writer_handle(&self.index.index, &mut self.handles)?;
        writer.add_document(stored)?;
        Ok(())
    }

    /// Deletes the subject's document, if any.
    pub fn delete_subject(&mut self, subject: &Resource) -> Result<()> {
        self.delete_document_id(&subject.index_id())
    }

    pub fn delete_document_id(&mut self, id: &str) -> Result<()> {
        let term = Term::from_field_text(self.index.fields.id, id);
        let writer = writer_handle(&self.index.index, &mut self.handles)?;
        writer.delete_term(term);
        Ok(())
    }

    /// Deletes every document carrying the given context identifier.
    pub fn delete_context(&mut self, context_id: &str) -> Result<()> {
        let term = Term::from_field_text(self.index.fields.context, context_id);
        let writer = writer_handle(&self.index.index, &mut self.handles)?;
        writer.delete_term(term);
        Ok(())
    }

    /// Flushes pending mutations and marks readers stale.
    pub fn commit(&mut self) -> Result<()> {
        let writer = writer_handle(&self.index.index, &mut self.handles)?;
        writer.commit()?;
        self.handles.reader = None;
        Ok(())
    }

    /// Truncates the index to empty.
    pub fn clear(&mut self) -> Result<()> {
        debug!("clearing full-text index");
        let writer = writer_handle(&self.index.index, &mut self.handles)?;
        writer.delete_all_documents()?;
        writer.commit()?;
        self.handles.reader = None;
        Ok(())
    }
}

fn writer_handle<'a>(index: &Index, handles: &'a mut Handles) -> Result<&'a mut IndexWriter> {
    if handles.writer.is_none() {
        handles.writer = Some(index.writer(WRITER_HEAP_BYTES)?);
    }
    Ok(handles.writer.as_mut().expect("writer just created"))
}

fn reader_handle<'a>(index: &Index, handles: &'a mut Handles) -> Result<&'a IndexReader> {
    if handles.reader.is_none() {
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        handles.reader = Some(reader);
    }
    Ok(handles.reader.as_ref().expect("reader just created"))
}

fn build_schema(analyzer: &str) -> (Schema, Fields) {
    let mut builder = Schema::builder();

    let id = builder.add_text_field("id", STRING | STORED);
    let context = builder.add_text_field("context", STRING | STORED);

    let indexing = TextFieldIndexing::default()
        .set_tokenizer(analyzer)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let text_options = TextOptions::default()
        .set_indexing_options(indexing.clone())
        .set_stored();
    let text = builder.add_text_field("text", text_options);

    let props_options = JsonObjectOptions::default()
        .set_stored()
        .set_indexing_options(indexing);
    let props = builder.add_json_field("props", props_options);

    let prop_entries = builder.add_text_field("prop_entries", STORED);

    let schema = builder.build();
    (
        schema,
        Fields {
            id,
            context,
            text,
            props,
            prop_entries,
        },
    )
}

fn break_stale_lock(path: &Path) {
    let lock_path = path.join(WRITER_LOCK_FILE);
    if lock_path.exists() {
        warn!(path = %lock_path.display(), "breaking stale index writer lock");
        if let Err(error) = std::fs::remove_file(&lock_path) {
            warn!(%error, "could not remove stale writer lock");
        }
    }
}

/// Formats the inclusive bounds of a one-dimensional degree interval,
/// swapping when the formatted bounds sort the wrong way round.
fn degree_bounds(center: f64, tolerance: f64) -> (String, String) {
    let from = format!("{}", center - tolerance);
    let to = format!("{}", center + tolerance);
    if to < from {
        (to, from)
    } else {
        (from, to)
    }
}

/// Extracts HTML-highlighted fragments from each text, joined with `"..."`.
/// Texts without a match contribute nothing.
pub fn snippet_html<'a>(
    generator: &SnippetGenerator,
    texts: impl Iterator<Item = &'a str>,
) -> String {
    let mut out = String::new();
    for text in texts {
        let snippet = generator.snippet(text);
        let html = snippet.to_html();
        if !html.is_empty() {
            if !out.is_empty() {
                out.push_str("...");
            }
            out.push_str(&html);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::make_document;
    use quill_core::term::Value;
    use quill_core::Statement;

    fn fact(s: &str, p: &str, o: &str) -> Statement {
        Statement::new(
            Resource::uri(s.to_owned()),
            Uri::new(p.to_owned()),
            Value::literal(o.to_owned()),
        )
    }

    #[test]
    fn add_statement_creates_then_augments() {
        let index = TextIndex::in_memory().unwrap();
        let subject = Resource::uri("urn:s");

        index.add_statement(&fact("urn:s", "urn:p1", "object1")).unwrap();
        let document = index.document(&subject).unwrap().unwrap();
        assert_eq!(document.property_field_count(), 1);

        index.add_statement(&fact("urn:s", "urn:p2", "object2")).unwrap();
        let document = index.document(&subject).unwrap().unwrap();
        assert_eq!(document.property_field_count(), 2);
        assert_eq!(index.num_docs().unwrap(), 1);
    }

    #[test]
    fn duplicate_add_does_not_grow_document() {
        let index = TextIndex::in_memory().unwrap();
        index.add_statement(&fact("urn:s", "urn:p", "v")).unwrap();
        index.add_statement(&fact("urn:s", "urn:p", "v")).unwrap();

        let document = index.document(&Resource::uri("urn:s")).unwrap().unwrap();
        assert_eq!(document.property_field_count(), 1);
    }

    #[test]
    fn remove_statement_deletes_last_property() {
        let index = TextIndex::in_memory().unwrap();
        index.add_statement(&fact("urn:s", "urn:p1", "a")).unwrap();
        index.add_statement(&fact("urn:s", "urn:p2", "b")).unwrap();

        index.remove_statement(&fact("urn:s", "urn:p1", "a")).unwrap();
        let document = index.document(&Resource::uri("urn:s")).unwrap().unwrap();
        assert_eq!(document.property_field_count(), 1);
        assert!(document.has(&Uri::new("urn:p2"), "b"));

        index.remove_statement(&fact("urn:s", "urn:p2", "b")).unwrap();
        assert!(index.document(&Resource::uri("urn:s")).unwrap().is_none());
        assert_eq!(index.num_docs().unwrap(), 0);
    }

    #[test]
    fn non_literal_objects_are_ignored() {
        let index = TextIndex::in_memory().unwrap();
        let statement = Statement::new(
            Resource::uri("urn:s"),
            Uri::new("urn:ref"),
            Value::Resource(Resource::uri("urn:o")),
        );
        index.add_statement(&statement).unwrap();
        assert!(index.document(&Resource::uri("urn:s")).unwrap().is_none());
    }

    #[test]
    fn free_text_search_finds_single_hit() {
        let index = TextIndex::in_memory().unwrap();
        index.add_statement(&fact("urn:s1", "urn:p", "object1")).unwrap();
        index.add_statement(&fact("urn:s2", "urn:p", "object2")).unwrap();

        let parsed = index.parse_query(&TextQuery::raw("object1"), None).unwrap();
        let searcher = index.searcher().unwrap();
        let hits = index.search(&searcher, parsed.query()).unwrap();
        assert_eq!(hits.len(), 1);

        let document = index.stored_document(&searcher, hits[0].address).unwrap();
        assert_eq!(document.resource(), Resource::uri("urn:s1"));
    }

    #[test]
    fn property_scoped_search_only_matches_that_predicate() {
        let index = TextIndex::in_memory().unwrap();
        index.add_statement(&fact("urn:s1", "urn:name", "alpha")).unwrap();
        index.add_statement(&fact("urn:s2", "urn:comment", "alpha")).unwrap();

        let parsed = index
            .parse_query(&TextQuery::raw("alpha"), Some(&Uri::new("urn:name")))
            .unwrap();
        let searcher = index.searcher().unwrap();
        let hits = index.search(&searcher, parsed.query()).unwrap();
        assert_eq!(hits.len(), 1);

        let document = index.stored_document(&searcher, hits[0].address).unwrap();
        assert_eq!(document.resource(), Resource::uri("urn:s1"));
    }

    #[test]
    fn subject_scoped_search_restricts_to_one_document() {
        let index = TextIndex::in_memory().unwrap();
        index.add_statement(&fact("urn:s1", "urn:p", "shared")).unwrap();
        index.add_statement(&fact("urn:s2", "urn:p", "shared")).unwrap();

        let parsed = index.parse_query(&TextQuery::raw("shared"), None).unwrap();
        let searcher = index.searcher().unwrap();
        let hits = index
            .search_subject(&searcher, &Resource::uri("urn:s2"), parsed.query())
            .unwrap();
        assert_eq!(hits.len(), 1);
        let document = index.stored_document(&searcher, hits[0].address).unwrap();
        assert_eq!(document.resource(), Resource::uri("urn:s2"));
    }

    #[test]
    fn clear_empties_the_index() {
        let index = TextIndex::in_memory().unwrap();
        for i in 0..5 {
            index
                .add_statement(&fact(&format!("urn:s{i}"), "urn:p", "value"))
                .unwrap();
        }
        assert_eq!(index.num_docs().unwrap(), 5);

        index.clear().unwrap();
        assert_eq!(index.num_docs().unwrap(), 0);
    }

    #[test]
    fn documents_survive_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = IndexConfig::disk(dir.path());
        {
            let index = TextIndex::open(&config).unwrap();
            index.add_statement(&fact("urn:s", "urn:p", "persisted")).unwrap();
        }
        let index = TextIndex::open(&config).unwrap();
        let document = index.document(&Resource::uri("urn:s")).unwrap().unwrap();
        assert!(document.has(&Uri::new("urn:p"), "persisted"));
    }

    #[test]
    fn unknown_analyzer_is_a_config_error() {
        let config = IndexConfig::memory().with_analyzer("no-such-analyzer");
        assert!(matches!(
            TextIndex::open(&config),
            Err(IndexError::Config(_))
        ));
    }

    #[test]
    fn snippet_highlights_matched_terms() {
        let index = TextIndex::in_memory().unwrap();
        index
            .add_statement(&fact("urn:s", "urn:p", "the quick brown fox"))
            .unwrap();

        let parsed = index.parse_query(&TextQuery::raw("quick"), None).unwrap();
        let searcher = index.searcher().unwrap();
        let generator = index.snippet_generator(&searcher, &parsed).unwrap();
        let document = index.document(&Resource::uri("urn:s")).unwrap().unwrap();

        let html = snippet_html(&generator, document.text_values());
        assert!(html.contains("<b>quick</b>"), "got: {html}");
    }

    #[test]
    fn geo_box_matches_integer_coordinates() {
        let index = TextIndex::in_memory().unwrap();
        index.add_statement(&fact("urn:here", geo::LAT, "48")).unwrap();
        index.add_statement(&fact("urn:here", geo::LONG, "11")).unwrap();
        index.add_statement(&fact("urn:far", geo::LAT, "52")).unwrap();
        index.add_statement(&fact("urn:far", geo::LONG, "13")).unwrap();

        let query = TextQuery::GeoBox {
            lat: 48.0,
            long: 11.0,
            tolerance: 1.0,
        };
        let parsed = index.parse_query(&query, None).unwrap();
        let searcher = index.searcher().unwrap();
        let hits = index.search(&searcher, parsed.query()).unwrap();
        assert_eq!(hits.len(), 1);
        let document = index.stored_document(&searcher, hits[0].address).unwrap();
        assert_eq!(document.resource(), Resource::uri("urn:here"));
    }
}
