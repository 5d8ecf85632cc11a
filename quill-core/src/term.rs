//! RDF terms and the index identifier encoding.
//!
//! Resources are identified in the full-text index by a plain string tag:
//! URIs verbatim, blank nodes prefixed with [`BNODE_ID_PREFIX`] (chosen so it
//! cannot begin a URI scheme), and the default graph by the literal string
//! [`NULL_CONTEXT_ID`]. [`Resource::from_index_id`] is the exact inverse of
//! [`Resource::index_id`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Prefix distinguishing blank-node identifiers from URIs in index ids.
pub const BNODE_ID_PREFIX: char = '!';

/// Identifier recorded for facts in the default graph.
pub const NULL_CONTEXT_ID: &str = "null";

/// A URI reference. Cheap to clone (Arc-backed).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri(Arc<str>);

impl Uri {
    pub fn new(iri: impl Into<Arc<str>>) -> Self {
        Self(iri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uri {
    fn from(iri: &str) -> Self {
        Self::new(iri)
    }
}

/// A blank node, identified by its label only.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BNode(Arc<str>);

impl BNode {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// A named or anonymous node: the subject (and context) position of a fact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Uri(Uri),
    BNode(BNode),
}

impl Resource {
    pub fn uri(iri: impl Into<Arc<str>>) -> Self {
        Resource::Uri(Uri::new(iri))
    }

    pub fn bnode(id: impl Into<Arc<str>>) -> Self {
        Resource::BNode(BNode::new(id))
    }

    pub fn as_uri(&self) -> Option<&Uri> {
        match self {
            Resource::Uri(uri) => Some(uri),
            Resource::BNode(_) => None,
        }
    }

    /// The string tag this resource is indexed under.
    pub fn index_id(&self) -> String {
        match self {
            Resource::Uri(uri) => uri.as_str().to_owned(),
            Resource::BNode(bnode) => format!("{}{}", BNODE_ID_PREFIX, bnode.id()),
        }
    }

    /// Inverse of [`Resource::index_id`].
    pub fn from_index_id(id: &str) -> Self {
        match id.strip_prefix(BNODE_ID_PREFIX) {
            Some(label) => Resource::bnode(label.to_owned()),
            None => Resource::uri(id.to_owned()),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Uri(uri) => uri.fmt(f),
            Resource::BNode(bnode) => bnode.fmt(f),
        }
    }
}

/// Index identifier for an optional context; `None` is the default graph.
pub fn context_index_id(context: Option<&Resource>) -> String {
    match context {
        Some(resource) => resource.index_id(),
        None => NULL_CONTEXT_ID.to_owned(),
    }
}

/// Inverse of [`context_index_id`].
pub fn context_from_index_id(id: &str) -> Option<Resource> {
    if id == NULL_CONTEXT_ID {
        None
    } else {
        Some(Resource::from_index_id(id))
    }
}

/// A textual value, optionally typed or language-tagged.
///
/// Datatypes and language tags are carried through but ignored by indexing:
/// every literal is indexed as text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    label: Arc<str>,
    datatype: Option<Uri>,
    language: Option<Arc<str>>,
}

impl Literal {
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(label: impl Into<Arc<str>>, datatype: Uri) -> Self {
        Self {
            label: label.into(),
            datatype: Some(datatype),
            language: None,
        }
    }

    pub fn with_language(label: impl Into<Arc<str>>, language: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn datatype(&self) -> Option<&Uri> {
        self.datatype.as_ref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.label)
    }
}

/// Any term that can appear in the object position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Resource(Resource),
    Literal(Literal),
}

impl Value {
    pub fn literal(label: impl Into<Arc<str>>) -> Self {
        Value::Literal(Literal::new(label))
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Literal(literal) => Some(literal),
            Value::Resource(_) => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Value::Resource(resource) => Some(resource),
            Value::Literal(_) => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Value::Literal(_))
    }

    /// Total order used by ORDER BY: blank nodes, then URIs, then literals.
    /// Literal pairs compare numerically when both labels parse as numbers.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        fn rank(value: &Value) -> u8 {
            match value {
                Value::Resource(Resource::BNode(_)) => 0,
                Value::Resource(Resource::Uri(_)) => 1,
                Value::Literal(_) => 2,
            }
        }

        match (self, other) {
            (Value::Resource(Resource::BNode(a)), Value::Resource(Resource::BNode(b))) => {
                a.id().cmp(b.id())
            }
            (Value::Resource(Resource::Uri(a)), Value::Resource(Resource::Uri(b))) => a.cmp(b),
            (Value::Literal(a), Value::Literal(b)) => {
                if let (Ok(x), Ok(y)) = (a.label().parse::<f64>(), b.label().parse::<f64>()) {
                    if let Some(ordering) = x.partial_cmp(&y) {
                        return ordering;
                    }
                }
                a.label().cmp(b.label())
            }
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Resource(resource) => resource.fmt(f),
            Value::Literal(literal) => literal.fmt(f),
        }
    }
}
