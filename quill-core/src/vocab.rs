//! Vocabulary constants used across the quill crates.

/// RDF vocabulary constants
pub mod rdf {
    /// rdf:type IRI
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

/// XSD vocabulary constants
pub mod xsd {
    /// xsd:string IRI
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

    /// xsd:float IRI
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";

    /// xsd:double IRI
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
}

/// WGS84 geographic position vocabulary, used by bounding-box queries.
pub mod geo {
    /// wgs84:lat IRI
    pub const LAT: &str = "http://www.w3.org/2003/01/geo/wgs84_pos#lat";

    /// wgs84:long IRI
    pub const LONG: &str = "http://www.w3.org/2003/01/geo/wgs84_pos#long";
}

/// The reserved predicates that express a full-text query inside a graph
/// pattern.
///
/// A textual sub-query is a group of statement patterns sharing a match
/// variable: the object of a `search:matches` pattern. The remaining
/// predicates hang off that variable.
pub mod search {
    /// Namespace of the full-text query vocabulary.
    pub const NAMESPACE: &str = "http://quilldb.org/ns/fulltext#";

    /// Names the per-hit join variable. Required.
    pub const MATCHES: &str = "http://quilldb.org/ns/fulltext#matches";

    /// Text query against the default field (literal object).
    pub const QUERY: &str = "http://quilldb.org/ns/fulltext#query";

    /// Restricts the default field to one predicate (URI object).
    pub const PROPERTY: &str = "http://quilldb.org/ns/fulltext#property";

    /// Receives the hit score (free variable object).
    pub const SCORE: &str = "http://quilldb.org/ns/fulltext#score";

    /// Receives HTML-highlighted fragments (free variable object).
    pub const SNIPPET: &str = "http://quilldb.org/ns/fulltext#snippet";

    /// Lower bound of a range query (literal object).
    pub const RANGE_QUERY_FROM: &str = "http://quilldb.org/ns/fulltext#rangeQueryFrom";

    /// Upper bound of a range query (literal object).
    pub const RANGE_QUERY_TO: &str = "http://quilldb.org/ns/fulltext#rangeQueryTo";

    /// Latitude of a geographic bounding-box query (literal object).
    pub const GEO_DEGREES_LAT: &str = "http://quilldb.org/ns/fulltext#geoDegreesLat";

    /// Longitude of a geographic bounding-box query (literal object).
    pub const GEO_DEGREES_LONG: &str = "http://quilldb.org/ns/fulltext#geoDegreesLong";

    /// Half-width of the bounding box, in degrees; defaults to 0.
    pub const GEO_DEGREES_TOLERANCE: &str = "http://quilldb.org/ns/fulltext#geoDegreesTolerance";

    /// Optional `rdf:type` marker for the match variable.
    pub const FULLTEXT_QUERY: &str = "http://quilldb.org/ns/fulltext#FulltextQuery";
}
