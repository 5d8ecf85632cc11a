//! The query shapes the interpreter hands to the index store.

use std::fmt;

/// A resolved textual query, before translation to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TextQuery {
    /// A raw query string: either user text for the default field or a
    /// `[from TO to]` range expression.
    Raw(String),
    /// A geographic bounding box over the WGS84 lat/long properties.
    /// `tolerance` is the half-width of the box, in degrees.
    GeoBox {
        lat: f64,
        long: f64,
        tolerance: f64,
    },
}

impl TextQuery {
    pub fn raw(text: impl Into<String>) -> Self {
        TextQuery::Raw(text.into())
    }

    /// The `[from TO to]` range form, with the bounds swapped when needed so
    /// the lower bound sorts first.
    pub fn range(from: &str, to: &str) -> Self {
        let (from, to) = if to < from { (to, from) } else { (from, to) };
        TextQuery::Raw(format!("[{} TO {}]", from, to))
    }
}

impl fmt::Display for TextQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextQuery::Raw(text) => f.write_str(text),
            TextQuery::GeoBox {
                lat,
                long,
                tolerance,
            } => write!(f, "geo({}, {}) +/- {}", lat, long, tolerance),
        }
    }
}

/// Splits a `[from TO to]` expression into its bounds.
pub(crate) fn parse_range(text: &str) -> Option<(&str, &str)> {
    let inner = text.strip_prefix('[')?.strip_suffix(']')?;
    let (from, to) = inner.split_once(" TO ")?;
    Some((from.trim(), to.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_swaps_unordered_bounds() {
        assert_eq!(TextQuery::range("b", "a"), TextQuery::Raw("[a TO b]".into()));
        assert_eq!(TextQuery::range("a", "b"), TextQuery::Raw("[a TO b]".into()));
    }

    #[test]
    fn parse_range_accepts_only_bracketed_form() {
        assert_eq!(parse_range("[a TO b]"), Some(("a", "b")));
        assert_eq!(parse_range("a TO b"), None);
        assert_eq!(parse_range("[a b]"), None);
    }
}
