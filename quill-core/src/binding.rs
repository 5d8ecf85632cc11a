//! Solution rows: variable-name to value maps.

use crate::term::Value;
use std::fmt;
use std::sync::Arc;

/// A set of variable bindings, kept sorted by variable name.
///
/// Rows are small (a handful of variables), so a sorted vec beats a map and
/// gives `Eq`/`Hash` for free, which DISTINCT and REDUCED rely on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BindingSet {
    entries: Vec<(Arc<str>, Value)>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .binary_search_by(|(n, _)| n.as_ref().cmp(name))
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Inserts or replaces the binding for `name`.
    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: Value) {
        let name = name.into();
        match self.entries.binary_search_by(|(n, _)| n.cmp(&name)) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (name, value)),
        }
    }

    /// Builder-style [`BindingSet::insert`].
    pub fn with(mut self, name: impl Into<Arc<str>>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds every binding of `other`, overriding on conflicts.
    pub fn extend(&mut self, other: &BindingSet) {
        for (name, value) in &other.entries {
            self.insert(name.clone(), value.clone());
        }
    }

    /// Non-destructive [`BindingSet::extend`].
    pub fn extended(&self, other: &BindingSet) -> BindingSet {
        let mut merged = self.clone();
        merged.extend(other);
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_ref(), v))
    }

    /// Keeps only the named variables (projection semantics).
    pub fn project(&self, names: &[Arc<str>]) -> BindingSet {
        let mut out = BindingSet::new();
        for name in names {
            if let Some(value) = self.get(name) {
                out.insert(name.clone(), value.clone());
            }
        }
        out
    }
}

impl fmt::Display for BindingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(Arc<str>, Value)> for BindingSet {
    fn from_iter<I: IntoIterator<Item = (Arc<str>, Value)>>(iter: I) -> Self {
        let mut set = BindingSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_and_keeps_order() {
        let mut set = BindingSet::new();
        set.insert("b", Value::literal("1"));
        set.insert("a", Value::literal("2"));
        set.insert("b", Value::literal("3"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("b"), Some(&Value::literal("3")));
        let names: Vec<&str> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn extend_overrides_conflicts() {
        let base = BindingSet::new().with("x", Value::literal("old"));
        let other = BindingSet::new()
            .with("x", Value::literal("new"))
            .with("y", Value::literal("1"));

        let merged = base.extended(&other);
        assert_eq!(merged.get("x"), Some(&Value::literal("new")));
        assert_eq!(merged.get("y"), Some(&Value::literal("1")));
    }

    #[test]
    fn equal_contents_hash_equal() {
        let a = BindingSet::new()
            .with("x", Value::literal("1"))
            .with("y", Value::literal("2"));
        let b = BindingSet::new()
            .with("y", Value::literal("2"))
            .with("x", Value::literal("1"));
        assert_eq!(a, b);
    }
}
