//! The fact type shared by stores and the index.

use crate::term::{Resource, Uri, Value};
use std::fmt;

/// A single fact: subject, predicate, object, and an optional named context.
///
/// `Hash`/`Eq` include the context so transaction buffering can cancel an add
/// against a remove of the same fact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Statement {
    subject: Resource,
    predicate: Uri,
    object: Value,
    context: Option<Resource>,
}

impl Statement {
    pub fn new(subject: Resource, predicate: Uri, object: Value) -> Self {
        Self {
            subject,
            predicate,
            object,
            context: None,
        }
    }

    pub fn with_context(
        subject: Resource,
        predicate: Uri,
        object: Value,
        context: Option<Resource>,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            context,
        }
    }

    pub fn subject(&self) -> &Resource {
        &self.subject
    }

    pub fn predicate(&self) -> &Uri {
        &self.predicate
    }

    pub fn object(&self) -> &Value {
        &self.object
    }

    pub fn context(&self) -> Option<&Resource> {
        self.context.as_ref()
    }

    /// Only facts with literal objects participate in the full-text index.
    pub fn has_literal_object(&self) -> bool {
        self.object.is_literal()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(context) = &self.context {
            write!(f, " @{}", context)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_participates_in_equality() {
        let a = Statement::new(
            Resource::uri("urn:s"),
            Uri::new("urn:p"),
            Value::literal("v"),
        );
        let b = Statement::with_context(
            Resource::uri("urn:s"),
            Uri::new("urn:p"),
            Value::literal("v"),
            Some(Resource::uri("urn:c")),
        );
        assert_ne!(a, b);
    }
}
