//! Non-fatal advisories collected during a build.
//!
//! Nothing is emitted until [`Diagnostics::flush`], which the builder only
//! calls after a successful build.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A collection field; the server does not guarantee element order.
    NonDeterministicOrder,
    /// The model may be inserted with nothing beyond its identifier.
    PossiblyEmptyOnInsert,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::NonDeterministicOrder => "non-deterministic-order",
            DiagnosticKind::PossiblyEmptyOnInsert => "possibly-empty-on-insert",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub subject: String,  // field or schema the advisory is about
    pub message: String,
}

impl Diagnostic {
    pub fn list_order(field: &str) -> Self {
        Self {
            kind: DiagnosticKind::NonDeterministicOrder,
            subject: field.to_string(),
            message: format!("Field '{field}' is a list type. Order will be non-deterministic."),
        }
    }

    pub fn empty_model(schema: &str) -> Self {
        Self {
            kind: DiagnosticKind::PossiblyEmptyOnInsert,
            subject: schema.to_string(),
            message: format!(
                "Model '{schema}' has only optional fields. This may result in an empty model when inserting."
            ),
        }
    }

    pub fn single_optional_field(field: &str) -> Self {
        Self {
            kind: DiagnosticKind::PossiblyEmptyOnInsert,
            subject: field.to_string(),
            message: format!(
                "Model has a single optional field '{field}'. This may result in an empty model when inserting."
            ),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Insertion-ordered accumulator.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Emits every collected diagnostic as a `warn` event, in insertion
    /// order, and hands them back to the caller.
    pub fn flush(self) -> Vec<Diagnostic> {
        for d in &self.items {
            tracing::warn!(category = %d.kind, subject = %d.subject, "{}", d.message);
        }
        self.items
    }
}
