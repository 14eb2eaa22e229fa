//! Diagnostics sink scoped to one analysis call.
//!
//! Structural problems in the analysed text (an unterminated literal, an
//! unterminated block comment) are recovered from locally and recorded here
//! rather than logged through a process-wide logger.

use serde::Serialize;
use std::ops::Range;

/// Byte range into a source unit.
pub type Span = Range<usize>;

/// A diagnostic message with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The span in the source where the diagnostic applies.
    pub span: Span,
    /// The severity level.
    pub severity: Severity,
    /// The diagnostic message.
    pub message: String,
}

impl Diagnostic {
    /// Create a new warning diagnostic.
    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Analysis of the unit could not proceed normally.
    Error,
    /// Recovered locally, analysis continued.
    Warning,
}

/// Append-only collection of diagnostics for one run over one unit.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Record a warning at `span`.
    pub fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.push(Diagnostic::warning(span, message));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if any warning was recorded.
    pub fn has_warnings(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Warning)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
