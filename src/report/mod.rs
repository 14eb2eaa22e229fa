//! Output records handed to the reporting layer.
//!
//! A unit's analysis yields [`StatementRecord`]s for statements that passed
//! the filter, [`RejectionRecord`]s for every candidate that did not, and the
//! structural diagnostics recorded while segmenting it. Reports from
//! independent units are combined with [`AnalysisReport::merge`]; ordering
//! across units is only established by [`AnalysisReport::sort`].

pub mod digest;

use std::fmt;

use serde::Serialize;

use crate::classify::StatementType;
use crate::diagnostics::{Diagnostic, Severity};
use crate::extract::{SqlStatement, TableReference};
use crate::source::LineIndex;
pub use digest::compute_digest;

/// A recovered statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementRecord {
    pub source_file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub statement_type: StatementType,
    pub tables: Vec<TableReference>,
    pub confidence: f64,
    pub raw_text: String,
}

impl StatementRecord {
    pub fn new(statement: SqlStatement, confidence: f64) -> Self {
        let SqlStatement {
            statement_type,
            tables,
            assembled,
        } = statement;
        Self {
            source_file: assembled.source_file,
            start_line: assembled.start_line,
            end_line: assembled.end_line,
            statement_type,
            tables,
            confidence,
            raw_text: assembled.text,
        }
    }
}

/// Why a candidate produced no statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionReason {
    /// Built from variables or call results that are not resolved.
    UnresolvedOrigin,
    /// Looks like SQL but reads as prose, a log line or configuration.
    FalsePositive,
    /// The assembled text does not start with a DML keyword.
    NoKeywordMatch,
    /// The unit exceeded its deadline.
    Timeout,
    /// The unit was skipped after an unexpected fault.
    InternalError,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::UnresolvedOrigin => "unresolved-origin",
            RejectionReason::FalsePositive => "false-positive",
            RejectionReason::NoKeywordMatch => "no-keyword-match",
            RejectionReason::Timeout => "timeout",
            RejectionReason::InternalError => "internal-error",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate that was dropped, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionRecord {
    pub source_file: String,
    /// `0` when the whole unit was rejected.
    pub start_line: usize,
    pub reason: RejectionReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RejectionRecord {
    pub fn new(source_file: impl Into<String>, start_line: usize, reason: RejectionReason) -> Self {
        Self {
            source_file: source_file.into(),
            start_line,
            reason,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A structural diagnostic located in a source unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDiagnostic {
    pub source_file: String,
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

impl UnitDiagnostic {
    pub fn new(source_file: &str, lines: &LineIndex, diagnostic: Diagnostic) -> Self {
        Self {
            source_file: source_file.to_string(),
            line: lines.line_of(diagnostic.span.start),
            severity: diagnostic.severity,
            message: diagnostic.message,
        }
    }
}

/// Everything produced by a run over one or more units.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub statements: Vec<StatementRecord>,
    pub rejections: Vec<RejectionRecord>,
    pub diagnostics: Vec<UnitDiagnostic>,
}

impl AnalysisReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A report holding a single unit-level rejection.
    pub fn rejected(record: RejectionRecord) -> Self {
        Self {
            rejections: vec![record],
            ..Self::default()
        }
    }

    /// Append another report's records.
    pub fn merge(&mut self, other: AnalysisReport) {
        self.statements.extend(other.statements);
        self.rejections.extend(other.rejections);
        self.diagnostics.extend(other.diagnostics);
    }

    /// Order every collection by `(source file, line)`.
    pub fn sort(&mut self) {
        self.statements.sort_by(|a, b| {
            (&a.source_file, a.start_line, a.end_line, &a.raw_text).cmp(&(
                &b.source_file,
                b.start_line,
                b.end_line,
                &b.raw_text,
            ))
        });
        self.rejections.sort();
        self.diagnostics.sort();
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.rejections.is_empty() && self.diagnostics.is_empty()
    }

    /// Rejections with the given reason.
    pub fn rejections_for(&self, reason: RejectionReason) -> impl Iterator<Item = &RejectionRecord> {
        self.rejections.iter().filter(move |r| r.reason == reason)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// SHA-256 over the sorted report, independent of the order in which
    /// units completed.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let mut sorted = self.clone();
        sorted.sort();
        compute_digest(&sorted)
    }
}
