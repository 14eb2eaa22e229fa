//! Confidence scoring and false-positive rejection.
//!
//! Runs after extraction. Each statement collects weighted [`Signal`]s; the
//! confidence is their clamped sum. A statement passes only when it has a
//! table reference, carries no prose or narrative signal, and reaches the
//! configured minimum confidence.

pub mod narrative;

use serde::Serialize;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::assemble::AssembledStatement;
use crate::classify::StatementType;
use crate::config::FilterSettings;
use crate::extract::sql_lexer::tokenize;
use crate::extract::SqlStatement;
pub use narrative::{find_marker, NarrativeMarker};

/// Identifier substituted for wildcards before the syntax check.
const NEUTRAL_IDENT: &str = "dyn";

/// Evidence for or against a statement being SQL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "signal", rename_all = "kebab-case")]
pub enum Signal {
    KeywordMatch,
    TablesExtracted,
    /// The clause keyword its statement type requires is present.
    ClauseStructure,
    /// A SQL parser accepted the text.
    SyntaxCheck,
    UnresolvedPlaceholder,
    NarrativeMarker { marker: String },
    ProseTableName { name: String },
}

impl Signal {
    pub fn weight(&self) -> f64 {
        match self {
            Signal::KeywordMatch => 0.5,
            Signal::TablesExtracted => 0.2,
            Signal::ClauseStructure => 0.15,
            Signal::SyntaxCheck => 0.1,
            Signal::UnresolvedPlaceholder => -0.05,
            Signal::NarrativeMarker { .. } => -0.6,
            Signal::ProseTableName { .. } => -0.6,
        }
    }

    /// Signals that reject a statement regardless of confidence.
    pub fn is_disqualifying(&self) -> bool {
        matches!(
            self,
            Signal::NarrativeMarker { .. } | Signal::ProseTableName { .. }
        )
    }
}

/// Outcome of filtering one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub confidence: f64,
    pub signals: Vec<Signal>,
    pub passed: bool,
}

impl Verdict {
    /// Short reason a failed statement was rejected.
    pub fn rejection_detail(&self) -> Option<String> {
        if self.passed {
            return None;
        }
        let detail = self
            .signals
            .iter()
            .find_map(|signal| match signal {
                Signal::NarrativeMarker { marker } => Some(marker.clone()),
                Signal::ProseTableName { name } => Some(format!("prose word `{}` as table", name)),
                _ => None,
            })
            .unwrap_or_else(|| {
                if self.signals.contains(&Signal::TablesExtracted) {
                    format!("confidence {:.2} below threshold", self.confidence)
                } else {
                    "no table reference".to_string()
                }
            });
        Some(detail)
    }
}

/// Scores statements against [`FilterSettings`].
#[derive(Debug, Clone)]
pub struct ConfidenceFilter<'a> {
    settings: &'a FilterSettings,
}

impl<'a> ConfidenceFilter<'a> {
    pub fn new(settings: &'a FilterSettings) -> Self {
        Self { settings }
    }

    pub fn evaluate(&self, statement: &SqlStatement) -> Verdict {
        let assembled = &statement.assembled;
        let mut signals = vec![Signal::KeywordMatch];

        if !statement.tables.is_empty() {
            signals.push(Signal::TablesExtracted);
        }
        if has_clause_structure(&assembled.text, statement.statement_type) {
            signals.push(Signal::ClauseStructure);
        }
        if self.settings.syntax_check && parses(assembled) {
            signals.push(Signal::SyntaxCheck);
        }
        if assembled.has_unresolved_placeholder {
            signals.push(Signal::UnresolvedPlaceholder);
        }
        if let Some(marker) = find_marker(&assembled.text, &self.settings.narrative_verbs) {
            signals.push(Signal::NarrativeMarker {
                marker: marker.to_string(),
            });
        }
        for table in &statement.tables {
            let is_prose = self
                .settings
                .prose_words
                .iter()
                .any(|w| w.eq_ignore_ascii_case(&table.name));
            if is_prose {
                signals.push(Signal::ProseTableName {
                    name: table.name.clone(),
                });
            }
        }

        let confidence = signals.iter().map(Signal::weight).sum::<f64>().clamp(0.0, 1.0);
        let passed = !statement.tables.is_empty()
            && !signals.iter().any(Signal::is_disqualifying)
            && confidence >= self.settings.min_confidence;

        Verdict {
            confidence,
            signals,
            passed,
        }
    }
}

/// Whether the keyword a statement of this type needs appears as a word.
fn has_clause_structure(text: &str, statement_type: StatementType) -> bool {
    let required: &[&str] = match statement_type {
        StatementType::Select => &["FROM"],
        StatementType::Insert => &["INTO"],
        StatementType::Update => &["SET"],
        StatementType::Delete => &["FROM", "WHERE"],
        StatementType::Merge => &["USING"],
    };
    tokenize(text)
        .iter()
        .filter(|t| t.is_word())
        .any(|t| required.iter().any(|k| k.eq_ignore_ascii_case(t.text(text))))
}

/// Offer the text to the generic SQL dialect with wildcards neutralized.
fn parses(statement: &AssembledStatement) -> bool {
    let mut text = statement.text.clone();
    let ranges: Vec<_> = statement.wildcard_ranges().cloned().collect();
    for range in ranges.into_iter().rev() {
        text.replace_range(range, NEUTRAL_IDENT);
    }
    Parser::parse_sql(&GenericDialect {}, &text).is_ok()
}
