//! Statement classification by leading keyword.

use std::fmt;

use serde::Serialize;

/// DML statement kinds the engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
}

impl StatementType {
    /// Parse a keyword, ignoring case.
    pub fn from_keyword(word: &str) -> Option<Self> {
        const KEYWORDS: [(&str, StatementType); 5] = [
            ("SELECT", StatementType::Select),
            ("INSERT", StatementType::Insert),
            ("UPDATE", StatementType::Update),
            ("DELETE", StatementType::Delete),
            ("MERGE", StatementType::Merge),
        ];
        KEYWORDS
            .iter()
            .find(|(keyword, _)| keyword.eq_ignore_ascii_case(word))
            .map(|(_, kind)| *kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::Select => "SELECT",
            StatementType::Insert => "INSERT",
            StatementType::Update => "UPDATE",
            StatementType::Delete => "DELETE",
            StatementType::Merge => "MERGE",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `text` by its first word.
///
/// Only the first token is inspected; `DELETE_BATCH_SIZE` is one token and
/// does not match.
pub fn classify(text: &str) -> Option<StatementType> {
    let trimmed = text.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(trimmed.len());
    StatementType::from_keyword(&trimmed[..end])
}
