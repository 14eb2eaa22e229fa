//! Source units handed to the engine by the crawler.

use serde::{Deserialize, Serialize};

/// One file's text, the unit of independent analysis.
///
/// Immutable once constructed; every stage borrows from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Identifier of the unit, usually the file path.
    pub path: String,
    /// Raw source text.
    pub text: String,
}

impl SourceUnit {
    /// Create a source unit from a path and its text.
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Build a line index for this unit's text.
    pub fn line_index(&self) -> LineIndex {
        LineIndex::new(&self.text)
    }
}

/// Maps byte offsets to 1-based line numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts. Always contains `0`.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Index the line starts of `text`.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Line number (1-based) containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// Number of lines in the indexed text.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
