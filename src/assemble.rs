//! Fragment assembly.
//!
//! A chain's fragments are concatenated in order with no separators added.
//! Every wildcard fragment becomes a literal `*` in the text, and the byte
//! range each fragment occupies is kept so later stages can trace a table
//! name back to the fragment it came from.

use std::ops::Range;

use crate::recognize::{ConstantPool, ConstructionChain, FragmentKind};
use crate::source::LineIndex;

/// Text standing in for content that cannot be resolved statically.
pub const WILDCARD: &str = "*";

/// Where one fragment landed in the assembled text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSpan {
    /// Byte range in [`AssembledStatement::text`].
    pub range: Range<usize>,
    /// The fragment was appended under a branch or loop.
    pub conditional: bool,
    pub wildcard: bool,
}

/// One logical statement rebuilt from a construction chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledStatement {
    pub source_file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    pub has_unresolved_placeholder: bool,
    pub max_conditional_depth: usize,
    pub spans: Vec<FragmentSpan>,
}

impl AssembledStatement {
    /// Statement made of one unconditional literal fragment.
    pub fn from_text(source_file: &str, text: impl Into<String>) -> Self {
        let text = text.into();
        let spans = if text.is_empty() {
            Vec::new()
        } else {
            vec![FragmentSpan {
                range: 0..text.len(),
                conditional: false,
                wildcard: false,
            }]
        };
        Self {
            source_file: source_file.to_string(),
            start_line: 1,
            end_line: 1,
            text,
            has_unresolved_placeholder: false,
            max_conditional_depth: 0,
            spans,
        }
    }

    /// Returns true if any fragment overlapping `range` was conditional.
    pub fn is_conditional(&self, range: &Range<usize>) -> bool {
        self.spans
            .iter()
            .filter(|span| span.range.start < range.end && range.start < span.range.end)
            .any(|span| span.conditional)
    }

    /// Ranges of the wildcard markers in the text.
    pub fn wildcard_ranges(&self) -> impl Iterator<Item = &Range<usize>> {
        self.spans
            .iter()
            .filter(|span| span.wildcard)
            .map(|span| &span.range)
    }
}

/// Assemble `chain` into one statement text.
pub fn assemble(
    chain: &ConstructionChain,
    pool: &ConstantPool,
    source_file: &str,
    lines: &LineIndex,
) -> AssembledStatement {
    let mut text = String::new();
    let mut spans = Vec::with_capacity(chain.fragments.len());

    for fragment in &chain.fragments {
        let start = text.len();
        let wildcard = match &fragment.kind {
            FragmentKind::Literal { constant, range } => {
                text.push_str(pool.slice(*constant, range));
                false
            }
            FragmentKind::FormatWildcard
            | FragmentKind::LoopWildcard
            | FragmentKind::ExprWildcard => {
                text.push_str(WILDCARD);
                true
            }
        };
        if text.len() > start {
            spans.push(FragmentSpan {
                range: start..text.len(),
                conditional: fragment.conditional_depth > 0,
                wildcard,
            });
        }
    }

    let last_offset = chain
        .fragments
        .iter()
        .map(|f| f.offset)
        .max()
        .unwrap_or(chain.offset)
        .max(chain.offset);

    AssembledStatement {
        source_file: source_file.to_string(),
        start_line: lines.line_of(chain.offset),
        end_line: lines.line_of(last_offset),
        has_unresolved_placeholder: spans.iter().any(|s| s.wildcard),
        max_conditional_depth: chain.max_conditional_depth(),
        text,
        spans,
    }
}
