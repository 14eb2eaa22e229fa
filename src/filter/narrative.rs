//! Markers of prose, log lines and configuration text around a keyword.
//!
//! Quoted SQL string values and SQL comments are blanked before scanning so
//! that `WHERE note = 'Done. Update later'` and `-- note: active only` do not
//! count as prose.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::extract::sql_lexer::{tokenize, SqlTokenKind};

/// Sentence-terminal punctuation right before or after a keyword.
static SENTENCE_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[.!]\s+(select|insert|update|delete|merge)\b|\b(select|insert|update|delete|merge)[.!?](\s|$)",
    )
    .expect("valid regex")
});

/// The word immediately preceding a keyword.
static PRECEDING_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z]+)\s+(select|insert|update|delete|merge)\b").expect("valid regex")
});

/// A colon immediately preceding a keyword.
static PRECEDING_COLON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i):\s*(select|insert|update|delete|merge)\b").expect("valid regex")
});

/// `Label: value`, as in log and configuration lines.
static LABEL_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]:\s").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeMarker {
    SentencePunctuation,
    PrecedingVerb(String),
    PrecedingColon,
    LabelColon,
}

impl fmt::Display for NarrativeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NarrativeMarker::SentencePunctuation => write!(f, "sentence punctuation at keyword"),
            NarrativeMarker::PrecedingVerb(verb) => write!(f, "verb `{}` before keyword", verb),
            NarrativeMarker::PrecedingColon => write!(f, "colon before keyword"),
            NarrativeMarker::LabelColon => write!(f, "label followed by colon"),
        }
    }
}

/// First narrative marker in `text`, if any.
pub fn find_marker(text: &str, verbs: &[String]) -> Option<NarrativeMarker> {
    let masked = mask_values(text);

    if SENTENCE_PUNCTUATION.is_match(&masked) {
        return Some(NarrativeMarker::SentencePunctuation);
    }
    for caps in PRECEDING_WORD.captures_iter(&masked) {
        if let Some(word) = caps.get(1) {
            let word = word.as_str();
            if verbs.iter().any(|v| v.eq_ignore_ascii_case(word)) {
                return Some(NarrativeMarker::PrecedingVerb(word.to_lowercase()));
            }
        }
    }
    if PRECEDING_COLON.is_match(&masked) {
        return Some(NarrativeMarker::PrecedingColon);
    }
    if LABEL_COLON.is_match(&masked) {
        return Some(NarrativeMarker::LabelColon);
    }
    None
}

/// `text` keeping only the tokens the SQL lexer sees; `'...'` literals,
/// comments and whitespace are blanked.
fn mask_values(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut last = 0;
    for token in tokenize(text) {
        blank(&mut masked, &text[last..token.range.start]);
        let piece = token.text(text);
        if token.kind == SqlTokenKind::Str {
            blank(&mut masked, piece);
        } else {
            masked.push_str(piece);
        }
        last = token.range.end;
    }
    blank(&mut masked, &text[last..]);
    masked
}

fn blank(out: &mut String, gap: &str) {
    out.extend(gap.chars().map(|c| if c == '\n' { '\n' } else { ' ' }));
}
