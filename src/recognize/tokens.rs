//! Coarse tokenizer for code segments.
//!
//! The recognizer does not need a host-language grammar, only identifiers,
//! punctuation and the constants it may fold into a statement. String
//! literal segments become [`Tok::Literal`] tokens whose decoded value lives
//! in the [`ConstantPool`].

use std::ops::Range;

use crate::lexer::{decode_literal, literal::unescape, SegmentKind, TextSegment};

/// Index of a value in the [`ConstantPool`].
pub type ConstId = usize;

/// Decoded compile-time constants referenced by fragments.
///
/// Fragments point into this arena by index and byte range instead of
/// carrying their own copies of the text.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    values: Vec<String>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` and return its id.
    pub fn intern(&mut self, value: impl Into<String>) -> ConstId {
        self.values.push(value.into());
        self.values.len() - 1
    }

    /// Full value of a constant. Unknown ids resolve to the empty string.
    pub fn get(&self, id: ConstId) -> &str {
        self.values.get(id).map(String::as_str).unwrap_or("")
    }

    /// A byte range of a constant, clamped to valid boundaries.
    pub fn slice(&self, id: ConstId, range: &Range<usize>) -> &str {
        let value = self.get(id);
        value.get(range.clone()).unwrap_or(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Token payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tok<'src> {
    Ident(&'src str),
    /// A string literal or text block.
    Literal(ConstId),
    /// A numeric literal, normalized (suffix and underscores removed).
    Number(ConstId),
    /// A char literal.
    Char(ConstId),
    /// Multi-character operator.
    Op(&'static str),
    Punct(char),
}

/// A token with the byte offset of its first character in the source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub tok: Tok<'src>,
    pub offset: usize,
}

impl<'src> Token<'src> {
    pub fn ident(&self) -> Option<&'src str> {
        match self.tok {
            Tok::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.ident() == Some(name)
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.tok == Tok::Punct(c)
    }

    pub fn is_op(&self, op: &str) -> bool {
        matches!(self.tok, Tok::Op(o) if o == op)
    }
}

const OPERATORS: &[&str] = &[
    ">>>=", "<<=", ">>=", "...", "->", "::", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=",
    "^=", "==", "!=", "<=", ">=", "&&", "||",
];

/// Tokenize every code and literal segment, skipping comments.
pub fn tokenize<'src>(segments: &[TextSegment<'src>], pool: &mut ConstantPool) -> Vec<Token<'src>> {
    let mut tokens = Vec::new();
    for segment in segments {
        match segment.kind {
            SegmentKind::Code => tokenize_code(segment.text, segment.start, pool, &mut tokens),
            SegmentKind::Literal => {
                let value = decode_literal(segment.text, segment.terminated);
                tokens.push(Token {
                    tok: Tok::Literal(pool.intern(value)),
                    offset: segment.start,
                });
            }
            SegmentKind::LineComment | SegmentKind::BlockComment => {}
        }
    }
    tokens
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn tokenize_code<'src>(
    text: &'src str,
    base: usize,
    pool: &mut ConstantPool,
    out: &mut Vec<Token<'src>>,
) {
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        let Some(c) = rest.chars().next() else { break };

        if c.is_whitespace() {
            i += c.len_utf8();
            continue;
        }

        let offset = base + i;

        if is_ident_start(c) {
            let len = rest
                .char_indices()
                .find(|(_, ch)| !is_ident_continue(*ch))
                .map(|(pos, _)| pos)
                .unwrap_or(rest.len());
            out.push(Token {
                tok: Tok::Ident(&rest[..len]),
                offset,
            });
            i += len;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && rest[1..].starts_with(|n: char| n.is_ascii_digit())) {
            let len = rest
                .char_indices()
                .find(|(pos, ch)| {
                    !(ch.is_ascii_alphanumeric()
                        || *ch == '_'
                        || *ch == '.'
                        // exponent sign
                        || ((*ch == '-' || *ch == '+')
                            && *pos > 0
                            && rest[..*pos].ends_with(['e', 'E'])
                            && !rest.starts_with("0x")))
                })
                .map(|(pos, _)| pos)
                .unwrap_or(rest.len());
            let literal = normalize_number(&rest[..len]);
            out.push(Token {
                tok: Tok::Number(pool.intern(literal)),
                offset,
            });
            i += len;
            continue;
        }

        if c == '\'' {
            // Char literals were kept in code segments by the segmenter.
            if let Some(close) = char_literal_len(rest) {
                let value = unescape(&rest[1..close - 1]);
                out.push(Token {
                    tok: Tok::Char(pool.intern(value)),
                    offset,
                });
                i += close;
                continue;
            }
        }

        if let Some(op) = OPERATORS.iter().copied().find(|op| rest.starts_with(*op)) {
            out.push(Token {
                tok: Tok::Op(op),
                offset,
            });
            i += op.len();
            continue;
        }

        out.push(Token {
            tok: Tok::Punct(c),
            offset,
        });
        i += c.len_utf8();
    }
}

/// Byte length of a char literal at the start of `rest`, quotes included.
fn char_literal_len(rest: &str) -> Option<usize> {
    let body = &rest[1..];
    let mut escaped = false;
    for (pos, ch) in body.char_indices() {
        match ch {
            '\n' => return None,
            '\\' if !escaped => escaped = true,
            '\'' if !escaped => return (pos > 0).then_some(pos + 2),
            _ => escaped = false,
        }
    }
    None
}

/// Strip underscores and type suffixes so `1_000L` folds to `1000`.
fn normalize_number(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| *c != '_').collect();
    let is_hex = cleaned.starts_with("0x") || cleaned.starts_with("0X");
    let trimmed = if is_hex {
        cleaned.trim_end_matches(['l', 'L'])
    } else {
        cleaned.trim_end_matches(['l', 'L', 'f', 'F', 'd', 'D'])
    };
    if trimmed.is_empty() {
        cleaned
    } else {
        trimmed.to_string()
    }
}
