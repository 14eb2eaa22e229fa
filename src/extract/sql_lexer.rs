//! Tolerant tokenizer for assembled statement text.
//!
//! Assembled text may contain wildcard markers inside identifiers
//! (`users_*`), unbalanced quotes and arbitrary prose, so this lexer never
//! fails. `*` is a word character here; dotted names are one word.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlTokenKind {
    /// Identifier, keyword, number or qualified name (`s.t`, `u.*`).
    Word,
    /// `'...'` string literal.
    Str,
    LParen,
    RParen,
    Comma,
    /// Any other single character.
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlToken {
    pub kind: SqlTokenKind,
    pub range: Range<usize>,
}

impl SqlToken {
    pub fn text<'t>(&self, source: &'t str) -> &'t str {
        &source[self.range.clone()]
    }

    pub fn is_word(&self) -> bool {
        self.kind == SqlTokenKind::Word
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '#' | '@' | '*')
}

/// Tokenize `text`, skipping whitespace and `--`/`/* */` comments.
pub fn tokenize(text: &str) -> Vec<SqlToken> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let rest = &text[start..];
        if rest.starts_with("--") {
            let end = rest.find('\n').map_or(text.len(), |n| start + n);
            while chars.peek().is_some_and(|&(i, _)| i < end) {
                chars.next();
            }
            continue;
        }
        if rest.starts_with("/*") {
            let end = rest[2..].find("*/").map_or(text.len(), |n| start + 2 + n + 2);
            while chars.peek().is_some_and(|&(i, _)| i < end) {
                chars.next();
            }
            continue;
        }

        if c == '\'' {
            chars.next();
            let mut end = text.len();
            while let Some((i, ch)) = chars.next() {
                if ch == '\'' {
                    // '' is an escaped quote
                    if chars.peek().is_some_and(|&(_, next)| next == '\'') {
                        chars.next();
                        continue;
                    }
                    end = i + 1;
                    break;
                }
            }
            tokens.push(SqlToken {
                kind: SqlTokenKind::Str,
                range: start..end,
            });
            continue;
        }

        if is_word_char(c) || c == '"' || c == '`' {
            let end = scan_word(text, start);
            while chars.peek().is_some_and(|&(i, _)| i < end) {
                chars.next();
            }
            tokens.push(SqlToken {
                kind: SqlTokenKind::Word,
                range: start..end,
            });
            continue;
        }

        chars.next();
        let kind = match c {
            '(' => SqlTokenKind::LParen,
            ')' => SqlTokenKind::RParen,
            ',' => SqlTokenKind::Comma,
            _ => SqlTokenKind::Symbol,
        };
        tokens.push(SqlToken {
            kind,
            range: start..start + c.len_utf8(),
        });
    }

    tokens
}

/// End of the (possibly dotted, possibly quoted) word starting at `start`.
fn scan_word(text: &str, start: usize) -> usize {
    let mut pos = start;
    loop {
        let rest = &text[pos..];
        let part_end = match rest.chars().next() {
            Some(quote @ ('"' | '`')) => rest[1..]
                .find(quote)
                .map_or(text.len(), |n| pos + 1 + n + 1),
            Some(_) => {
                rest.find(|c: char| !is_word_char(c))
                    .map_or(text.len(), |n| pos + n)
            }
            None => return pos,
        };
        if part_end == pos {
            return pos;
        }
        pos = part_end;

        let mut after = text[pos..].chars();
        let continues = after.next() == Some('.')
            && after
                .next()
                .is_some_and(|c| is_word_char(c) || c == '"' || c == '`');
        if !continues {
            return pos;
        }
        pos += 1;
    }
}

/// Strip identifier quotes from each part of a dotted name.
pub fn unquote(name: &str) -> String {
    name.chars().filter(|c| !matches!(c, '"' | '`')).collect()
}
