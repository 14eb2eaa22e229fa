//! Shallow expression reading over token slices.
//!
//! Expressions are never parsed into a tree. A right-hand side is split on
//! top-level `+` into operands, and each operand is classified by its shape.

use super::format::FormatStyle;
use super::tokens::{ConstId, Tok, Token};
use crate::config::RecognizerSettings;

/// Index one past the token closing the group opened at `open`, or
/// `tokens.len()` when the group is never closed.
pub(crate) fn group_end(tokens: &[Token<'_>], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.tok {
            Tok::Punct('(' | '[' | '{') => depth += 1,
            Tok::Punct(')' | ']' | '}') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    tokens.len()
}

/// Deepest bracket nesting in `tokens`. Stray closers are ignored.
pub(crate) fn nesting_depth(tokens: &[Token<'_>]) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    for token in tokens {
        match token.tok {
            Tok::Punct('(' | '[' | '{') => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            Tok::Punct(')' | ']' | '}') => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Split `tokens` at every top-level token matching `is_sep`.
pub(crate) fn split_top_level<'t, 'src>(
    tokens: &'t [Token<'src>],
    is_sep: impl Fn(&Token<'src>) -> bool,
) -> Vec<&'t [Token<'src>]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.tok {
            Tok::Punct('(' | '[' | '{') => depth += 1,
            Tok::Punct(')' | ']' | '}') => depth = depth.saturating_sub(1),
            _ if depth == 0 && is_sep(token) => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

/// Comma-separated arguments of the group opened at `open`.
pub(crate) fn call_args<'t, 'src>(tokens: &'t [Token<'src>], open: usize) -> Vec<&'t [Token<'src>]> {
    let end = group_end(tokens, open);
    let inner_end = if end > open + 1 && end <= tokens.len() && is_closer(&tokens[end - 1]) {
        end - 1
    } else {
        end
    };
    let inner = &tokens[(open + 1).min(inner_end)..inner_end];
    if inner.is_empty() {
        return Vec::new();
    }
    split_top_level(inner, |t| t.is_punct(','))
}

fn is_closer(token: &Token<'_>) -> bool {
    matches!(token.tok, Tok::Punct(')' | ']' | '}'))
}

/// Read a dotted identifier path starting at `start`.
///
/// Returns the path segments and the index after the last segment.
pub(crate) fn read_path<'src>(tokens: &[Token<'src>], start: usize) -> (Vec<&'src str>, usize) {
    let mut path = Vec::new();
    let mut i = start;
    while let Some(name) = tokens.get(i).and_then(Token::ident) {
        path.push(name);
        i += 1;
        let dot_then_ident = tokens.get(i).is_some_and(|t| t.is_punct('.'))
            && tokens.get(i + 1).is_some_and(|t| t.ident().is_some());
        if !dot_then_ident {
            break;
        }
        i += 1;
    }
    (path, i)
}

/// A classified operand of a `+` expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand<'t, 'src> {
    /// String, number or char literal.
    Constant { id: ConstId, offset: usize },
    /// A bare variable name.
    Var { name: &'src str, offset: usize },
    /// A formatting call: template operands and the remaining arguments.
    Format {
        style: FormatStyle,
        template: &'t [Token<'src>],
        args: Vec<&'t [Token<'src>]>,
        offset: usize,
    },
    /// `new StringBuilder(seed).append(..)...`.
    Builder {
        seed: Option<&'t [Token<'src>]>,
        appends: Vec<&'t [Token<'src>]>,
        offset: usize,
    },
    /// Any other call; its value is not known in this pass.
    Call {
        name: String,
        tokens: &'t [Token<'src>],
        offset: usize,
    },
    /// Anything else (field access, ternary, arithmetic).
    Other { tokens: &'t [Token<'src>], offset: usize },
}

impl Operand<'_, '_> {
    pub fn offset(&self) -> usize {
        match self {
            Operand::Constant { offset, .. }
            | Operand::Var { offset, .. }
            | Operand::Format { offset, .. }
            | Operand::Builder { offset, .. }
            | Operand::Call { offset, .. }
            | Operand::Other { offset, .. } => *offset,
        }
    }

    /// Returns true if the operand carries literal text of its own.
    pub fn is_textual(&self) -> bool {
        match self {
            Operand::Constant { .. } | Operand::Format { .. } => true,
            Operand::Builder { seed, appends, .. } => seed.is_some() || !appends.is_empty(),
            _ => false,
        }
    }
}

/// Split an expression on top-level `+` and classify each operand.
///
/// Parenthesized sub-sums are flattened in place.
pub(crate) fn parse_operands<'t, 'src>(
    tokens: &'t [Token<'src>],
    settings: &RecognizerSettings,
) -> Vec<Operand<'t, 'src>> {
    let mut operands = Vec::new();
    for part in split_top_level(tokens, |t| t.is_punct('+')) {
        parse_operand(part, settings, &mut operands);
    }
    operands
}

fn strip_casts<'t, 'src>(mut part: &'t [Token<'src>]) -> &'t [Token<'src>] {
    while part.first().is_some_and(|t| t.is_punct('(')) {
        let end = group_end(part, 0);
        if end >= part.len() {
            break;
        }
        let inner = &part[1..end - 1];
        let is_type = !inner.is_empty()
            && inner.iter().all(|t| {
                t.ident().is_some()
                    || matches!(t.tok, Tok::Punct('.' | '<' | '>' | '[' | ']' | ',' | '?'))
            });
        let followed_by_value = part
            .get(end)
            .is_some_and(|t| matches!(t.tok, Tok::Ident(_) | Tok::Literal(_) | Tok::Number(_) | Tok::Punct('(')));
        if !(is_type && followed_by_value) {
            break;
        }
        part = &part[end..];
    }
    part
}

fn parse_operand<'t, 'src>(
    part: &'t [Token<'src>],
    settings: &RecognizerSettings,
    out: &mut Vec<Operand<'t, 'src>>,
) {
    let part = strip_casts(part);
    let Some(first) = part.first() else { return };
    let offset = first.offset;

    // Whole operand wrapped in parentheses.
    if first.is_punct('(') && group_end(part, 0) == part.len() && part.len() >= 2 {
        let inner = &part[1..part.len() - 1];
        for piece in split_top_level(inner, |t| t.is_punct('+')) {
            parse_operand(piece, settings, out);
        }
        return;
    }

    if part.len() == 1 {
        out.push(match first.tok {
            Tok::Literal(id) | Tok::Number(id) | Tok::Char(id) => Operand::Constant { id, offset },
            Tok::Ident(name) => Operand::Var { name, offset },
            _ => Operand::Other { tokens: part, offset },
        });
        return;
    }

    // this.name
    if part.len() == 3 && first.is_ident("this") && part[1].is_punct('.') {
        if let Some(name) = part[2].ident() {
            out.push(Operand::Var { name, offset });
            return;
        }
    }

    // "...".formatted(args)
    if matches!(first.tok, Tok::Literal(_))
        && part[1].is_punct('.')
        && part.get(2).is_some_and(|t| t.is_ident("formatted"))
        && part.get(3).is_some_and(|t| t.is_punct('('))
    {
        out.push(Operand::Format {
            style: FormatStyle::Printf,
            template: &part[..1],
            args: call_args(part, 3),
            offset,
        });
        return;
    }

    if first.is_ident("new") {
        out.push(parse_new(part, settings));
        return;
    }

    if first.ident().is_some() {
        let (path, after) = read_path(part, 0);
        if part.get(after).is_some_and(|t| t.is_punct('(')) {
            let name = path.join(".");
            if settings.format_functions.iter().any(|f| *f == name) {
                let mut args = call_args(part, after);
                if args.first().is_some_and(|a| is_locale(a)) {
                    args.remove(0);
                }
                if !args.is_empty() {
                    let template = args.remove(0);
                    let style = if name.contains("MessageFormat") {
                        FormatStyle::MessageFormat
                    } else {
                        FormatStyle::Printf
                    };
                    out.push(Operand::Format {
                        style,
                        template,
                        args,
                        offset,
                    });
                    return;
                }
            }
            out.push(Operand::Call {
                name,
                tokens: part,
                offset,
            });
            return;
        }
    }

    // "literal".trim() and similar
    if matches!(first.tok, Tok::Literal(_)) && part[1].is_punct('.') {
        if let Some(method) = part.get(2).and_then(Token::ident) {
            out.push(Operand::Call {
                name: method.to_string(),
                tokens: part,
                offset,
            });
            return;
        }
    }

    out.push(Operand::Other { tokens: part, offset });
}

fn is_locale(arg: &[Token<'_>]) -> bool {
    arg.iter()
        .any(|t| t.ident().is_some_and(|name| name == "Locale" || name.ends_with("Locale")))
}

fn parse_new<'t, 'src>(part: &'t [Token<'src>], settings: &RecognizerSettings) -> Operand<'t, 'src> {
    let offset = part[0].offset;
    let (path, mut i) = read_path(part, 1);
    let type_name = path.last().copied().unwrap_or("");

    // Skip generic arguments: new StringBuilder<>() is not valid, but new Foo<Bar>() is.
    if part.get(i).is_some_and(|t| t.is_punct('<')) {
        let mut depth = 0usize;
        while let Some(t) = part.get(i) {
            if t.is_punct('<') {
                depth += 1;
            } else if t.is_punct('>') {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    i += 1;
                    break;
                }
            }
            i += 1;
        }
    }

    let is_builder = settings.builder_types.iter().any(|b| b == type_name);
    if !is_builder || !part.get(i).is_some_and(|t| t.is_punct('(')) {
        return Operand::Other { tokens: part, offset };
    }

    let seed = call_args(part, i)
        .into_iter()
        .next()
        .filter(|arg| !is_capacity(arg));
    let mut appends = Vec::new();
    let mut cursor = group_end(part, i);

    // Fluent appends on the new builder.
    while part.get(cursor).is_some_and(|t| t.is_punct('.')) {
        let Some(method) = part.get(cursor + 1).and_then(Token::ident) else { break };
        if !part.get(cursor + 2).is_some_and(|t| t.is_punct('(')) {
            break;
        }
        if !settings.append_methods.iter().any(|m| m == method) {
            break;
        }
        if let Some(arg) = call_args(part, cursor + 2).into_iter().next() {
            appends.push(arg);
        }
        cursor = group_end(part, cursor + 2);
    }

    Operand::Builder {
        seed,
        appends,
        offset,
    }
}

/// `new StringBuilder(256)` sets a capacity, not content.
fn is_capacity(arg: &[Token<'_>]) -> bool {
    arg.len() == 1 && matches!(arg[0].tok, Tok::Number(_))
}
