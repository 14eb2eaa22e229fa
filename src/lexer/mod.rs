//! Lexical segmentation of host-language source text.
//!
//! The segmenter splits a source unit into an ordered, gap-free sequence of
//! [`TextSegment`]s tagged as code, string literal, line comment or block
//! comment. It never fails: unterminated literals and comments are closed at
//! the end of the unit and reported through the [`Diagnostics`] sink.
//!
//! Block comments do not nest. The first `*/` closes the comment no matter
//! how many `/*` appear inside it.

pub mod literal;

pub use literal::decode_literal;

use chumsky::prelude::*;

use crate::diagnostics::Diagnostics;

/// Kind of a text segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Anything outside literals and comments, including char literals.
    Code,
    /// A `"..."` string literal or a `"""..."""` text block.
    Literal,
    /// `//` up to (not including) the end of line.
    LineComment,
    /// `/* ... */`, closed by the first `*/`.
    BlockComment,
}

/// A contiguous slice of the source text with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment<'src> {
    pub kind: SegmentKind,
    /// The raw slice, delimiters included.
    pub text: &'src str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// False when a literal or block comment ran into the end of the unit.
    pub terminated: bool,
}

impl TextSegment<'_> {
    pub fn is_code(&self) -> bool {
        self.kind == SegmentKind::Code
    }

    pub fn is_literal(&self) -> bool {
        self.kind == SegmentKind::Literal
    }

    /// Returns true if this literal is a `"""` text block.
    pub fn is_text_block(&self) -> bool {
        self.is_literal() && self.text.starts_with("\"\"\"")
    }
}

/// One raw item produced by the chumsky parser: kind, whether the closing
/// delimiter was present, and its span.
type RawItem = (SegmentKind, bool, SimpleSpan);

/// Build the chumsky segmenter.
pub fn segmenter<'src>(
) -> impl Parser<'src, &'src str, Vec<RawItem>, extra::Err<Rich<'src, char>>> {
    let line_comment = just("//")
        .then(any().and_is(just('\n').not()).repeated())
        .to((SegmentKind::LineComment, true));

    // Single-level: the first `*/` closes the region.
    let block_comment = just("/*")
        .then(any().and_is(just("*/").not()).repeated())
        .then(just("*/").or_not())
        .map(|((_, ()), close)| (SegmentKind::BlockComment, close.is_some()));

    let text_block = just("\"\"\"")
        .then(
            just('\\')
                .then(any())
                .ignored()
                .or(any().and_is(just("\"\"\"").not()).ignored())
                .repeated(),
        )
        .then(just("\"\"\"").or_not())
        .map(|(_, close)| (SegmentKind::Literal, close.is_some()));

    let string_lit = just('"')
        .then(
            just('\\')
                .then(any())
                .ignored()
                .or(none_of("\\\"").ignored())
                .repeated(),
        )
        .then(just('"').or_not())
        .map(|(_, close)| (SegmentKind::Literal, close.is_some()));

    // `'"'` and `'\''` must never open a string literal.
    let char_lit = just('\'')
        .then(
            just('\\')
                .then(any())
                .then(none_of("'\n").repeated())
                .ignored()
                .or(none_of("\\'\n").ignored()),
        )
        .then(just('\''))
        .to((SegmentKind::Code, true));

    let stray_quote = just('\'').to((SegmentKind::Code, true));

    let boundary = choice((
        just("//").ignored(),
        just("/*").ignored(),
        just('"').ignored(),
        just('\'').ignored(),
    ));

    let code = any()
        .and_is(boundary.not())
        .repeated()
        .at_least(1)
        .to((SegmentKind::Code, true));

    let item = choice((
        line_comment,
        block_comment,
        text_block,
        string_lit,
        char_lit,
        stray_quote,
        code,
    ))
    .map_with(|(kind, closed), e| (kind, closed, e.span()));

    item.repeated().collect().then_ignore(end())
}

/// Split `source` into segments covering the whole text.
///
/// Adjacent code items are merged, so code and non-code segments alternate
/// except where two literals or comments touch.
pub fn segment<'src>(source: &'src str, diagnostics: &mut Diagnostics) -> Vec<TextSegment<'src>> {
    let (items, errs) = segmenter().parse(source).into_output_errors();

    let items = match items {
        Some(items) if errs.is_empty() => items,
        _ => {
            // The grammar accepts every input; keep the contract regardless.
            for err in &errs {
                let span = err.span();
                diagnostics.warning(span.start..span.end, format!("segmentation error: {}", err));
            }
            return if source.is_empty() {
                Vec::new()
            } else {
                vec![TextSegment {
                    kind: SegmentKind::Code,
                    text: source,
                    start: 0,
                    end: source.len(),
                    terminated: true,
                }]
            };
        }
    };

    let mut segments: Vec<TextSegment<'src>> = Vec::with_capacity(items.len());
    for (kind, terminated, span) in items {
        if !terminated {
            let what = match kind {
                SegmentKind::BlockComment => "block comment",
                _ => "string literal",
            };
            diagnostics.warning(
                span.start..span.end,
                format!("unterminated {} closed at end of unit", what),
            );
        }

        if let Some(last) = segments.last_mut() {
            if kind == SegmentKind::Code && last.kind == SegmentKind::Code {
                last.end = span.end;
                last.text = &source[last.start..last.end];
                continue;
            }
        }

        segments.push(TextSegment {
            kind,
            text: &source[span.start..span.end],
            start: span.start,
            end: span.end,
            terminated,
        });
    }

    segments
}
