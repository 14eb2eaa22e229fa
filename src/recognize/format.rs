//! Expansion of formatting-call templates into fragments.
//!
//! Placeholders whose argument is a compile-time constant are substituted;
//! every other placeholder becomes a [`FragmentKind::FormatWildcard`].

use std::sync::LazyLock;

use regex::Regex;

use super::chain::FragmentKind;
use super::tokens::{ConstId, ConstantPool};

/// printf-style conversion: `%[index$][flags][width][.precision]conversion`.
static PRINTF_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%(?:(\d+)\$)?([-#+ 0,(<]*)?(\d+)?(?:\.\d+)?([a-zA-Z%])")
        .expect("valid regex")
});

/// `MessageFormat` argument: `{index[,type[,style]]}`.
static MESSAGE_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\d+)(?:,[^}]*)?\}").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStyle {
    /// `String.format`, `"...".formatted`, `printf`.
    Printf,
    /// `MessageFormat.format`.
    MessageFormat,
}

/// An argument passed to a formatting call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Constant(ConstId),
    Dynamic,
}

/// One operand of the template expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePart {
    Literal { constant: ConstId, offset: usize },
    Dynamic { offset: usize },
}

/// Argument cursor shared across template parts.
#[derive(Debug, Default)]
struct Cursor {
    next: usize,
    last: Option<usize>,
}

/// Expand a template into `(fragment, offset)` pairs in order.
pub fn expand(
    style: FormatStyle,
    parts: &[TemplatePart],
    args: &[FormatArg],
    pool: &mut ConstantPool,
) -> Vec<(FragmentKind, usize)> {
    let mut out = Vec::new();
    let mut cursor = Cursor::default();

    for part in parts {
        match *part {
            TemplatePart::Dynamic { offset } => out.push((FragmentKind::ExprWildcard, offset)),
            TemplatePart::Literal { constant, offset } => {
                let pieces = match style {
                    FormatStyle::Printf => expand_printf(constant, args, &mut cursor, pool),
                    FormatStyle::MessageFormat => expand_message(constant, args, pool),
                };
                out.extend(pieces.into_iter().map(|kind| (kind, offset)));
            }
        }
    }

    out
}

fn argument(args: &[FormatArg], index: usize, pool: &ConstantPool) -> FragmentKind {
    match args.get(index) {
        Some(FormatArg::Constant(id)) => FragmentKind::constant(pool, *id),
        _ => FragmentKind::FormatWildcard,
    }
}

fn expand_printf(
    constant: ConstId,
    args: &[FormatArg],
    cursor: &mut Cursor,
    pool: &mut ConstantPool,
) -> Vec<FragmentKind> {
    let template = pool.get(constant).to_string();
    let mut out = Vec::new();
    let mut last_end = 0;

    for caps in PRINTF_SPEC.captures_iter(&template) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last_end {
            out.push(FragmentKind::Literal {
                constant,
                range: last_end..whole.start(),
            });
        }
        last_end = whole.end();

        let conversion = caps.get(4).map(|m| m.as_str()).unwrap_or("s");
        match conversion {
            "%" | "n" => {
                let escape = pool.intern(if conversion == "%" { "%" } else { "\n" });
                out.push(FragmentKind::constant(pool, escape));
            }
            _ => {
                let flags = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                let index = if let Some(explicit) = caps.get(1) {
                    explicit
                        .as_str()
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                } else if flags.contains('<') {
                    cursor.last
                } else {
                    let index = cursor.next;
                    cursor.next += 1;
                    Some(index)
                };
                cursor.last = index;
                out.push(match index {
                    Some(index) => argument(args, index, pool),
                    None => FragmentKind::FormatWildcard,
                });
            }
        }
    }

    if last_end < template.len() {
        out.push(FragmentKind::Literal {
            constant,
            range: last_end..template.len(),
        });
    }
    out
}

fn expand_message(constant: ConstId, args: &[FormatArg], pool: &ConstantPool) -> Vec<FragmentKind> {
    let template = pool.get(constant);
    let mut out = Vec::new();
    let mut last_end = 0;

    for caps in MESSAGE_ARG.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last_end {
            out.push(FragmentKind::Literal {
                constant,
                range: last_end..whole.start(),
            });
        }
        last_end = whole.end();

        let index = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok());
        out.push(match index {
            Some(index) => argument(args, index, pool),
            None => FragmentKind::FormatWildcard,
        });
    }

    if last_end < template.len() {
        out.push(FragmentKind::Literal {
            constant,
            range: last_end..template.len(),
        });
    }
    out
}
