//! Decoding of literal segments into their runtime string values.

/// Decode a raw literal segment (delimiters included) into its value.
///
/// Handles both `"..."` literals and `"""` text blocks. `terminated` says
/// whether the closing delimiter is present.
pub fn decode_literal(raw: &str, terminated: bool) -> String {
    if let Some(rest) = raw.strip_prefix("\"\"\"") {
        let body = if terminated {
            rest.strip_suffix("\"\"\"").unwrap_or(rest)
        } else {
            rest
        };
        return unescape(&strip_indent(body));
    }

    let body = raw.strip_prefix('"').unwrap_or(raw);
    let body = if terminated {
        body.strip_suffix('"').unwrap_or(body)
    } else {
        body
    };
    unescape(body)
}

/// Strip incidental indentation from a text block body.
///
/// The content starts on the line after the opening delimiter. When the
/// closing delimiter sits on its own line its indentation counts too.
fn strip_indent(body: &str) -> String {
    let content = match body.find('\n') {
        Some(pos) => &body[pos + 1..],
        None => return String::new(),
    };

    let lines: Vec<&str> = content.split('\n').collect();
    let last_is_closing = lines.last().is_some_and(|l| l.trim().is_empty());

    let indent = lines
        .iter()
        .enumerate()
        .filter(|(i, l)| !l.trim().is_empty() || (last_is_closing && *i == lines.len() - 1))
        .map(|(_, l)| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut out = String::with_capacity(content.len());
    for (i, line) in lines.iter().enumerate() {
        if last_is_closing && i == lines.len() - 1 {
            break;
        }
        if i > 0 {
            out.push('\n');
        }
        out.push_str(strip_leading(line, indent).trim_end_matches([' ', '\t', '\r']));
    }
    if last_is_closing && lines.len() > 1 {
        out.push('\n');
    }
    out
}

/// `line` without its first `count` whitespace characters.
fn strip_leading(line: &str, count: usize) -> &str {
    let mut rest = line;
    for _ in 0..count {
        let mut chars = rest.chars();
        match chars.next() {
            Some(c) if c.is_whitespace() => rest = chars.as_str(),
            _ => break,
        }
    }
    rest
}

/// Decode Java escape sequences. Unknown escapes are kept verbatim.
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('s') => out.push(' '),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            // Line continuation inside a text block.
            Some('\n') => {}
            Some('u') => {
                while chars.peek() == Some(&'u') {
                    chars.next();
                }
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(ch) if hex.len() == 4 => out.push(ch),
                    _ => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or(0);
                let max_digits = if d <= '3' { 3 } else { 2 };
                for _ in 1..max_digits {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(next) => {
                            value = value * 8 + next;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
