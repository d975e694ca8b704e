//! LaTeX escaping
//!
//! Escaping is a single left-to-right pass over the input, so the
//! replacement text of one character (`\textbackslash{}`) is never
//! re-escaped by a later rule. [`unescape`] is the exact inverse of
//! [`escape`].

/// Characters with special meaning in LaTeX text mode and their escapes
const ESCAPES: &[(char, &str)] = &[
    ('\\', r"\textbackslash{}"),
    ('{', r"\{"),
    ('}', r"\}"),
    ('$', r"\$"),
    ('&', r"\&"),
    ('#', r"\#"),
    ('_', r"\_"),
    ('%', r"\%"),
    ('~', r"\textasciitilde{}"),
    ('^', r"\textasciicircum{}"),
];

/// Escape a single character, if it needs escaping
fn escape_char(c: char) -> Option<&'static str> {
    ESCAPES
        .iter()
        .find(|(special, _)| *special == c)
        .map(|(_, escaped)| *escaped)
}

/// Escape text for LaTeX text mode
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match escape_char(c) {
            Some(escaped) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`]
///
/// Sequences that [`escape`] never produces are copied through unchanged.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'outer: while let Some(c) = rest.chars().next() {
        if c == '\\' {
            for (special, escaped) in ESCAPES {
                if let Some(tail) = rest.strip_prefix(escaped) {
                    out.push(*special);
                    rest = tail;
                    continue 'outer;
                }
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Escape the characters that break LaTeX when copied out of BibTeX fields
///
/// Entries are already BibTeX, so braces and backslashes are structural
/// and left alone. Unescaped `&` and `%` are escaped anywhere; `#` only
/// inside braced or quoted field values, since between values it is the
/// concatenation operator (`month = jan # "~1"`).
pub fn escape_bibtex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous = None;
    let mut depth = 0usize;
    let mut quoted = false;
    for c in text.chars() {
        let escaped = previous == Some('\\');
        match c {
            '{' if !escaped => depth += 1,
            '}' if !escaped => depth = depth.saturating_sub(1),
            '"' if !escaped && depth <= 1 => quoted = !quoted,
            _ => {}
        }
        let in_value = depth >= 2 || quoted;
        let special = matches!(c, '&' | '%') || (c == '#' && in_value);
        if special && !escaped {
            out.push('\\');
        }
        out.push(c);
        previous = Some(c);
    }
    out
}
