//! Container-query selector rewriting.
//!
//! Authors write container queries as a pseudo-class:
//!
//! ```css
//! .card:container(min-width: 300px) { color: red }
//! ```
//!
//! No style engine accepts `:container()` in a selector, so stylesheet text
//! is rewritten before the host parses it. The fragment becomes a single
//! escaped class selector, which the host parses like any other class:
//!
//! ```css
//! .card.\:container\(min-width\:300px\) { color: red }
//! ```
//!
//! # Grammar
//!
//! ```text
//! query     = [ "." ] ":container(" ws* comparator "-" dimension ws* ":" ws* value ws* ")"
//! comparator = "min" | "max"
//! dimension = "width" | "height"
//! value     = 1*( any char except ")" and white space )
//! ```
//!
//! Keywords match ASCII case-insensitively. The generated class name is
//! lowercased and has all white space removed.

use std::borrow::Cow;
use std::fmt::Write;
use std::ops::Range;
use std::str::FromStr;

use cq_common::url::{is_absolute_or_fragment, resolve_url};

use crate::length::Length;
use crate::registry::{Comparator, Dimension};

/// The pseudo-class fragment as authors write it.
const QUERY_PREFIX: &str = ":container(";

/// A parsed `comparator-dimension: value` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCondition {
    /// `min` or `max`.
    pub comparator: Comparator,
    /// `width` or `height`.
    pub dimension: Dimension,
    /// Lowercased threshold as written.
    pub threshold: Length,
}

impl QueryCondition {
    /// The unescaped marker class, e.g. `:container(min-width:300px)`.
    #[must_use]
    pub fn class_name(&self) -> String {
        format!(
            ":container({}-{}:{})",
            self.comparator, self.dimension, self.threshold
        )
    }
}

/// A rewritten container-query class found inside selector text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerToken {
    /// Byte range of the token, including the leading `.`.
    pub range: Range<usize>,
    /// The condition the token encodes.
    pub condition: QueryCondition,
}

/// Rewrite every `:container(...)` fragment of a stylesheet.
///
/// Returns [`Cow::Borrowed`] when nothing matched, so callers can skip
/// replacing the sheet. Rewriting rewritten text is a no-op.
#[must_use]
pub fn rewrite_stylesheet(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let mut out = String::new();
    let mut last = 0;
    let mut changed = false;
    let mut search = 0;

    while let Some(offset) = find_ascii_case_insensitive(&text[search..], QUERY_PREFIX) {
        let at = search + offset;
        search = at + 1;
        if is_escaped(bytes, at) {
            continue;
        }
        let Some((condition, end)) = parse_condition(text, at + QUERY_PREFIX.len()) else {
            continue;
        };
        let start = if at > 0 && bytes[at - 1] == b'.' && !is_escaped(bytes, at - 1) {
            at - 1
        } else {
            at
        };
        out.push_str(&text[last..start]);
        out.push('.');
        out.push_str(&escape_class_name(&condition.class_name()));
        last = end;
        search = end;
        changed = true;
    }

    if !changed {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[last..]);
    Cow::Owned(out)
}

/// Find every rewritten container-query class in a selector.
///
/// Any escaping of the class name is accepted, so hosts that serialize
/// `\(` as `\28 ` are handled too.
#[must_use]
pub fn find_container_tokens(selector: &str) -> Vec<ContainerToken> {
    let bytes = selector.as_bytes();
    let mut tokens = Vec::new();
    let mut search = 0;

    while let Some(offset) = selector[search..].find('.') {
        let start = search + offset;
        search = start + 1;
        if is_escaped(bytes, start) {
            continue;
        }
        let end = start + 1 + escaped_ident_len(&selector[start + 1..]);
        let name = unescape(&selector[start + 1..end]);
        let parsed = name
            .get(..QUERY_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(QUERY_PREFIX))
            .and_then(|_| parse_condition(&name, QUERY_PREFIX.len()))
            .filter(|(_, consumed)| *consumed == name.len());
        if let Some((condition, _)) = parsed {
            tokens.push(ContainerToken {
                range: start..end,
                condition,
            });
            search = end;
        }
    }
    tokens
}

/// [CSSOM § 2.1 Serialize an identifier](https://drafts.csswg.org/cssom/#serialize-an-identifier)
///
/// Escape every character that cannot appear unescaped in a class name.
#[must_use]
pub fn escape_class_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() * 2);
    for (i, c) in name.chars().enumerate() {
        if i == 0 && c.is_ascii_digit() {
            // "as code point escaped"
            let _ = write!(out, "\\{:x} ", u32::from(c));
        } else if is_ident_char(c) {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// [CSS Syntax § 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
#[must_use]
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(*h);
                    let _ = chars.next();
                }
                _ => break,
            }
        }
        if hex.is_empty() {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }
        let code_point = u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|&cp| cp != 0)
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        out.push(code_point);
        // "If the next input code point is whitespace, consume it as well."
        if chars.peek().is_some_and(char::is_ascii_whitespace) {
            let _ = chars.next();
        }
    }
    out
}

/// Rewrite relative `url(...)` references of a fetched sheet against the
/// sheet's own URL. Absolute, `data:` and fragment references are kept.
#[must_use]
pub fn resolve_relative_urls<'a>(text: &'a str, base: &str) -> Cow<'a, str> {
    let mut out = String::new();
    let mut last = 0;
    let mut changed = false;
    let mut search = 0;

    while let Some(offset) = find_ascii_case_insensitive(&text[search..], "url(") {
        let open = search + offset + "url(".len();
        let rest = &text[open..];
        let value_start = open + (rest.len() - rest.trim_start().len());
        let (start, end, resume) = match text[value_start..].chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let start = value_start + 1;
                let Some(len) = text[start..].find(quote) else {
                    break;
                };
                (start, start + len, start + len + 1)
            }
            _ => {
                let Some(len) = text[value_start..].find(')') else {
                    break;
                };
                let raw = &text[value_start..value_start + len];
                (value_start, value_start + raw.trim_end().len(), value_start + len)
            }
        };
        search = resume;

        let url = &text[start..end];
        if url.is_empty() || is_absolute_or_fragment(url) {
            continue;
        }
        out.push_str(&text[last..start]);
        out.push_str(&resolve_url(url, Some(base)));
        last = end;
        changed = true;
    }

    if !changed {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[last..]);
    Cow::Owned(out)
}

/// Parse `ws* comparator-dimension ws* : ws* value ws* )` starting at
/// `from`. Returns the condition and the byte index after the `)`.
fn parse_condition(text: &str, from: usize) -> Option<(QueryCondition, usize)> {
    let mut pos = skip_whitespace(text, from);

    let name_len = text[pos..]
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-'))
        .unwrap_or(text.len() - pos);
    let (comparator, dimension) = text[pos..pos + name_len].split_once('-')?;
    let comparator = Comparator::from_str(comparator).ok()?;
    let dimension = Dimension::from_str(dimension).ok()?;
    pos = skip_whitespace(text, pos + name_len);

    if !text[pos..].starts_with(':') {
        return None;
    }
    pos = skip_whitespace(text, pos + 1);

    let value_len = text[pos..]
        .find(|c: char| c == ')' || c.is_ascii_whitespace())
        .unwrap_or(text.len() - pos);
    if value_len == 0 {
        return None;
    }
    let value = &text[pos..pos + value_len];
    pos = skip_whitespace(text, pos + value_len);

    if !text[pos..].starts_with(')') {
        return None;
    }
    Some((
        QueryCondition {
            comparator,
            dimension,
            threshold: Length::new(value.to_ascii_lowercase()),
        },
        pos + 1,
    ))
}

/// Length of the escape-aware identifier at the start of `text`.
fn escaped_ident_len(text: &str) -> usize {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            let Some((_, escaped)) = chars.next() else {
                return i;
            };
            if escaped.is_ascii_hexdigit() {
                let mut digits = 1;
                while digits < 6 && chars.peek().is_some_and(|(_, h)| h.is_ascii_hexdigit()) {
                    let _ = chars.next();
                    digits += 1;
                }
                if chars.peek().is_some_and(|(_, w)| w.is_ascii_whitespace()) {
                    let _ = chars.next();
                }
            }
        } else if !is_ident_char(c) {
            return i;
        }
    }
    text.len()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    text[from..]
        .find(|c: char| !c.is_ascii_whitespace())
        .map_or(text.len(), |n| from + n)
}

/// True if the byte at `at` is preceded by an odd number of backslashes.
fn is_escaped(bytes: &[u8], at: usize) -> bool {
    bytes[..at]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count()
        % 2
        == 1
}

/// Byte offset of an ASCII `needle` in `haystack`, ignoring ASCII case.
fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}
