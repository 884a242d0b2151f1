//! Selector specificity from selector text.
//!
//! [Selectors Level 4 § 17](https://www.w3.org/TR/selectors-4/#specificity-rules)
//!
//! The cascade approximation only sees selector text, so specificity is
//! computed by repeatedly stripping one kind of simple selector and counting
//! what was removed:
//!
//! 1. container-query classes and attribute selectors (class-like)
//! 2. the `:not(` wrapper, whose argument is counted by the later steps
//! 3. `#id`
//! 4. `.class`
//! 5. `::pseudo-element` (type-like)
//! 6. `:pseudo-class` (class-like)
//! 7. remaining type selectors
//!
//! This is not exact for `:is()`, `:where()` or selector lists inside
//! `:not()`, which is acceptable for single-property lookups.

use serde::Serialize;

use crate::rewrite::find_container_tokens;

/// `(ids, class-likes, types)`, compared lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Compute the specificity of one complex selector.
    #[must_use]
    pub fn of(selector: &str) -> Self {
        let mut text = selector.to_string();
        let mut classes = 0;

        // Container-query classes contain `(`, `:` and `.` and must go first.
        let tokens = find_container_tokens(&text);
        classes += count(tokens.len());
        for token in tokens.iter().rev() {
            text.replace_range(token.range.clone(), " ");
        }

        let (stripped, attributes) = strip(&text, attribute_len);
        classes += attributes;
        let text = unwrap_not(&stripped);
        let (text, ids) = strip(&text, |chars, i| prefixed_ident_len(chars, i, '#'));
        let (text, plain_classes) = strip(&text, |chars, i| prefixed_ident_len(chars, i, '.'));
        let (text, pseudo_elements) = strip(&text, pseudo_element_len);
        let (text, pseudo_classes) = strip(&text, pseudo_class_len);
        let types = count_type_selectors(&text);

        Self(
            ids,
            classes + plain_classes + pseudo_classes,
            pseudo_elements + types,
        )
    }

    /// Packed score: `id * 65536 + class * 256 + type`, saturating at
    /// `u32::MAX`.
    #[must_use]
    pub const fn score(self) -> u32 {
        self.0
            .saturating_mul(65536)
            .saturating_add(self.1.saturating_mul(256))
            .saturating_add(self.2)
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Split a selector list on top-level commas; commas inside parentheses,
/// brackets and strings do not split.
#[must_use]
pub fn split_selector_list(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            q @ ('"' | '\'') if quote.is_none() => quote = Some(q),
            q if quote == Some(q) => quote = None,
            _ if quote.is_some() => {}
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

/// Remove every match of `matcher` and count the removals. `matcher`
/// returns the length in chars of a match starting at `i`. Escapes are
/// copied through untouched.
fn strip(text: &str, matcher: impl Fn(&[char], usize) -> Option<usize>) -> (String, u32) {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut removed = 0;
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            let len = escape_len(&chars, i);
            out.extend(chars[i..i + len].iter());
            i += len;
            continue;
        }
        if let Some(len) = matcher(&chars, i) {
            removed += 1;
            i += len;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    (out, removed)
}

/// Drop `:not(` and its closing parenthesis, keeping the argument.
fn unwrap_not(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut closers: Vec<usize> = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let len = escape_len(&chars, i);
                out.extend(chars[i..i + len].iter());
                i += len;
                continue;
            }
            ':' if starts_with_ignore_case(&chars[i + 1..], "not(") => {
                depth += 1;
                closers.push(depth);
                i += ":not(".len();
                continue;
            }
            '(' => depth += 1,
            ')' => {
                if closers.last() == Some(&depth) {
                    let _ = closers.pop();
                    depth -= 1;
                    i += 1;
                    continue;
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn attribute_len(chars: &[char], i: usize) -> Option<usize> {
    if chars[i] != '[' {
        return None;
    }
    let mut quote: Option<char> = None;
    let mut j = i + 1;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 1,
            q @ ('"' | '\'') if quote.is_none() => quote = Some(q),
            q if quote == Some(q) => quote = None,
            ']' if quote.is_none() => return Some(j + 1 - i),
            _ => {}
        }
        j += 1;
    }
    None
}

fn prefixed_ident_len(chars: &[char], i: usize, prefix: char) -> Option<usize> {
    if chars[i] != prefix {
        return None;
    }
    let len = ident_len(chars, i + 1);
    (len > 0).then_some(1 + len)
}

fn pseudo_element_len(chars: &[char], i: usize) -> Option<usize> {
    if chars[i] != ':' || chars.get(i + 1) != Some(&':') {
        return None;
    }
    let name = ident_len(chars, i + 2);
    (name > 0).then(|| 2 + name + arguments_len(chars, i + 2 + name))
}

fn pseudo_class_len(chars: &[char], i: usize) -> Option<usize> {
    if chars[i] != ':' {
        return None;
    }
    let name = ident_len(chars, i + 1);
    (name > 0).then(|| 1 + name + arguments_len(chars, i + 1 + name))
}

/// Length of a parenthesized argument list at `i`, or 0.
fn arguments_len(chars: &[char], i: usize) -> usize {
    if chars.get(i) != Some(&'(') {
        return 0;
    }
    let mut depth = 0usize;
    for (offset, &c) in chars[i..].iter().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return offset + 1;
                }
            }
            _ => {}
        }
    }
    chars.len() - i
}

/// [CSS Syntax § 4.3.7](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
///
/// Length in chars of the escape whose backslash is at `i`: up to six hex
/// digits plus one trailing white space, or the single escaped char.
fn escape_len(chars: &[char], i: usize) -> usize {
    let hex = chars[i + 1..]
        .iter()
        .take(6)
        .take_while(|c| c.is_ascii_hexdigit())
        .count();
    if hex == 0 {
        return (chars.len() - i).min(2);
    }
    let end = i + 1 + hex;
    if chars.get(end).is_some_and(char::is_ascii_whitespace) {
        end + 1 - i
    } else {
        end - i
    }
}

/// Length of an escape-aware identifier at `i`.
fn ident_len(chars: &[char], i: usize) -> usize {
    let mut j = i;
    while j < chars.len() {
        let c = chars[j];
        if c == '\\' {
            j += escape_len(chars, j);
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            j += 1;
        } else {
            break;
        }
    }
    j.min(chars.len()) - i
}

fn count_type_selectors(text: &str) -> u32 {
    count(
        text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()))
            .filter(|word| {
                word.chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || !c.is_ascii())
            })
            .count(),
    )
}

fn starts_with_ignore_case(chars: &[char], needle: &str) -> bool {
    chars.len() >= needle.len()
        && chars
            .iter()
            .zip(needle.chars())
            .all(|(a, b)| a.eq_ignore_ascii_case(&b))
}
