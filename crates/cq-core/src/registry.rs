//! Query registry.
//!
//! After rewriting, every container query lives in the host's rule tree as
//! an escaped class inside some selector. The registry walks that tree and
//! records one [`ContainerQuery`] per distinct
//! `(selector, comparator, dimension, threshold)`, where `selector` is the
//! part of the selector that picks the elements the marker class goes on.
//!
//! The registry is rebuilt from scratch on every reparse and never mutated
//! in place afterwards.

use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::CharIndices;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::host::{CascadeHost, CssRuleView};
use crate::length::Length;
use crate::rewrite::{ContainerToken, find_container_tokens, unescape};

/// The axis a query measures.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Inline size, `offsetWidth`.
    Width,
    /// Block size, `offsetHeight`.
    Height,
}

impl Dimension {
    /// The physical edges on this axis, as used in `padding-*` and
    /// `border-*-width`.
    #[must_use]
    pub const fn edges(self) -> [&'static str; 2] {
        match self {
            Self::Width => ["left", "right"],
            Self::Height => ["top", "bottom"],
        }
    }
}

/// How the container size is compared against the threshold.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    /// Applies when the size is at least the threshold.
    Min,
    /// Applies when the size is at most the threshold.
    Max,
}

impl Comparator {
    /// Compare a container size against a resolved threshold.
    #[must_use]
    pub fn applies(self, size: f64, threshold: f64) -> bool {
        match self {
            Self::Min => size >= threshold,
            Self::Max => size <= threshold,
        }
    }
}

/// One registered container query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerQuery {
    /// Selector for the elements that receive the marker class.
    pub selector: String,
    /// Measured axis.
    pub dimension: Dimension,
    /// `min` or `max`.
    pub comparator: Comparator,
    /// Threshold as written (lowercased).
    pub threshold: Length,
    /// Marker class, e.g. `:container(min-width:300px)`.
    pub class_name: String,
}

impl ContainerQuery {
    /// Canonical key: `selector:container(comparator-dimension:threshold)`.
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}:container({}-{}:{})",
            self.selector, self.comparator, self.dimension, self.threshold
        )
    }
}

/// Pseudo-classes for transient states. A query must keep evaluating
/// while the element is not hovered or focused.
const TRANSIENT_PSEUDO_CLASSES: &[&str] = &["hover", "active", "focus", "checked"];

/// The set of container queries of a document, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Registry {
    queries: BTreeMap<String, ContainerQuery>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queries: BTreeMap::new(),
        }
    }

    /// Walk every enabled, readable stylesheet of `host` and collect its
    /// container queries.
    #[must_use]
    pub fn build<H: CascadeHost + ?Sized>(host: &H) -> Self {
        let mut registry = Self::new();
        for sheet in host.style_sheets() {
            if sheet.disabled {
                continue;
            }
            // Inaccessible sheets contribute nothing.
            let Ok(rules) = sheet.rules else {
                continue;
            };
            registry.collect(&rules);
        }
        registry
    }

    fn collect(&mut self, rules: &[CssRuleView]) {
        for rule in rules {
            match rule {
                CssRuleView::Style(style) => {
                    // Plain comma split: commas inside attribute strings or
                    // `:not()` arguments are not respected.
                    for selector in style.selector_text.split(',') {
                        let selector = selector.trim();
                        for token in find_container_tokens(selector) {
                            let _ = self.insert(query_for_token(selector, &token));
                        }
                    }
                }
                CssRuleView::Group { rules, .. } => self.collect(rules),
            }
        }
    }

    /// Insert a query. Returns false if an equal key was already present.
    pub fn insert(&mut self, query: ContainerQuery) -> bool {
        let key = query.key();
        if self.queries.contains_key(&key) {
            return false;
        }
        let _ = self.queries.insert(key, query);
        true
    }

    /// Look up a query by its canonical key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContainerQuery> {
        self.queries.get(key)
    }

    /// Queries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ContainerQuery> {
        self.queries.values()
    }

    /// Number of distinct queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// True if the document has no container queries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

fn query_for_token(selector: &str, token: &ContainerToken) -> ContainerQuery {
    let text = &selector[token.range.clone()];
    ContainerQuery {
        selector: preceding_selector(selector, token),
        dimension: token.condition.dimension,
        comparator: token.condition.comparator,
        threshold: token.condition.threshold.clone(),
        class_name: unescape(&text[1..]),
    }
}

/// The selector of the elements a token applies to.
///
/// Everything before the token is kept. After the token, the rest of the
/// token's compound selector is kept and everything from the next
/// combinator on is dropped. Other container classes of the same compound
/// are removed, so that sibling conditions do not depend on each other, as
/// are transient pseudo-classes. An empty compound becomes `*`.
#[must_use]
pub fn preceding_selector(selector: &str, token: &ContainerToken) -> String {
    let before = &selector[..token.range.start];
    let after = &selector[token.range.end..];

    let compound_start = last_combinator_end(before);
    let ancestors = &before[..compound_start];
    let compound_after_len = first_combinator(after).unwrap_or(after.len());
    let compound = format!("{}{}", &before[compound_start..], &after[..compound_after_len]);

    let mut compound = strip_transient_pseudo_classes(&strip_container_tokens(&compound));
    if compound.trim().is_empty() {
        compound = "*".to_string();
    }
    let result = format!("{}{compound}", strip_transient_pseudo_classes(ancestors));
    let result = result.trim();
    if result.is_empty() {
        "*".to_string()
    } else {
        result.to_string()
    }
}

fn strip_container_tokens(compound: &str) -> String {
    let mut out = String::with_capacity(compound.len());
    let mut last = 0;
    for token in find_container_tokens(compound) {
        out.push_str(&compound[last..token.range.start]);
        last = token.range.end;
    }
    out.push_str(&compound[last..]);
    out
}

/// Remove `:hover`, `:active`, `:focus` and `:checked`, leaving longer
/// names such as `:focus-within` alone.
fn strip_transient_pseudo_classes(compound: &str) -> String {
    let mut out = String::with_capacity(compound.len());
    let mut chars = compound.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let end = skip_escape(&mut chars, compound.len());
                out.push_str(&compound[i..end]);
            }
            ':' if !compound[i + 1..].starts_with(':') => {
                let rest = &compound[i + 1..];
                let name_len = rest
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'))
                    .unwrap_or(rest.len());
                let name = &rest[..name_len];
                if TRANSIENT_PSEUDO_CLASSES
                    .iter()
                    .any(|t| name.eq_ignore_ascii_case(t))
                {
                    for _ in 0..name.chars().count() {
                        let _ = chars.next();
                    }
                } else {
                    out.push(c);
                }
            }
            ':' => {
                // `::pseudo-element`
                out.push(c);
                if let Some((_, next)) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Byte index just past the last top-level combinator of `text`, or 0.
fn last_combinator_end(text: &str) -> usize {
    combinator_positions(text)
        .last()
        .map_or(0, |&(_, end)| end)
}

/// Byte index of the first top-level combinator of `text`.
fn first_combinator(text: &str) -> Option<usize> {
    combinator_positions(text).first().map(|&(start, _)| start)
}

/// `(start, end)` byte ranges of top-level combinators: runs of white
/// space and `>`, `+`, `~` outside brackets, parentheses, strings and
/// escapes.
fn combinator_positions(text: &str) -> Vec<(usize, usize)> {
    let mut positions: Vec<(usize, usize)> = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let _ = skip_escape(&mut chars, text.len());
            }
            q @ ('"' | '\'') if quote.is_none() => quote = Some(q),
            q if quote == Some(q) => quote = None,
            _ if quote.is_some() => {}
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if depth == 0 && (c.is_ascii_whitespace() || matches!(c, '>' | '+' | '~')) => {
                match positions.last_mut() {
                    Some((_, end)) if *end == i => *end = i + c.len_utf8(),
                    _ => positions.push((i, i + c.len_utf8())),
                }
            }
            _ => {}
        }
    }
    positions
}

/// Consume the rest of an escape after its backslash, including the
/// white space that may end a hex escape. Returns the byte index after it.
fn skip_escape(chars: &mut Peekable<CharIndices<'_>>, len: usize) -> usize {
    if let Some((_, first)) = chars.next()
        && first.is_ascii_hexdigit()
    {
        let mut digits = 1;
        while digits < 6 && chars.peek().is_some_and(|(_, h)| h.is_ascii_hexdigit()) {
            let _ = chars.next();
            digits += 1;
        }
        if chars.peek().is_some_and(|(_, w)| w.is_ascii_whitespace()) {
            let _ = chars.next();
        }
    }
    chars.peek().map_or(len, |&(j, _)| j)
}
