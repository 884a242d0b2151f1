//! CSS selector parsing and matching
//!
//! This module implements selector parsing and matching per
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/). Identifiers may
//! contain CSS escapes, which is how container-query marker classes such as
//! `.\:container\(min-width\:300px\)` reach the matcher.

use core::iter::Peekable;
use core::str::Chars;

use cq_common::warning::warn_once;
use cq_dom::{DomTree, ElementData, NodeId, NodeType};

use crate::tokenizer::{is_ident_code_point, is_ident_start_code_point};

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    Type(String),
    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    Class(String),
    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    Id(String),
    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,
    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),
    /// Structural and static-state pseudo-classes.
    PseudoClass(PseudoClass),
    /// [§ 4.3 :not()](https://www.w3.org/TR/selectors-4/#negation)
    Not(Vec<ParsedSelector>),
    /// [§ 4.2 :is()](https://www.w3.org/TR/selectors-4/#matches) and `:where()`.
    Is {
        /// The argument selector list.
        selectors: Vec<ParsedSelector>,
        /// `:where()` contributes no specificity.
        zero_specificity: bool,
    },
    /// A pseudo-element, or a pseudo-class describing a transient user state
    /// (`:hover`, `:focus`, ...). Never matches a static document.
    NeverMatch {
        /// Counts towards the type component (pseudo-elements) instead of the
        /// class component.
        pseudo_element: bool,
    },
}

/// Structural pseudo-classes per [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    /// `:root`
    Root,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// `:first-of-type`
    FirstOfType,
    /// `:last-of-type`
    LastOfType,
    /// `:empty`
    Empty,
    /// `:link`, `:any-link`
    Link,
    /// `:checked`, from the `checked` attribute.
    Checked,
    /// `:disabled`
    Disabled,
    /// `:enabled`
    Enabled,
}

/// Attribute matching operators per [§ 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `[attr]`
    Exists,
    /// `[attr=value]`
    Equals,
    /// `[attr~=value]`
    Includes,
    /// `[attr|=value]`
    DashMatch,
    /// `[attr^=value]`
    Prefix,
    /// `[attr$=value]`
    Suffix,
    /// `[attr*=value]`
    Substring,
}

/// An attribute selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Attribute name, lowercased.
    pub name: String,
    /// Matching operator.
    pub operator: AttributeOperator,
    /// Value to compare against (empty for `Exists`).
    pub value: String,
    /// `i` flag: compare ASCII case-insensitively.
    pub case_insensitive: bool,
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    /// The simple selectors that must all match.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `A B`
    Descendant,
    /// `A > B`
    Child,
    /// `A + B`
    NextSibling,
    /// `A ~ B`
    SubsequentSibling,
}

/// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl core::ops::Add for Specificity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Stored subject-first: `A > B C` is subject `C` with
/// `[(Descendant, B), (Child, A)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    /// The rightmost compound selector.
    pub subject: CompoundSelector,
    /// `(combinator, compound)` pairs walking left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

impl ParsedSelector {
    /// [§ 17](https://www.w3.org/TR/selectors-4/#specificity-rules)
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.combinators
            .iter()
            .fold(compound_specificity(&self.subject), |acc, (_, c)| {
                acc + compound_specificity(c)
            })
    }

    /// [§ 4.1 Selector Matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
    #[must_use]
    pub fn matches_in_tree(&self, tree: &DomTree, node_id: NodeId) -> bool {
        if !compound_matches(&self.subject, tree, node_id) {
            return false;
        }
        self.matches_combinators(tree, node_id, 0)
    }

    /// Match the combinator chain starting at `index`, backtracking over
    /// alternative ancestors and siblings.
    fn matches_combinators(&self, tree: &DomTree, current: NodeId, index: usize) -> bool {
        let Some((combinator, compound)) = self.combinators.get(index) else {
            return true;
        };
        let try_candidate = |candidate: NodeId| {
            compound_matches(compound, tree, candidate)
                && self.matches_combinators(tree, candidate, index + 1)
        };
        match combinator {
            Combinator::Descendant => tree
                .ancestors(current)
                .filter(|&a| tree.as_element(a).is_some())
                .any(try_candidate),
            Combinator::Child => tree.parent_element(current).is_some_and(try_candidate),
            Combinator::NextSibling => tree
                .preceding_siblings(current)
                .find(|&s| tree.as_element(s).is_some())
                .is_some_and(try_candidate),
            Combinator::SubsequentSibling => tree
                .preceding_siblings(current)
                .filter(|&s| tree.as_element(s).is_some())
                .any(try_candidate),
        }
    }
}

fn compound_specificity(compound: &CompoundSelector) -> Specificity {
    compound
        .simple_selectors
        .iter()
        .fold(Specificity::default(), |acc, simple| {
            acc + match simple {
                SimpleSelector::Id(_) => Specificity(1, 0, 0),
                SimpleSelector::Class(_)
                | SimpleSelector::Attribute(_)
                | SimpleSelector::PseudoClass(_)
                | SimpleSelector::NeverMatch {
                    pseudo_element: false,
                } => Specificity(0, 1, 0),
                SimpleSelector::Type(_)
                | SimpleSelector::NeverMatch {
                    pseudo_element: true,
                } => Specificity(0, 0, 1),
                SimpleSelector::Universal => Specificity::default(),
                // "The specificity of an :is(), :not(), or :has() pseudo-class is
                // replaced by the specificity of the most specific complex
                // selector in its selector list argument."
                SimpleSelector::Not(list)
                | SimpleSelector::Is {
                    selectors: list,
                    zero_specificity: false,
                } => list
                    .iter()
                    .map(ParsedSelector::specificity)
                    .max()
                    .unwrap_or_default(),
                SimpleSelector::Is {
                    zero_specificity: true,
                    ..
                } => Specificity::default(),
            }
        })
}

fn compound_matches(compound: &CompoundSelector, tree: &DomTree, node_id: NodeId) -> bool {
    let Some(element) = tree.as_element(node_id) else {
        return false;
    };
    compound.simple_selectors.iter().all(|simple| match simple {
        SimpleSelector::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
        SimpleSelector::Class(class) => element.has_class(class),
        SimpleSelector::Id(id) => element.id() == Some(id.as_str()),
        SimpleSelector::Universal => true,
        SimpleSelector::Attribute(attr) => attribute_matches(attr, element),
        SimpleSelector::PseudoClass(pc) => pseudo_class_matches(*pc, tree, node_id, element),
        SimpleSelector::Not(list) => !list.iter().any(|s| s.matches_in_tree(tree, node_id)),
        SimpleSelector::Is { selectors, .. } => {
            selectors.iter().any(|s| s.matches_in_tree(tree, node_id))
        }
        SimpleSelector::NeverMatch { .. } => false,
    })
}

fn attribute_matches(attr: &AttributeSelector, element: &ElementData) -> bool {
    let Some(actual) = element.attrs.get(&attr.name) else {
        return false;
    };
    let (actual, expected) = if attr.case_insensitive {
        (actual.to_ascii_lowercase(), attr.value.to_ascii_lowercase())
    } else {
        (actual.clone(), attr.value.clone())
    };
    match attr.operator {
        AttributeOperator::Exists => true,
        AttributeOperator::Equals => actual == expected,
        AttributeOperator::Includes => actual.split_ascii_whitespace().any(|w| w == expected),
        AttributeOperator::DashMatch => {
            actual == expected || actual.starts_with(&format!("{expected}-"))
        }
        // "If "val" is the empty string then the selector does not represent anything."
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

fn pseudo_class_matches(
    pc: PseudoClass,
    tree: &DomTree,
    node_id: NodeId,
    element: &ElementData,
) -> bool {
    let element_siblings = || -> Vec<NodeId> {
        tree.parent(node_id)
            .map(|p| tree.element_children(p).collect())
            .unwrap_or_default()
    };
    let same_type = |id: &NodeId| {
        tree.as_element(*id)
            .is_some_and(|e| e.tag_name == element.tag_name)
    };
    match pc {
        PseudoClass::Root => tree.document_element() == Some(node_id),
        PseudoClass::FirstChild => element_siblings().first() == Some(&node_id),
        PseudoClass::LastChild => element_siblings().last() == Some(&node_id),
        PseudoClass::OnlyChild => element_siblings() == [node_id],
        PseudoClass::FirstOfType => {
            element_siblings().into_iter().find(same_type) == Some(node_id)
        }
        PseudoClass::LastOfType => {
            element_siblings().into_iter().rev().find(same_type) == Some(node_id)
        }
        // [§ 4.5 :empty] Comments and empty text do not count.
        PseudoClass::Empty => tree.children(node_id).iter().all(|&c| {
            match tree.get(c).map(|n| &n.node_type) {
                Some(NodeType::Text(t)) => t.is_empty(),
                Some(NodeType::Comment(_)) => true,
                _ => false,
            }
        }),
        PseudoClass::Link => {
            matches!(element.tag_name.as_str(), "a" | "area")
                && element.attrs.contains_key("href")
        }
        PseudoClass::Checked => element.attrs.contains_key("checked"),
        PseudoClass::Disabled => element.attrs.contains_key("disabled"),
        PseudoClass::Enabled => {
            matches!(
                element.tag_name.as_str(),
                "input" | "button" | "select" | "textarea"
            ) && !element.attrs.contains_key("disabled")
        }
    }
}

/// Pseudo-classes describing interaction state, which a static document
/// never has.
const TRANSIENT_PSEUDO_CLASSES: &[&str] = &[
    "hover",
    "active",
    "focus",
    "focus-visible",
    "focus-within",
    "visited",
    "target",
    "target-within",
];

/// Pseudo-elements that may be written with a single colon.
const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

type Input<'a> = Peekable<Chars<'a>>;

/// [§ 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
///
/// Assumes the backslash has already been consumed.
fn consume_escape(chars: &mut Input<'_>) -> Option<char> {
    let first = chars.next()?;
    if !first.is_ascii_hexdigit() {
        return Some(first);
    }
    let mut hex = String::from(first);
    while hex.len() < 6 {
        match chars.peek() {
            Some(&h) if h.is_ascii_hexdigit() => {
                hex.push(h);
                let _ = chars.next();
            }
            _ => break,
        }
    }
    if chars.peek().is_some_and(char::is_ascii_whitespace) {
        let _ = chars.next();
    }
    Some(
        u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|&n| n != 0)
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER),
    )
}

/// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
fn consume_ident(chars: &mut Input<'_>) -> String {
    let mut ident = String::new();
    loop {
        match chars.peek() {
            Some(&c) if is_ident_code_point(c) => {
                ident.push(c);
                let _ = chars.next();
            }
            Some('\\') => {
                let _ = chars.next();
                match consume_escape(chars) {
                    Some(c) => ident.push(c),
                    None => return ident,
                }
            }
            _ => return ident,
        }
    }
}

fn skip_whitespace(chars: &mut Input<'_>) {
    while chars.peek().is_some_and(char::is_ascii_whitespace) {
        let _ = chars.next();
    }
}

/// Collect the text up to the `)` closing an already-consumed `(`.
fn consume_parenthesized(chars: &mut Input<'_>) -> Option<String> {
    let mut depth = 0usize;
    let mut out = String::new();
    let mut quote: Option<char> = None;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                out.push(chars.next()?);
                continue;
            }
            q @ ('"' | '\'') if quote.is_none() => quote = Some(q),
            q if quote == Some(q) => quote = None,
            '(' if quote.is_none() => depth += 1,
            ')' if quote.is_none() => {
                if depth == 0 {
                    return Some(out);
                }
                depth -= 1;
            }
            _ => {}
        }
        out.push(c);
    }
    None
}

fn parse_attribute(chars: &mut Input<'_>) -> Option<AttributeSelector> {
    skip_whitespace(chars);
    let name = consume_ident(chars).to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }
    skip_whitespace(chars);
    let operator = match chars.next()? {
        ']' => {
            return Some(AttributeSelector {
                name,
                operator: AttributeOperator::Exists,
                value: String::new(),
                case_insensitive: false,
            });
        }
        '=' => AttributeOperator::Equals,
        c => {
            let op = match c {
                '~' => AttributeOperator::Includes,
                '|' => AttributeOperator::DashMatch,
                '^' => AttributeOperator::Prefix,
                '$' => AttributeOperator::Suffix,
                '*' => AttributeOperator::Substring,
                _ => return None,
            };
            if chars.next()? != '=' {
                return None;
            }
            op
        }
    };
    skip_whitespace(chars);
    let value = match chars.peek()? {
        &q @ ('"' | '\'') => {
            let _ = chars.next();
            let mut value = String::new();
            loop {
                match chars.next()? {
                    c if c == q => break,
                    '\\' => value.push(consume_escape(chars)?),
                    c => value.push(c),
                }
            }
            value
        }
        _ => {
            let value = consume_ident(chars);
            if value.is_empty() {
                return None;
            }
            value
        }
    };
    skip_whitespace(chars);
    let mut case_insensitive = false;
    if matches!(chars.peek(), Some('i' | 'I' | 's' | 'S')) {
        case_insensitive = matches!(chars.next(), Some('i' | 'I'));
        skip_whitespace(chars);
    }
    if chars.next()? != ']' {
        return None;
    }
    Some(AttributeSelector {
        name,
        operator,
        value,
        case_insensitive,
    })
}

/// Parse what follows a `:` into a simple selector.
fn parse_pseudo(chars: &mut Input<'_>) -> Option<SimpleSelector> {
    if chars.peek() == Some(&':') {
        let _ = chars.next();
        let name = consume_ident(chars);
        if name.is_empty() {
            return None;
        }
        if chars.peek() == Some(&'(') {
            let _ = chars.next();
            let _ = consume_parenthesized(chars)?;
        }
        return Some(SimpleSelector::NeverMatch {
            pseudo_element: true,
        });
    }

    let name = consume_ident(chars).to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    if chars.peek() == Some(&'(') {
        let _ = chars.next();
        let argument = consume_parenthesized(chars)?;
        return match name.as_str() {
            "not" => Some(SimpleSelector::Not(parse_selector_list(&argument)?)),
            "is" | "matches" | "where" => Some(SimpleSelector::Is {
                selectors: parse_selector_list(&argument)?,
                zero_specificity: name == "where",
            }),
            _ => {
                warn_once("selector", &format!("unsupported pseudo-class ':{name}()'"));
                Some(SimpleSelector::NeverMatch {
                    pseudo_element: false,
                })
            }
        };
    }

    let pc = match name.as_str() {
        "root" => PseudoClass::Root,
        "first-child" => PseudoClass::FirstChild,
        "last-child" => PseudoClass::LastChild,
        "only-child" => PseudoClass::OnlyChild,
        "first-of-type" => PseudoClass::FirstOfType,
        "last-of-type" => PseudoClass::LastOfType,
        "empty" => PseudoClass::Empty,
        "link" | "any-link" => PseudoClass::Link,
        "checked" => PseudoClass::Checked,
        "disabled" => PseudoClass::Disabled,
        "enabled" => PseudoClass::Enabled,
        n if LEGACY_PSEUDO_ELEMENTS.contains(&n) => {
            return Some(SimpleSelector::NeverMatch {
                pseudo_element: true,
            });
        }
        n => {
            if !TRANSIENT_PSEUDO_CLASSES.contains(&n) {
                warn_once("selector", &format!("unsupported pseudo-class ':{n}'"));
            }
            return Some(SimpleSelector::NeverMatch {
                pseudo_element: false,
            });
        }
    };
    Some(SimpleSelector::PseudoClass(pc))
}

/// Parse a single complex selector.
///
/// [§ 4 Selector syntax](https://www.w3.org/TR/selectors-4/#syntax)
///
/// Returns `None` if the selector is invalid (dangling combinator, empty
/// compound, unexpected character).
#[must_use]
pub fn parse_selector(raw: &str) -> Option<ParsedSelector> {
    let mut chars = raw.trim().chars().peekable();
    let mut compounds: Vec<CompoundSelector> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();
    let mut current = CompoundSelector::default();
    let mut pending: Option<Combinator> = None;

    // Push the current compound with the combinator that precedes it.
    let flush = |current: &mut CompoundSelector,
                 pending: &mut Option<Combinator>,
                 compounds: &mut Vec<CompoundSelector>,
                 combinators: &mut Vec<Combinator>|
     -> Option<()> {
        if current.simple_selectors.is_empty() {
            return None;
        }
        if !compounds.is_empty() {
            combinators.push(pending.take()?);
        }
        compounds.push(core::mem::take(current));
        Some(())
    };

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_ascii_whitespace() => {
                skip_whitespace(&mut chars);
                if !current.simple_selectors.is_empty() {
                    flush(&mut current, &mut pending, &mut compounds, &mut combinators)?;
                    pending = Some(Combinator::Descendant);
                }
            }
            '>' | '+' | '~' => {
                let _ = chars.next();
                if !current.simple_selectors.is_empty() {
                    flush(&mut current, &mut pending, &mut compounds, &mut combinators)?;
                } else if compounds.is_empty() || pending != Some(Combinator::Descendant) {
                    return None;
                }
                pending = Some(match c {
                    '>' => Combinator::Child,
                    '+' => Combinator::NextSibling,
                    _ => Combinator::SubsequentSibling,
                });
                skip_whitespace(&mut chars);
            }
            '.' => {
                let _ = chars.next();
                let class = consume_ident(&mut chars);
                if class.is_empty() {
                    return None;
                }
                current.simple_selectors.push(SimpleSelector::Class(class));
            }
            '#' => {
                let _ = chars.next();
                let id = consume_ident(&mut chars);
                if id.is_empty() {
                    return None;
                }
                current.simple_selectors.push(SimpleSelector::Id(id));
            }
            '*' => {
                let _ = chars.next();
                current.simple_selectors.push(SimpleSelector::Universal);
            }
            '[' => {
                let _ = chars.next();
                current
                    .simple_selectors
                    .push(SimpleSelector::Attribute(parse_attribute(&mut chars)?));
            }
            ':' => {
                let _ = chars.next();
                current.simple_selectors.push(parse_pseudo(&mut chars)?);
            }
            c if is_ident_start_code_point(c) || c == '\\' || c == '-' => {
                if !current.simple_selectors.is_empty() {
                    // A type selector must come first in its compound.
                    return None;
                }
                let name = consume_ident(&mut chars).to_ascii_lowercase();
                if name.is_empty() {
                    return None;
                }
                current.simple_selectors.push(SimpleSelector::Type(name));
            }
            _ => return None,
        }
    }

    if current.simple_selectors.is_empty() {
        // Trailing combinator other than whitespace is invalid.
        if pending != Some(Combinator::Descendant) || compounds.is_empty() {
            return None;
        }
    } else {
        flush(&mut current, &mut pending, &mut compounds, &mut combinators)?;
    }

    let subject = compounds.pop()?;
    let mut chain = Vec::with_capacity(compounds.len());
    while let Some(compound) = compounds.pop() {
        chain.push((combinators.pop()?, compound));
    }
    Some(ParsedSelector {
        subject,
        combinators: chain,
    })
}

/// Split a selector list on top-level commas.
///
/// Commas inside parentheses, attribute brackets, strings and escapes do not
/// split.
#[must_use]
pub fn split_selector_list(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            q @ ('"' | '\'') if quote.is_none() => quote = Some(q),
            q if quote == Some(q) => quote = None,
            '(' | '[' if quote.is_none() => depth += 1,
            ')' | ']' if quote.is_none() => depth -= 1,
            ',' if quote.is_none() && depth == 0 => {
                parts.push(raw[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(raw[start..].trim());
    parts
}

/// Parse a comma-separated selector list. Invalid if any member is invalid.
#[must_use]
pub fn parse_selector_list(raw: &str) -> Option<Vec<ParsedSelector>> {
    split_selector_list(raw)
        .into_iter()
        .map(parse_selector)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaped_class_is_unescaped() {
        let selector = parse_selector(r".card.\:container\(min-width\:300px\)").unwrap();
        assert_eq!(
            selector.subject.simple_selectors[1],
            SimpleSelector::Class(":container(min-width:300px)".to_string())
        );
        assert_eq!(selector.specificity(), Specificity(0, 2, 0));
    }

    #[test]
    fn test_combinator_chain_is_subject_first() {
        let selector = parse_selector("ul > li a").unwrap();
        assert_eq!(
            selector.subject.simple_selectors,
            vec![SimpleSelector::Type("a".to_string())]
        );
        assert_eq!(selector.combinators[0].0, Combinator::Descendant);
        assert_eq!(selector.combinators[1].0, Combinator::Child);
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(parse_selector("").is_none());
        assert!(parse_selector("a >").is_none());
        assert!(parse_selector("> a").is_none());
        assert!(parse_selector(".").is_none());
        assert!(parse_selector("a > > b").is_none());
    }

    #[test]
    fn test_split_respects_parentheses() {
        assert_eq!(
            split_selector_list("a:not(.b, .c), d[e=\"f,g\"]"),
            vec!["a:not(.b, .c)", "d[e=\"f,g\"]"]
        );
    }

    #[test]
    fn test_not_takes_argument_specificity() {
        let selector = parse_selector("div:not(#x)").unwrap();
        assert_eq!(selector.specificity(), Specificity(1, 0, 1));
    }
}
