//! Declared-value lookup.
//!
//! [CSS Cascade § 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
//!
//! A host's computed values say nothing about how a size was declared:
//! `300px`, `50%` and `auto` all compute to pixels. Container resolution
//! needs the declared value, so this module re-runs a reduced cascade over
//! the host's rule tree. Only importance, specificity and source order take
//! part; origins and layers are ignored.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::host::{CascadeHost, CssRuleView, DeclarationBlock};
use crate::specificity::{Specificity, split_selector_list};

/// A style rule of the flattened rule index.
#[derive(Debug, Clone)]
struct IndexedRule {
    order: usize,
    selectors: Vec<(String, Specificity)>,
    declarations: DeclarationBlock,
    media_applicable: bool,
}

/// Every style rule of every enabled, readable stylesheet, in source
/// order, with media applicability evaluated once.
///
/// Built at the start of an evaluation pass and shared by every lookup of
/// that pass.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    rules: Vec<IndexedRule>,
}

/// A rule whose selector matched an element.
#[derive(Debug, Clone, Copy)]
pub struct MatchedRule<'a> {
    /// The individual selector that matched.
    pub selector: &'a str,
    /// Specificity of that selector.
    pub specificity: Specificity,
    /// The rule's declarations.
    pub declarations: &'a DeclarationBlock,
    /// Whether every enclosing `@media` condition applies.
    pub media_applicable: bool,
    order: usize,
}

impl RuleIndex {
    /// Flatten the rule trees of `host`.
    ///
    /// Disabled sheets and sheets whose rules cannot be read are skipped.
    #[must_use]
    pub fn build<H: CascadeHost + ?Sized>(host: &H) -> Self {
        let mut index = Self::default();
        for sheet in host.style_sheets() {
            if sheet.disabled {
                continue;
            }
            if let Ok(rules) = sheet.rules {
                index.flatten(host, &rules, true);
            }
        }
        index
    }

    fn flatten<H: CascadeHost + ?Sized>(
        &mut self,
        host: &H,
        rules: &[CssRuleView],
        media_applicable: bool,
    ) {
        for rule in rules {
            match rule {
                CssRuleView::Style(style) => {
                    let selectors = split_selector_list(&style.selector_text)
                        .into_iter()
                        .map(|selector| (selector.to_string(), Specificity::of(selector)))
                        .collect();
                    self.rules.push(IndexedRule {
                        order: self.rules.len(),
                        selectors,
                        declarations: style.declarations.clone(),
                        media_applicable,
                    });
                }
                CssRuleView::Group { media, rules } => {
                    let applies = media_applicable
                        && media
                            .as_deref()
                            .is_none_or(|condition| host.media_applies(condition));
                    self.flatten(host, rules, applies);
                }
            }
        }
    }

    /// Number of indexed style rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if no style rule was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules that set at least one of `properties` and have a selector
    /// matching `element`, most specific first. Equal specificity puts the
    /// later rule first. A rule with several matching selectors is listed
    /// once per selector.
    #[must_use]
    pub fn matching<'a, H: CascadeHost + ?Sized>(
        &'a self,
        host: &H,
        element: H::Element,
        properties: &[&str],
    ) -> Vec<MatchedRule<'a>> {
        let mut matched = Vec::new();
        for rule in &self.rules {
            if !properties
                .iter()
                .any(|property| rule.declarations.get_value(property).is_some())
            {
                continue;
            }
            for (selector, specificity) in &rule.selectors {
                if host.matches_selector(element, selector) {
                    matched.push(MatchedRule {
                        selector,
                        specificity: *specificity,
                        declarations: &rule.declarations,
                        media_applicable: rule.media_applicable,
                        order: rule.order,
                    });
                }
            }
        }
        matched.sort_by_key(|m| (Reverse(m.specificity), Reverse(m.order)));
        matched
    }
}

/// The author-declared value of each of `properties` on `element`.
///
/// Inline style ranks above every rule. `!important` declarations are
/// considered first, in rank order; normal declarations only when no
/// important one exists. Empty values never win. Properties nobody
/// declares are absent from the result.
#[must_use]
pub fn resolve_declared_values<H: CascadeHost + ?Sized>(
    host: &H,
    index: &RuleIndex,
    element: H::Element,
    properties: &[&str],
) -> HashMap<String, String> {
    let inline = host.inline_style(element);
    let matched = index.matching(host, element, properties);
    let blocks: Vec<&DeclarationBlock> = std::iter::once(&inline)
        .chain(
            matched
                .iter()
                .filter(|m| m.media_applicable)
                .map(|m| m.declarations),
        )
        .collect();

    let mut values = HashMap::new();
    for &property in properties {
        let winner = [true, false].into_iter().find_map(|important| {
            blocks.iter().find_map(|block| {
                let value = block.get_value(property)?.trim();
                let is_important = block.priority(property) == "important";
                (is_important == important && !value.is_empty()).then_some(value)
            })
        });
        if let Some(value) = winner {
            let _ = values.insert(property.to_string(), value.to_string());
        }
    }
    values
}

/// The declared value of a single property, if any.
#[must_use]
pub fn declared_value<H: CascadeHost + ?Sized>(
    host: &H,
    index: &RuleIndex,
    element: H::Element,
    property: &str,
) -> Option<String> {
    resolve_declared_values(host, index, element, &[property]).remove(property)
}
