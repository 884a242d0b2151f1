//! CSS Cascading and Style Computation
//!
//! This module implements style computation per
//! [CSS Cascading and Inheritance Level 4](https://www.w3.org/TR/css-cascade-4/)
//! for the reference host: origins, importance, specificity, source order,
//! `style` attributes and `@media` applicability.

use std::collections::HashMap;

use cq_common::warning::warn_once;
use cq_dom::{DomTree, NodeId};

use crate::media::MediaContext;
use crate::parser::{Declaration, Stylesheet, parse_declaration_list};
use crate::selector::{ParsedSelector, Specificity, parse_selector_list};
use crate::style::{ComputeContext, ComputedStyle, DEFAULT_FONT_SIZE};
use crate::ua_stylesheet::ua_stylesheet;
use crate::values::{expand_box_shorthand, parse_length, split_components};

/// [§ 6.1 Cascade Origins](https://www.w3.org/TR/css-cascade-4/#cascading-origins)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Origin {
    /// User-agent defaults.
    UserAgent,
    /// Document stylesheets and `style` attributes.
    Author,
}

/// A selector of a style rule that survived media filtering.
struct CandidateRule<'a> {
    origin: Origin,
    selector: ParsedSelector,
    specificity: Specificity,
    /// Position of the rule across all sheets, UA first.
    order: usize,
    declarations: &'a [Declaration],
}

/// [§ 6.4 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
///
/// Lower sorts first; the last declaration applied wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CascadeKey {
    /// "Origin and Importance": UA normal, author normal, author important,
    /// UA important.
    tier: u8,
    /// "Context": style attributes win over any selector.
    inline: bool,
    specificity: Specificity,
    order: usize,
    /// Declaration index inside its block.
    index: usize,
}

const fn tier(origin: Origin, important: bool) -> u8 {
    match (origin, important) {
        (Origin::UserAgent, false) => 0,
        (Origin::Author, false) => 1,
        (Origin::Author, true) => 2,
        (Origin::UserAgent, true) => 3,
    }
}

fn collect_candidates<'a>(
    sheets: &[(Origin, &'a Stylesheet)],
    media: &MediaContext,
) -> Vec<CandidateRule<'a>> {
    let mut candidates = Vec::new();
    let mut order = 0;
    for &(origin, sheet) in sheets {
        sheet.for_each_style_rule(|rule, media_lists| {
            order += 1;
            if !media_lists.iter().all(|list| media.evaluate_list(list)) {
                return;
            }
            let Some(selectors) = parse_selector_list(&rule.selector_text) else {
                warn_once(
                    "css",
                    &format!("failed to parse selector '{}'", rule.selector_text),
                );
                return;
            };
            for selector in selectors {
                candidates.push(CandidateRule {
                    origin,
                    specificity: selector.specificity(),
                    selector,
                    order,
                    declarations: &rule.declarations,
                });
            }
        });
    }
    candidates
}

/// [§ 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
///
/// Compute styles for every element of `tree` from the UA sheet plus
/// `author_sheets` (in cascade order).
#[must_use]
pub fn compute_styles(
    tree: &DomTree,
    author_sheets: &[&Stylesheet],
    media: &MediaContext,
) -> HashMap<NodeId, ComputedStyle> {
    let mut sheets = vec![(Origin::UserAgent, ua_stylesheet())];
    sheets.extend(author_sheets.iter().map(|&s| (Origin::Author, s)));
    let candidates = collect_candidates(&sheets, media);

    let mut styles = HashMap::new();
    let mut root_font_size = None;
    for element in tree.elements() {
        let parent_font_size = tree
            .parent_element(element)
            .and_then(|p| styles.get(&p))
            .map_or(DEFAULT_FONT_SIZE, |s: &ComputedStyle| s.font_size);
        let is_root = tree.document_element() == Some(element);
        let cascaded = cascaded_values(tree, element, &candidates);
        let style = ComputedStyle::compute(
            &cascaded,
            &ComputeContext {
                parent_font_size,
                root_font_size,
                viewport_width: media.width,
                viewport_height: media.height,
                is_root,
            },
        );
        if is_root {
            root_font_size = Some(style.font_size);
        }
        let _ = styles.insert(element, style);
    }
    styles
}

/// [§ 6.4 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
///
/// The winning declared value of every property set on `element`, with
/// shorthands expanded.
fn cascaded_values(
    tree: &DomTree,
    element: NodeId,
    candidates: &[CandidateRule<'_>],
) -> HashMap<String, String> {
    let mut entries: Vec<(CascadeKey, &Declaration)> = Vec::new();
    for candidate in candidates {
        if !candidate.selector.matches_in_tree(tree, element) {
            continue;
        }
        for (index, declaration) in candidate.declarations.iter().enumerate() {
            entries.push((
                CascadeKey {
                    tier: tier(candidate.origin, declaration.important),
                    inline: false,
                    specificity: candidate.specificity,
                    order: candidate.order,
                    index,
                },
                declaration,
            ));
        }
    }

    let inline = tree
        .as_element(element)
        .and_then(|e| e.attrs.get("style"))
        .map(String::as_str)
        .map(parse_declaration_list)
        .unwrap_or_default();
    for (index, declaration) in inline.iter().enumerate() {
        entries.push((
            CascadeKey {
                tier: tier(Origin::Author, declaration.important),
                inline: true,
                specificity: Specificity::default(),
                order: usize::MAX,
                index,
            },
            declaration,
        ));
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut values = HashMap::new();
    for (_, declaration) in entries {
        for (name, value) in expand_shorthand(&declaration.name, &declaration.value) {
            let _ = values.insert(name, value);
        }
    }
    values
}

/// Expand box and border shorthands into longhands. Other properties pass
/// through unchanged.
///
/// [CSS Box Model § 5](https://www.w3.org/TR/css-box-4/#margins)
/// [CSS Backgrounds § 4](https://www.w3.org/TR/css-backgrounds-3/#borders)
#[must_use]
pub fn expand_shorthand(name: &str, value: &str) -> Vec<(String, String)> {
    const EDGES: [&str; 4] = ["top", "right", "bottom", "left"];
    let per_edge = |format_name: &dyn Fn(&str) -> String, values: [&str; 4]| {
        EDGES
            .iter()
            .zip(values)
            .map(|(edge, v)| (format_name(edge), v.to_string()))
            .collect::<Vec<_>>()
    };

    match name {
        "margin" | "padding" => expand_box_shorthand(value).map_or_else(Vec::new, |values| {
            per_edge(&|edge| format!("{name}-{edge}"), values)
        }),
        "border-width" => expand_box_shorthand(value).map_or_else(Vec::new, |values| {
            per_edge(&|edge| format!("border-{edge}-width"), values)
        }),
        "border-style" => expand_box_shorthand(value).map_or_else(Vec::new, |values| {
            per_edge(&|edge| format!("border-{edge}-style"), values)
        }),
        "border" => {
            let (width, style) = split_border(value);
            EDGES
                .iter()
                .flat_map(|edge| {
                    [
                        (format!("border-{edge}-width"), width.clone()),
                        (format!("border-{edge}-style"), style.clone()),
                    ]
                })
                .collect()
        }
        "border-top" | "border-right" | "border-bottom" | "border-left" => {
            let (width, style) = split_border(value);
            vec![
                (format!("{name}-width"), width),
                (format!("{name}-style"), style),
            ]
        }
        _ => vec![(name.to_string(), value.to_string())],
    }
}

/// Split a `border` shorthand into `(width, style)`; color is ignored.
fn split_border(value: &str) -> (String, String) {
    const STYLES: &[&str] = &[
        "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset",
        "outset",
    ];
    let mut width = "medium".to_string();
    let mut style = "none".to_string();
    for part in split_components(value) {
        let lowered = part.to_ascii_lowercase();
        if STYLES.contains(&lowered.as_str()) {
            style = lowered;
        } else if matches!(lowered.as_str(), "thin" | "medium" | "thick")
            || parse_length(part).is_some()
        {
            width = part.to_string();
        }
    }
    (width, style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_stylesheet;
    use cq_dom::ElementData;

    fn make_element(tree: &mut DomTree, parent: NodeId, tag: &str, class: &str) -> NodeId {
        let mut data = ElementData::new(tag);
        if !class.is_empty() {
            let _ = data.attrs.insert("class".to_string(), class.to_string());
        }
        tree.append_element(parent, data)
    }

    #[test]
    fn test_specificity_beats_order() {
        let mut tree = DomTree::new();
        let html = make_element(&mut tree, NodeId::ROOT, "html", "");
        let div = make_element(&mut tree, html, "div", "box");
        let sheet = parse_stylesheet(".box { width: 10px } div { width: 20px }");
        let styles = compute_styles(&tree, &[&sheet], &MediaContext::screen(800.0, 600.0));
        assert_eq!(styles[&div].property_value("display"), "block");
        assert_eq!(styles[&div].width, crate::style::SizeValue::Px(10.0));
    }

    #[test]
    fn test_inline_style_and_important() {
        let mut tree = DomTree::new();
        let html = make_element(&mut tree, NodeId::ROOT, "html", "");
        let div = make_element(&mut tree, html, "div", "box");
        tree.set_attribute(div, "style", "width: 30px; height: 5px");
        let sheet = parse_stylesheet(".box { width: 10px } div { height: 7px !important }");
        let styles = compute_styles(&tree, &[&sheet], &MediaContext::screen(800.0, 600.0));
        assert_eq!(styles[&div].width, crate::style::SizeValue::Px(30.0));
        assert_eq!(styles[&div].height, crate::style::SizeValue::Px(7.0));
    }

    #[test]
    fn test_media_rules_filtered() {
        let mut tree = DomTree::new();
        let html = make_element(&mut tree, NodeId::ROOT, "html", "");
        let div = make_element(&mut tree, html, "div", "");
        let sheet = parse_stylesheet(
            "div { width: 1px } @media (min-width: 1000px) { div { width: 2px } }",
        );
        let narrow = compute_styles(&tree, &[&sheet], &MediaContext::screen(800.0, 600.0));
        let wide = compute_styles(&tree, &[&sheet], &MediaContext::screen(1200.0, 600.0));
        assert_eq!(narrow[&div].width, crate::style::SizeValue::Px(1.0));
        assert_eq!(wide[&div].width, crate::style::SizeValue::Px(2.0));
    }

    #[test]
    fn test_border_shorthand() {
        let expanded = expand_shorthand("border", "2px solid red");
        assert!(expanded.contains(&("border-left-width".to_string(), "2px".to_string())));
        assert!(expanded.contains(&("border-top-style".to_string(), "solid".to_string())));
    }
}
