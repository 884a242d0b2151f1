//! Tests for container resolution, evaluation and the pipeline against a
//! scripted host.

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};

use cq_common::net::FetchError;
use cq_common::warning::was_warned;
use cq_core::evaluate::content_size;
use cq_core::{
    CascadeHost, CssRuleView, DeclarationBlock, Dimension, Pass, Pipeline, Registry, SheetHost,
    SheetOwner, SheetSource, StyleHost, StyleRuleView, StyleSheetView, Viewport, evaluate,
    unescape,
};

struct Node {
    tag: &'static str,
    parent: Option<usize>,
    classes: BTreeSet<String>,
    computed: HashMap<&'static str, String>,
    size: (f64, f64),
}

struct Sheet {
    owner: SheetOwner,
    text: String,
    disabled: bool,
}

/// A host whose layout is scripted: offset sizes and computed values are
/// set by the test, only the rule tree is derived from sheet text.
struct ScriptedHost {
    nodes: Vec<Node>,
    sheets: Vec<Sheet>,
    viewport: Viewport,
}

impl ScriptedHost {
    /// A document with just `<html>`, 1000x800.
    fn new() -> Self {
        Self {
            nodes: vec![Node {
                tag: "html",
                parent: None,
                classes: BTreeSet::new(),
                computed: HashMap::new(),
                size: (1000.0, 800.0),
            }],
            sheets: Vec::new(),
            viewport: Viewport {
                width: 1000.0,
                height: 800.0,
            },
        }
    }

    fn add(&mut self, parent: usize, tag: &'static str, classes: &str, width: f64) -> usize {
        self.nodes.push(Node {
            tag,
            parent: Some(parent),
            classes: classes.split_whitespace().map(str::to_string).collect(),
            computed: HashMap::new(),
            size: (width, 100.0),
        });
        self.nodes.len() - 1
    }

    fn set(&mut self, element: usize, property: &'static str, value: &str) {
        let _ = self.nodes[element]
            .computed
            .insert(property, value.to_string());
    }

    fn style(&mut self, text: &str) {
        self.sheets.push(Sheet {
            owner: SheetOwner::Inline {
                text: text.to_string(),
            },
            text: text.to_string(),
            disabled: false,
        });
    }

    fn link(&mut self, href: &str) {
        self.sheets.push(Sheet {
            owner: SheetOwner::Linked {
                href: href.to_string(),
            },
            text: String::new(),
            disabled: false,
        });
    }

    fn has_class(&self, element: usize, class: &str) -> bool {
        self.nodes[element].classes.contains(class)
    }

    fn matches_compound(&self, element: usize, compound: &str) -> bool {
        let node = &self.nodes[element];
        let mut parts = Vec::new();
        let mut kind = 't';
        let mut current = String::new();
        let mut chars = compound.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    current.push(c);
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                '.' | '#' | ':' => {
                    parts.push((kind, unescape(&current)));
                    kind = c;
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        parts.push((kind, unescape(&current)));

        parts.iter().all(|(kind, name)| match kind {
            't' => name.is_empty() || name == "*" || name == node.tag,
            '.' => node.classes.contains(name),
            _ => false,
        })
    }
}

fn parse_rules(text: &str) -> Vec<CssRuleView> {
    text.split('}')
        .filter_map(|chunk| {
            let (selector, body) = chunk.split_once('{')?;
            let declarations: DeclarationBlock = body
                .split(';')
                .filter_map(|declaration| {
                    let (name, value) = declaration.split_once(':')?;
                    let value = value.trim();
                    Some(match value.strip_suffix("!important") {
                        Some(value) => (name.trim(), value.trim(), true),
                        None => (name.trim(), value, false),
                    })
                })
                .collect();
            Some(CssRuleView::Style(StyleRuleView {
                selector_text: selector.trim().to_string(),
                declarations,
            }))
        })
        .collect()
}

impl CascadeHost for ScriptedHost {
    type Element = usize;

    fn style_sheets(&self) -> Vec<StyleSheetView> {
        self.sheets
            .iter()
            .map(|sheet| StyleSheetView {
                disabled: sheet.disabled,
                href: match &sheet.owner {
                    SheetOwner::Linked { href } => Some(href.clone()),
                    SheetOwner::Inline { .. } => None,
                },
                rules: Ok(parse_rules(&sheet.text)),
            })
            .collect()
    }

    fn matches_selector(&self, element: usize, selector: &str) -> bool {
        let compounds: Vec<&str> = selector
            .split(|c: char| c.is_whitespace() || c == '>')
            .filter(|s| !s.is_empty())
            .collect();
        let Some((last, ancestors)) = compounds.split_last() else {
            return false;
        };
        if !self.matches_compound(element, last) {
            return false;
        }
        let mut current = self.nodes[element].parent;
        for compound in ancestors.iter().rev() {
            loop {
                let Some(node) = current else {
                    return false;
                };
                current = self.nodes[node].parent;
                if self.matches_compound(node, compound) {
                    break;
                }
            }
        }
        true
    }

    fn inline_style(&self, _: usize) -> DeclarationBlock {
        DeclarationBlock::new()
    }

    fn media_applies(&self, _: &str) -> bool {
        true
    }
}

impl StyleHost for ScriptedHost {
    fn root_element(&self) -> Option<usize> {
        Some(0)
    }

    fn parent_element(&self, element: usize) -> Option<usize> {
        self.nodes[element].parent
    }

    fn query_selector_all(&self, selector: &str) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&element| self.matches_selector(element, selector))
            .collect()
    }

    fn computed_value(&self, element: usize, property: &str) -> String {
        if let Some(value) = self.nodes[element].computed.get(property) {
            return value.clone();
        }
        match property {
            "display" => "block",
            "position" => "static",
            "float" | "transform" => "none",
            "font-size" => "16px",
            _ => "0px",
        }
        .to_string()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn offset_size(&self, element: usize, dimension: Dimension) -> f64 {
        let (width, height) = self.nodes[element].size;
        match dimension {
            Dimension::Width => width,
            Dimension::Height => height,
        }
    }

    fn set_class(&mut self, element: usize, class: &str, enabled: bool) -> bool {
        let classes = &mut self.nodes[element].classes;
        if enabled {
            classes.insert(class.to_string())
        } else {
            classes.remove(class)
        }
    }
}

impl SheetHost for ScriptedHost {
    fn sheet_sources(&self) -> Vec<SheetSource> {
        self.sheets
            .iter()
            .enumerate()
            .map(|(index, sheet)| SheetSource {
                index,
                disabled: sheet.disabled,
                owner: sheet.owner.clone(),
            })
            .collect()
    }

    fn replace_sheet(&mut self, index: usize, text: String) {
        self.sheets[index].disabled = true;
        self.sheets.insert(
            index + 1,
            Sheet {
                owner: SheetOwner::Inline { text: text.clone() },
                text,
                disabled: false,
            },
        );
    }
}

const MIN_300: &str = ":container(min-width:300px)";

// ========== container resolution ==========

#[test]
fn test_fixed_size_element_is_its_own_container() {
    let mut host = ScriptedHost::new();
    host.style(".box { width: 300px }");
    let body = host.add(0, "body", "", 1000.0);
    let boxed = host.add(body, "div", "box", 300.0);
    let child = host.add(boxed, "div", "child", 300.0);

    let mut pass = Pass::new(&host);
    assert_eq!(pass.container_for(&host, boxed, Dimension::Width), boxed);
    assert_eq!(pass.container_for(&host, child, Dimension::Width), boxed);
    assert_eq!(pass.container_for(&host, body, Dimension::Width), 0);
    assert_eq!(pass.container_for(&host, 0, Dimension::Width), 0);
}

#[test]
fn test_auto_chain_stops_below_intrinsic_ancestor() {
    let mut host = ScriptedHost::new();
    host.style(".pct { width: 50% }");
    let body = host.add(0, "body", "", 1000.0);
    let float = host.add(body, "div", "float", 400.0);
    host.set(float, "float", "left");
    let pct = host.add(float, "div", "pct", 200.0);
    let auto = host.add(pct, "div", "auto", 200.0);
    let auto2 = host.add(auto, "div", "auto2", 200.0);

    let mut pass = Pass::new(&host);
    assert_eq!(pass.container_for(&host, auto2, Dimension::Width), pct);
    assert_eq!(pass.container_for(&host, auto, Dimension::Width), pct);
    assert_eq!(pass.container_for(&host, float, Dimension::Width), 0);
    // Auto heights follow content, so each block is its own height container.
    assert_eq!(pass.container_for(&host, auto, Dimension::Height), auto);
    assert!(pass.cached() >= 5);
}

#[test]
fn test_inline_element_uses_parent_container() {
    let mut host = ScriptedHost::new();
    host.style(".box { width: 300px } span { width: 10px }");
    let boxed = host.add(0, "div", "box", 300.0);
    let span = host.add(boxed, "span", "", 10.0);
    host.set(span, "display", "inline");

    let mut pass = Pass::new(&host);
    assert_eq!(pass.container_for(&host, span, Dimension::Width), boxed);
}

#[test]
fn test_out_of_flow_elements_skip_to_their_containing_block() {
    let mut host = ScriptedHost::new();
    host.style(".rel { width: 500px } .wrap { width: 200px }");
    let rel = host.add(0, "div", "rel", 500.0);
    host.set(rel, "position", "relative");
    let wrap = host.add(rel, "div", "wrap", 200.0);
    let abs = host.add(wrap, "div", "abs", 100.0);
    host.set(abs, "position", "absolute");
    let fixed = host.add(wrap, "div", "fixed", 100.0);
    host.set(fixed, "position", "fixed");
    let flow = host.add(wrap, "div", "flow", 200.0);

    let mut pass = Pass::new(&host);
    assert_eq!(pass.container_for(&host, abs, Dimension::Width), rel);
    assert_eq!(pass.container_for(&host, fixed, Dimension::Width), 0);
    assert_eq!(pass.container_for(&host, flow, Dimension::Width), wrap);
}

#[test]
fn test_important_declaration_decides_fixedness() {
    let mut host = ScriptedHost::new();
    host.style(".box.wide { width: 300px } .box { width: 50% !important }");
    let boxed = host.add(0, "div", "box wide", 500.0);
    let child = host.add(boxed, "div", "", 500.0);

    let mut pass = Pass::new(&host);
    // 50% is not fixed, so the box defers to the root.
    assert_eq!(pass.container_for(&host, child, Dimension::Width), 0);
}

// ========== evaluation ==========

fn two_cards() -> (ScriptedHost, usize, usize, usize, usize) {
    let mut host = ScriptedHost::new();
    host.style(
        r".wide { width: 400px } .narrow { width: 200px } .card.\:container\(min-width\:300px\) { color: red }",
    );
    let wide = host.add(0, "div", "wide", 400.0);
    let narrow = host.add(0, "div", "narrow", 200.0);
    let wide_card = host.add(wide, "div", "card", 400.0);
    let narrow_card = host.add(narrow, "div", "card", 200.0);
    (host, wide, narrow, wide_card, narrow_card)
}

#[test]
fn test_content_size_subtracts_padding_and_border() {
    let (mut host, wide, ..) = two_cards();
    host.set(wide, "padding-left", "20px");
    host.set(wide, "padding-right", "20px");
    host.set(wide, "border-left-width", "5px");
    host.set(wide, "padding-top", "7px");
    assert!((content_size(&host, wide, Dimension::Width) - 355.0).abs() < f64::EPSILON);
    assert!((content_size(&host, wide, Dimension::Height) - 93.0).abs() < f64::EPSILON);
}

#[test]
fn test_evaluate_toggles_classes() {
    let (mut host, wide, _, wide_card, narrow_card) = two_cards();
    let registry = Registry::build(&host);
    assert_eq!(registry.len(), 1);
    let query = registry.iter().next().map(|q| q.selector.clone());
    assert_eq!(query.as_deref(), Some(".card"));

    let report = evaluate(&mut host, &registry);
    assert_eq!(report.queries, 1);
    assert_eq!(report.elements_checked, 2);
    assert_eq!(report.classes_added, 1);
    assert_eq!(report.classes_removed, 0);
    assert!(host.has_class(wide_card, MIN_300));
    assert!(!host.has_class(narrow_card, MIN_300));

    // Padding eats into the content box.
    host.set(wide, "padding-left", "60px");
    host.set(wide, "padding-right", "60px");
    let report = evaluate(&mut host, &registry);
    assert_eq!(report.classes_removed, 1);
    assert!(!host.has_class(wide_card, MIN_300));

    let report = evaluate(&mut host, &registry);
    assert!(!report.changed());
}

#[test]
fn test_font_relative_threshold_uses_parent_font() {
    let mut host = ScriptedHost::new();
    host.style(r".wide { width: 400px } .card.\:container\(min-width\:20em\) { color: red }");
    let wide = host.add(0, "div", "wide", 400.0);
    let card = host.add(wide, "div", "card", 400.0);
    let class = ":container(min-width:20em)";
    let registry = Registry::build(&host);

    host.set(wide, "font-size", "21px");
    let _ = evaluate(&mut host, &registry);
    assert!(!host.has_class(card, class));

    host.set(wide, "font-size", "16px");
    let _ = evaluate(&mut host, &registry);
    assert!(host.has_class(card, class));
}

#[test]
fn test_root_is_never_toggled() {
    let mut host = ScriptedHost::new();
    host.style(r"html.\:container\(min-width\:1px\), .x { color: red }");
    let registry = Registry::build(&host);
    let report = evaluate(&mut host, &registry);
    assert_eq!(report.elements_checked, 0);
    assert!(host.nodes[0].classes.is_empty());
}

// ========== pipeline ==========

fn fetch(url: &str) -> Result<String, FetchError> {
    match url {
        "https://cdn.test/a.css" => Ok(
            ".card:container(max-width: 250px) { background: url(img/x.png) }".to_string(),
        ),
        "https://cdn.test/plain.css" => Ok(".card { color: blue }".to_string()),
        _ => Err(FetchError::Status("404 Not Found".to_string())),
    }
}

fn pipeline_host() -> (ScriptedHost, usize, usize) {
    let mut host = ScriptedHost::new();
    host.style(".wide { width: 400px } .narrow { width: 200px }");
    host.style(".card:container(min-width: 300px) { color: red }");
    host.link("https://cdn.test/a.css");
    host.link("https://cdn.test/missing.css");
    host.link("https://cdn.test/plain.css");
    let wide = host.add(0, "div", "wide", 400.0);
    let narrow = host.add(0, "div", "narrow", 200.0);
    let wide_card = host.add(wide, "div", "card", 400.0);
    let narrow_card = host.add(narrow, "div", "card", 200.0);
    (host, wide_card, narrow_card)
}

#[test]
fn test_pipeline_runs_every_stage_from_reevaluate() {
    let (host, wide_card, narrow_card) = pipeline_host();
    let mut pipeline = Pipeline::new(host, fetch);
    let calls = Cell::new(0);

    let report = pipeline.reevaluate(Some(Box::new(|| calls.set(calls.get() + 1))));
    assert_eq!(calls.get(), 1);
    assert_eq!(pipeline.registry().len(), 2);
    assert_eq!(report.classes_added, 2);

    let host = pipeline.host();
    assert!(host.has_class(wide_card, MIN_300));
    assert!(host.has_class(narrow_card, ":container(max-width:250px)"));
    assert!(!host.has_class(narrow_card, MIN_300));
}

#[test]
fn test_preprocess_replaces_changed_sheets_in_place() {
    let (host, ..) = pipeline_host();
    let mut pipeline = Pipeline::new(host, fetch);
    let _ = pipeline.reprocess(None);

    let sheets = &pipeline.host().sheets;
    let disabled: Vec<bool> = sheets.iter().map(|s| s.disabled).collect();
    // Two sheets changed, each followed by its replacement.
    assert_eq!(disabled, vec![false, true, false, true, false, false, false]);
    assert!(sheets[2].text.contains(r".card.\:container\(min-width\:300px\)"));
    assert!(sheets[4].text.contains(r".card.\:container\(max-width\:250px\)"));
    assert!(sheets[4].text.contains("url(https://cdn.test/img/x.png)"));
    assert!(was_warned(
        "fetch",
        "failed to load 'https://cdn.test/missing.css': HTTP error: 404 Not Found"
    ));
}

#[test]
fn test_later_stages_do_not_rerun_preprocessing() {
    let (host, ..) = pipeline_host();
    let mut pipeline = Pipeline::new(host, fetch);
    let _ = pipeline.reparse(None);
    let sheet_count = pipeline.host().sheets.len();
    let registry = pipeline.registry().clone();

    let report = pipeline.reevaluate(None);
    assert!(!report.changed());
    let _ = pipeline.reparse(None);
    assert_eq!(pipeline.host().sheets.len(), sheet_count);
    assert_eq!(pipeline.registry(), &registry);

    let _ = pipeline.reprocess(None);
    // Rewritten sheets are not rewritten again.
    assert_eq!(pipeline.into_host().sheets.len(), sheet_count);
}
