//! End-to-end tests: the engine driving the reference document.

use cq_common::net::FetchError;
use cq_common::warning::was_warned;
use cq_core::cascade::{RuleIndex, resolve_declared_values};
use cq_core::{
    Comparator, Dimension, Length, Pass, Pipeline, Registry, StyleHost, evaluate,
    rewrite_stylesheet, to_pixels,
};
use cq_dom::{DomTree, ElementData, NodeId};
use cq_host::{Document, SheetFetcher, load_fixture};

const MIN_300: &str = ":container(min-width:300px)";

/// Helper to append an element with a class attribute.
fn element(tree: &mut DomTree, parent: NodeId, tag: &str, class: &str) -> NodeId {
    let mut data = ElementData::new(tag);
    if !class.is_empty() {
        let _ = data.attrs.insert("class".to_string(), class.to_string());
    }
    tree.append_element(parent, data)
}

/// `<html><body>` and the body's id.
fn page() -> (DomTree, NodeId, NodeId) {
    let mut tree = DomTree::new();
    let html = element(&mut tree, NodeId::ROOT, "html", "");
    let body = element(&mut tree, html, "body", "");
    (tree, html, body)
}

fn never_fetch(url: &str) -> Result<String, FetchError> {
    Err(FetchError::UnsupportedScheme(url.to_string()))
}

// ========== end to end ==========

#[test]
fn test_card_query_end_to_end() {
    let (mut tree, _, body) = page();
    let wide = element(&mut tree, body, "div", "wide");
    let wide_card = element(&mut tree, wide, "div", "card");
    let narrow = element(&mut tree, body, "div", "narrow");
    let narrow_card = element(&mut tree, narrow, "div", "card");
    let mut document = Document::new(tree);
    let _ = document.add_style_sheet(
        ".wide { width: 400px } .narrow { width: 200px } \
         .card:container(min-width: 300px) { color: red }",
    );

    let mut pipeline = Pipeline::new(document, SheetFetcher);
    let report = pipeline.reevaluate(None);

    let queries: Vec<_> = pipeline.registry().iter().collect();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].selector, ".card");
    assert_eq!(queries[0].dimension, Dimension::Width);
    assert_eq!(queries[0].comparator, Comparator::Min);
    assert_eq!(queries[0].threshold.as_str(), "300px");
    assert_eq!(queries[0].class_name, MIN_300);

    assert_eq!(report.elements_checked, 2);
    assert_eq!(report.classes_added, 1);
    let document = pipeline.host();
    assert!(document.has_class(wide_card, MIN_300));
    assert!(!document.has_class(narrow_card, MIN_300));
}

#[test]
fn test_marker_class_styles_apply_through_host_cascade() {
    let (mut tree, _, body) = page();
    let wide = element(&mut tree, body, "div", "wide");
    let card = element(&mut tree, wide, "div", "card");
    let mut document = Document::new(tree);
    let _ = document.add_style_sheet(
        ".wide { width: 400px } .card:container(min-width: 300px) { padding-left: 12px }",
    );

    let mut pipeline = Pipeline::new(document, SheetFetcher);
    let _ = pipeline.reevaluate(None);
    assert_eq!(pipeline.host().computed_value(card, "padding-left"), "12px");
}

#[test]
fn test_resize_toggles_classes() {
    let (mut tree, _, body) = page();
    let column = element(&mut tree, body, "div", "col");
    let card = element(&mut tree, column, "div", "card");
    let mut document = Document::new(tree);
    document.set_viewport(1000.0, 600.0);
    let _ = document.add_style_sheet(
        ".col { width: 50% } .card:container(min-width: 300px) { color: red }",
    );

    let mut pipeline = Pipeline::new(document, SheetFetcher);
    let _ = pipeline.reevaluate(None);
    // Percentages follow the viewport, so the root is the container.
    assert!(pipeline.host().has_class(card, MIN_300));

    pipeline.host_mut().set_viewport(250.0, 600.0);
    let report = pipeline.reevaluate(None);
    assert_eq!(report.classes_removed, 1);
    assert!(!pipeline.host().has_class(card, MIN_300));
}

#[test]
fn test_height_query_against_fixed_height_parent() {
    let (mut tree, _, body) = page();
    let panel = element(&mut tree, body, "div", "panel");
    let item = element(&mut tree, panel, "div", "item");
    let mut document = Document::new(tree);
    let _ = document.add_style_sheet(
        ".panel { height: 120px; padding-top: 10px } \
         .item:container(min-height: 120px) { color: red } \
         .item:container(min-height: 121px) { color: blue }",
    );

    let mut pipeline = Pipeline::new(document, never_fetch);
    let _ = pipeline.reevaluate(None);
    let document = pipeline.host();
    // Padding is not part of the content box.
    assert!(document.has_class(item, ":container(min-height:120px)"));
    assert!(!document.has_class(item, ":container(min-height:121px)"));
}

// ========== container resolution on real layout ==========

#[test]
fn test_intrinsic_float_makes_percentage_child_the_container() {
    let (mut tree, html, body) = page();
    let float = element(&mut tree, body, "div", "float");
    let pct = element(&mut tree, float, "div", "pct");
    let auto = element(&mut tree, pct, "div", "auto");
    let card = element(&mut tree, auto, "div", "card");
    let _ = tree.append_text(card, "Hello world");
    let mut document = Document::new(tree);
    let _ = document.add_style_sheet(&rewrite_stylesheet(
        ".float { float: left } .pct { width: 50% } \
         .card:container(max-width: 100px) { color: red }",
    ));

    let mut pass = Pass::new(&document);
    assert_eq!(pass.container_for(&document, auto, Dimension::Width), pct);
    assert_eq!(pass.container_for(&document, float, Dimension::Width), html);

    // 11 characters of 8px shrink-wrap the float to 88px; half of it is 44px.
    let pct_width = document.offset_size(pct, Dimension::Width);
    assert!((pct_width - 44.0).abs() < 1e-9);

    let registry = Registry::build(&document);
    let _ = evaluate(&mut document, &registry);
    assert!(document.has_class(card, ":container(max-width:100px)"));
}

#[test]
fn test_fixed_width_parent_is_the_container() {
    let (mut tree, _, body) = page();
    let sidebar = element(&mut tree, body, "aside", "sidebar");
    let inner = element(&mut tree, sidebar, "div", "inner");
    let mut document = Document::new(tree);
    let _ = document.add_style_sheet(".sidebar { width: 20em }");

    let mut pass = Pass::new(&document);
    assert_eq!(pass.container_for(&document, inner, Dimension::Width), sidebar);
    assert_eq!(pass.container_for(&document, sidebar, Dimension::Width), sidebar);
}

// ========== cascade and lengths ==========

#[test]
fn test_important_lower_specificity_beats_normal() {
    let (mut tree, _, body) = page();
    let target = element(&mut tree, body, "div", "a");
    tree.set_attribute(target, "id", "x");
    let mut document = Document::new(tree);
    let _ = document.add_style_sheet(
        "div#x.a { width: 10px; height: 5px } div { width: 20% !important } \
         @media (max-width: 100px) { .a { height: 1px !important } }",
    );

    let index = RuleIndex::build(&document);
    let values = resolve_declared_values(&document, &index, target, &["width", "height"]);
    assert_eq!(values.get("width").map(String::as_str), Some("20%"));
    assert_eq!(values.get("height").map(String::as_str), Some("5px"));

    document.tree_mut().set_attribute(target, "style", "height: 3em");
    let index = RuleIndex::build(&document);
    let values = resolve_declared_values(&document, &index, target, &["height"]);
    assert_eq!(values.get("height").map(String::as_str), Some("3em"));
}

#[test]
fn test_unit_conversion_uses_root_font_and_viewport() {
    let (mut tree, html, body) = page();
    tree.set_attribute(html, "style", "font-size: 10px");
    let mut document = Document::new(tree);
    document.set_viewport(800.0, 600.0);
    let _ = document.add_style_sheet("body { font-size: 20px }");

    let px = |raw: &str| to_pixels(&document, &Length::new(raw), body);
    assert_eq!(px("2rem"), Some(20.0));
    assert_eq!(px("50vw"), Some(400.0));
    assert_eq!(px("1.5em"), Some(30.0));
    assert_eq!(px("10vmin"), Some(60.0));
    assert_eq!(px("auto"), None);
}

// ========== sheets ==========

#[test]
fn test_registry_is_deterministic() {
    let (tree, ..) = page();
    let mut document = Document::new(tree);
    let _ = document.add_style_sheet(
        ".b:container(max-width: 10em), .a:container(min-width: 1px) { color: red } \
         .a:container(min-width: 1px) { color: blue }",
    );

    let mut pipeline = Pipeline::new(document, never_fetch);
    let _ = pipeline.reparse(None);
    let first = pipeline.registry().clone();
    assert_eq!(first.len(), 2);
    let _ = pipeline.reparse(None);
    assert_eq!(pipeline.registry(), &first);
    let selectors: Vec<&str> = first.iter().map(|q| q.selector.as_str()).collect();
    assert_eq!(selectors, vec![".a", ".b"]);
}

#[test]
fn test_linked_sheets_are_fetched_rewritten_and_replaced_in_order() {
    let (mut tree, _, body) = page();
    let wide = element(&mut tree, body, "div", "wide");
    let card = element(&mut tree, wide, "div", "card");
    let mut document = Document::new(tree);
    document.set_base_url(Some("https://site.test/index.html".to_string()));
    let _ = document.add_style_sheet(".wide { width: 400px }");
    let _ = document.link_style_sheet("https://cdn.test/css/cards.css", None);
    let _ = document.link_style_sheet("missing.css", None);
    let _ = document.add_style_sheet(".card:container(max-width: 500px) { color: red }");

    let fetch = |url: &str| -> Result<String, FetchError> {
        if url == "https://cdn.test/css/cards.css" {
            Ok(".card:container(min-width: 300px) { background: url(../img/bg.png) }".to_string())
        } else {
            Err(FetchError::Status("404 Not Found".to_string()))
        }
    };
    let mut pipeline = Pipeline::new(document, fetch);
    let report = pipeline.reprocess(None);
    assert_eq!(report.classes_added, 2);

    let document = pipeline.host();
    assert_eq!(document.sheet_count(), 6);
    let disabled: Vec<bool> = (0..6).map(|i| document.is_sheet_disabled(i)).collect();
    assert_eq!(disabled, vec![false, true, false, false, true, false]);
    let fetched = document.sheet_text(2).unwrap_or_default();
    assert!(fetched.contains(r".card.\:container\(min-width\:300px\)"));
    assert!(fetched.contains("url(https://cdn.test/img/bg.png)"));
    assert!(
        document
            .sheet_text(5)
            .unwrap_or_default()
            .contains(r"\:container\(max-width\:500px\)")
    );
    assert!(was_warned(
        "fetch",
        "failed to load 'https://site.test/missing.css': HTTP error: 404 Not Found"
    ));
    assert!(document.has_class(card, MIN_300));
    assert!(document.has_class(card, ":container(max-width:500px)"));
}

#[test]
fn test_fetched_sheet_without_queries_is_installed() {
    let (mut tree, _, body) = page();
    let sized = element(&mut tree, body, "div", "box");
    let card = element(&mut tree, sized, "div", "card");
    let mut document = Document::new(tree);
    document.set_base_url(Some("https://site.test/".to_string()));
    let theme = document.link_style_sheet("theme.css", None);
    let _ = document.add_style_sheet(".card:container(max-width: 250px) { color: red }");

    let fetch = |url: &str| -> Result<String, FetchError> {
        assert_eq!(url, "https://site.test/theme.css");
        Ok(".box { width: 200px }".to_string())
    };
    let mut pipeline = Pipeline::new(document, fetch);
    let _ = pipeline.reprocess(None);

    let document = pipeline.host();
    // Only the inline sheet needed rewriting; the linked one stays in place.
    assert_eq!(document.sheet_count(), 3);
    assert!(!document.is_sheet_disabled(theme));
    assert!((document.offset_size(sized, Dimension::Width) - 200.0).abs() < 1e-9);
    assert!(document.has_class(card, ":container(max-width:250px)"));
}

#[test]
fn test_fixture_links_resolve_next_to_the_fixture_file() {
    let dir = std::env::temp_dir().join(format!("cq-fixture-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("theme.css"), ".box { width: 200px }").unwrap();
    std::fs::write(
        dir.join("page.json"),
        r#"{
            "styleSheets": [
                { "href": "theme.css" },
                { "text": ".card:container(max-width: 250px) { color: red }" }
            ],
            "root": { "tag": "html", "children": [
                { "tag": "body", "children": [
                    { "tag": "div", "attributes": { "class": "box" }, "children": [
                        { "tag": "div", "attributes": { "class": "card" } }
                    ] }
                ] }
            ] }
        }"#,
    )
    .unwrap();

    let document = load_fixture(&dir.join("page.json")).unwrap();
    let mut pipeline = Pipeline::new(document, SheetFetcher);
    let _ = pipeline.reprocess(None);
    let _ = std::fs::remove_dir_all(&dir);

    let document = pipeline.host();
    let cards = document.query_selector_all(".card");
    assert_eq!(cards.len(), 1);
    let sized = document.parent_element(cards[0]).unwrap();
    assert!((document.offset_size(sized, Dimension::Width) - 200.0).abs() < 1e-9);
    assert!(document.has_class(cards[0], ":container(max-width:250px)"));
}

#[test]
fn test_inaccessible_and_disabled_sheets_contribute_no_rules() {
    let (tree, ..) = page();
    let mut document = Document::new(tree);
    let hidden = document.link_style_sheet(
        "https://other.test/a.css",
        Some(r".a.\:container\(min-width\:1px\) { width: 1px }"),
    );
    document.mark_inaccessible(hidden);
    let disabled = document.add_style_sheet(r".b.\:container\(min-width\:1px\) { width: 1px }");
    document.set_sheet_disabled(disabled, true);
    let _ = document.add_style_sheet(r".c.\:container\(min-width\:1px\) { width: 1px }");

    let registry = Registry::build(&document);
    let selectors: Vec<&str> = registry.iter().map(|q| q.selector.as_str()).collect();
    assert_eq!(selectors, vec![".c"]);
    assert_eq!(RuleIndex::build(&document).len(), 1);
}
