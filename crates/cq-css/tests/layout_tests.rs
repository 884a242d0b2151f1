//! Integration tests for the cascade feeding layout.

use cq_css::{Layout, LayoutBox, MediaContext, compute_styles, parse_stylesheet};
use cq_dom::{DomTree, ElementData, NodeId};

struct Page {
    tree: DomTree,
    body: NodeId,
}

impl Page {
    fn new() -> Self {
        let mut tree = DomTree::new();
        let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
        let body = tree.append_element(html, ElementData::new("body"));
        Self { tree, body }
    }

    fn add(&mut self, parent: NodeId, tag: &str, class: &str) -> NodeId {
        let mut data = ElementData::new(tag);
        let _ = data.attrs.insert("class".to_string(), class.to_string());
        self.tree.append_element(parent, data)
    }

    fn layout(&self, css: &str, width: f64) -> Layout {
        let sheet = parse_stylesheet(css);
        let styles = compute_styles(&self.tree, &[&sheet], &MediaContext::screen(width, 600.0));
        Layout::compute(&self.tree, &styles, width, 600.0)
    }
}

fn offset_width(layout: &Layout, id: NodeId) -> f64 {
    layout.get(id).map_or(f64::NAN, LayoutBox::offset_width)
}

#[test]
fn test_percentage_inside_shrink_to_fit_float() {
    let mut page = Page::new();
    let float = page.add(page.body, "div", "float");
    let pct = page.add(float, "div", "pct");
    let fixed = page.add(pct, "div", "fixed");
    let layout = page.layout(
        ".float { float: left } .pct { width: 50% } .fixed { width: 300px }",
        1000.0,
    );
    assert!((offset_width(&layout, float) - 300.0).abs() < 1e-9);
    assert!((offset_width(&layout, pct) - 150.0).abs() < 1e-9);
    assert!((offset_width(&layout, fixed) - 300.0).abs() < 1e-9);
}

#[test]
fn test_absolute_uses_positioned_ancestor() {
    let mut page = Page::new();
    let relative = page.add(page.body, "div", "rel");
    let wrapper = page.add(relative, "div", "wrap");
    let abs = page.add(wrapper, "div", "abs");
    let layout = page.layout(
        ".rel { position: relative; width: 400px; padding: 0 50px } \
         .wrap { width: 100px } \
         .abs { position: absolute; width: 50% }",
        1000.0,
    );
    // Padding box of .rel is 500px wide.
    assert!((offset_width(&layout, abs) - 250.0).abs() < 1e-9);
}

#[test]
fn test_fixed_uses_viewport() {
    let mut page = Page::new();
    let narrow = page.add(page.body, "div", "narrow");
    let fixed = page.add(narrow, "div", "fixed");
    let layout = page.layout(".narrow { width: 100px } .fixed { position: fixed; width: 25% }", 800.0);
    assert!((offset_width(&layout, fixed) - 200.0).abs() < 1e-9);
}

#[test]
fn test_viewport_units_follow_viewport() {
    let mut page = Page::new();
    let half = page.add(page.body, "div", "half");
    let css = ".half { width: 50vw }";
    assert!((offset_width(&page.layout(css, 800.0), half) - 400.0).abs() < 1e-9);
    assert!((offset_width(&page.layout(css, 1200.0), half) - 600.0).abs() < 1e-9);
}

#[test]
fn test_rem_uses_root_font_size() {
    let mut page = Page::new();
    let box_ = page.add(page.body, "div", "box");
    let layout = page.layout("html { font-size: 10px } .box { width: 2rem; font-size: 30px }", 800.0);
    assert!((offset_width(&layout, box_) - 20.0).abs() < 1e-9);
}

#[test]
fn test_important_beats_inline_style() {
    let mut page = Page::new();
    let target = page.add(page.body, "div", "target");
    page.tree.set_attribute(target, "style", "width: 10px");
    let layout = page.layout(".target { width: 40px !important }", 800.0);
    assert!((offset_width(&layout, target) - 40.0).abs() < 1e-9);
}

#[test]
fn test_inline_block_shrinks_around_text() {
    let mut page = Page::new();
    let chip = page.add(page.body, "span", "chip");
    let _ = page.tree.append_text(chip, "  ten chars  ");
    let layout = page.layout(".chip { display: inline-block; padding: 0 4px }", 800.0);
    // "ten chars" is 9 glyphs at 8px each.
    assert!((offset_width(&layout, chip) - 80.0).abs() < 1e-9);
}
