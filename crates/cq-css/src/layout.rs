//! Approximate box layout.
//!
//! [CSS 2.1 § 10 Visual formatting model details](https://www.w3.org/TR/CSS21/visudet.html)
//!
//! The reference host needs offset sizes, not painted geometry, so this
//! layout only tracks box dimensions. Text is measured with a fixed average
//! glyph advance instead of real font metrics.
//!
//! # Model
//!
//! - Block-level boxes fill their containing block.
//! - Floats, absolutely positioned boxes, inline-blocks and flex items
//!   shrink to fit their content.
//! - Heights are the specified height or the sum of in-flow block children
//!   plus the line boxes of inline content.

use std::collections::HashMap;

use cq_dom::{DomTree, NodeId};
use serde::Serialize;

use crate::style::{BoxSizing, ComputedStyle, Display, Edges, Float, Position, SizeValue};

/// Average glyph advance as a fraction of the font size.
pub const AVERAGE_CHAR_WIDTH: f64 = 0.5;

/// `line-height: normal` as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// [CSS Box Model § 3](https://www.w3.org/TR/css-box-3/#box-model)
///
/// "Each box has a content area and optional surrounding padding, border,
/// and margin areas."
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutBox {
    /// Width of the content area.
    pub content_width: f64,
    /// Height of the content area.
    pub content_height: f64,
    /// Used padding.
    pub padding: Edges<f64>,
    /// Used border widths.
    pub border: Edges<f64>,
    /// Used margins (`auto` resolves to 0).
    pub margin: Edges<f64>,
}

impl LayoutBox {
    /// A box that generates nothing (`display: none`).
    pub const EMPTY: Self = Self {
        content_width: 0.0,
        content_height: 0.0,
        padding: Edges::uniform(0.0),
        border: Edges::uniform(0.0),
        margin: Edges::uniform(0.0),
    };

    /// [CSSOM View § 6 offsetWidth](https://drafts.csswg.org/cssom-view/#dom-htmlelement-offsetwidth)
    ///
    /// "the border edge width of the first CSS layout box"
    #[must_use]
    pub fn offset_width(&self) -> f64 {
        self.content_width
            + self.padding.left
            + self.padding.right
            + self.border.left
            + self.border.right
    }

    /// [CSSOM View § 6 offsetHeight](https://drafts.csswg.org/cssom-view/#dom-htmlelement-offsetheight)
    #[must_use]
    pub fn offset_height(&self) -> f64 {
        self.content_height
            + self.padding.top
            + self.padding.bottom
            + self.border.top
            + self.border.bottom
    }

    fn outer_width(&self) -> f64 {
        self.offset_width() + self.margin.left + self.margin.right
    }

    fn outer_height(&self) -> f64 {
        self.offset_height() + self.margin.top + self.margin.bottom
    }
}

/// Laid-out boxes of every element in a document.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    boxes: HashMap<NodeId, LayoutBox>,
}

impl Layout {
    /// Lay out the document element and its descendants in a viewport.
    #[must_use]
    pub fn compute(
        tree: &DomTree,
        styles: &HashMap<NodeId, ComputedStyle>,
        viewport_width: f64,
        viewport_height: f64,
    ) -> Self {
        let mut engine = LayoutEngine {
            tree,
            styles,
            viewport_width,
            viewport_height,
            boxes: HashMap::new(),
            fallback: ComputedStyle::default(),
        };
        if let Some(root) = tree.document_element() {
            let _ = engine.layout_element(
                root,
                Containing {
                    width: viewport_width,
                    height: Some(viewport_height),
                    positioned_width: viewport_width,
                    flex_item: false,
                },
            );
        }
        Self {
            boxes: engine.boxes,
        }
    }

    /// The box of `id`, if it is an element of the laid-out document.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&LayoutBox> {
        self.boxes.get(&id)
    }
}

/// What a child needs to know about where it is laid out.
#[derive(Debug, Clone, Copy)]
struct Containing {
    /// Content width of the containing block.
    width: f64,
    /// Content height of the containing block when it is definite.
    height: Option<f64>,
    /// Padding-box width of the nearest positioned ancestor.
    positioned_width: f64,
    /// The parent is a flex container.
    flex_item: bool,
}

struct LayoutEngine<'a> {
    tree: &'a DomTree,
    styles: &'a HashMap<NodeId, ComputedStyle>,
    viewport_width: f64,
    viewport_height: f64,
    boxes: HashMap<NodeId, LayoutBox>,
    fallback: ComputedStyle,
}

impl LayoutEngine<'_> {
    fn style(&self, id: NodeId) -> &ComputedStyle {
        self.styles.get(&id).unwrap_or(&self.fallback)
    }

    /// Lay out `id` and its subtree; returns the box that was stored.
    fn layout_element(&mut self, id: NodeId, containing: Containing) -> LayoutBox {
        let style = self.style(id).clone();
        if style.display == Display::None {
            self.hide_subtree(id);
            return LayoutBox::EMPTY;
        }

        // [CSS 2.1 § 10.1](https://www.w3.org/TR/CSS21/visudet.html#containing-block-details)
        let (cb_width, cb_height) = match style.position {
            Position::Fixed => (self.viewport_width, Some(self.viewport_height)),
            Position::Absolute => (containing.positioned_width, None),
            _ => (containing.width, containing.height),
        };

        let padding = style.padding.map(|p| p.resolve(Some(cb_width)).unwrap_or(0.0));
        let margin = style.margin.map(|m| m.resolve(Some(cb_width)).unwrap_or(0.0));
        let border = style.border_width;
        let extra_width = padding.left + padding.right + border.left + border.right;
        let extra_height = padding.top + padding.bottom + border.top + border.bottom;
        let available = (cb_width - margin.left - margin.right - extra_width).max(0.0);

        let is_inline = matches!(style.display, Display::Inline | Display::Contents);
        let content_width = if is_inline {
            // [§ 10.3.1](https://www.w3.org/TR/CSS21/visudet.html#inline-width)
            // "The 'width' property does not apply."
            self.max_content_width(id).min(available)
        } else {
            match style.width.resolve(Some(cb_width)) {
                Some(width) if style.box_sizing == BoxSizing::BorderBox => {
                    (width - extra_width).max(0.0)
                }
                Some(width) => width,
                None if shrinks_to_fit(&style, containing.flex_item) => {
                    self.max_content_width(id).min(available)
                }
                None => available,
            }
        };

        // [§ 10.5](https://www.w3.org/TR/CSS21/visudet.html#the-height-property)
        // Percentages resolve only against a definite containing block height.
        let specified_height = if is_inline {
            None
        } else {
            style
                .height
                .resolve(cb_height)
                .map(|h| match style.box_sizing {
                    BoxSizing::BorderBox => (h - extra_height).max(0.0),
                    BoxSizing::ContentBox => h,
                })
        };

        let positioned_width = if style.position == Position::Static {
            containing.positioned_width
        } else {
            content_width + padding.left + padding.right
        };
        let child_containing = Containing {
            width: content_width,
            height: specified_height,
            positioned_width,
            flex_item: matches!(style.display, Display::Flex | Display::InlineFlex),
        };

        let content_height = self.layout_children(id, &style, child_containing);
        let layout_box = LayoutBox {
            content_width,
            content_height: specified_height.unwrap_or(content_height),
            padding,
            border,
            margin,
        };
        let _ = self.boxes.insert(id, layout_box);
        layout_box
    }

    /// Lay out the children of `id`; returns the auto content height.
    fn layout_children(&mut self, id: NodeId, style: &ComputedStyle, containing: Containing) -> f64 {
        let establishes_bfc = establishes_block_formatting_context(style)
            || self.tree.document_element() == Some(id);
        let line_height = style.font_size * LINE_HEIGHT_FACTOR;

        let mut block_height = 0.0;
        let mut float_height: f64 = 0.0;
        let mut flex_height: f64 = 0.0;
        let mut inline_width = 0.0;
        let mut tallest_inline: f64 = 0.0;

        let tree = self.tree;
        for &child in tree.children(id) {
            if let Some(text) = tree.as_text(child) {
                inline_width += text_width(text, style.font_size);
                continue;
            }
            if tree.as_element(child).is_none() {
                continue;
            }
            let child_box = self.layout_element(child, containing);
            let child_style = self.style(child);
            if child_style.display == Display::None
                || child_style.position.is_absolutely_positioned()
            {
                continue;
            }
            if containing.flex_item {
                flex_height = flex_height.max(child_box.outer_height());
            } else if child_style.float != Float::None {
                float_height = float_height.max(child_box.outer_height());
            } else if child_style.display.is_block_level() {
                block_height += child_box.outer_height();
            } else {
                inline_width += child_box.outer_width();
                tallest_inline = tallest_inline.max(child_box.outer_height());
            }
        }

        // [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS21/visuren.html#inline-formatting)
        let inline_height = if inline_width > 0.0 {
            let lines = (inline_width / containing.width.max(1.0)).ceil();
            lines * line_height.max(tallest_inline)
        } else {
            0.0
        };

        // [§ 10.6.7](https://www.w3.org/TR/CSS21/visudet.html#root-height)
        // Floats only extend block formatting context roots.
        let mut height = block_height + inline_height + flex_height;
        if establishes_bfc {
            height = height.max(float_height);
        }
        height
    }

    /// [CSS Sizing § 5.1](https://www.w3.org/TR/css-sizing-3/#max-content)
    ///
    /// Content-box width of `id` if it never wrapped.
    fn max_content_width(&self, id: NodeId) -> f64 {
        let style = self.style(id);
        let mut inline_run = 0.0;
        let mut widest: f64 = 0.0;
        for &child in self.tree.children(id) {
            if let Some(text) = self.tree.as_text(child) {
                inline_run += text_width(text, style.font_size);
                continue;
            }
            if self.tree.as_element(child).is_none() {
                continue;
            }
            let child_style = self.style(child);
            if child_style.display == Display::None
                || child_style.position.is_absolutely_positioned()
            {
                continue;
            }
            let outer = self.max_content_outer_width(child, child_style);
            if child_style.display.is_block_level() && child_style.float == Float::None {
                widest = widest.max(outer);
            } else {
                inline_run += outer;
            }
        }
        widest.max(inline_run)
    }

    fn max_content_outer_width(&self, id: NodeId, style: &ComputedStyle) -> f64 {
        let px = |value: SizeValue| match value {
            SizeValue::Px(px) => px,
            SizeValue::Auto | SizeValue::Percent(_) => 0.0,
        };
        let padding = style.padding.map(px);
        let margin = style.margin.map(px);
        let border = style.border_width;
        let extra = padding.left + padding.right + border.left + border.right;
        let content = match style.width {
            SizeValue::Px(width) if style.box_sizing == BoxSizing::BorderBox => {
                (width - extra).max(0.0)
            }
            SizeValue::Px(width) => width,
            SizeValue::Auto | SizeValue::Percent(_) => self.max_content_width(id),
        };
        content + extra + margin.left + margin.right
    }

    fn hide_subtree(&mut self, id: NodeId) {
        let _ = self.boxes.insert(id, LayoutBox::EMPTY);
        for descendant in self.tree.descendants(id) {
            if self.tree.as_element(descendant).is_some() {
                let _ = self.boxes.insert(descendant, LayoutBox::EMPTY);
            }
        }
    }
}

/// [§ 10.3.5 - 10.3.9](https://www.w3.org/TR/CSS21/visudet.html#float-width)
///
/// "If 'width' is computed as 'auto', the used value is the 'shrink-to-fit'
/// width."
fn shrinks_to_fit(style: &ComputedStyle, flex_item: bool) -> bool {
    flex_item
        || style.float != Float::None
        || style.position.is_absolutely_positioned()
        || matches!(
            style.display,
            Display::InlineBlock
                | Display::InlineFlex
                | Display::InlineGrid
                | Display::Table
                | Display::TableCell
        )
}

/// [§ 9.4.1](https://www.w3.org/TR/CSS21/visuren.html#block-formatting)
///
/// "Floats, absolutely positioned elements, block containers (such as
/// inline-blocks, table-cells, and table-captions) that are not block boxes,
/// and block boxes with 'overflow' other than 'visible' ... establish new
/// block formatting contexts for their contents."
fn establishes_block_formatting_context(style: &ComputedStyle) -> bool {
    style.float != Float::None
        || style.position.is_absolutely_positioned()
        || matches!(
            style.display,
            Display::InlineBlock
                | Display::TableCell
                | Display::FlowRoot
                | Display::Flex
                | Display::InlineFlex
                | Display::Grid
                | Display::InlineGrid
        )
        || style
            .other
            .get("overflow")
            .is_some_and(|o| !o.eq_ignore_ascii_case("visible"))
}

/// Width of a text run with collapsed white space.
fn text_width(text: &str, font_size: f64) -> f64 {
    let collapsed = text.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
    let chars = u32::try_from(collapsed.chars().count()).unwrap_or(u32::MAX);
    f64::from(chars) * AVERAGE_CHAR_WIDTH * font_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::compute_styles;
    use crate::media::MediaContext;
    use crate::parser::parse_stylesheet;
    use cq_dom::ElementData;

    struct Doc {
        tree: DomTree,
        body: NodeId,
    }

    fn doc() -> Doc {
        let mut tree = DomTree::new();
        let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
        let body = tree.append_element(html, ElementData::new("body"));
        Doc { tree, body }
    }

    fn div(tree: &mut DomTree, parent: NodeId, class: &str) -> NodeId {
        let mut data = ElementData::new("div");
        let _ = data.attrs.insert("class".to_string(), class.to_string());
        tree.append_element(parent, data)
    }

    fn layout(tree: &DomTree, css: &str) -> Layout {
        let sheet = parse_stylesheet(css);
        let styles = compute_styles(tree, &[&sheet], &MediaContext::screen(800.0, 600.0));
        Layout::compute(tree, &styles, 800.0, 600.0)
    }

    #[test]
    fn test_block_fills_body() {
        let mut d = doc();
        let a = div(&mut d.tree, d.body, "a");
        let layout = layout(&d.tree, ".a { padding: 10px; border: 2px solid }");
        let b = layout.get(a).copied().unwrap_or(LayoutBox::EMPTY);
        // 800 - 2 * 8px body margin
        assert!((b.offset_width() - 784.0).abs() < 1e-9);
        assert!((b.content_width - 760.0).abs() < 1e-9);
    }

    #[test]
    fn test_float_shrinks_to_content() {
        let mut d = doc();
        let float = div(&mut d.tree, d.body, "f");
        let inner = div(&mut d.tree, float, "inner");
        let layout = layout(&d.tree, ".f { float: left } .inner { width: 120px }");
        assert!((layout.get(float).map_or(0.0, LayoutBox::offset_width) - 120.0).abs() < 1e-9);
        assert!((layout.get(inner).map_or(0.0, LayoutBox::offset_width) - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_border_box_and_percentage() {
        let mut d = doc();
        let outer = div(&mut d.tree, d.body, "outer");
        let inner = div(&mut d.tree, outer, "inner");
        let layout = layout(
            &d.tree,
            ".outer { width: 400px } .inner { width: 50%; padding: 0 10px; box-sizing: border-box }",
        );
        let b = layout.get(inner).copied().unwrap_or(LayoutBox::EMPTY);
        assert!((b.offset_width() - 200.0).abs() < 1e-9);
        assert!((b.content_width - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_auto_height_sums_children() {
        let mut d = doc();
        let outer = div(&mut d.tree, d.body, "outer");
        let _ = div(&mut d.tree, outer, "child");
        let _ = div(&mut d.tree, outer, "child");
        let layout = layout(&d.tree, ".child { height: 30px; margin: 5px 0 }");
        assert!((layout.get(outer).map_or(0.0, LayoutBox::offset_height) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_none_is_empty() {
        let mut d = doc();
        let hidden = div(&mut d.tree, d.body, "hidden");
        let child = div(&mut d.tree, hidden, "child");
        let layout = layout(&d.tree, ".hidden { display: none } .child { width: 50px }");
        assert_eq!(layout.get(child), Some(&LayoutBox::EMPTY));
    }

    #[test]
    fn test_text_wraps_into_lines() {
        let mut d = doc();
        let p = div(&mut d.tree, d.body, "p");
        // 20 chars * 8px = 160px of text in a 100px box: two lines.
        let _ = d.tree.append_text(p, "aaaaaaaaaaaaaaaaaaaa");
        let layout = layout(&d.tree, ".p { width: 100px }");
        let height = layout.get(p).map_or(0.0, LayoutBox::offset_height);
        assert!((height - 2.0 * 16.0 * LINE_HEIGHT_FACTOR).abs() < 1e-9);
    }
}
