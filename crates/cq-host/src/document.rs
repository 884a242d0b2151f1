//! A document the container-query engine can drive.
//!
//! [`Document`] owns a DOM tree and its stylesheets and answers every engine
//! question from them: the CSSOM-like rule tree, selector matching, media
//! conditions, computed values from [`cq_css::compute_styles`] and offset
//! sizes from [`cq_css::Layout`]. Styles and layout are computed lazily and
//! dropped whenever the tree, a sheet or the viewport changes.

use std::cell::OnceCell;
use std::collections::HashMap;

use cq_common::url::resolve_url;
use cq_common::warning::warn_once;
use cq_core::{
    CascadeHost, CssRuleView, DeclarationBlock, Dimension, SheetAccessError, SheetHost,
    SheetOwner, SheetSource, StyleHost, StyleRuleView, StyleSheetView, Viewport,
};
use cq_css::parser::GroupRule;
use cq_css::style::{Edges, format_px};
use cq_css::{
    ComputedStyle, Layout, LayoutBox, MediaContext, ParsedSelector, Rule, Stylesheet,
    compute_styles, parse_declaration_list, parse_selector, parse_selector_list, parse_stylesheet,
};
use cq_dom::{DomTree, NodeId};

/// Viewport of a new document.
pub const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1024.0,
    height: 768.0,
};

/// A stylesheet attached to the document.
#[derive(Debug, Clone)]
struct SheetEntry {
    owner: SheetOwner,
    disabled: bool,
    rules: Result<Stylesheet, SheetAccessError>,
}


/// A DOM tree with stylesheets, a viewport and lazily computed layout.
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
    sheets: Vec<SheetEntry>,
    viewport: Viewport,
    base_url: Option<String>,
    styles: OnceCell<HashMap<NodeId, ComputedStyle>>,
    layout: OnceCell<Layout>,
}

impl Document {
    /// Wrap a tree. The document has no stylesheets and the
    /// [`DEFAULT_VIEWPORT`].
    #[must_use]
    pub fn new(tree: DomTree) -> Self {
        Self {
            tree,
            sheets: Vec::new(),
            viewport: DEFAULT_VIEWPORT,
            base_url: None,
            styles: OnceCell::new(),
            layout: OnceCell::new(),
        }
    }

    /// The DOM tree.
    #[must_use]
    pub const fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// The DOM tree, for mutation. Styles and layout are recomputed on the
    /// next query.
    pub fn tree_mut(&mut self) -> &mut DomTree {
        self.invalidate();
        &mut self.tree
    }

    /// URL that relative sheet hrefs are resolved against.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Set the document URL. Linked sheets keep their href as written and
    /// are resolved against the current base URL whenever they are listed.
    pub fn set_base_url(&mut self, url: Option<String>) {
        self.base_url = url;
    }

    /// Resize the viewport, e.g. before reevaluating on a window resize.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Viewport { width, height };
        self.invalidate();
    }

    /// Append a `<style>` sheet. Returns its index.
    pub fn add_style_sheet(&mut self, text: &str) -> usize {
        self.push_sheet(SheetEntry {
            owner: SheetOwner::Inline {
                text: text.to_string(),
            },
            disabled: false,
            rules: Ok(parse_stylesheet(text)),
        })
    }

    /// Append a `<link rel=stylesheet>`. With `loaded` the sheet's rules
    /// are readable right away; without, they stay unavailable until its
    /// text is loaded or the sheet is replaced.
    pub fn link_style_sheet(&mut self, href: &str, loaded: Option<&str>) -> usize {
        self.push_sheet(SheetEntry {
            owner: SheetOwner::Linked {
                href: href.to_string(),
            },
            disabled: false,
            rules: loaded
                .map(parse_stylesheet)
                .ok_or(SheetAccessError::Loading),
        })
    }

    /// Hide the rules of a linked sheet, as for a cross-origin sheet.
    pub fn mark_inaccessible(&mut self, index: usize) {
        let href = self
            .sheets
            .get(index)
            .and_then(|sheet| self.resolved_href(sheet))
            .unwrap_or_default();
        if let Some(sheet) = self.sheets.get_mut(index) {
            sheet.rules = Err(SheetAccessError::CrossOrigin { href });
            self.invalidate();
        }
    }

    /// Enable or disable a sheet.
    pub fn set_sheet_disabled(&mut self, index: usize, disabled: bool) {
        if let Some(sheet) = self.sheets.get_mut(index) {
            sheet.disabled = disabled;
            self.invalidate();
        }
    }

    /// Number of sheets, disabled ones included.
    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Whether the sheet at `index` is disabled.
    #[must_use]
    pub fn is_sheet_disabled(&self, index: usize) -> bool {
        self.sheets.get(index).is_some_and(|sheet| sheet.disabled)
    }

    /// The text of an inline sheet (replacements are inline sheets).
    #[must_use]
    pub fn sheet_text(&self, index: usize) -> Option<&str> {
        match &self.sheets.get(index)?.owner {
            SheetOwner::Inline { text } => Some(text),
            SheetOwner::Linked { .. } => None,
        }
    }

    /// Whether `element` has `class`.
    #[must_use]
    pub fn has_class(&self, element: NodeId, class: &str) -> bool {
        self.tree
            .as_element(element)
            .is_some_and(|data| data.has_class(class))
    }

    /// The laid-out box of `element`.
    #[must_use]
    pub fn layout_box(&self, element: NodeId) -> Option<LayoutBox> {
        self.layout().get(element).copied()
    }

    /// The absolute URL of a linked sheet.
    fn resolved_href(&self, sheet: &SheetEntry) -> Option<String> {
        match &sheet.owner {
            SheetOwner::Linked { href } => Some(resolve_url(href, self.base_url.as_deref())),
            SheetOwner::Inline { .. } => None,
        }
    }

    fn push_sheet(&mut self, sheet: SheetEntry) -> usize {
        self.sheets.push(sheet);
        self.invalidate();
        self.sheets.len() - 1
    }

    fn invalidate(&mut self) {
        self.styles = OnceCell::new();
        self.layout = OnceCell::new();
    }

    fn media(&self) -> MediaContext {
        MediaContext::screen(self.viewport.width, self.viewport.height)
    }

    fn styles(&self) -> &HashMap<NodeId, ComputedStyle> {
        self.styles.get_or_init(|| {
            let sheets: Vec<&Stylesheet> = self
                .sheets
                .iter()
                .filter(|sheet| !sheet.disabled)
                .filter_map(|sheet| sheet.rules.as_ref().ok())
                .collect();
            compute_styles(&self.tree, &sheets, &self.media())
        })
    }

    fn layout(&self) -> &Layout {
        self.layout.get_or_init(|| {
            Layout::compute(
                &self.tree,
                self.styles(),
                self.viewport.width,
                self.viewport.height,
            )
        })
    }

    fn parse_selector_logged(selector: &str) -> Option<ParsedSelector> {
        let parsed = parse_selector(selector);
        if parsed.is_none() {
            warn_once("css", &format!("failed to parse selector '{selector}'"));
        }
        parsed
    }
}

fn edge(edges: &Edges<f64>, side: &str) -> f64 {
    match side {
        "top" => edges.top,
        "right" => edges.right,
        "bottom" => edges.bottom,
        _ => edges.left,
    }
}

fn rule_views(rules: &[Rule]) -> Vec<CssRuleView> {
    rules
        .iter()
        .filter_map(|rule| match rule {
            Rule::Style(style) => Some(CssRuleView::Style(StyleRuleView {
                selector_text: style.selector_text.clone(),
                declarations: style
                    .declarations
                    .iter()
                    .map(|d| (d.name.as_str(), d.value.as_str(), d.important))
                    .collect(),
            })),
            Rule::Group(GroupRule {
                name,
                prelude,
                rules,
            }) => Some(CssRuleView::Group {
                media: (name == "media").then(|| prelude.clone()),
                rules: rule_views(rules),
            }),
            Rule::At(_) => None,
        })
        .collect()
}

impl CascadeHost for Document {
    type Element = NodeId;

    fn style_sheets(&self) -> Vec<StyleSheetView> {
        self.sheets
            .iter()
            .map(|sheet| StyleSheetView {
                disabled: sheet.disabled,
                href: self.resolved_href(sheet),
                rules: sheet
                    .rules
                    .as_ref()
                    .map(|stylesheet| rule_views(&stylesheet.rules))
                    .map_err(Clone::clone),
            })
            .collect()
    }

    fn matches_selector(&self, element: NodeId, selector: &str) -> bool {
        Self::parse_selector_logged(selector)
            .is_some_and(|parsed| parsed.matches_in_tree(&self.tree, element))
    }

    fn inline_style(&self, element: NodeId) -> DeclarationBlock {
        self.tree
            .as_element(element)
            .and_then(|data| data.attrs.get("style"))
            .map(|style| {
                parse_declaration_list(style)
                    .iter()
                    .map(|d| (d.name.as_str(), d.value.as_str(), d.important))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn media_applies(&self, condition: &str) -> bool {
        self.media().evaluate_list(condition)
    }
}

impl StyleHost for Document {
    fn root_element(&self) -> Option<NodeId> {
        self.tree.document_element()
    }

    fn parent_element(&self, element: NodeId) -> Option<NodeId> {
        self.tree.parent_element(element)
    }

    fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        let Some(list) = parse_selector_list(selector) else {
            warn_once("css", &format!("failed to parse selector '{selector}'"));
            return Vec::new();
        };
        self.tree
            .elements()
            .into_iter()
            .filter(|&element| list.iter().any(|s| s.matches_in_tree(&self.tree, element)))
            .collect()
    }

    /// Box-model values come from the layout, everything else from the
    /// computed style.
    fn computed_value(&self, element: NodeId, property: &str) -> String {
        let Some(style) = self.styles().get(&element) else {
            return String::new();
        };
        let layout_box = self.layout().get(element);
        match property {
            "width" => format_px(layout_box.map_or(0.0, |b| b.content_width)),
            "height" => format_px(layout_box.map_or(0.0, |b| b.content_height)),
            _ => {
                if let Some(side) = property.strip_prefix("padding-") {
                    format_px(layout_box.map_or(0.0, |b| edge(&b.padding, side)))
                } else if let Some(side) = property.strip_prefix("margin-") {
                    format_px(layout_box.map_or(0.0, |b| edge(&b.margin, side)))
                } else {
                    style.property_value(property)
                }
            }
        }
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn offset_size(&self, element: NodeId, dimension: Dimension) -> f64 {
        self.layout().get(element).map_or(0.0, |b| match dimension {
            Dimension::Width => b.offset_width(),
            Dimension::Height => b.offset_height(),
        })
    }

    fn set_class(&mut self, element: NodeId, class: &str, enabled: bool) -> bool {
        let changed = if enabled {
            self.tree.add_class(element, class)
        } else {
            self.tree.remove_class(element, class)
        };
        if changed {
            self.invalidate();
        }
        changed
    }
}

impl SheetHost for Document {
    fn sheet_sources(&self) -> Vec<SheetSource> {
        self.sheets
            .iter()
            .enumerate()
            .map(|(index, sheet)| SheetSource {
                index,
                disabled: sheet.disabled,
                owner: match self.resolved_href(sheet) {
                    Some(href) => SheetOwner::Linked { href },
                    None => sheet.owner.clone(),
                },
            })
            .collect()
    }

    /// The original is disabled and the replacement goes right after it,
    /// so it keeps the original's place in the cascade.
    fn replace_sheet(&mut self, index: usize, text: String) {
        if index >= self.sheets.len() {
            return;
        }
        self.sheets[index].disabled = true;
        let rules = Ok(parse_stylesheet(&text));
        self.sheets.insert(
            index + 1,
            SheetEntry {
                owner: SheetOwner::Inline { text },
                disabled: false,
                rules,
            },
        );
        self.invalidate();
    }

    /// A linked sheet still waiting for its text gets its rules. Sheets
    /// that are readable or hidden keep what they have.
    fn sheet_loaded(&mut self, index: usize, text: String) {
        let Some(sheet) = self.sheets.get_mut(index) else {
            return;
        };
        if matches!(sheet.rules, Err(SheetAccessError::Loading)) {
            sheet.rules = Ok(parse_stylesheet(&text));
            self.invalidate();
        }
    }
}
