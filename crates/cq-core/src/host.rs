//! Host capabilities the engine is driven through.
//!
//! The engine never owns a document. Everything it knows about stylesheets,
//! elements and layout comes through these traits, so the same code runs
//! against the in-workspace reference host and against any other style
//! engine that can answer the same questions.
//!
//! # Layers
//!
//! - [`CascadeHost`]: the stylesheet rule tree plus selector and media
//!   oracles. Enough to approximate the cascade.
//! - [`StyleHost`]: tree navigation, computed values, layout sizes and class
//!   mutation on top of the cascade capability.
//! - [`SheetHost`]: stylesheet sources and replacement, for preprocessing.
//! - [`Fetcher`]: blocking text fetch for linked stylesheets.

use std::fmt::Debug;
use std::hash::Hash;

use cq_common::net::FetchError;
use thiserror::Error;

use crate::registry::Dimension;

/// Size of the viewport in CSS px.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in CSS px.
    pub width: f64,
    /// Height in CSS px.
    pub height: f64,
}

/// Why a stylesheet's rules could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetAccessError {
    /// The sheet came from another origin and its rules are hidden.
    #[error("rules of stylesheet '{href}' are not accessible")]
    CrossOrigin {
        /// Where the sheet was loaded from.
        href: String,
    },
    /// The sheet has not finished loading.
    #[error("stylesheet is still loading")]
    Loading,
}

/// One declaration of a [`DeclarationBlock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationEntry {
    /// Lowercased property name.
    pub name: String,
    /// Value as written, without `!important`.
    pub value: String,
    /// Whether the declaration carried `!important`.
    pub important: bool,
}

/// A CSSOM-style declaration block: at most one value per property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    entries: Vec<DeclarationEntry>,
}

impl DeclarationBlock {
    /// An empty block.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set a property. A later declaration replaces an earlier one unless
    /// only the earlier one is `!important`.
    pub fn set(&mut self, name: &str, value: &str, important: bool) {
        let name = name.to_ascii_lowercase();
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == name) {
            if existing.important && !important {
                return;
            }
            existing.value = value.to_string();
            existing.important = important;
        } else {
            self.entries.push(DeclarationEntry {
                name,
                value: value.to_string(),
                important,
            });
        }
    }

    /// The value set for `name`, if any.
    #[must_use]
    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|e| e.value.as_str())
    }

    /// `"important"` or `""`, like `CSSStyleDeclaration.getPropertyPriority`.
    #[must_use]
    pub fn priority(&self, name: &str) -> &'static str {
        if self.entry(name).is_some_and(|e| e.important) {
            "important"
        } else {
            ""
        }
    }

    /// Property names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Number of properties set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, name: &str) -> Option<&DeclarationEntry> {
        self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }
}

impl<'a> FromIterator<(&'a str, &'a str, bool)> for DeclarationBlock {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str, bool)>>(iter: I) -> Self {
        let mut block = Self::new();
        for (name, value, important) in iter {
            block.set(name, value, important);
        }
        block
    }
}

/// A style rule as seen through the host's object model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRuleView {
    /// Selector list as the host serializes it.
    pub selector_text: String,
    /// The rule's declarations.
    pub declarations: DeclarationBlock,
}

/// A rule of a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssRuleView {
    /// A style rule.
    Style(StyleRuleView),
    /// A grouping rule (`@media`, `@supports`, ...) with nested rules.
    Group {
        /// The media condition for `@media`, `None` for other groups.
        media: Option<String>,
        /// Nested rules.
        rules: Vec<CssRuleView>,
    },
}

/// A stylesheet as seen through the host's object model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheetView {
    /// Disabled sheets do not take part in the cascade.
    pub disabled: bool,
    /// Where the sheet was loaded from, for linked sheets.
    pub href: Option<String>,
    /// The rule list, or why it cannot be read.
    pub rules: Result<Vec<CssRuleView>, SheetAccessError>,
}

/// The narrow capability the cascade approximation needs.
pub trait CascadeHost {
    /// Element handle. Cheap to copy and usable as a map key.
    type Element: Copy + Eq + Hash + Debug;

    /// Every stylesheet of the document, in cascade order.
    fn style_sheets(&self) -> Vec<StyleSheetView>;

    /// Whether `element` matches a single selector. Unparseable selectors
    /// never match.
    fn matches_selector(&self, element: Self::Element, selector: &str) -> bool;

    /// The element's `style` attribute declarations.
    fn inline_style(&self, element: Self::Element) -> DeclarationBlock;

    /// Whether a media query list currently applies.
    fn media_applies(&self, condition: &str) -> bool;
}

/// Everything the container resolver and the evaluator need from a host.
pub trait StyleHost: CascadeHost {
    /// The document element.
    fn root_element(&self) -> Option<Self::Element>;

    /// The parent element, `None` for the root.
    fn parent_element(&self, element: Self::Element) -> Option<Self::Element>;

    /// Elements matching a selector, in tree order.
    fn query_selector_all(&self, selector: &str) -> Vec<Self::Element>;

    /// `getComputedStyle(element).getPropertyValue(property)`.
    fn computed_value(&self, element: Self::Element, property: &str) -> String;

    /// Current viewport size.
    fn viewport(&self) -> Viewport;

    /// `offsetWidth` or `offsetHeight` of the element.
    fn offset_size(&self, element: Self::Element, dimension: Dimension) -> f64;

    /// Add (`enabled`) or remove a class. Returns true if the class list
    /// changed.
    fn set_class(&mut self, element: Self::Element, class: &str, enabled: bool) -> bool;
}

/// Where a stylesheet's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOwner {
    /// A `<style>` element; the text is at hand.
    Inline {
        /// The element's text content.
        text: String,
    },
    /// A `<link rel=stylesheet>`; the text must be fetched.
    Linked {
        /// Absolute URL of the sheet.
        href: String,
    },
}

/// A stylesheet the preprocessor may rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSource {
    /// Position in the host's stylesheet list.
    pub index: usize,
    /// Disabled sheets are left alone.
    pub disabled: bool,
    /// Origin of the text.
    pub owner: SheetOwner,
}

/// Stylesheet enumeration and replacement.
pub trait SheetHost {
    /// Every stylesheet, in cascade order.
    fn sheet_sources(&self) -> Vec<SheetSource>;

    /// Disable the sheet at `index` and insert `text` as a new sheet in its
    /// place. Sheets after `index` shift by one.
    fn replace_sheet(&mut self, index: usize, text: String);

    /// Text fetched for the linked sheet at `index` that did not need
    /// rewriting. A host that loads linked sheets on its own can ignore it.
    fn sheet_loaded(&mut self, _index: usize, _text: String) {}
}

/// Blocking text fetch for linked stylesheets.
///
/// Called from several threads at once during preprocessing.
pub trait Fetcher: Sync {
    /// Fetch the body of `url` as text.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the resource cannot be loaded.
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&str) -> Result<String, FetchError> + Sync,
{
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_important_declaration_is_not_replaced_by_normal() {
        let block: DeclarationBlock = [
            ("Width", "10px", true),
            ("width", "20px", false),
            ("height", "1em", false),
            ("height", "2em", false),
        ]
        .into_iter()
        .collect();
        assert_eq!(block.get_value("width"), Some("10px"));
        assert_eq!(block.priority("width"), "important");
        assert_eq!(block.get_value("height"), Some("2em"));
        assert_eq!(block.priority("height"), "");
        assert_eq!(block.names().collect::<Vec<_>>(), vec!["width", "height"]);
    }

    #[test]
    fn test_closures_are_fetchers() {
        let fetcher = |url: &str| -> Result<String, FetchError> { Ok(format!("/* {url} */")) };
        assert_eq!(fetcher.fetch("a.css").as_deref(), Ok("/* a.css */"));
    }
}
