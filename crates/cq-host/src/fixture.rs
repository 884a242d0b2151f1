//! JSON document fixtures.
//!
//! The reference host has no HTML parser; documents are described as JSON:
//!
//! ```json
//! {
//!   "viewport": { "width": 1024, "height": 768 },
//!   "baseUrl": "https://example.test/",
//!   "styleSheets": [
//!     { "text": ".card:container(min-width: 300px) { color: red }" },
//!     { "href": "theme.css" },
//!     { "href": "https://cdn.test/x.css", "crossOrigin": true }
//!   ],
//!   "root": {
//!     "tag": "html",
//!     "children": [
//!       { "tag": "body", "children": [
//!         { "tag": "div", "attributes": { "class": "card" },
//!           "children": [{ "text": "Hello" }] }
//!       ] }
//!     ]
//!   }
//! }
//! ```
//!
//! A sheet with both `href` and `text` is a linked sheet that has already
//! loaded.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cq_dom::{DomTree, ElementData, NodeId};
use serde::Deserialize;
use thiserror::Error;

use crate::document::Document;

/// Errors raised while loading a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture file could not be read.
    #[error("failed to read fixture '{path}': {source}")]
    Io {
        /// The fixture path.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// The fixture is not valid JSON or does not have the expected shape.
    #[error("invalid fixture: {0}")]
    Json(#[from] serde_json::Error),
    /// A stylesheet entry has neither `text` nor `href`.
    #[error("stylesheet {index} has neither 'text' nor 'href'")]
    EmptySheet {
        /// Position of the entry in `styleSheets`.
        index: usize,
    },
}

/// Top-level fixture object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Fixture {
    /// Initial viewport; the document default when absent.
    #[serde(default)]
    pub viewport: Option<ViewportSpec>,
    /// Document URL for resolving sheet hrefs.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Stylesheets in document order.
    #[serde(default)]
    pub style_sheets: Vec<SheetSpec>,
    /// The document element.
    pub root: NodeSpec,
}

/// Viewport size in CSS px.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewportSpec {
    /// Width in CSS px.
    pub width: f64,
    /// Height in CSS px.
    pub height: f64,
}

/// A `<style>` or `<link rel=stylesheet>`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SheetSpec {
    /// Sheet text.
    #[serde(default)]
    pub text: Option<String>,
    /// Sheet URL, relative to `baseUrl`.
    #[serde(default)]
    pub href: Option<String>,
    /// Whether the sheet's rules are hidden from the document.
    #[serde(default)]
    pub cross_origin: bool,
}

/// An element or a text node.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    /// A text node.
    Text {
        /// Text content.
        text: String,
    },
    /// An element.
    Element {
        /// Tag name.
        tag: String,
        /// Attributes, e.g. `class`, `id` and `style`.
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        /// Child nodes.
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
}

impl Fixture {
    /// Build the document this fixture describes.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::EmptySheet`] for a sheet entry with neither
    /// text nor href.
    pub fn into_document(self) -> Result<Document, FixtureError> {
        let mut tree = DomTree::new();
        append_node(&mut tree, NodeId::ROOT, &self.root);

        let mut document = Document::new(tree);
        document.set_base_url(self.base_url);
        if let Some(viewport) = self.viewport {
            document.set_viewport(viewport.width, viewport.height);
        }
        for (index, sheet) in self.style_sheets.iter().enumerate() {
            let added = match (&sheet.href, &sheet.text) {
                (Some(href), text) => document.link_style_sheet(href, text.as_deref()),
                (None, Some(text)) => document.add_style_sheet(text),
                (None, None) => return Err(FixtureError::EmptySheet { index }),
            };
            if sheet.cross_origin {
                document.mark_inaccessible(added);
            }
        }
        Ok(document)
    }
}

fn append_node(tree: &mut DomTree, parent: NodeId, node: &NodeSpec) {
    match node {
        NodeSpec::Text { text } => {
            let _ = tree.append_text(parent, text);
        }
        NodeSpec::Element {
            tag,
            attributes,
            children,
        } => {
            let mut data = ElementData::new(tag);
            for (name, value) in attributes {
                let _ = data.attrs.insert(name.to_ascii_lowercase(), value.clone());
            }
            let element = tree.append_element(parent, data);
            for child in children {
                append_node(tree, element, child);
            }
        }
    }
}

/// Parse a fixture from JSON text.
///
/// # Errors
///
/// Returns [`FixtureError::Json`] for malformed JSON and
/// [`FixtureError::EmptySheet`] for an empty sheet entry.
pub fn parse_fixture(json: &str) -> Result<Document, FixtureError> {
    serde_json::from_str::<Fixture>(json)?.into_document()
}

/// Read and parse a fixture file.
///
/// A fixture without `baseUrl` gets the fixture file's own `file://` URL,
/// so relative sheet links point next to it.
///
/// # Errors
///
/// Returns [`FixtureError::Io`] if the file cannot be read, otherwise as
/// [`parse_fixture`].
pub fn load_fixture(path: &Path) -> Result<Document, FixtureError> {
    let io_error = |source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    };
    let json = std::fs::read_to_string(path).map_err(io_error)?;
    let mut fixture: Fixture = serde_json::from_str(&json)?;
    if fixture.base_url.is_none() {
        let absolute = std::path::absolute(path).map_err(io_error)?;
        fixture.base_url = Some(format!("file://{}", absolute.display()));
    }
    fixture.into_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cq_core::{SheetHost, SheetOwner, StyleHost};

    #[test]
    fn test_fixture_builds_tree_and_sheets() {
        let document = parse_fixture(
            r#"{
                "viewport": { "width": 640, "height": 480 },
                "baseUrl": "https://example.test/pages/index.html",
                "styleSheets": [
                    { "text": ".a { width: 10px }" },
                    { "href": "../css/theme.css" },
                    { "href": "https://cdn.test/x.css", "text": ".b {}", "crossOrigin": true }
                ],
                "root": { "tag": "HTML", "children": [
                    { "tag": "body", "attributes": { "CLASS": "page" }, "children": [
                        { "text": "hi" }
                    ] }
                ] }
            }"#,
        )
        .unwrap();

        assert!((document.viewport().width - 640.0).abs() < f64::EPSILON);
        let root = document.root_element().unwrap();
        assert_eq!(document.tree().as_element(root).unwrap().tag_name, "html");
        let body = document.tree().element_children(root).next().unwrap();
        assert!(document.has_class(body, "page"));
        assert_eq!(document.tree().text_content(body), "hi");

        let sources = document.sheet_sources();
        assert_eq!(sources.len(), 3);
        assert_eq!(
            sources[1].owner,
            SheetOwner::Linked {
                href: "https://example.test/css/theme.css".to_string()
            }
        );
    }

    #[test]
    fn test_relative_links_follow_a_later_base_url() {
        let mut document = parse_fixture(
            r#"{ "styleSheets": [{ "href": "theme.css" }], "root": { "tag": "html" } }"#,
        )
        .unwrap();
        assert_eq!(
            document.sheet_sources()[0].owner,
            SheetOwner::Linked {
                href: "theme.css".to_string()
            }
        );

        document.set_base_url(Some("https://example.com/index.html".to_string()));
        assert_eq!(
            document.sheet_sources()[0].owner,
            SheetOwner::Linked {
                href: "https://example.com/theme.css".to_string()
            }
        );
    }

    #[test]
    fn test_empty_sheet_is_rejected() {
        let result = parse_fixture(r#"{ "styleSheets": [{}], "root": { "tag": "html" } }"#);
        assert!(matches!(result, Err(FixtureError::EmptySheet { index: 0 })));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = parse_fixture(r#"{ "root": { "tag": "html" }, "extra": 1 }"#);
        assert!(matches!(result, Err(FixtureError::Json(_))));
    }
}
