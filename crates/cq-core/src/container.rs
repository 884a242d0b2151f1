//! Container resolution.
//!
//! The container of an element, for one axis, is the ancestor whose size
//! that element's size follows. Walking up from an element:
//!
//! - an element with a fixed declared size is its own container;
//! - an element inside an intrinsically sized ancestor (a float, an inline
//!   block, an `auto` height) cannot follow anything above that ancestor,
//!   so the element just inside it is the container;
//! - otherwise the container is inherited from the parent.
//!
//! Results are memoized per `(element, dimension)` for one [`Pass`].

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::cascade::{RuleIndex, declared_value};
use crate::host::{CascadeHost, StyleHost};
use crate::length::{is_fixed_length, is_percentage};
use crate::registry::Dimension;

/// Display values whose width follows the containing block when in flow.
///
/// [CSS Display § 2](https://www.w3.org/TR/css-display-3/#outer-role)
const BLOCK_LEVEL_DISPLAYS: &[&str] = &["block", "list-item", "flow-root", "flex", "grid"];

/// The state of one evaluation pass: the container cache and the rule
/// index used for declared-value lookups.
///
/// Dropped at the end of the pass; nothing survives into the next one.
#[derive(Debug)]
pub struct Pass<E> {
    cache: HashMap<(E, Dimension), E>,
    rules: RuleIndex,
}

impl<E: Copy + Eq + Hash + Debug> Pass<E> {
    /// Start a pass, flattening the host's rule tree once.
    #[must_use]
    pub fn new<H: CascadeHost<Element = E> + ?Sized>(host: &H) -> Self {
        Self {
            cache: HashMap::new(),
            rules: RuleIndex::build(host),
        }
    }

    /// The rule index of this pass.
    #[must_use]
    pub const fn rules(&self) -> &RuleIndex {
        &self.rules
    }

    /// Number of memoized resolutions.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// The container of `element` along `dimension`.
    pub fn container_for<H: StyleHost<Element = E> + ?Sized>(
        &mut self,
        host: &H,
        element: E,
        dimension: Dimension,
    ) -> E {
        if let Some(&container) = self.cache.get(&(element, dimension)) {
            return container;
        }
        let container = self.resolve(host, element, dimension);

        #[cfg(feature = "container-trace")]
        eprintln!("[CONTAINER] {element:?} {dimension} -> {container:?}");

        let _ = self.cache.insert((element, dimension), container);
        container
    }

    fn resolve<H: StyleHost<Element = E> + ?Sized>(
        &mut self,
        host: &H,
        element: E,
        dimension: Dimension,
    ) -> E {
        if host.root_element() == Some(element) {
            return element;
        }
        let Some(parent) = host.parent_element(element) else {
            // Detached subtree: its top element is its own root.
            return element;
        };

        if display(host, element) == "inline" {
            return self.container_for(host, parent, dimension);
        }

        if self
            .declared(host, element, dimension)
            .is_some_and(|value| is_fixed_length(&value))
        {
            return element;
        }

        let sizing_parent = containing_parent(host, element).unwrap_or(parent);
        let outer = self.container_for(host, sizing_parent, dimension);

        // The element, then its sizing ancestors up to (not including) the
        // parent's container. Inline boxes do not size anything.
        let mut chain = vec![element];
        let mut current = Some(sizing_parent);
        while let Some(node) = current
            && node != outer
        {
            if display(host, node) != "inline" {
                chain.push(node);
            }
            current = host.parent_element(node);
        }

        for i in (1..chain.len()).rev() {
            if self.is_intrinsic(host, chain[i], dimension) {
                return chain[i - 1];
            }
        }
        outer
    }

    /// Whether the size of `element` along `dimension` comes from its
    /// content rather than its containing block.
    fn is_intrinsic<H: StyleHost<Element = E> + ?Sized>(
        &self,
        host: &H,
        element: E,
        dimension: Dimension,
    ) -> bool {
        let display = display(host, element);
        match display.as_str() {
            "none" => return false,
            "inline" => return true,
            _ => {}
        }

        let float = host.computed_value(element, "float");
        let floating = !matches!(float.trim(), "" | "none");
        let position = host.computed_value(element, "position");
        let out_of_flow = matches!(position.trim(), "absolute" | "fixed");
        if dimension == Dimension::Width
            && !floating
            && !out_of_flow
            && BLOCK_LEVEL_DISPLAYS.contains(&display.as_str())
        {
            return false;
        }

        !self
            .declared(host, element, dimension)
            .is_some_and(|value| is_fixed_length(&value) || is_percentage(&value))
    }

    fn declared<H: CascadeHost<Element = E> + ?Sized>(
        &self,
        host: &H,
        element: E,
        dimension: Dimension,
    ) -> Option<String> {
        declared_value(host, &self.rules, element, dimension.as_ref())
    }
}

fn display<H: StyleHost + ?Sized>(host: &H, element: H::Element) -> String {
    host.computed_value(element, "display").trim().to_ascii_lowercase()
}

/// The ancestor an out-of-flow element is sized against: the nearest
/// positioned ancestor for `absolute`, the nearest transformed ancestor for
/// `fixed`. Either falls back to the root. `None` for in-flow elements.
///
/// [CSS Position § 2.1](https://www.w3.org/TR/css-position-3/#def-cb)
fn containing_parent<H: StyleHost + ?Sized>(host: &H, element: H::Element) -> Option<H::Element> {
    let position = host.computed_value(element, "position");
    let (property, initial) = match position.trim() {
        "absolute" => ("position", "static"),
        "fixed" => ("transform", "none"),
        _ => return None,
    };

    let mut current = host.parent_element(element);
    while let Some(ancestor) = current {
        let value = host.computed_value(ancestor, property);
        if !value.trim().is_empty() && value.trim() != initial {
            return Some(ancestor);
        }
        current = host.parent_element(ancestor);
    }
    host.root_element()
}
