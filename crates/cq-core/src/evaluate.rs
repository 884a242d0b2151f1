//! Query evaluation and class toggling.
//!
//! For every registered query, every element matching its selector gets
//! the query's marker class exactly when the element's container (the
//! container of its parent) has a content-box size on the query's axis
//! that satisfies the comparison.

use serde::Serialize;

use crate::container::Pass;
use crate::host::StyleHost;
use crate::length::{parse_px, to_pixels};
use crate::registry::{ContainerQuery, Dimension, Registry};

/// Counters of one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationReport {
    /// Queries evaluated.
    pub queries: usize,
    /// Element/query pairs checked.
    pub elements_checked: usize,
    /// Classes that were added.
    pub classes_added: usize,
    /// Classes that were removed.
    pub classes_removed: usize,
}

impl EvaluationReport {
    /// True if the pass changed any class list.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.classes_added + self.classes_removed > 0
    }
}

/// Run one evaluation pass over `registry`.
///
/// Queries run in registry order. A query's classes are applied before the
/// next query is evaluated, so a query whose selector mentions another
/// query's marker class sees the updated class lists.
pub fn evaluate<H: StyleHost + ?Sized>(host: &mut H, registry: &Registry) -> EvaluationReport {
    let mut pass = Pass::new(&*host);
    let root = host.root_element();
    let mut report = EvaluationReport {
        queries: registry.len(),
        ..EvaluationReport::default()
    };

    for query in registry.iter() {
        let decisions: Vec<(H::Element, bool)> = host
            .query_selector_all(&query.selector)
            .into_iter()
            .filter(|&element| Some(element) != root)
            .filter_map(|element| {
                let parent = host.parent_element(element)?;
                Some((element, query_applies(&*host, &mut pass, query, parent)))
            })
            .collect();

        for (element, applies) in decisions {
            report.elements_checked += 1;
            if host.set_class(element, &query.class_name, applies) {
                if applies {
                    report.classes_added += 1;
                } else {
                    report.classes_removed += 1;
                }
            }
        }
    }
    report
}

/// Whether `query` holds for the children of `parent`.
fn query_applies<H: StyleHost + ?Sized>(
    host: &H,
    pass: &mut Pass<H::Element>,
    query: &ContainerQuery,
    parent: H::Element,
) -> bool {
    let container = pass.container_for(host, parent, query.dimension);
    let size = content_size(host, container, query.dimension);
    // A threshold without a number never applies.
    to_pixels(host, &query.threshold, parent)
        .is_some_and(|threshold| query.comparator.applies(size, threshold))
}

/// The content-box size of `element` along `dimension`: the offset size
/// minus borders and padding on that axis.
///
/// [CSSOM View § 6](https://www.w3.org/TR/cssom-view-1/#dom-htmlelement-offsetwidth)
#[must_use]
pub fn content_size<H: StyleHost + ?Sized>(
    host: &H,
    element: H::Element,
    dimension: Dimension,
) -> f64 {
    let px = |property: String| parse_px(&host.computed_value(element, &property)).unwrap_or(0.0);
    dimension
        .edges()
        .into_iter()
        .fold(host.offset_size(element, dimension), |size, edge| {
            size - px(format!("border-{edge}-width")) - px(format!("padding-{edge}"))
        })
}
