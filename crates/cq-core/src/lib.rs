//! Container-query engine.
//!
//! Retrofits container queries onto a style engine that only knows media
//! queries. Authors write `:container(min-width: 300px)` as a pseudo-class;
//! the engine rewrites it into an escaped marker class the host can parse,
//! collects every query into a [`Registry`], and on each evaluation pass
//! adds or removes the marker classes according to the size of each
//! element's container. The host's own cascade then does the styling.
//!
//! # Modules
//!
//! - [`rewrite`]: stylesheet text rewriting and the escaped-token scanner
//! - [`registry`]: query collection from the host's rule tree
//! - [`specificity`] and [`cascade`]: declared-value lookup
//! - [`container`]: container resolution, memoized per [`Pass`]
//! - [`length`]: length-to-pixel conversion
//! - [`evaluate`]: class toggling
//! - [`pipeline`]: preprocess, parse and evaluate, chained
//! - [`host`]: the traits a style engine implements to drive all of this
//!
//! # Example
//!
//! ```ignore
//! let mut pipeline = Pipeline::new(document, HttpFetcher::default());
//! let report = pipeline.reevaluate(None);
//! pipeline.host_mut().set_viewport(480.0, 800.0);
//! let report = pipeline.reevaluate(None);
//! ```

pub mod cascade;
pub mod container;
pub mod evaluate;
pub mod host;
pub mod length;
pub mod pipeline;
pub mod registry;
pub mod rewrite;
pub mod specificity;

pub use cascade::{MatchedRule, RuleIndex, resolve_declared_values};
pub use container::Pass;
pub use evaluate::{EvaluationReport, evaluate};
pub use host::{
    CascadeHost, CssRuleView, DeclarationBlock, Fetcher, SheetAccessError, SheetHost, SheetOwner,
    SheetSource, StyleHost, StyleRuleView, StyleSheetView, Viewport,
};
pub use length::{Length, to_pixels};
pub use pipeline::{Callback, Pipeline, preprocess};
pub use registry::{Comparator, ContainerQuery, Dimension, Registry};
pub use rewrite::{escape_class_name, rewrite_stylesheet, unescape};
pub use specificity::Specificity;
