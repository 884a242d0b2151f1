//! Reference host for the container-query engine.
//!
//! Binds the workspace's own DOM ([`cq_dom`]) and CSS engine ([`cq_css`]) to
//! the traits of [`cq_core`], so the whole pipeline runs without a browser:
//!
//! ```ignore
//! let document = cq_host::load_fixture(Path::new("demos/cards.json"))?;
//! let mut pipeline = Pipeline::new(document, SheetFetcher);
//! let report = pipeline.reevaluate(None);
//! ```
//!
//! - [`Document`]: tree, sheets, viewport, lazily computed styles and layout
//! - [`SheetFetcher`]: `http(s)`, `data:` and `file:` sheet loading
//! - [`fixture`]: JSON document descriptions

pub mod document;
pub mod fetcher;
pub mod fixture;

pub use document::{DEFAULT_VIEWPORT, Document};
pub use fetcher::SheetFetcher;
pub use fixture::{Fixture, FixtureError, load_fixture, parse_fixture};
