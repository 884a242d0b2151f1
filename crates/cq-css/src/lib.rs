//! CSS engine for the container-query reference host.
//!
//! # Scope
//!
//! This crate implements:
//! - **CSS Tokenizer** ([§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization))
//!   - Escapes, comments, numbers, dimensions and `url()` tokens
//!   - Byte spans, so rule text can be reproduced exactly
//!
//! - **CSS Parser** ([§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing))
//!   - Style rules, grouping at-rules (`@media`, `@supports`, ...) and
//!     statement at-rules
//!   - Declaration lists with `!important`
//!
//! - **CSS Selectors** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - Type, class, ID, universal and attribute selectors
//!   - Structural pseudo-classes, `:not()`, `:is()`, `:where()`
//!   - All four combinators and specificity
//!
//! - **Media Queries** ([Media Queries Level 4](https://www.w3.org/TR/mediaqueries-4/))
//!
//! - **CSS Cascade** ([CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/))
//!   - Origins, importance, specificity, order and `style` attributes
//!   - Box and border shorthand expansion
//!
//! - **Layout** ([CSS 2.1 § 10](https://www.w3.org/TR/CSS21/visudet.html))
//!   - Box dimensions only: fill, shrink-to-fit and auto heights
//!
//! # Not Implemented
//!
//! - Painting, positioning offsets and real font metrics
//! - Inheritance of properties other than `font-size`

/// CSS cascade and style computation per [CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/).
pub mod cascade;
/// Box dimensions per [CSS 2.1 § 10](https://www.w3.org/TR/CSS21/visudet.html).
pub mod layout;
/// Media query evaluation per [Media Queries Level 4](https://www.w3.org/TR/mediaqueries-4/).
pub mod media;
/// CSS parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod parser;
/// CSS selector parsing and matching per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;
/// Computed style representation per [CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/).
pub mod style;
/// CSS tokenizer per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod tokenizer;
/// User-agent default stylesheet.
pub mod ua_stylesheet;
/// Length values per [CSS Values § 5](https://www.w3.org/TR/css-values-4/#lengths).
pub mod values;

pub use cascade::compute_styles;
pub use layout::{Layout, LayoutBox};
pub use media::MediaContext;
pub use parser::{Declaration, Rule, StyleRule, Stylesheet, parse_declaration_list, parse_stylesheet};
pub use selector::{ParsedSelector, Specificity, parse_selector, parse_selector_list};
pub use style::{ComputedStyle, Display, Position};
