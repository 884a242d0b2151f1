//! Length evaluation.
//!
//! [CSS Values and Units § 5](https://www.w3.org/TR/css-values-4/#lengths)
//!
//! Query thresholds are kept as written and resolved to px only when a
//! comparison needs them, in the context of one element. Nothing here is
//! cached: font sizes and the viewport change between passes.

use std::fmt;

use cq_common::warning::warn_once;
use serde::Serialize;

use crate::host::StyleHost;

/// Units whose value does not depend on the containing block.
///
/// [§ 5.1 Relative lengths](https://www.w3.org/TR/css-values-4/#relative-lengths)
/// and [§ 5.2 Absolute lengths](https://www.w3.org/TR/css-values-4/#absolute-lengths)
pub const FIXED_UNITS: &[&str] = &[
    "px", "pt", "pc", "in", "cm", "mm", "vw", "vh", "vmin", "vmax", "rem", "em", "ex",
];

/// Font size assumed when the host reports none.
const FALLBACK_FONT_SIZE: f64 = 16.0;

/// A length token as written, e.g. `300px` or `12.5em`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Length {
    raw: String,
}

impl Length {
    /// Wrap a raw length token.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The token as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Split into the leading number and the (lowercased) unit.
    #[must_use]
    pub fn number_and_unit(&self) -> Option<(f64, String)> {
        split_number(&self.raw).map(|(value, unit)| (value, unit.to_ascii_lowercase()))
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split `value` into a leading `<number>` and the rest.
///
/// [CSS Syntax § 4.3.12 Consume a number](https://www.w3.org/TR/css-syntax-3/#consume-number)
/// restricted to sign, digits, one decimal point and an exponent.
#[must_use]
pub fn split_number(value: &str) -> Option<(f64, &str)> {
    let value = value.trim();
    let bytes = value.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;
    if end < bytes.len() && bytes[end] == b'.' && bytes.get(end + 1).is_some_and(u8::is_ascii_digit)
    {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        has_digits = true;
    }
    if !has_digits {
        return None;
    }
    // Exponent, only if followed by digits ("1em" is not an exponent).
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        if bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                exp_end += 1;
            }
            end = exp_end;
        }
    }
    let number = value[..end].parse().ok()?;
    Some((number, &value[end..]))
}

/// Whether a declared value is a fixed length: a number followed by one of
/// [`FIXED_UNITS`].
#[must_use]
pub fn is_fixed_length(value: &str) -> bool {
    split_number(value).is_some_and(|(_, unit)| {
        FIXED_UNITS
            .iter()
            .any(|fixed| unit.eq_ignore_ascii_case(fixed))
    })
}

/// Whether a declared value is a percentage.
#[must_use]
pub fn is_percentage(value: &str) -> bool {
    split_number(value).is_some_and(|(_, unit)| unit == "%")
}

/// Parse a px value reported by the host (`"16px"`, `"0"`).
#[must_use]
pub fn parse_px(value: &str) -> Option<f64> {
    split_number(value).map(|(number, _)| number)
}

/// Resolve `length` to CSS px in the context of `element`.
///
/// `em` and `ex` use the element's font size, `rem` the root element's.
/// Unknown units fall back to the bare number; a value without a leading
/// number yields `None`.
#[must_use]
pub fn to_pixels<H: StyleHost + ?Sized>(
    host: &H,
    length: &Length,
    element: H::Element,
) -> Option<f64> {
    let (value, unit) = length.number_and_unit()?;
    let font_size = |el: Option<H::Element>| {
        el.and_then(|el| parse_px(&host.computed_value(el, "font-size")))
            .unwrap_or(FALLBACK_FONT_SIZE)
    };

    Some(match unit.as_str() {
        "" | "px" => value,
        "pt" => value * 16.0 / 12.0,
        "pc" => value * 16.0,
        "in" => value * 96.0,
        "cm" => value * 96.0 / 2.54,
        "mm" => value * 96.0 / 25.4,
        "vw" => value * host.viewport().width / 100.0,
        "vh" => value * host.viewport().height / 100.0,
        "vmin" => {
            let viewport = host.viewport();
            value * viewport.width.min(viewport.height) / 100.0
        }
        "vmax" => {
            let viewport = host.viewport();
            value * viewport.width.max(viewport.height) / 100.0
        }
        "rem" => value * font_size(host.root_element()),
        "em" => value * font_size(Some(element)),
        "ex" => value * font_size(Some(element)) / 2.0,
        other => {
            warn_once(
                "length",
                &format!("unknown unit '{other}' in '{length}', treating the number as px"),
            );
            value
        }
    })
}
