//! Length values per [CSS Values and Units § 5](https://www.w3.org/TR/css-values-4/#lengths).

use crate::tokenizer::{TokenKind, tokenize};

/// Units the reference host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    /// Unitless number (only meaningful for `0`).
    None,
    /// `px`
    Px,
    /// `em`
    Em,
    /// `rem`
    Rem,
    /// `ex`
    Ex,
    /// `ch`
    Ch,
    /// `vw`
    Vw,
    /// `vh`
    Vh,
    /// `vmin`
    Vmin,
    /// `vmax`
    Vmax,
    /// `pt`
    Pt,
    /// `pc`
    Pc,
    /// `in`
    In,
    /// `cm`
    Cm,
    /// `mm`
    Mm,
    /// `%`
    Percent,
}

impl LengthUnit {
    /// Look up a unit by its (case-insensitive) name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "px" => Self::Px,
            "em" => Self::Em,
            "rem" => Self::Rem,
            "ex" => Self::Ex,
            "ch" => Self::Ch,
            "vw" => Self::Vw,
            "vh" => Self::Vh,
            "vmin" => Self::Vmin,
            "vmax" => Self::Vmax,
            "pt" => Self::Pt,
            "pc" => Self::Pc,
            "in" => Self::In,
            "cm" => Self::Cm,
            "mm" => Self::Mm,
            _ => return None,
        })
    }
}

/// A number with a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    /// Numeric part.
    pub value: f64,
    /// Unit part.
    pub unit: LengthUnit,
}

/// Everything a host needs to turn a [`Length`] into px.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthContext {
    /// Font size of the element the length applies to.
    pub font_size: f64,
    /// Font size of the root element.
    pub root_font_size: f64,
    /// Viewport width.
    pub viewport_width: f64,
    /// Viewport height.
    pub viewport_height: f64,
}

impl Length {
    /// Resolve to px. Percentages need a basis and return `None` here.
    #[must_use]
    pub fn to_px(self, ctx: &LengthContext) -> Option<f64> {
        let v = self.value;
        Some(match self.unit {
            LengthUnit::None | LengthUnit::Px => v,
            LengthUnit::Em => v * ctx.font_size,
            LengthUnit::Rem => v * ctx.root_font_size,
            LengthUnit::Ex | LengthUnit::Ch => v * ctx.font_size / 2.0,
            LengthUnit::Vw => v * ctx.viewport_width / 100.0,
            LengthUnit::Vh => v * ctx.viewport_height / 100.0,
            LengthUnit::Vmin => v * ctx.viewport_width.min(ctx.viewport_height) / 100.0,
            LengthUnit::Vmax => v * ctx.viewport_width.max(ctx.viewport_height) / 100.0,
            LengthUnit::Pt => v * 96.0 / 72.0,
            LengthUnit::Pc => v * 16.0,
            LengthUnit::In => v * 96.0,
            LengthUnit::Cm => v * 96.0 / 2.54,
            LengthUnit::Mm => v * 96.0 / 25.4,
            LengthUnit::Percent => return None,
        })
    }
}

/// Parse a single `<length>` or `<percentage>`.
///
/// Unitless numbers parse as [`LengthUnit::None`]; unknown units are rejected.
#[must_use]
pub fn parse_length(input: &str) -> Option<Length> {
    let tokens = tokenize(input.trim());
    let [token] = tokens.as_slice() else {
        return None;
    };
    match &token.kind {
        TokenKind::Dimension { value, unit } => Some(Length {
            value: *value,
            unit: LengthUnit::from_name(unit)?,
        }),
        TokenKind::Percentage(value) => Some(Length {
            value: *value,
            unit: LengthUnit::Percent,
        }),
        TokenKind::Number(value) => Some(Length {
            value: *value,
            unit: LengthUnit::None,
        }),
        _ => None,
    }
}

/// Split a shorthand value into its whitespace-separated components.
///
/// Function arguments (`calc(1px + 2px)`) stay together.
#[must_use]
pub fn split_components(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start: Option<usize> = None;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c.is_ascii_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    parts.push(&value[s..i]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        parts.push(&value[s..]);
    }
    parts
}

/// Expand a 1-4 value box shorthand into `[top, right, bottom, left]`.
///
/// [CSS Box Model § 5.2](https://www.w3.org/TR/css-box-4/#margin-shorthand)
#[must_use]
pub fn expand_box_shorthand(value: &str) -> Option<[&str; 4]> {
    let parts = split_components(value);
    Some(match *parts.as_slice() {
        [all] => [all, all, all, all],
        [vertical, horizontal] => [vertical, horizontal, vertical, horizontal],
        [top, horizontal, bottom] => [top, horizontal, bottom, horizontal],
        [top, right, bottom, left] => [top, right, bottom, left],
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_length() {
        assert_eq!(
            parse_length("12.5em"),
            Some(Length {
                value: 12.5,
                unit: LengthUnit::Em
            })
        );
        assert_eq!(parse_length("50%").map(|l| l.unit), Some(LengthUnit::Percent));
        assert_eq!(parse_length("auto"), None);
        assert_eq!(parse_length("10 px"), None);
        assert_eq!(parse_length("3furlongs"), None);
    }

    #[test]
    fn test_box_shorthand() {
        assert_eq!(
            expand_box_shorthand("1px 2px 3px"),
            Some(["1px", "2px", "3px", "2px"])
        );
        assert_eq!(expand_box_shorthand(""), None);
    }

    #[test]
    fn test_split_keeps_functions_together() {
        assert_eq!(
            split_components("solid calc(1px + 2px) red"),
            vec!["solid", "calc(1px + 2px)", "red"]
        );
    }
}
