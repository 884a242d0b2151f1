//! Media query evaluation per [Media Queries Level 4](https://www.w3.org/TR/mediaqueries-4/).
//!
//! Supports media types (`all`, `screen`, `print`), `not`/`only`, `and`
//! chains, and the width/height/orientation/aspect-ratio features in both
//! the `min-`/`max-` prefix form and the range form (`width >= 600px`).

use cq_common::warning::warn_once;

use crate::values::{LengthUnit, parse_length};

/// The environment media queries are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaContext {
    /// Viewport width in CSS px.
    pub width: f64,
    /// Viewport height in CSS px.
    pub height: f64,
    /// Root font size used for `em`/`rem` in media features.
    pub font_size: f64,
}

impl MediaContext {
    /// A screen of the given viewport size with a 16px default font.
    #[must_use]
    pub const fn screen(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            font_size: 16.0,
        }
    }

    /// [§ 2 Media Queries](https://www.w3.org/TR/mediaqueries-4/#media)
    ///
    /// "A media query list is true if any of its component media queries are
    /// true". An empty list is true.
    #[must_use]
    pub fn evaluate_list(&self, list: &str) -> bool {
        let list = list.trim();
        if list.is_empty() {
            return true;
        }
        split_top_level_commas(list)
            .into_iter()
            .any(|query| self.evaluate_query(query))
    }

    /// Evaluate one media query. Malformed queries evaluate to false.
    fn evaluate_query(&self, query: &str) -> bool {
        let lowered = query.trim().to_ascii_lowercase();
        let mut rest = lowered.as_str();

        let mut negated = false;
        if let Some(after) = strip_keyword(rest, "not") {
            negated = true;
            rest = after;
        } else if let Some(after) = strip_keyword(rest, "only") {
            rest = after;
        }

        let mut result = true;
        if !rest.starts_with('(') {
            let (media_type, after) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            result = match media_type {
                "all" | "screen" => true,
                "print" | "speech" | "tty" | "tv" | "projection" | "handheld" | "braille"
                | "embossed" | "aural" => false,
                _ => return false,
            };
            rest = after.trim_start();
            if !rest.is_empty() {
                match strip_keyword(rest, "and") {
                    Some(after) => rest = after,
                    None => return false,
                }
            }
        }

        while !rest.is_empty() {
            let Some((feature, after)) = take_parenthesized(rest) else {
                return false;
            };
            match self.evaluate_feature(feature) {
                Some(matches) => result &= matches,
                None => return false,
            }
            rest = after.trim_start();
            if !rest.is_empty() {
                match strip_keyword(rest, "and") {
                    Some(after) => rest = after,
                    None => return false,
                }
            }
        }

        result != negated
    }

    /// Evaluate the inside of one `( ... )`. `None` for unknown features.
    fn evaluate_feature(&self, feature: &str) -> Option<bool> {
        let feature = feature.trim();

        // Range form: `width >= 600px`, `600px < width`, `400px <= width <= 800px`.
        if feature.contains(['<', '>', '=']) && !feature.contains(':') {
            return self.evaluate_range(feature);
        }

        let (name, value) = match feature.split_once(':') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (feature, None),
        };

        let (prefix, base) = if let Some(base) = name.strip_prefix("min-") {
            (Some(Comparison::Ge), base)
        } else if let Some(base) = name.strip_prefix("max-") {
            (Some(Comparison::Le), base)
        } else {
            (None, name)
        };

        match (base, value) {
            ("width" | "height" | "aspect-ratio", None) => Some(true),
            ("width" | "height", Some(value)) => {
                let actual = self.dimension(base);
                let expected = self.length_px(value)?;
                Some(prefix.unwrap_or(Comparison::Eq).test(actual, expected))
            }
            ("aspect-ratio", Some(value)) => {
                let expected = parse_ratio(value)?;
                let actual = self.width / self.height;
                Some(prefix.unwrap_or(Comparison::Eq).test(actual, expected))
            }
            ("orientation", Some(value)) if prefix.is_none() => match value {
                "portrait" => Some(self.height >= self.width),
                "landscape" => Some(self.width > self.height),
                _ => None,
            },
            ("color", _) => Some(true),
            ("prefers-color-scheme", Some(value)) => Some(value == "light"),
            ("prefers-reduced-motion", Some(value)) => Some(value == "no-preference"),
            ("hover" | "any-hover", Some(value)) => Some(value == "hover"),
            ("pointer" | "any-pointer", Some(value)) => Some(value == "fine"),
            _ => {
                warn_once("media", &format!("unsupported media feature '({feature})'"));
                None
            }
        }
    }

    /// [§ 2.4.3 Range context](https://www.w3.org/TR/mediaqueries-4/#mq-range-context)
    fn evaluate_range(&self, feature: &str) -> Option<bool> {
        let mut operands = Vec::new();
        let mut operators = Vec::new();
        let mut rest = feature;
        loop {
            let end = rest.find(['<', '>', '=']).unwrap_or(rest.len());
            operands.push(rest[..end].trim());
            rest = &rest[end..];
            if rest.is_empty() {
                break;
            }
            let op_len = if rest[1..].starts_with('=') { 2 } else { 1 };
            operators.push(Comparison::from_operator(&rest[..op_len])?);
            rest = &rest[op_len..];
        }

        let value_of = |operand: &str| -> Option<f64> {
            match operand {
                "width" | "height" => Some(self.dimension(operand)),
                other => self.length_px(other),
            }
        };
        let mut result = true;
        for (i, op) in operators.iter().enumerate() {
            let left = value_of(operands[i])?;
            let right = value_of(operands.get(i + 1)?)?;
            result &= op.test(left, right);
        }
        Some(result)
    }

    fn dimension(&self, name: &str) -> f64 {
        if name == "height" { self.height } else { self.width }
    }

    fn length_px(&self, value: &str) -> Option<f64> {
        let length = parse_length(value)?;
        match length.unit {
            LengthUnit::Px => Some(length.value),
            LengthUnit::Em | LengthUnit::Rem => Some(length.value * self.font_size),
            LengthUnit::Pt => Some(length.value * 96.0 / 72.0),
            LengthUnit::In => Some(length.value * 96.0),
            LengthUnit::Cm => Some(length.value * 96.0 / 2.54),
            LengthUnit::Mm => Some(length.value * 96.0 / 25.4),
            // Unitless zero.
            LengthUnit::None if length.value == 0.0 => Some(0.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl Comparison {
    fn from_operator(op: &str) -> Option<Self> {
        Some(match op {
            "<" => Self::Lt,
            "<=" => Self::Le,
            "=" => Self::Eq,
            ">=" => Self::Ge,
            ">" => Self::Gt,
            _ => return None,
        })
    }

    fn test(self, left: f64, right: f64) -> bool {
        match self {
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Eq => (left - right).abs() < 0.01,
            Self::Ge => left >= right,
            Self::Gt => left > right,
        }
    }
}

/// Strip a leading keyword followed by whitespace or `(`.
fn strip_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = input.strip_prefix(keyword)?;
    if rest.starts_with(char::is_whitespace) || rest.starts_with('(') {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// Split `(inner) rest` into `inner` and `rest`.
fn take_parenthesized(input: &str) -> Option<(&str, &str)> {
    let body = input.strip_prefix('(')?;
    let mut depth = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some((&body[..i], &body[i + 1..])),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn parse_ratio(value: &str) -> Option<f64> {
    let (num, den) = value.split_once('/').unwrap_or((value, "1"));
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    (den != 0.0).then(|| num / den)
}

fn split_top_level_commas(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_and_max_width() {
        let ctx = MediaContext::screen(800.0, 600.0);
        assert!(ctx.evaluate_list("(min-width: 768px)"));
        assert!(!ctx.evaluate_list("(min-width: 1024px)"));
        assert!(ctx.evaluate_list("screen and (max-width: 50em)"));
    }

    #[test]
    fn test_media_types_and_negation() {
        let ctx = MediaContext::screen(800.0, 600.0);
        assert!(!ctx.evaluate_list("print"));
        assert!(ctx.evaluate_list("not print"));
        assert!(ctx.evaluate_list("print, (orientation: landscape)"));
        assert!(!ctx.evaluate_list("not all and (min-width: 100px)"));
    }

    #[test]
    fn test_range_syntax() {
        let ctx = MediaContext::screen(800.0, 600.0);
        assert!(ctx.evaluate_list("(width >= 600px)"));
        assert!(ctx.evaluate_list("(400px <= width <= 900px)"));
        assert!(!ctx.evaluate_list("(height > 600px)"));
    }

    #[test]
    fn test_unknown_feature_is_false() {
        let ctx = MediaContext::screen(800.0, 600.0);
        assert!(!ctx.evaluate_list("(scan: interlace)"));
    }
}
