//! Computed style for the properties that influence box sizing.
//!
//! [CSS Cascading § 4.4 Computed Values](https://www.w3.org/TR/css-cascade-4/#computed)

use std::collections::HashMap;

use serde::Serialize;

use crate::values::{LengthContext, LengthUnit, parse_length};

/// Initial `font-size` (`medium`).
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// [§ 2 display](https://www.w3.org/TR/css-display-3/#the-display-properties)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Display {
    /// `none`
    None,
    /// `inline` (initial value)
    Inline,
    /// `block`
    Block,
    /// `inline-block`
    InlineBlock,
    /// `list-item`
    ListItem,
    /// `flow-root`
    FlowRoot,
    /// `flex`
    Flex,
    /// `inline-flex`
    InlineFlex,
    /// `grid`
    Grid,
    /// `inline-grid`
    InlineGrid,
    /// `table`
    Table,
    /// `table-row`
    TableRow,
    /// `table-cell`
    TableCell,
    /// `contents`
    Contents,
}

impl Display {
    /// Parse a `display` keyword.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.trim().to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "inline" => Self::Inline,
            "block" => Self::Block,
            "inline-block" => Self::InlineBlock,
            "list-item" => Self::ListItem,
            "flow-root" => Self::FlowRoot,
            "flex" => Self::Flex,
            "inline-flex" => Self::InlineFlex,
            "grid" => Self::Grid,
            "inline-grid" => Self::InlineGrid,
            "table" => Self::Table,
            "table-row" => Self::TableRow,
            "table-cell" => Self::TableCell,
            "contents" => Self::Contents,
            _ => return None,
        })
    }

    /// The keyword as serialized by `getComputedStyle`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Inline => "inline",
            Self::Block => "block",
            Self::InlineBlock => "inline-block",
            Self::ListItem => "list-item",
            Self::FlowRoot => "flow-root",
            Self::Flex => "flex",
            Self::InlineFlex => "inline-flex",
            Self::Grid => "grid",
            Self::InlineGrid => "inline-grid",
            Self::Table => "table",
            Self::TableRow => "table-row",
            Self::TableCell => "table-cell",
            Self::Contents => "contents",
        }
    }

    /// Block-level boxes fill their containing block's width.
    #[must_use]
    pub const fn is_block_level(self) -> bool {
        matches!(
            self,
            Self::Block | Self::ListItem | Self::FlowRoot | Self::Flex | Self::Grid | Self::Table
        )
    }

    /// [§ 2.7 Automatic Box Type Transformations](https://www.w3.org/TR/css-display-3/#transformations)
    ///
    /// "blockify": inline-level types become their block-level equivalents.
    #[must_use]
    pub const fn blockify(self) -> Self {
        match self {
            Self::Inline | Self::InlineBlock | Self::TableRow | Self::TableCell => Self::Block,
            Self::InlineFlex => Self::Flex,
            Self::InlineGrid => Self::Grid,
            other => other,
        }
    }
}

/// [CSS Positioned Layout § 2](https://www.w3.org/TR/css-position-3/#position-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    /// `static`
    Static,
    /// `relative`
    Relative,
    /// `absolute`
    Absolute,
    /// `fixed`
    Fixed,
    /// `sticky`
    Sticky,
}

impl Position {
    fn parse(value: &str) -> Option<Self> {
        Some(match value.trim().to_ascii_lowercase().as_str() {
            "static" => Self::Static,
            "relative" => Self::Relative,
            "absolute" => Self::Absolute,
            "fixed" => Self::Fixed,
            "sticky" => Self::Sticky,
            _ => return None,
        })
    }

    /// The keyword as serialized by `getComputedStyle`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Relative => "relative",
            Self::Absolute => "absolute",
            Self::Fixed => "fixed",
            Self::Sticky => "sticky",
        }
    }

    /// Out-of-flow positioning.
    #[must_use]
    pub const fn is_absolutely_positioned(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }
}

/// [CSS 2.1 § 9.5.1 float](https://www.w3.org/TR/CSS21/visuren.html#float-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Float {
    /// `none`
    None,
    /// `left`
    Left,
    /// `right`
    Right,
}

impl Float {
    /// The keyword as serialized by `getComputedStyle`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// A `width`/`height`/`padding`/`margin` value after computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SizeValue {
    /// `auto`
    Auto,
    /// Absolute px.
    Px(f64),
    /// Percentage of the containing block.
    Percent(f64),
}

impl SizeValue {
    /// Resolve against a basis; `auto` and percentages of an unknown basis yield `None`.
    #[must_use]
    pub fn resolve(self, basis: Option<f64>) -> Option<f64> {
        match self {
            Self::Auto => None,
            Self::Px(px) => Some(px),
            Self::Percent(pct) => basis.map(|b| b * pct / 100.0),
        }
    }
}

/// [CSS Box Sizing § 4.1](https://www.w3.org/TR/css-sizing-3/#box-sizing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoxSizing {
    /// `content-box`
    ContentBox,
    /// `border-box`
    BorderBox,
}

/// Four physical edges in `[top, right, bottom, left]` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edges<T> {
    /// Top edge.
    pub top: T,
    /// Right edge.
    pub right: T,
    /// Bottom edge.
    pub bottom: T,
    /// Left edge.
    pub left: T,
}

impl<T: Copy> Edges<T> {
    /// The same value on every edge.
    #[must_use]
    pub const fn uniform(value: T) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Apply `f` to every edge.
    #[must_use]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Edges<U> {
        Edges {
            top: f(self.top),
            right: f(self.right),
            bottom: f(self.bottom),
            left: f(self.left),
        }
    }
}

const EDGE_NAMES: [&str; 4] = ["top", "right", "bottom", "left"];

/// Computed values of one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedStyle {
    /// `display`, after blockification.
    pub display: Display,
    /// `position`
    pub position: Position,
    /// `float`
    pub float: Float,
    /// `font-size` in px.
    pub font_size: f64,
    /// `width`
    pub width: SizeValue,
    /// `height`
    pub height: SizeValue,
    /// `box-sizing`
    pub box_sizing: BoxSizing,
    /// `margin-*` (`auto` allowed).
    pub margin: Edges<SizeValue>,
    /// `padding-*` (`auto` is invalid and treated as 0).
    pub padding: Edges<SizeValue>,
    /// `border-*-width` in px; 0 when the border style is `none`.
    pub border_width: Edges<f64>,
    /// `transform`, if not `none`.
    pub transform: Option<String>,
    /// Cascaded values of every other property, as written.
    pub other: HashMap<String, String>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Inline,
            position: Position::Static,
            float: Float::None,
            font_size: DEFAULT_FONT_SIZE,
            width: SizeValue::Auto,
            height: SizeValue::Auto,
            box_sizing: BoxSizing::ContentBox,
            margin: Edges::uniform(SizeValue::Px(0.0)),
            padding: Edges::uniform(SizeValue::Px(0.0)),
            border_width: Edges::uniform(0.0),
            transform: None,
            other: HashMap::new(),
        }
    }
}

/// Inputs for turning cascaded values into computed values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputeContext {
    /// Parent's computed font size (the initial value for the root).
    pub parent_font_size: f64,
    /// Root element's computed font size, if the root has been computed.
    pub root_font_size: Option<f64>,
    /// Viewport width.
    pub viewport_width: f64,
    /// Viewport height.
    pub viewport_height: f64,
    /// Whether the element is the document element.
    pub is_root: bool,
}

impl ComputedStyle {
    /// [§ 4.4 Computed Values](https://www.w3.org/TR/css-cascade-4/#computed)
    ///
    /// Build computed values from the cascaded (winning) declarations of an
    /// element. Shorthands must already be expanded.
    #[must_use]
    pub fn compute(cascaded: &HashMap<String, String>, ctx: &ComputeContext) -> Self {
        let mut style = Self::default();
        let get = |name: &str| cascaded.get(name).map(String::as_str);

        // [CSS Fonts § 2.5](https://www.w3.org/TR/css-fonts-4/#font-size-prop)
        // "Inherited: yes"; em and % refer to the parent's font size.
        style.font_size = get("font-size")
            .and_then(|v| compute_font_size(v, ctx))
            .unwrap_or(ctx.parent_font_size);

        let length_ctx = LengthContext {
            font_size: style.font_size,
            root_font_size: if ctx.is_root {
                style.font_size
            } else {
                ctx.root_font_size.unwrap_or(DEFAULT_FONT_SIZE)
            },
            viewport_width: ctx.viewport_width,
            viewport_height: ctx.viewport_height,
        };
        let size = |name: &str, allow_auto: bool| -> Option<SizeValue> {
            let value = get(name)?;
            if value.eq_ignore_ascii_case("auto") {
                return allow_auto.then_some(SizeValue::Auto);
            }
            let length = parse_length(value)?;
            if length.unit == LengthUnit::Percent {
                return Some(SizeValue::Percent(length.value));
            }
            if length.unit == LengthUnit::None && length.value != 0.0 {
                return None;
            }
            length.to_px(&length_ctx).map(SizeValue::Px)
        };

        if let Some(display) = get("display").and_then(Display::parse) {
            style.display = display;
        }
        if let Some(position) = get("position").and_then(Position::parse) {
            style.position = position;
        }
        style.float = match get("float").map(str::to_ascii_lowercase).as_deref() {
            Some("left") => Float::Left,
            Some("right") => Float::Right,
            _ => Float::None,
        };

        // [CSS 2.1 § 9.7](https://www.w3.org/TR/CSS21/visuren.html#dis-pos-flo)
        // "if 'position' has the value 'absolute' or 'fixed', the box is
        // absolutely positioned, the computed value of 'float' is 'none', and
        // display is set according to the table below."
        if style.position.is_absolutely_positioned() {
            style.float = Float::None;
            style.display = style.display.blockify();
        } else if style.float != Float::None || ctx.is_root {
            style.display = style.display.blockify();
        }

        style.width = size("width", true).unwrap_or(SizeValue::Auto);
        style.height = size("height", true).unwrap_or(SizeValue::Auto);
        if get("box-sizing").is_some_and(|v| v.eq_ignore_ascii_case("border-box")) {
            style.box_sizing = BoxSizing::BorderBox;
        }

        for (i, edge) in EDGE_NAMES.iter().enumerate() {
            let margin = size(&format!("margin-{edge}"), true).unwrap_or(SizeValue::Px(0.0));
            let padding = size(&format!("padding-{edge}"), false).unwrap_or(SizeValue::Px(0.0));

            // [CSS Backgrounds § 4.3](https://www.w3.org/TR/css-backgrounds-3/#border-width)
            // "Computed value: absolute length; zero if the border style is none or hidden"
            let style_name = format!("border-{edge}-style");
            let has_border = get(&style_name)
                .is_some_and(|s| !matches!(s.to_ascii_lowercase().as_str(), "none" | "hidden"));
            let border = if has_border {
                get(&format!("border-{edge}-width"))
                    .and_then(|w| border_width_px(w, &length_ctx))
                    .unwrap_or(3.0)
            } else {
                0.0
            };

            match i {
                0 => {
                    style.margin.top = margin;
                    style.padding.top = padding;
                    style.border_width.top = border;
                }
                1 => {
                    style.margin.right = margin;
                    style.padding.right = padding;
                    style.border_width.right = border;
                }
                2 => {
                    style.margin.bottom = margin;
                    style.padding.bottom = padding;
                    style.border_width.bottom = border;
                }
                _ => {
                    style.margin.left = margin;
                    style.padding.left = padding;
                    style.border_width.left = border;
                }
            }
        }

        style.transform = get("transform")
            .filter(|t| !t.eq_ignore_ascii_case("none"))
            .map(str::to_string);

        style.other = cascaded
            .iter()
            .filter(|(name, _)| !is_modelled(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        style
    }

    /// `getComputedStyle`-like serialization for properties that do not depend
    /// on layout. Layout-dependent properties are answered by the layout.
    #[must_use]
    pub fn property_value(&self, name: &str) -> String {
        match name {
            "display" => self.display.as_str().to_string(),
            "position" => self.position.as_str().to_string(),
            "float" => self.float.as_str().to_string(),
            "font-size" => format_px(self.font_size),
            "box-sizing" => match self.box_sizing {
                BoxSizing::ContentBox => "content-box".to_string(),
                BoxSizing::BorderBox => "border-box".to_string(),
            },
            "transform" => self.transform.clone().unwrap_or_else(|| "none".to_string()),
            "border-top-width" => format_px(self.border_width.top),
            "border-right-width" => format_px(self.border_width.right),
            "border-bottom-width" => format_px(self.border_width.bottom),
            "border-left-width" => format_px(self.border_width.left),
            other => self.other.get(other).cloned().unwrap_or_default(),
        }
    }
}

/// Serialize a px value the way `getComputedStyle` does (`16px`, `12.5px`).
#[must_use]
pub fn format_px(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    format!("{rounded}px")
}

fn is_modelled(name: &str) -> bool {
    matches!(
        name,
        "display" | "position" | "float" | "font-size" | "width" | "height" | "box-sizing"
            | "transform"
    ) || ["margin-", "padding-", "border-"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// [CSS Fonts § 2.5](https://www.w3.org/TR/css-fonts-4/#font-size-prop)
fn compute_font_size(value: &str, ctx: &ComputeContext) -> Option<f64> {
    let keyword = match value.trim().to_ascii_lowercase().as_str() {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "smaller" => Some(ctx.parent_font_size / 1.2),
        "larger" => Some(ctx.parent_font_size * 1.2),
        _ => None,
    };
    if keyword.is_some() {
        return keyword;
    }
    let length = parse_length(value)?;
    let parent = ctx.parent_font_size;
    match length.unit {
        LengthUnit::Percent => Some(parent * length.value / 100.0),
        // "rem" on the root refers to the initial value.
        LengthUnit::Rem => Some(length.value * ctx.root_font_size.unwrap_or(DEFAULT_FONT_SIZE)),
        LengthUnit::None => None,
        _ => length.to_px(&LengthContext {
            font_size: parent,
            root_font_size: ctx.root_font_size.unwrap_or(DEFAULT_FONT_SIZE),
            viewport_width: ctx.viewport_width,
            viewport_height: ctx.viewport_height,
        }),
    }
}

/// [CSS Backgrounds § 4.3](https://www.w3.org/TR/css-backgrounds-3/#border-width)
fn border_width_px(value: &str, ctx: &LengthContext) -> Option<f64> {
    match value.trim().to_ascii_lowercase().as_str() {
        "thin" => Some(1.0),
        "medium" => Some(3.0),
        "thick" => Some(5.0),
        other => parse_length(other)
            .filter(|l| l.unit != LengthUnit::Percent)
            .and_then(|l| l.to_px(ctx)),
    }
}
