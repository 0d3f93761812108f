//! Style kind classification
//!
//! Kinds are detected by attribute presence and are not exclusive: a text
//! annotation usually also exhibits the stroke and fill kinds.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::FlatStyle;

/// Attributes whose presence makes a style a stroke style
pub const STROKE_ATTRIBUTES: &[&str] = &[
    "color",
    "opacity",
    "dashArray",
    "dashOffset",
    "lineCap",
    "lineJoin",
    "weight",
];

/// Attributes whose presence makes a style a fill style
pub const FILL_ATTRIBUTES: &[&str] = &["fillColor", "fillOpacity"];

/// Attributes whose presence makes a style a text style
pub const TEXT_ATTRIBUTES: &[&str] = &["label"];

/// Attributes whose presence makes a style a circle style
pub const CIRCLE_ATTRIBUTES: &[&str] = &["radius"];

/// Attributes whose presence makes a style a marker style
pub const MARKER_ATTRIBUTES: &[&str] = &["iconGlyph", "iconShape", "iconColor"];

/// Attributes whose presence makes a style a symbol style
pub const SYMBOL_ATTRIBUTES: &[&str] = &["symbolUrl"];

/// Title given to legacy annotation circles that carry no radius
const CIRCLE_STYLE_TITLE: &str = "Circle Style";

/// Visual kind exhibited by a flat style
///
/// Variants are declared in title precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Marker,
    Symbol,
    Text,
    Circle,
    Fill,
    Stroke,
}

impl StyleKind {
    /// All kinds, highest title precedence first
    pub const ALL: [StyleKind; 6] = [
        StyleKind::Marker,
        StyleKind::Symbol,
        StyleKind::Text,
        StyleKind::Circle,
        StyleKind::Fill,
        StyleKind::Stroke,
    ];

    /// Attributes that signal this kind
    pub fn attributes(&self) -> &'static [&'static str] {
        match self {
            StyleKind::Marker => MARKER_ATTRIBUTES,
            StyleKind::Symbol => SYMBOL_ATTRIBUTES,
            StyleKind::Text => TEXT_ATTRIBUTES,
            StyleKind::Circle => CIRCLE_ATTRIBUTES,
            StyleKind::Fill => FILL_ATTRIBUTES,
            StyleKind::Stroke => STROKE_ATTRIBUTES,
        }
    }

    /// Human readable title of the kind
    pub fn title(&self) -> &'static str {
        match self {
            StyleKind::Marker => "Marker",
            StyleKind::Symbol => "Symbol",
            StyleKind::Text => "Text",
            StyleKind::Circle => "Circle",
            StyleKind::Fill => "Polygon",
            StyleKind::Stroke => "Polyline",
        }
    }

    /// Check whether a style exhibits this kind
    pub fn matches(&self, style: &FlatStyle) -> bool {
        is_attr_present(style, self.attributes())
    }
}

impl std::fmt::Display for StyleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StyleKind::Marker => "marker",
            StyleKind::Symbol => "symbol",
            StyleKind::Text => "text",
            StyleKind::Circle => "circle",
            StyleKind::Fill => "fill",
            StyleKind::Stroke => "stroke",
        };
        write!(f, "{}", name)
    }
}

/// True if at least one of `attributes` is set (non-null) on the style
pub fn is_attr_present(style: &FlatStyle, attributes: &[&str]) -> bool {
    attributes
        .iter()
        .any(|attr| style.get(*attr).is_some_and(|v| !v.is_null()))
}

pub fn is_stroke_style(style: &FlatStyle) -> bool {
    StyleKind::Stroke.matches(style)
}

pub fn is_fill_style(style: &FlatStyle) -> bool {
    StyleKind::Fill.matches(style)
}

pub fn is_text_style(style: &FlatStyle) -> bool {
    StyleKind::Text.matches(style)
}

pub fn is_circle_style(style: &FlatStyle) -> bool {
    StyleKind::Circle.matches(style)
}

pub fn is_marker_style(style: &FlatStyle) -> bool {
    StyleKind::Marker.matches(style)
}

pub fn is_symbol_style(style: &FlatStyle) -> bool {
    StyleKind::Symbol.matches(style)
}

/// Every kind the style exhibits
pub fn classify(style: &FlatStyle) -> BTreeSet<StyleKind> {
    StyleKind::ALL
        .into_iter()
        .filter(|kind| kind.matches(style))
        .collect()
}

/// Title of the highest-precedence kind, or `""` for a style with no kind
///
/// Precedence: marker, symbol, text, circle, fill, stroke.
pub fn styler_title(style: &FlatStyle) -> &'static str {
    let titled_circle = style
        .get("title")
        .and_then(|v| v.as_str())
        .is_some_and(|t| t == CIRCLE_STYLE_TITLE);

    StyleKind::ALL
        .into_iter()
        .find(|kind| kind.matches(style) || (*kind == StyleKind::Circle && titled_circle))
        .map(|kind| kind.title())
        .unwrap_or("")
}
