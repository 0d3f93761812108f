//! SVG manipulation for symbols
//!
//! Recoloring only touches attributes of the root `<svg>` element; children
//! inherit presentation attributes from it. The document is parsed with
//! `roxmltree` to locate the root, then edited as text so everything else
//! (namespaces, comments, formatting) survives byte for byte.

use std::f64::consts::PI;

use crate::geostyler::MarkSymbolizer;
use crate::style::{format_number, parse_color};
use crate::symbol::fetch::DataUrl;
use crate::{MapstyleError, Result};

pub const SVG_MEDIA_TYPE: &str = "image/svg+xml";

/// Default mark radius when a mark has none
pub const DEFAULT_MARK_RADIUS: f64 = 16.0;

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Set (or overwrite) attributes on the root `<svg>` element
///
/// Fails when the input is not well-formed XML or its root isn't `svg`.
pub fn set_root_attributes(svg: &str, attributes: &[(&str, String)]) -> Result<String> {
    let doc = roxmltree::Document::parse(svg)
        .map_err(|e| MapstyleError::ParseError(format!("Invalid SVG: {}", e)))?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(MapstyleError::ParseError(format!(
            "Expected <svg> root element, found <{}>",
            root.tag_name().name()
        )));
    }

    // End of the root's qualified tag name, where new attributes go
    let start = root.range().start + 1;
    let name_end = svg[start..]
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .map(|offset| start + offset)
        .ok_or_else(|| MapstyleError::ParseError("Unterminated <svg> tag".to_string()))?;

    let mut edits: Vec<(std::ops::Range<usize>, String)> = Vec::new();
    let mut inserted = String::new();
    for (name, value) in attributes {
        let rendered = format!("{}=\"{}\"", name, escape_attribute(value));
        let existing = root
            .attributes()
            .find(|attr| attr.name() == *name && attr.namespace().is_none());
        match existing {
            Some(attr) => edits.push((attr.range(), rendered)),
            None => {
                inserted.push(' ');
                inserted.push_str(&rendered);
            }
        }
    }
    if !inserted.is_empty() {
        edits.push((name_end..name_end, inserted));
    }

    let mut output = svg.to_string();
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    for (range, replacement) in edits {
        output.replace_range(range, &replacement);
    }
    Ok(output)
}

/// Encode an SVG document as `data:image/svg+xml;base64,...`
pub fn svg_data_uri(svg: &str) -> String {
    DataUrl {
        media_type: SVG_MEDIA_TYPE.to_string(),
        bytes: svg.as_bytes().to_vec(),
    }
    .encode()
}

/// A mark rendered as a standalone SVG
#[derive(Debug, Clone, PartialEq)]
pub struct MarkImage {
    pub svg: String,
    /// Width and height of the square canvas
    pub size: u32,
}

fn color_attribute(color: Option<&str>) -> Result<String> {
    match color {
        Some(color) => Ok(parse_color(color)?.to_hex()),
        None => Ok("none".to_string()),
    }
}

fn polygon_points(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{},{}", format_number(round2(*x)), format_number(round2(*y))))
        .collect::<Vec<_>>()
        .join(" ")
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Regular star or polygon vertices around `(c, c)`, first vertex up
fn radial_points(c: f64, radii: &[f64], count: usize) -> Vec<(f64, f64)> {
    (0..count)
        .map(|i| {
            let r = radii[i % radii.len()];
            let angle = -PI / 2.0 + i as f64 * 2.0 * PI / count as f64;
            (c + r * angle.cos(), c + r * angle.sin())
        })
        .collect()
}

/// Draw a well-known mark
///
/// Supported names are `Circle`, `Square`, `Triangle`, `Star`, `Cross` and
/// `X` (case-insensitive); anything else is drawn as a circle.
pub fn draw_mark(mark: &MarkSymbolizer) -> Result<MarkImage> {
    let radius = mark.radius.unwrap_or(DEFAULT_MARK_RADIUS);
    let stroke_width = mark.stroke_width.unwrap_or(1.0);
    let size = (2.0 * (radius + stroke_width)).ceil().max(1.0);
    let c = size / 2.0;

    let fill = color_attribute(mark.color.as_deref())?;
    let stroke = color_attribute(mark.stroke_color.as_deref())?;

    let shape = match mark.well_known_name.to_lowercase().as_str() {
        "square" => format!(
            r#"<rect x="{0}" y="{0}" width="{1}" height="{1}"/>"#,
            format_number(c - radius),
            format_number(2.0 * radius)
        ),
        "triangle" => format!(
            r#"<polygon points="{}"/>"#,
            polygon_points(&radial_points(c, &[radius], 3))
        ),
        "star" => format!(
            r#"<polygon points="{}"/>"#,
            polygon_points(&radial_points(c, &[radius, radius * 0.4], 10))
        ),
        "cross" => format!(
            r#"<path d="M{l} {c}H{r}M{c} {l}V{r}"/>"#,
            l = format_number(c - radius),
            r = format_number(c + radius),
            c = format_number(c)
        ),
        "x" => {
            let d = radius * std::f64::consts::FRAC_1_SQRT_2;
            format!(
                r#"<path d="M{a} {a}L{b} {b}M{a} {b}L{b} {a}"/>"#,
                a = format_number(round2(c - d)),
                b = format_number(round2(c + d))
            )
        }
        _ => format!(
            r#"<circle cx="{0}" cy="{0}" r="{1}"/>"#,
            format_number(c),
            format_number(radius)
        ),
    };

    let svg = format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#,
            r#"<g fill="{fill}" fill-opacity="{fill_opacity}" stroke="{stroke}" stroke-opacity="{stroke_opacity}" stroke-width="{stroke_width}">"#,
            "{shape}</g></svg>"
        ),
        size = format_number(size),
        fill = fill,
        fill_opacity = format_number(mark.fill_opacity.unwrap_or(1.0)),
        stroke = stroke,
        stroke_opacity = format_number(mark.stroke_opacity.unwrap_or(1.0)),
        stroke_width = format_number(stroke_width),
        shape = shape
    );
    Ok(MarkImage {
        svg,
        size: size as u32,
    })
}
