//! Icon images for point symbolizers
//!
//! Renderers that draw points from an image atlas need every Mark and Icon
//! of a style as a ready-to-load image, keyed by a stable id.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use super::fetch::{DataUrl, SymbolFetcher};
use super::svg::{draw_mark, svg_data_uri, SVG_MEDIA_TYPE};
use crate::geostyler::{IconSymbolizer, MarkSymbolizer, StructuredStyle, Symbolizer};
use crate::style::format_number;
use crate::Result;

/// Size of icons whose symbolizer and image declare none
pub const DEFAULT_ICON_SIZE: u32 = 32;

/// An image ready for an icon atlas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IconImage {
    pub id: String,
    /// Data URI of the image
    pub src: String,
    pub width: u32,
    pub height: u32,
}

fn opt_str(value: Option<&str>) -> &str {
    value.unwrap_or("")
}

fn opt_num(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

fn mark_id(mark: &MarkSymbolizer) -> String {
    format!(
        "{}:{}:{}:{}:{}:{}:{}",
        mark.well_known_name,
        opt_str(mark.color.as_deref()),
        opt_num(mark.fill_opacity),
        opt_str(mark.stroke_color.as_deref()),
        opt_num(mark.stroke_opacity),
        opt_num(mark.stroke_width),
        opt_num(mark.radius)
    )
}

/// Stable image id of a point symbolizer
///
/// Marks are identified by their drawing parameters (rotation excluded),
/// icons by their image source. Other kinds have no image.
pub fn get_image_id_from_symbolizer(symbolizer: &Symbolizer) -> Option<String> {
    match symbolizer {
        Symbolizer::Mark(mark) => Some(mark_id(mark)),
        Symbolizer::Icon(icon) => Some(icon.image.clone()),
        _ => None,
    }
}

fn media_type_for(url: &str, bytes: &[u8]) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    let by_extension = [
        (".svg", SVG_MEDIA_TYPE),
        (".png", "image/png"),
        (".jpg", "image/jpeg"),
        (".jpeg", "image/jpeg"),
        (".gif", "image/gif"),
        (".webp", "image/webp"),
    ];
    if let Some((_, media_type)) = by_extension.iter().find(|(ext, _)| path.ends_with(ext)) {
        return *media_type;
    }
    if bytes.starts_with(b"\x89PNG") {
        "image/png"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.starts_with(&[0xFF, 0xD8]) {
        "image/jpeg"
    } else if String::from_utf8_lossy(&bytes[..bytes.len().min(512)]).contains("<svg") {
        SVG_MEDIA_TYPE
    } else {
        "application/octet-stream"
    }
}

fn svg_size(bytes: &[u8]) -> Option<u32> {
    let svg = std::str::from_utf8(bytes).ok()?;
    let doc = roxmltree::Document::parse(svg).ok()?;
    let width = doc.root_element().attribute("width")?;
    let numeric = width.trim_end_matches("px").trim().parse::<f64>().ok()?;
    Some(numeric.round() as u32)
}

async fn load_icon(icon: &IconSymbolizer, fetcher: &dyn SymbolFetcher) -> Result<IconImage> {
    let data = if icon.image.starts_with("data:") {
        DataUrl::decode(&icon.image)?
    } else {
        let bytes = fetcher.fetch(&icon.image).await?;
        DataUrl {
            media_type: media_type_for(&icon.image, &bytes).to_string(),
            bytes,
        }
    };

    let intrinsic = if data.media_type == SVG_MEDIA_TYPE {
        svg_size(&data.bytes)
    } else {
        None
    };
    let size = icon
        .size
        .map(|s| s.round() as u32)
        .or(intrinsic)
        .unwrap_or(DEFAULT_ICON_SIZE);
    let src = if icon.image.starts_with("data:") {
        icon.image.clone()
    } else {
        data.encode()
    };

    Ok(IconImage {
        id: icon.image.clone(),
        src,
        width: size,
        height: size,
    })
}

/// Produce an image for every distinct Mark and Icon of a style
///
/// Images come out in symbolizer order, one per image id. Icons or marks
/// that can't be loaded are skipped with a warning.
pub async fn draw_icons(style: &StructuredStyle, fetcher: &dyn SymbolFetcher) -> Vec<IconImage> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for symbolizer in style.symbolizers() {
        let Some(id) = get_image_id_from_symbolizer(symbolizer) else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }

        let image = match symbolizer {
            Symbolizer::Mark(mark) => draw_mark(mark).map(|drawn| IconImage {
                id: id.clone(),
                src: svg_data_uri(&drawn.svg),
                width: drawn.size,
                height: drawn.size,
            }),
            Symbolizer::Icon(icon) => load_icon(icon, fetcher).await,
            _ => continue,
        };
        match image {
            Ok(image) => images.push(image),
            Err(e) => warn!("Skipping icon {}: {}", id, e),
        }
    }
    images
}
