//! Color utilities for flat styles

use serde::{Deserialize, Serialize};

use super::format_number;
use crate::{MapstyleError, Result};

/// Opacity attached by [`add_opacity_to_color`] when none is given
pub const DEFAULT_COLOR_OPACITY: f64 = 0.2;

/// Opaque RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// RGB triple with an alpha channel in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Rgba {
    /// CSS `rgba()` notation
    pub fn to_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.r,
            self.g,
            self.b,
            format_number(self.a)
        )
    }
}

/// Attach an alpha channel to a color; `None` falls back to 0.2
pub fn add_opacity_to_color(color: Rgb, opacity: Option<f64>) -> Rgba {
    Rgba {
        r: color.r,
        g: color.g,
        b: color.b,
        a: opacity.unwrap_or(DEFAULT_COLOR_OPACITY),
    }
}

/// Parse any CSS color (named, hex, `rgb()`, `hsl()`, ...) into RGB
pub fn parse_color(value: &str) -> Result<Rgb> {
    let parsed = csscolorparser::parse(value)
        .map_err(|e| MapstyleError::ParseError(format!("Invalid color '{}': {}", value, e)))?;
    let [r, g, b, _] = parsed.to_rgba8();
    Ok(Rgb { r, g, b })
}
