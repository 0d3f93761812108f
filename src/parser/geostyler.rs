//! GeoStyler JSON encoding

use async_trait::async_trait;

use super::StyleParser;
use crate::geostyler::StructuredStyle;
use crate::{MapstyleError, Result};

/// The structured style model serialized as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoStylerParser;

#[async_trait]
impl StyleParser for GeoStylerParser {
    fn name(&self) -> &'static str {
        "geostyler"
    }

    async fn read_style(&self, encoded: &str) -> Result<StructuredStyle> {
        serde_json::from_str(encoded)
            .map_err(|e| MapstyleError::FormatError(format!("Invalid GeoStyler style: {}", e)))
    }

    async fn write_style(&self, style: &StructuredStyle) -> Result<String> {
        Ok(serde_json::to_string_pretty(style)?)
    }
}
