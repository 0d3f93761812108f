//! MapStore flat style encoding
//!
//! Reads a flat style object (or an array of them) through the layer-level
//! translation; writes one flat style per symbolizer. Filters, scale ranges
//! and symbolizers with no flat form (Raster, ...) are dropped on write.

use async_trait::async_trait;
use serde_json::Value;

use super::StyleParser;
use crate::geostyler::{flat_style_to_rules, symbolizer_to_flat_style, StructuredStyle};
use crate::style::FlatStyle;
use crate::{MapstyleError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct MapStoreParser;

#[async_trait]
impl StyleParser for MapStoreParser {
    fn name(&self) -> &'static str {
        "mapstore"
    }

    async fn read_style(&self, encoded: &str) -> Result<StructuredStyle> {
        let value: Value = serde_json::from_str(encoded)
            .map_err(|e| MapstyleError::FormatError(format!("Invalid MapStore style: {}", e)))?;
        let styles: Vec<FlatStyle> = match value {
            Value::Object(style) => vec![style],
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(style) => Ok(style),
                    other => Err(MapstyleError::FormatError(format!(
                        "Expected a flat style object, got {}",
                        other
                    ))),
                })
                .collect::<Result<_>>()?,
            other => {
                return Err(MapstyleError::FormatError(format!(
                    "Expected a flat style object or array, got {}",
                    other
                )))
            }
        };
        let rules = styles.iter().flat_map(flat_style_to_rules).collect();
        Ok(StructuredStyle::from_rules(rules))
    }

    async fn write_style(&self, style: &StructuredStyle) -> Result<String> {
        let flat: Vec<FlatStyle> = style
            .symbolizers()
            .map(symbolizer_to_flat_style)
            .filter(|flat| !flat.is_empty())
            .collect();
        Ok(serde_json::to_string_pretty(&flat)?)
    }
}
