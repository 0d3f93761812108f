//! Structured (GeoStyler) style model
//!
//! This module contains the rule-based style document, the filter language
//! used to match rules against features, and the translation from flat
//! styles.
//!
//! # Architecture
//!
//! - `types` - `StructuredStyle`, `Rule` and the closed `Symbolizer` union
//! - `filter` - `FilterExpression` and its evaluator
//! - `translate` - flat to structured (and back), default styles

pub mod filter;
pub mod translate;
pub mod types;

pub use filter::{geostyler_style_filter, ComparisonOp, FilterExpression, LogicalOp};
pub use translate::{
    apply_default_style_to_layer, default_style, flat_style_to_rules, flat_style_to_symbolizer,
    layer_to_geostyler_style, symbolizer_to_flat_style, translate_layer,
};
pub use types::*;
