/*!
# mapstyle - map layer style translation

mapstyle converts the flat, attribute-bag styles attached to vector map layers
and annotation features into rule-based [GeoStyler](https://geostyler.org)
styles, and produces the derived artifacts a renderer needs: recolored SVG
symbols as data URIs, content-addressed symbol caches and icon images.

## Example

```rust,ignore
use mapstyle::geostyler::layer_to_geostyler_style;
use mapstyle::layer::Layer;

let layer: Layer = serde_json::from_str(r##"{"style": {"color": "#3075e9", "weight": 2}}"##)?;
let style = layer_to_geostyler_style(&layer).await;
assert_eq!(style.body.rules.len(), 1);
```

## Core Components

- [`style`] - Flat styles, kind classification and content hashing
- [`geostyler`] - Structured style model, filters and translation
- [`layer`] - Layers, features and geometries
- [`geometry`] - Named geometry functions
- [`symbol`] - Symbol cache, SVG recoloring and icon generation
- [`parser`] - Pluggable style encodings
*/

pub mod geometry;
pub mod geostyler;
pub mod layer;
pub mod parser;
pub mod style;
pub mod symbol;

pub use geostyler::{FilterExpression, Rule, StructuredStyle, Symbolizer};
pub use layer::{Feature, Layer};
pub use style::{FlatStyle, StyleKind};

/// Crate version, as reported by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum MapstyleError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Format error: {0}")]
    FormatError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapstyleError>;
