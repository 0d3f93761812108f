//! Symbols: caching, recoloring and icon images
//!
//! # Architecture
//!
//! - `fetch` - `SymbolFetcher` trait, file and data URL fetching
//! - `cache` - `SymbolCache`, recolored symbols by style hash
//! - `svg` - root attribute rewriting, data URIs, mark drawing
//! - `colorizer` - `SvgColorizer`, single and batch recoloring
//! - `icons` - image ids and `draw_icons`

pub mod cache;
pub mod colorizer;
pub mod fetch;
pub mod icons;
pub mod svg;

pub use cache::{SymbolCache, SymbolEntry};
pub use colorizer::{ColorizerOptions, SvgColorizer, SYMBOL_URL_CUSTOMIZED};
pub use fetch::{DataUrl, FileFetcher, SymbolFetcher};
pub use icons::{draw_icons, get_image_id_from_symbolizer, IconImage};
pub use svg::{draw_mark, set_root_attributes, svg_data_uri, MarkImage};
