//! SVG symbol recoloring
//!
//! A symbol style references an SVG by `symbolUrl` and carries the colors to
//! paint it with. The colorizer fetches the SVG, applies the style to the
//! root element, encodes the result as a data URI and caches it under the
//! style hash, so the same style is only ever fetched and rewritten once.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::cache::{SymbolCache, SymbolEntry};
use super::fetch::SymbolFetcher;
use super::svg::{set_root_attributes, svg_data_uri};
use crate::style::{
    format_number, get_f64, get_str, hash_and_stringify, is_symbol_style, value_to_string,
    FlatStyle,
};
use crate::{MapstyleError, Result};

/// Style attribute holding the recolored data URI
pub const SYMBOL_URL_CUSTOMIZED: &str = "symbolUrlCustomized";

const MISSING_SYMBOL_SVG: &str = concat!(
    r##"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="32" viewBox="0 0 32 32">"##,
    r##"<rect x="1" y="1" width="30" height="30" fill="#ffffff" stroke="#d9534f" stroke-width="2"/>"##,
    r##"<path d="M9 9L23 23M9 23L23 9" stroke="#d9534f" stroke-width="3"/></svg>"##
);

fn default_color() -> String {
    "#FFCC33".to_string()
}

fn default_fill_opacity() -> f64 {
    0.2
}

fn default_one() -> f64 {
    1.0
}

fn default_size() -> f64 {
    32.0
}

fn default_missing_symbol() -> String {
    svg_data_uri(MISSING_SYMBOL_SVG)
}

/// Fallback values applied while recoloring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorizerOptions {
    /// Fill and stroke color when the style has none
    #[serde(default = "default_color")]
    pub default_color: String,
    #[serde(default = "default_fill_opacity")]
    pub default_fill_opacity: f64,
    #[serde(default = "default_one")]
    pub default_stroke_opacity: f64,
    #[serde(default = "default_one")]
    pub default_stroke_width: f64,
    /// Width and height of the recolored symbol
    #[serde(default = "default_size")]
    pub default_size: f64,
    /// Data URI substituted for symbols that fail to load in a batch
    #[serde(default = "default_missing_symbol")]
    pub missing_symbol: String,
}

impl Default for ColorizerOptions {
    fn default() -> Self {
        Self {
            default_color: default_color(),
            default_fill_opacity: default_fill_opacity(),
            default_stroke_opacity: default_one(),
            default_stroke_width: default_one(),
            default_size: default_size(),
            missing_symbol: default_missing_symbol(),
        }
    }
}

impl ColorizerOptions {
    /// Load options from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MapstyleError::InvalidArgument(format!(
                "Cannot read colorizer options {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Recolors SVG symbols and caches the results
#[derive(Clone)]
pub struct SvgColorizer {
    fetcher: Arc<dyn SymbolFetcher>,
    cache: Arc<SymbolCache>,
    options: Arc<ColorizerOptions>,
}

impl SvgColorizer {
    pub fn new(fetcher: Arc<dyn SymbolFetcher>, cache: Arc<SymbolCache>) -> Self {
        Self::with_options(fetcher, cache, ColorizerOptions::default())
    }

    pub fn with_options(
        fetcher: Arc<dyn SymbolFetcher>,
        cache: Arc<SymbolCache>,
        options: ColorizerOptions,
    ) -> Self {
        Self {
            fetcher,
            cache,
            options: Arc::new(options),
        }
    }

    pub fn cache(&self) -> &Arc<SymbolCache> {
        &self.cache
    }

    pub fn options(&self) -> &ColorizerOptions {
        &self.options
    }

    /// Root attributes a style paints its symbol with
    ///
    /// Colors, stroke width and size treat empty and zero values as absent;
    /// opacities keep an explicit `0`.
    pub fn root_attributes(&self, style: &FlatStyle) -> Vec<(&'static str, String)> {
        let opts = &self.options;
        let color = |key: &str| {
            get_str(style, key)
                .filter(|c| !c.is_empty())
                .unwrap_or(opts.default_color.as_str())
                .to_string()
        };
        let non_zero = |key: &str, default: f64| {
            get_f64(style, key)
                .filter(|v| *v != 0.0)
                .unwrap_or(default)
        };
        let size = format_number(non_zero("size", opts.default_size));
        let dasharray = match style.get("dashArray") {
            Some(Value::Null) | None => "none".to_string(),
            Some(value) => {
                let joined = value_to_string(value);
                if joined.is_empty() {
                    "none".to_string()
                } else {
                    joined
                }
            }
        };

        vec![
            ("fill", color("fillColor")),
            (
                "fill-opacity",
                format_number(get_f64(style, "fillOpacity").unwrap_or(opts.default_fill_opacity)),
            ),
            ("stroke", color("color")),
            (
                "stroke-opacity",
                format_number(get_f64(style, "opacity").unwrap_or(opts.default_stroke_opacity)),
            ),
            (
                "stroke-width",
                format_number(non_zero("weight", opts.default_stroke_width)),
            ),
            ("width", size.clone()),
            ("height", size),
            ("stroke-dasharray", dasharray),
        ]
    }

    /// Recolor the symbol of a style
    ///
    /// Returns `None` for styles without a string `symbolUrl`. Cached styles
    /// are served without fetching.
    pub async fn recolor(&self, style: &FlatStyle) -> Result<Option<String>> {
        if !is_symbol_style(style) {
            return Ok(None);
        }
        let Some(url) = get_str(style, "symbolUrl") else {
            return Ok(None);
        };

        let hash = hash_and_stringify(Some(style))?;
        if let Some(uri) = self.cache.data_uri(hash) {
            debug!("Symbol cache hit for {} ({})", url, hash);
            return Ok(Some(uri));
        }

        debug!("Fetching symbol {}", url);
        let bytes = self.fetcher.fetch(url).await?;
        let svg = String::from_utf8(bytes)
            .map_err(|e| MapstyleError::ParseError(format!("Symbol {} is not UTF-8: {}", url, e)))?;
        let recolored = set_root_attributes(&svg, &self.root_attributes(style))?;
        let uri = svg_data_uri(&recolored);

        let mut customized = style.clone();
        customized.insert(SYMBOL_URL_CUSTOMIZED.to_string(), Value::String(uri.clone()));
        self.cache.register(
            Some(hash),
            Some(SymbolEntry::new(customized).with_data_uri(uri.as_str())),
        )?;
        Ok(Some(uri))
    }

    fn substitute_missing_symbol(&self, style: &mut FlatStyle) {
        style.insert(
            SYMBOL_URL_CUSTOMIZED.to_string(),
            Value::String(self.options.missing_symbol.clone()),
        );
    }

    /// Recolor every symbol style of a list concurrently
    ///
    /// The output mirrors the input position by position. Symbol styles gain
    /// `symbolUrlCustomized`; one that fails gets the missing symbol image.
    pub async fn recolor_batch(&self, styles: Vec<FlatStyle>) -> Vec<FlatStyle> {
        let mut output = styles.clone();
        // Positions still waiting for a result
        let mut pending = vec![false; styles.len()];
        let mut tasks = JoinSet::new();
        for (idx, style) in styles.into_iter().enumerate() {
            if !is_symbol_style(&style) {
                continue;
            }
            pending[idx] = true;
            let colorizer = self.clone();
            tasks.spawn(async move { (idx, colorizer.recolor(&style).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            let (idx, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    // Its position is picked up below
                    warn!("Recolor task failed: {}", e);
                    continue;
                }
            };
            pending[idx] = false;
            match result {
                Ok(Some(uri)) => {
                    output[idx].insert(SYMBOL_URL_CUSTOMIZED.to_string(), Value::String(uri));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Cannot recolor symbol at position {}: {}", idx, e);
                    self.substitute_missing_symbol(&mut output[idx]);
                }
            }
        }

        for (idx, style) in output.iter_mut().enumerate() {
            if pending[idx] {
                warn!("No recolor result for symbol at position {}", idx);
                self.substitute_missing_symbol(style);
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::fetch::DataUrl;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><circle cx="5" cy="5" r="4"/></svg>"#;

    /// In-memory fetcher with a per-url delay
    #[derive(Default)]
    struct MemoryFetcher {
        symbols: HashMap<String, (u64, String)>,
        calls: AtomicUsize,
    }

    impl MemoryFetcher {
        fn with(mut self, url: &str, delay_ms: u64, svg: &str) -> Self {
            self.symbols
                .insert(url.to_string(), (delay_ms, svg.to_string()));
            self
        }
    }

    #[async_trait]
    impl SymbolFetcher for MemoryFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, svg) = self
                .symbols
                .get(url)
                .cloned()
                .ok_or_else(|| MapstyleError::FetchError(format!("404: {}", url)))?;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(svg.into_bytes())
        }
    }

    fn flat(value: serde_json::Value) -> FlatStyle {
        value.as_object().cloned().unwrap()
    }

    fn decode_root(uri: &str) -> HashMap<String, String> {
        let bytes = DataUrl::decode(uri).unwrap().bytes;
        let svg = String::from_utf8(bytes).unwrap();
        let doc = roxmltree::Document::parse(&svg).unwrap();
        doc.root_element()
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect()
    }

    fn colorizer(fetcher: MemoryFetcher) -> (SvgColorizer, Arc<MemoryFetcher>) {
        let fetcher = Arc::new(fetcher);
        let colorizer = SvgColorizer::new(fetcher.clone(), Arc::new(SymbolCache::new()));
        (colorizer, fetcher)
    }

    #[tokio::test]
    async fn test_recolor_applies_style_and_defaults() {
        let (colorizer, _) = colorizer(MemoryFetcher::default().with("/path/symbol.svg", 0, SVG));
        let style = flat(json!({
            "symbolUrl": "/path/symbol.svg",
            "color": "#005544",
            "fillColor": "#218f8f"
        }));

        let uri = colorizer.recolor(&style).await.unwrap().unwrap();
        assert!(uri.starts_with("data:image/svg+xml;base64,"));
        let attrs = decode_root(&uri);
        assert_eq!(attrs["fill"], "#218f8f");
        assert_eq!(attrs["fill-opacity"], "0.2");
        assert_eq!(attrs["stroke"], "#005544");
        assert_eq!(attrs["stroke-opacity"], "1");
        assert_eq!(attrs["stroke-width"], "1");
        assert_eq!(attrs["width"], "32");
        assert_eq!(attrs["height"], "32");
        assert_eq!(attrs["stroke-dasharray"], "none");
        assert_eq!(attrs["viewBox"], "0 0 10 10");

        let cached = colorizer.cache().fetch(-1572904514).unwrap();
        assert_eq!(cached[SYMBOL_URL_CUSTOMIZED], json!(uri));
        assert_eq!(cached["fillColor"], "#218f8f");
    }

    #[test]
    fn test_root_attributes_edge_values() {
        let (colorizer, _) = colorizer(MemoryFetcher::default());
        let attrs: HashMap<_, _> = colorizer
            .root_attributes(&flat(json!({
                "symbolUrl": "a.svg",
                "color": "",
                "opacity": 0,
                "fillOpacity": 0,
                "weight": 0,
                "size": 48,
                "dashArray": ["4", "2"]
            })))
            .into_iter()
            .collect();
        assert_eq!(attrs["fill"], "#FFCC33");
        assert_eq!(attrs["stroke"], "#FFCC33");
        assert_eq!(attrs["stroke-opacity"], "0");
        assert_eq!(attrs["fill-opacity"], "0");
        assert_eq!(attrs["stroke-width"], "1");
        assert_eq!(attrs["width"], "48");
        assert_eq!(attrs["stroke-dasharray"], "4,2");
    }

    #[tokio::test]
    async fn test_recolor_skips_non_symbol_styles() {
        let (colorizer, fetcher) = colorizer(MemoryFetcher::default());
        assert_eq!(colorizer.recolor(&flat(json!({"color": "#000"}))).await.unwrap(), None);
        assert_eq!(colorizer.recolor(&flat(json!({"symbolUrl": 42}))).await.unwrap(), None);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recolor_uses_cache() {
        let (colorizer, fetcher) = colorizer(MemoryFetcher::default().with("a.svg", 0, SVG));
        let style = flat(json!({"symbolUrl": "a.svg", "fillColor": "#ff0000"}));
        let first = colorizer.recolor(&style).await.unwrap();
        let second = colorizer.recolor(&style).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        let other = flat(json!({"symbolUrl": "a.svg", "fillColor": "#00ff00"}));
        colorizer.recolor(&other).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(colorizer.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_recolor_errors_propagate() {
        let (colorizer, _) = colorizer(
            MemoryFetcher::default()
                .with("page.svg", 0, "<html></html>")
                .with("broken.svg", 0, "<svg"),
        );
        let err = colorizer
            .recolor(&flat(json!({"symbolUrl": "missing.svg"})))
            .await
            .unwrap_err();
        assert!(matches!(err, MapstyleError::FetchError(_)));
        let err = colorizer
            .recolor(&flat(json!({"symbolUrl": "page.svg"})))
            .await
            .unwrap_err();
        assert!(matches!(err, MapstyleError::ParseError(_)));
        let err = colorizer
            .recolor(&flat(json!({"symbolUrl": "broken.svg"})))
            .await
            .unwrap_err();
        assert!(matches!(err, MapstyleError::ParseError(_)));
        assert!(colorizer.cache().is_empty());
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let (colorizer, _) = colorizer(
            MemoryFetcher::default()
                .with("slow.svg", 50, SVG)
                .with("fast.svg", 0, SVG),
        );
        let styles = vec![
            flat(json!({"color": "#000000", "weight": 2})),
            flat(json!({"symbolUrl": "slow.svg", "fillColor": "#ff0000"})),
            flat(json!({"symbolUrl": "fast.svg", "fillColor": "#0000ff"})),
        ];
        let out = colorizer.recolor_batch(styles.clone()).await;

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], styles[0]);
        let slow = out[1][SYMBOL_URL_CUSTOMIZED].as_str().unwrap();
        let fast = out[2][SYMBOL_URL_CUSTOMIZED].as_str().unwrap();
        assert_eq!(decode_root(slow)["fill"], "#ff0000");
        assert_eq!(decode_root(fast)["fill"], "#0000ff");
        assert_eq!(out[1]["symbolUrl"], "slow.svg");
    }

    #[tokio::test]
    async fn test_batch_substitutes_missing_symbol() {
        let (colorizer, _) = colorizer(MemoryFetcher::default().with("ok.svg", 0, SVG));
        let out = colorizer
            .recolor_batch(vec![
                flat(json!({"symbolUrl": "gone.svg"})),
                flat(json!({"symbolUrl": "ok.svg"})),
            ])
            .await;
        assert_eq!(
            out[0][SYMBOL_URL_CUSTOMIZED],
            json!(colorizer.options().missing_symbol)
        );
        assert_ne!(out[1][SYMBOL_URL_CUSTOMIZED], out[0][SYMBOL_URL_CUSTOMIZED]);
    }

    /// Fetcher whose task dies mid-flight
    struct PanickingFetcher;

    #[async_trait]
    impl SymbolFetcher for PanickingFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            if url.contains("crash") {
                panic!("fetcher crashed on {}", url);
            }
            Ok(SVG.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn test_batch_substitutes_missing_symbol_when_task_dies() {
        let colorizer = SvgColorizer::new(Arc::new(PanickingFetcher), Arc::new(SymbolCache::new()));
        let styles = vec![
            flat(json!({"symbolUrl": "/crash.svg", "color": "#000000"})),
            flat(json!({"symbolUrl": "/fine.svg", "color": "#000000"})),
            flat(json!({"color": "#000000"})),
        ];

        let output = colorizer.recolor_batch(styles).await;
        assert_eq!(
            output[0][SYMBOL_URL_CUSTOMIZED],
            json!(colorizer.options().missing_symbol)
        );
        assert!(output[1][SYMBOL_URL_CUSTOMIZED]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,"));
        assert!(!output[2].contains_key(SYMBOL_URL_CUSTOMIZED));
    }

    #[test]
    fn test_options_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colorizer.json");
        std::fs::write(&path, r##"{"default_color": "#333333", "default_size": 24}"##).unwrap();

        let options = ColorizerOptions::from_json_file(&path).unwrap();
        assert_eq!(options.default_color, "#333333");
        assert_eq!(options.default_size, 24.0);
        assert_eq!(options.default_fill_opacity, 0.2);
        assert_eq!(options.missing_symbol, ColorizerOptions::default().missing_symbol);

        assert!(ColorizerOptions::from_json_file(dir.path().join("nope.json")).is_err());
    }
}
