//! Style encodings
//!
//! A [`StyleParser`] converts between a [`StructuredStyle`] and one textual
//! encoding (GeoStyler JSON, MapStore flat JSON, SLD, ...). Parsers are
//! looked up by format name in a [`ParserRegistry`], either registered ready
//! to use or through a loader that builds them on first use.
//!
//! # Example
//!
//! ```rust,ignore
//! use mapstyle::parser::ParserRegistry;
//!
//! let registry = ParserRegistry::with_builtin();
//! let parser = registry.resolve("mapstore").await?.expect("built-in");
//! let style = parser.read_style(r#"{"color": "#3075e9", "weight": 2}"#).await?;
//! ```

mod geostyler;
mod mapstore;

pub use geostyler::GeoStylerParser;
pub use mapstore::MapStoreParser;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::geostyler::StructuredStyle;
use crate::Result;

/// Reads and writes one style encoding
#[async_trait]
pub trait StyleParser: Send + Sync {
    /// Format name the parser is registered under
    fn name(&self) -> &'static str;

    /// Decode an encoded style
    async fn read_style(&self, encoded: &str) -> Result<StructuredStyle>;

    /// Encode a style
    async fn write_style(&self, style: &StructuredStyle) -> Result<String>;
}

/// Future produced by a parser loader
pub type LoaderFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn StyleParser>>> + Send>>;

type Loader = Arc<dyn Fn() -> LoaderFuture + Send + Sync>;

#[derive(Clone)]
enum Entry {
    Ready(Arc<dyn StyleParser>),
    Lazy(Loader),
}

/// Parsers by case-sensitive format name
#[derive(Default)]
pub struct ParserRegistry {
    entries: RwLock<HashMap<String, Entry>>,
}

impl ParserRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `geostyler` and `mapstore` parsers
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register(GeoStylerParser.name(), Arc::new(GeoStylerParser));
        registry.register(MapStoreParser.name(), Arc::new(MapStoreParser));
        registry
    }

    /// Register a parser, replacing any previous one under `name`
    pub fn register(&self, name: impl Into<String>, parser: Arc<dyn StyleParser>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), Entry::Ready(parser));
    }

    /// Register a loader run the first time `name` is resolved
    ///
    /// A loader that fails is retried on the next resolution.
    pub fn register_lazy<F, Fut>(&self, name: impl Into<String>, loader: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn StyleParser>>> + Send + 'static,
    {
        let loader: Loader = Arc::new(move || Box::pin(loader()) as LoaderFuture);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), Entry::Lazy(loader));
    }

    /// Parser for a format
    ///
    /// Unknown formats resolve to `None`; a failing loader is an error.
    pub async fn resolve(&self, name: &str) -> Result<Option<Arc<dyn StyleParser>>> {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();

        match entry {
            None => {
                debug!("No parser registered for format '{}'", name);
                Ok(None)
            }
            Some(Entry::Ready(parser)) => Ok(Some(parser)),
            Some(Entry::Lazy(loader)) => {
                info!("Loading parser for format '{}'", name);
                let parser = loader().await?;
                self.entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(name.to_string(), Entry::Ready(parser.clone()));
                Ok(Some(parser))
            }
        }
    }

    /// Registered format names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geostyler::Rule;
    use crate::MapstyleError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stand-in for an external encoding: the body name travels as the text
    struct NamedParser(&'static str);

    #[async_trait]
    impl StyleParser for NamedParser {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn read_style(&self, encoded: &str) -> Result<StructuredStyle> {
            let mut style = StructuredStyle::from_rules(vec![Rule::default()]);
            style.body.name = encoded.to_string();
            Ok(style)
        }

        async fn write_style(&self, style: &StructuredStyle) -> Result<String> {
            Ok(format!("{}:{}", self.0, style.body.name))
        }
    }

    #[tokio::test]
    async fn test_resolve_registered_parsers() {
        let registry = ParserRegistry::new();
        registry.register("sld", Arc::new(NamedParser("sld")));
        registry.register("css", Arc::new(NamedParser("css")));

        let sld = registry.resolve("sld").await.unwrap().unwrap();
        assert_eq!(sld.name(), "sld");
        let style = sld.read_style("roads").await.unwrap();
        assert_eq!(style.body.name, "roads");
        assert_eq!(sld.write_style(&style).await.unwrap(), "sld:roads");

        let css = registry.resolve("css").await.unwrap().unwrap();
        assert_eq!(css.name(), "css");
        assert_eq!(registry.names(), vec!["css", "sld"]);
    }

    #[tokio::test]
    async fn test_unknown_and_case_sensitive_names() {
        let registry = ParserRegistry::new();
        registry.register("sld", Arc::new(NamedParser("sld")));
        assert!(registry.resolve("SLD").await.unwrap().is_none());
        assert!(registry.resolve("mbstyle").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lazy_loader_runs_once() {
        let registry = ParserRegistry::new();
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        registry.register_lazy("css", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, MapstyleError>(Arc::new(NamedParser("css")) as Arc<dyn StyleParser>)
            }
        });
        assert_eq!(loads.load(Ordering::SeqCst), 0);

        for _ in 0..3 {
            let parser = registry.resolve("css").await.unwrap().unwrap();
            assert_eq!(parser.name(), "css");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_loader_is_an_error() {
        let registry = ParserRegistry::new();
        registry.register_lazy("sld", || async {
            Err::<Arc<dyn StyleParser>, _>(MapstyleError::FormatError(
                "sld support not installed".to_string(),
            ))
        });
        let err = registry.resolve("sld").await.err().unwrap();
        assert!(matches!(err, MapstyleError::FormatError(_)));
        // Still registered, so resolving again retries
        assert!(registry.resolve("sld").await.is_err());
    }

    #[tokio::test]
    async fn test_builtin_parsers() {
        let registry = ParserRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["geostyler", "mapstore"]);
        assert_eq!(
            registry.resolve("geostyler").await.unwrap().unwrap().name(),
            "geostyler"
        );
        assert_eq!(
            registry.resolve("mapstore").await.unwrap().unwrap().name(),
            "mapstore"
        );
    }
}
