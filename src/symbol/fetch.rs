//! Symbol image fetching
//!
//! The colorizer and icon drawing never touch the network or the filesystem
//! directly; they go through a [`SymbolFetcher`]. [`FileFetcher`] serves
//! `data:` URLs, `file://` URLs and paths relative to a root directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use tracing::debug;

use crate::{MapstyleError, Result};

const DATA_URL_PREFIX: &str = "data:";
const FILE_URL_PREFIX: &str = "file://";

/// Source of raw symbol bytes
#[async_trait]
pub trait SymbolFetcher: Send + Sync {
    /// Fetch the resource at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Decoded `data:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type without parameters, e.g. `image/svg+xml`
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Decode a `data:[<mediatype>][;base64],<data>` URL
    ///
    /// Base64 payloads may contain ASCII whitespace; other payloads are
    /// percent-decoded.
    pub fn decode(url: &str) -> Result<Self> {
        let invalid = |reason: &str| MapstyleError::FetchError(format!("Invalid data URL: {}", reason));

        let rest = url
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or_else(|| invalid("missing 'data:' prefix"))?;
        let (header, payload) = rest.split_once(',').ok_or_else(|| invalid("missing ','"))?;

        let mut params = header.split(';').map(str::trim);
        let media_type = match params.next() {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => "text/plain".to_string(),
        };
        let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

        let bytes = if is_base64 {
            let cleaned: Vec<u8> = payload
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            base64::engine::general_purpose::STANDARD
                .decode(cleaned)
                .map_err(|e| invalid(&format!("bad base64 payload ({})", e)))?
        } else {
            percent_decode(payload).ok_or_else(|| invalid("bad percent escape"))?
        };

        Ok(Self { media_type, bytes })
    }

    /// Encode as a base64 data URL
    pub fn encode(&self) -> String {
        format!(
            "{}{};base64,{}",
            DATA_URL_PREFIX,
            self.media_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

fn percent_decode(input: &str) -> Option<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
}

/// Fetcher for data URLs and local files
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    /// Relative symbol paths resolve against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> Result<PathBuf> {
        if let Some(path) = url.strip_prefix(FILE_URL_PREFIX) {
            return Ok(PathBuf::from(path));
        }
        if url.contains("://") {
            return Err(MapstyleError::FetchError(format!(
                "Unsupported URL scheme: {}",
                url
            )));
        }
        let relative = Path::new(url.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(MapstyleError::FetchError(format!(
                "Path escapes the symbol root: {}",
                url
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl Default for FileFetcher {
    fn default() -> Self {
        Self::new(".")
    }
}

#[async_trait]
impl SymbolFetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if url.starts_with(DATA_URL_PREFIX) {
            return Ok(DataUrl::decode(url)?.bytes);
        }
        let path = self.resolve(url)?;
        debug!("Reading symbol {}", path.display());
        tokio::fs::read(&path)
            .await
            .map_err(|e| MapstyleError::FetchError(format!("{}: {}", path.display(), e)))
    }
}
