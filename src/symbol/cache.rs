//! Content-addressed symbol cache
//!
//! Recolored symbols are stored under the hash of the flat style that
//! produced them (see [`hash_and_stringify`](crate::style::hash_and_stringify)).
//! Each entry keeps:
//! - The style, extended with `symbolUrlCustomized`
//! - The recolored data URI, once known
//!
//! The cache is unbounded and entries never expire. Share it with `Arc`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::style::FlatStyle;
use crate::{MapstyleError, Result};

/// A cached symbol
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    /// Style the symbol was produced from
    pub style: FlatStyle,
    /// Recolored image as a data URI
    pub data_uri: Option<String>,
}

impl SymbolEntry {
    pub fn new(style: FlatStyle) -> Self {
        Self {
            style,
            data_uri: None,
        }
    }

    pub fn with_data_uri(mut self, data_uri: impl Into<String>) -> Self {
        self.data_uri = Some(data_uri.into());
        self
    }
}

/// Symbols indexed by style hash
#[derive(Debug, Default)]
pub struct SymbolCache {
    entries: RwLock<HashMap<i32, SymbolEntry>>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<i32, SymbolEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<i32, SymbolEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or overwrite the entry for `hash`
    ///
    /// Both arguments are mandatory.
    pub fn register(&self, hash: Option<i32>, entry: Option<SymbolEntry>) -> Result<()> {
        let (Some(hash), Some(entry)) = (hash, entry) else {
            return Err(MapstyleError::InvalidArgument(
                "register: specify mandatory params: hash, style".to_string(),
            ));
        };
        self.write().insert(hash, entry);
        Ok(())
    }

    /// Style stored under `hash`
    pub fn fetch(&self, hash: i32) -> Option<FlatStyle> {
        self.read().get(&hash).map(|entry| entry.style.clone())
    }

    /// Full entry stored under `hash`, including the data URI
    pub fn fetch_entry(&self, hash: i32) -> Option<SymbolEntry> {
        self.read().get(&hash).cloned()
    }

    /// Recolored data URI stored under `hash`
    pub fn data_uri(&self, hash: i32) -> Option<String> {
        self.read().get(&hash).and_then(|entry| entry.data_uri.clone())
    }

    pub fn contains(&self, hash: i32) -> bool {
        self.read().contains_key(&hash)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}
