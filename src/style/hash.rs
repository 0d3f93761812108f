//! Content hashing for flat styles
//!
//! The hash must stay bit-for-bit compatible with caches written by other
//! processes: a Java-style `s[0]*31^(n-1) + ... + s[n-1]` over UTF-16 code
//! units, wrapping at 32 bits.

use serde_json::Value;

use super::{normalize_numbers, FlatStyle};
use crate::{MapstyleError, Result};

/// 32-bit signed string hash
pub fn hash_code(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |acc, unit| acc.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Serialize a style to compact JSON (insertion key order) and hash it
///
/// Whole numbers serialize without a fraction (`2`, never `2.0`), matching
/// the browser's `JSON.stringify`.
pub fn hash_and_stringify(style: Option<&FlatStyle>) -> Result<i32> {
    let style = style.ok_or_else(|| {
        MapstyleError::InvalidArgument(
            "hash_and_stringify: specify mandatory params: style".to_string(),
        )
    })?;
    let mut canonical = Value::Object(style.clone());
    normalize_numbers(&mut canonical);
    let serialized = serde_json::to_string(&canonical)?;
    Ok(hash_code(&serialized))
}
