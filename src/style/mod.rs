//! Flat (legacy) style objects
//!
//! A flat style is an open attribute bag such as
//! `{"color": "#3075e9", "weight": 2, "fillColor": "#f2f2f2"}`. There is no
//! fixed schema: which attributes are present decides which visual kinds the
//! style exhibits (see [`classify`]).
//!
//! Key order is preserved from the source document, which keeps
//! [`hash_and_stringify`] stable across processes.

mod classify;
pub mod color;
mod hash;

pub use classify::{
    classify, is_attr_present, is_circle_style, is_fill_style, is_marker_style, is_stroke_style,
    is_symbol_style, is_text_style, styler_title, StyleKind, CIRCLE_ATTRIBUTES, FILL_ATTRIBUTES,
    MARKER_ATTRIBUTES, STROKE_ATTRIBUTES, SYMBOL_ATTRIBUTES, TEXT_ATTRIBUTES,
};
pub use color::{add_opacity_to_color, parse_color, Rgb, Rgba};
pub use hash::{hash_and_stringify, hash_code};

use serde_json::{Map, Number, Value};

/// Flat style: attribute name to primitive value, in insertion order
pub type FlatStyle = Map<String, Value>;

/// Read a string attribute
pub fn get_str<'a>(style: &'a FlatStyle, key: &str) -> Option<&'a str> {
    style.get(key).and_then(Value::as_str)
}

/// Read a numeric attribute; numeric strings are accepted
pub fn get_f64(style: &FlatStyle, key: &str) -> Option<f64> {
    match style.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Largest magnitude below which every whole `f64` is an exact integer (2^53)
const MAX_SAFE_WHOLE: f64 = 9_007_199_254_740_992.0;

fn as_whole(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_SAFE_WHOLE)
        .then_some(value as i64)
}

/// Format a number the way a browser prints it (`2`, `0.5`, `-3.25`)
pub fn format_number(value: f64) -> String {
    match as_whole(value) {
        Some(whole) => whole.to_string(),
        None => value.to_string(),
    }
}

/// JSON number for `value`, written as an integer when it is whole
///
/// Non-finite values have no JSON form and become `null`.
pub fn json_number(value: f64) -> Value {
    match as_whole(value) {
        Some(whole) => Value::from(whole),
        None => Number::from_f64(value).map_or(Value::Null, Value::Number),
    }
}

/// Rewrite whole floating-point numbers (`2.0`) as integers (`2`), recursively
///
/// Browsers print both the same way, so documents compared or hashed
/// against theirs need this form.
pub fn normalize_numbers(value: &mut Value) {
    match value {
        Value::Number(n) => {
            if let Some(whole) = n.as_f64().filter(|_| n.is_f64()).and_then(as_whole) {
                *n = Number::from(whole);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_numbers),
        Value::Object(map) => map.values_mut().for_each(normalize_numbers),
        _ => {}
    }
}

/// String form of a style value as used in attributes and substring filters
///
/// Arrays are joined with commas, null renders as an empty string.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-3.25), "-3.25");
        assert_eq!(format_number(16.0), "16");
        assert_eq!(format_number(1e16), "10000000000000000");
    }

    #[test]
    fn test_normalize_numbers() {
        let mut value = json!({"weight": 2.0, "dash": [6.0, 1.5], "nested": {"radius": 10.0}, "n": 3});
        normalize_numbers(&mut value);
        assert_eq!(value, json!({"weight": 2, "dash": [6, 1.5], "nested": {"radius": 10}, "n": 3}));
        assert_eq!(value.to_string(), r#"{"weight":2,"dash":[6,1.5],"nested":{"radius":10},"n":3}"#);

        assert_eq!(json_number(1.0), json!(1));
        assert_eq!(json_number(0.3), json!(0.3));
        assert_eq!(json_number(f64::NAN), Value::Null);
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!(10)), "10");
        assert_eq!(value_to_string(&json!(2.0)), "2");
        assert_eq!(value_to_string(&json!("Abc")), "Abc");
        assert_eq!(value_to_string(&json!([4, 2])), "4,2");
        assert_eq!(value_to_string(&Value::Null), "");
        assert_eq!(value_to_string(&json!(true)), "true");
    }

    #[test]
    fn test_getters() {
        let style = json!({"weight": 2, "radius": "10", "color": "#ff0000"});
        let style = style.as_object().unwrap();
        assert_eq!(get_f64(style, "weight"), Some(2.0));
        assert_eq!(get_f64(style, "radius"), Some(10.0));
        assert_eq!(get_f64(style, "color"), None);
        assert_eq!(get_str(style, "color"), Some("#ff0000"));
        assert_eq!(get_str(style, "missing"), None);
    }
}
