//! Structured style types
//!
//! Field names serialize in the GeoStyler camelCase form so documents can be
//! exchanged with other GeoStyler tooling unchanged.
//!
//! Documents read from elsewhere round-trip without loss: fields the model
//! doesn't know are kept in each level's `extra` map, a field whose value
//! doesn't fit its typed slot stays there verbatim, and symbolizers of an
//! unknown kind (or that don't parse) are kept as [`Symbolizer::Other`].

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use super::filter::{geostyler_style_filter, FilterExpression};
use crate::layer::Feature;
use crate::style::{json_number, normalize_numbers};

/// Remove `key` from `map` when its value parses as `T`
///
/// Values that don't parse stay in the map, so they are written back as
/// they came.
fn take_field<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = map.get(key)?;
    match T::deserialize(value) {
        Ok(parsed) => {
            map.remove(key);
            Some(parsed)
        }
        Err(e) => {
            debug!("Keeping '{}' verbatim: {}", key, e);
            None
        }
    }
}

fn serialize_number<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => json_number(*value).serialize(serializer),
        None => serializer.serialize_none(),
    }
}

/// Style document format marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StyleFormat {
    #[default]
    #[serde(rename = "geostyler")]
    GeoStyler,
}

/// A complete structured style document
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredStyle {
    pub format: StyleFormat,
    pub body: StyleBody,
    pub metadata: Option<StyleMetadata>,
    /// Document fields outside the model
    pub extra: Map<String, Value>,
}

/// Named list of rules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBody {
    pub name: String,
    pub rules: Vec<Rule>,
    pub extra: Map<String, Value>,
}

/// Editor hints stored alongside a style
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleMetadata {
    #[serde(
        rename = "editorType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub editor_type: Option<EditorType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorType {
    #[default]
    Visual,
    Textarea,
}

/// A filter plus the symbolizers to draw for matching features
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    pub name: String,
    pub filter: Option<FilterExpression>,
    pub scale_denominator: Option<ScaleDenominator>,
    pub symbolizers: Vec<Symbolizer>,
    /// Rule fields outside the model, including filters the evaluator
    /// doesn't support
    pub extra: Map<String, Value>,
}

/// Scale range a rule is visible in; `min` inclusive, `max` exclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScaleDenominator {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_number"
    )]
    pub min: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_number"
    )]
    pub max: Option<f64>,
}

impl ScaleDenominator {
    pub fn contains(&self, scale: f64) -> bool {
        self.min.map_or(true, |min| scale >= min) && self.max.map_or(true, |max| scale < max)
    }
}

impl Rule {
    /// Unnamed, unfiltered rule with one symbolizer
    pub fn with_symbolizer(symbolizer: Symbolizer) -> Self {
        Self {
            symbolizers: vec![symbolizer],
            ..Default::default()
        }
    }

    /// Whether the rule applies to a feature at an optional map scale
    ///
    /// A missing filter matches every feature; a missing scale ignores the
    /// scale range. A filter kept verbatim because it can't be evaluated
    /// matches nothing.
    pub fn matches(&self, feature: &Feature, scale: Option<f64>) -> bool {
        let in_scale = match (self.scale_denominator, scale) {
            (Some(range), Some(scale)) => range.contains(scale),
            _ => true,
        };
        let filtered = match &self.filter {
            Some(filter) => geostyler_style_filter(feature, filter),
            None => self.extra.get("filter").map_or(true, Value::is_null),
        };
        in_scale && filtered
    }
}

impl StructuredStyle {
    /// Wrap a rule list in a translated style document
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self {
            format: StyleFormat::GeoStyler,
            body: StyleBody {
                name: String::new(),
                rules,
                extra: Map::new(),
            },
            metadata: Some(StyleMetadata {
                editor_type: Some(EditorType::Visual),
                extra: Map::new(),
            }),
            extra: Map::new(),
        }
    }

    /// Rules applying to `feature`, in document order
    pub fn rules_for<'a>(
        &'a self,
        feature: &'a Feature,
        scale: Option<f64>,
    ) -> impl Iterator<Item = &'a Rule> + 'a {
        self.body
            .rules
            .iter()
            .filter(move |rule| rule.matches(feature, scale))
    }

    /// Every symbolizer of every rule, in document order
    pub fn symbolizers(&self) -> impl Iterator<Item = &Symbolizer> {
        self.body.rules.iter().flat_map(|rule| rule.symbolizers.iter())
    }
}

impl Serialize for StructuredStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("format", &self.format)?;
        if !self.extra.contains_key("body") {
            map.serialize_entry("body", &self.body)?;
        }
        if let Some(metadata) = &self.metadata {
            map.serialize_entry("metadata", metadata)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StructuredStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra = Map::<String, Value>::deserialize(deserializer)?;
        let format = match extra.remove("format") {
            Some(format) => StyleFormat::deserialize(format).map_err(D::Error::custom)?,
            None => return Err(D::Error::missing_field("format")),
        };
        Ok(StructuredStyle {
            format,
            body: take_field(&mut extra, "body").unwrap_or_default(),
            metadata: take_field(&mut extra, "metadata"),
            extra,
        })
    }
}

impl Serialize for StyleBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.extra.contains_key("name") {
            map.serialize_entry("name", &self.name)?;
        }
        if !self.extra.contains_key("rules") {
            map.serialize_entry("rules", &self.rules)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StyleBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra = Map::<String, Value>::deserialize(deserializer)?;
        Ok(StyleBody {
            name: take_field(&mut extra, "name").unwrap_or_default(),
            rules: take_field(&mut extra, "rules").unwrap_or_default(),
            extra,
        })
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.extra.contains_key("name") {
            map.serialize_entry("name", &self.name)?;
        }
        if let Some(filter) = &self.filter {
            map.serialize_entry("filter", filter)?;
        }
        if let Some(range) = &self.scale_denominator {
            map.serialize_entry("scaleDenominator", range)?;
        }
        if !self.extra.contains_key("symbolizers") {
            map.serialize_entry("symbolizers", &self.symbolizers)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Rule {
            name: take_field(&mut extra, "name").unwrap_or_default(),
            filter: take_field(&mut extra, "filter"),
            scale_denominator: take_field(&mut extra, "scaleDenominator"),
            symbolizers: take_field(&mut extra, "symbolizers").unwrap_or_default(),
            extra,
        })
    }
}

/// A single rendering instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Symbolizer {
    Mark(MarkSymbolizer),
    Icon(IconSymbolizer),
    Line(LineSymbolizer),
    Fill(FillSymbolizer),
    Text(TextSymbolizer),
    /// Any other kind (Raster, ...) or a symbolizer that doesn't parse,
    /// kept as written
    Other(Value),
}

impl Symbolizer {
    pub fn kind(&self) -> &str {
        match self {
            Symbolizer::Mark(_) => "Mark",
            Symbolizer::Icon(_) => "Icon",
            Symbolizer::Line(_) => "Line",
            Symbolizer::Fill(_) => "Fill",
            Symbolizer::Text(_) => "Text",
            Symbolizer::Other(raw) => raw.get("kind").and_then(Value::as_str).unwrap_or(""),
        }
    }

    fn from_value(value: Value) -> Self {
        fn typed<T: DeserializeOwned>(value: &Value) -> Option<T> {
            let mut fields = value.as_object()?.clone();
            fields.remove("kind");
            match serde_json::from_value(Value::Object(fields)) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    debug!("Keeping symbolizer verbatim: {}", e);
                    None
                }
            }
        }

        let parsed = match value.get("kind").and_then(Value::as_str) {
            Some("Mark") => typed(&value).map(Symbolizer::Mark),
            Some("Icon") => typed(&value).map(Symbolizer::Icon),
            Some("Line") => typed(&value).map(Symbolizer::Line),
            Some("Fill") => typed(&value).map(Symbolizer::Fill),
            Some("Text") => typed(&value).map(Symbolizer::Text),
            _ => None,
        };
        parsed.unwrap_or(Symbolizer::Other(value))
    }
}

impl Serialize for Symbolizer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (typed, extra) = match self {
            Symbolizer::Mark(s) => (serde_json::to_value(s), &s.extra),
            Symbolizer::Icon(s) => (serde_json::to_value(s), &s.extra),
            Symbolizer::Line(s) => (serde_json::to_value(s), &s.extra),
            Symbolizer::Fill(s) => (serde_json::to_value(s), &s.extra),
            Symbolizer::Text(s) => (serde_json::to_value(s), &s.extra),
            Symbolizer::Other(raw) => return raw.serialize(serializer),
        };
        let Value::Object(fields) = typed.map_err(S::Error::custom)? else {
            return Err(S::Error::custom("symbolizer did not serialize to an object"));
        };

        let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
        map.serialize_entry("kind", self.kind())?;
        for (key, mut value) in fields {
            // Typed numbers print as a browser would; extra fields as written
            if !extra.contains_key(&key) {
                normalize_numbers(&mut value);
            }
            map.serialize_entry(&key, &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Symbolizer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Symbolizer::from_value)
    }
}

/// Well-known shape drawn at point locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSymbolizer {
    pub well_known_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ms_bring_to_front: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// External image drawn at point locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconSymbolizer {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSymbolizer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dasharray: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillSymbolizer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_dasharray: Option<Vec<f64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSymbolizer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halo_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halo_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<[f64; 2]>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
