//! Vector layers, features and geometries
//!
//! Layers arrive as loosely shaped JSON: the feature list may mix GeoJSON
//! Features and FeatureCollections, and a feature may carry its own flat
//! style (annotations do). Anything that doesn't parse is skipped rather
//! than rejected, so translation can always make progress.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::geostyler::StructuredStyle;
use crate::style::FlatStyle;

/// GeoJSON position (`[x, y]` or `[x, y, z]`)
pub type Position = Vec<f64>;

/// A vector map layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub layer_type: Option<String>,
    /// Raw feature entries (Features or FeatureCollections)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<LayerStyle>,
    /// Everything else the layer carries (id, name, visibility, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Style attached to a layer: either already structured, or flat
///
/// A style object is structured exactly when its `format` is `"geostyler"`;
/// anything else is read as a flat style.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LayerStyle {
    Structured(StructuredStyle),
    Flat(FlatStyle),
}

impl<'de> Deserialize<'de> for LayerStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let style = FlatStyle::deserialize(deserializer)?;
        if style.get("format").and_then(Value::as_str) == Some("geostyler") {
            StructuredStyle::deserialize(Value::Object(style))
                .map(LayerStyle::Structured)
                .map_err(D::Error::custom)
        } else {
            Ok(LayerStyle::Flat(style))
        }
    }
}

impl LayerStyle {
    /// True for a flat style with no attributes
    pub fn is_empty(&self) -> bool {
        matches!(self, LayerStyle::Flat(style) if style.is_empty())
    }
}

/// Style carried by a single feature: one flat style or a stack of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureStyle {
    Single(FlatStyle),
    Multiple(Vec<FlatStyle>),
}

impl FeatureStyle {
    pub fn styles(&self) -> Vec<&FlatStyle> {
        match self {
            FeatureStyle::Single(style) => vec![style],
            FeatureStyle::Multiple(styles) => styles.iter().collect(),
        }
    }
}

/// GeoJSON feature, optionally styled
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient_geometry")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<FeatureStyle>,
}

/// GeoJSON allows `"properties": null`
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Map<String, Value>, D::Error> {
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// An unreadable geometry leaves the feature (and its style) usable
fn lenient_geometry<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Geometry>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match Geometry::deserialize(&value) {
        Ok(geometry) => Ok(Some(geometry)),
        Err(e) => {
            debug!("Ignoring unreadable geometry: {}", e);
            Ok(None)
        }
    }
}

impl Feature {
    /// Create an unstyled feature with only properties
    pub fn with_properties(properties: Map<String, Value>) -> Self {
        Self {
            properties,
            ..Default::default()
        }
    }

    /// Property lookup, `None` when missing
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// GeoJSON geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

/// Geometry type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point { .. } => GeometryType::Point,
            Geometry::MultiPoint { .. } => GeometryType::MultiPoint,
            Geometry::LineString { .. } => GeometryType::LineString,
            Geometry::MultiLineString { .. } => GeometryType::MultiLineString,
            Geometry::Polygon { .. } => GeometryType::Polygon,
            Geometry::MultiPolygon { .. } => GeometryType::MultiPolygon,
            Geometry::GeometryCollection { .. } => GeometryType::GeometryCollection,
        }
    }

    /// All positions in document order
    pub fn positions(&self) -> Vec<&Position> {
        match self {
            Geometry::Point { coordinates } => vec![coordinates],
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.iter().collect()
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().collect()
            }
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().collect()
            }
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().flat_map(|g| g.positions()).collect()
            }
        }
    }
}

impl std::fmt::Display for GeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Top-level GeoJSON object found in a layer's feature list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonObject {
    Feature(Feature),
    FeatureCollection {
        #[serde(default)]
        features: Vec<Value>,
    },
}

/// Flatten a mixed list of Features and FeatureCollections into features
///
/// Entries that are neither are skipped, as are unreadable features inside
/// a collection; their siblings are kept.
pub fn flatten_features(entries: &[Value]) -> Vec<Feature> {
    let mut features = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        match GeoJsonObject::deserialize(entry) {
            Ok(GeoJsonObject::Feature(feature)) => features.push(feature),
            Ok(GeoJsonObject::FeatureCollection { features: nested }) => {
                for (n, nested) in nested.iter().enumerate() {
                    match Feature::deserialize(nested) {
                        Ok(feature) => features.push(feature),
                        Err(e) => debug!("Skipping feature {} of entry {}: {}", n, idx, e),
                    }
                }
            }
            Err(e) => debug!("Skipping feature entry {}: {}", idx, e),
        }
    }
    features
}

impl Layer {
    /// Features of the layer, flattened
    pub fn flat_features(&self) -> Vec<Feature> {
        flatten_features(&self.features)
    }
}
