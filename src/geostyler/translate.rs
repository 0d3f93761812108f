//! Flat style to structured style translation
//!
//! # Mapping Strategy
//!
//! - Layer style already structured -> returned unchanged
//! - Styled features -> one rule per feature, filtered on `id`, with one
//!   symbolizer per flat style
//! - Layer-level flat style -> one unfiltered rule per exhibited kind
//!
//! A single flat style becomes exactly one symbolizer, picked by precedence
//! `symbol > marker > circle > text > fill > stroke`. A polygon annotation
//! carrying both outline and fill attributes therefore yields only a `Fill`
//! symbolizer; the outline lives in its `outline*` fields.

use serde_json::{json, Map, Value};
use tracing::debug;

use super::filter::{ComparisonOp, FilterExpression};
use super::types::*;
use crate::layer::{Layer, LayerStyle};
use crate::style::{
    get_f64, get_str, is_circle_style, is_fill_style, is_marker_style, is_stroke_style,
    is_symbol_style, is_text_style, normalize_numbers, FlatStyle,
};

const DEFAULT_FILL_COLOR: &str = "#f2f2f2";
const DEFAULT_STROKE_COLOR: &str = "#3075e9";
const DEFAULT_FILL_OPACITY: f64 = 0.3;
const DEFAULT_STROKE_WIDTH: f64 = 2.0;
const DEFAULT_POINT_RADIUS: f64 = 10.0;

// ============================================================================
// Layer translation
// ============================================================================

/// Translate a layer's style into a structured style
///
/// Never fails: shapes that can't be translated produce an empty rule list.
pub fn translate_layer(layer: &Layer) -> StructuredStyle {
    if let Some(LayerStyle::Structured(style)) = &layer.style {
        return style.clone();
    }

    let features = layer.flat_features();
    if features.iter().any(|f| f.style.is_some()) {
        let rules = features
            .iter()
            .filter_map(|feature| {
                let style = feature.style.as_ref()?;
                let Some(id) = feature.property("id") else {
                    debug!("Skipping styled feature without an id property");
                    return None;
                };
                let symbolizers: Vec<Symbolizer> = style
                    .styles()
                    .into_iter()
                    .filter_map(flat_style_to_symbolizer)
                    .collect();
                if symbolizers.is_empty() {
                    debug!("Feature {} has no translatable style", id);
                    return None;
                }
                Some(Rule {
                    name: String::new(),
                    filter: Some(FilterExpression::comparison(
                        ComparisonOp::Eq,
                        "id",
                        id.clone(),
                    )),
                    symbolizers,
                    ..Default::default()
                })
            })
            .collect();
        return StructuredStyle::from_rules(rules);
    }

    match &layer.style {
        Some(LayerStyle::Flat(style)) => StructuredStyle::from_rules(flat_style_to_rules(style)),
        _ => StructuredStyle::from_rules(Vec::new()),
    }
}

/// Asynchronous entry point used by renderer pipelines
pub async fn layer_to_geostyler_style(layer: &Layer) -> StructuredStyle {
    translate_layer(layer)
}

/// Rules for a layer-level flat style, ordered `Line, Fill, point, Text`
pub fn flat_style_to_rules(style: &FlatStyle) -> Vec<Rule> {
    let candidates = [
        is_stroke_style(style).then(|| Symbolizer::Line(line_symbolizer(style))),
        is_fill_style(style).then(|| Symbolizer::Fill(fill_symbolizer(style))),
        point_symbolizer(style),
        is_text_style(style).then(|| Symbolizer::Text(text_symbolizer(style))),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(Rule::with_symbolizer)
        .collect()
}

/// The single symbolizer standing for one flat style
pub fn flat_style_to_symbolizer(style: &FlatStyle) -> Option<Symbolizer> {
    if let Some(point) = point_symbolizer(style) {
        return Some(point);
    }
    if is_text_style(style) {
        return Some(Symbolizer::Text(text_symbolizer(style)));
    }
    if is_fill_style(style) {
        return Some(Symbolizer::Fill(fill_symbolizer(style)));
    }
    if is_stroke_style(style) {
        return Some(Symbolizer::Line(line_symbolizer(style)));
    }
    None
}

// ============================================================================
// Flat -> symbolizer mappings
// ============================================================================

fn get_string(style: &FlatStyle, key: &str) -> Option<String> {
    get_str(style, key).map(str::to_string)
}

fn get_dasharray(style: &FlatStyle, key: &str) -> Option<Vec<f64>> {
    match style.get(key)? {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse().ok())
            .collect(),
        _ => None,
    }
}

fn line_symbolizer(style: &FlatStyle) -> LineSymbolizer {
    LineSymbolizer {
        color: get_string(style, "color"),
        opacity: get_f64(style, "opacity"),
        width: get_f64(style, "weight"),
        dasharray: get_dasharray(style, "dashArray"),
        cap: get_string(style, "lineCap"),
        join: get_string(style, "lineJoin"),
        ..Default::default()
    }
}

fn fill_symbolizer(style: &FlatStyle) -> FillSymbolizer {
    FillSymbolizer {
        color: get_string(style, "fillColor"),
        opacity: get_f64(style, "fillOpacity"),
        fill_opacity: get_f64(style, "fillOpacity"),
        outline_color: get_string(style, "color"),
        outline_opacity: get_f64(style, "opacity"),
        outline_width: get_f64(style, "weight"),
        outline_dasharray: get_dasharray(style, "dashArray"),
        ..Default::default()
    }
}

fn point_symbolizer(style: &FlatStyle) -> Option<Symbolizer> {
    let image = get_string(style, "symbolUrlCustomized").or_else(|| get_string(style, "symbolUrl"));
    if let (true, Some(image)) = (is_symbol_style(style), image) {
        return Some(Symbolizer::Icon(IconSymbolizer {
            image,
            size: get_f64(style, "size"),
            ..Default::default()
        }));
    }
    if is_marker_style(style) {
        let well_known_name = match get_str(style, "iconShape") {
            Some("square") => "Square",
            Some("star") => "Star",
            Some("triangle") => "Triangle",
            _ => "Circle",
        };
        return Some(Symbolizer::Mark(MarkSymbolizer {
            well_known_name: well_known_name.to_string(),
            color: get_string(style, "iconColor"),
            ..Default::default()
        }));
    }
    if is_circle_style(style) {
        return Some(Symbolizer::Mark(MarkSymbolizer {
            well_known_name: "Circle".to_string(),
            color: get_string(style, "fillColor"),
            fill_opacity: get_f64(style, "fillOpacity"),
            stroke_color: get_string(style, "color"),
            stroke_opacity: get_f64(style, "opacity"),
            stroke_width: get_f64(style, "weight"),
            radius: get_f64(style, "radius"),
            ..Default::default()
        }));
    }
    None
}

fn text_symbolizer(style: &FlatStyle) -> TextSymbolizer {
    let has_fill = is_fill_style(style);
    let halo_color = if has_fill { get_string(style, "color") } else { None };
    TextSymbolizer {
        label: style.get("label").map(crate::style::value_to_string),
        font: get_string(style, "fontFamily").map(|family| vec![family]),
        size: get_f64(style, "fontSize"),
        color: get_string(style, "fillColor").or_else(|| get_string(style, "color")),
        opacity: get_f64(style, "fillOpacity").or_else(|| get_f64(style, "opacity")),
        halo_width: halo_color.as_ref().and_then(|_| get_f64(style, "weight")),
        halo_color,
        ..Default::default()
    }
}

// ============================================================================
// Symbolizer -> flat mapping
// ============================================================================

fn insert_opt<T: Into<Value>>(style: &mut FlatStyle, key: &str, value: Option<T>) {
    if let Some(value) = value {
        style.insert(key.to_string(), value.into());
    }
}

/// Flat style equivalent of a symbolizer
pub fn symbolizer_to_flat_style(symbolizer: &Symbolizer) -> FlatStyle {
    let mut style = FlatStyle::new();
    match symbolizer {
        Symbolizer::Line(line) => {
            insert_opt(&mut style, "color", line.color.clone());
            insert_opt(&mut style, "opacity", line.opacity);
            insert_opt(&mut style, "weight", line.width);
            insert_opt(&mut style, "dashArray", line.dasharray.clone());
            insert_opt(&mut style, "lineCap", line.cap.clone());
            insert_opt(&mut style, "lineJoin", line.join.clone());
        }
        Symbolizer::Fill(fill) => {
            insert_opt(&mut style, "fillColor", fill.color.clone());
            insert_opt(&mut style, "fillOpacity", fill.fill_opacity.or(fill.opacity));
            insert_opt(&mut style, "color", fill.outline_color.clone());
            insert_opt(&mut style, "opacity", fill.outline_opacity);
            insert_opt(&mut style, "weight", fill.outline_width);
            insert_opt(&mut style, "dashArray", fill.outline_dasharray.clone());
        }
        Symbolizer::Mark(mark) if mark.well_known_name == "Circle" || mark.radius.is_some() => {
            insert_opt(&mut style, "fillColor", mark.color.clone());
            insert_opt(&mut style, "fillOpacity", mark.fill_opacity);
            insert_opt(&mut style, "color", mark.stroke_color.clone());
            insert_opt(&mut style, "opacity", mark.stroke_opacity);
            insert_opt(&mut style, "weight", mark.stroke_width);
            style.insert(
                "radius".to_string(),
                json!(mark.radius.unwrap_or(DEFAULT_POINT_RADIUS)),
            );
        }
        Symbolizer::Mark(mark) => {
            style.insert(
                "iconShape".to_string(),
                json!(mark.well_known_name.to_lowercase()),
            );
            insert_opt(&mut style, "iconColor", mark.color.clone());
        }
        Symbolizer::Icon(icon) => {
            style.insert("symbolUrl".to_string(), json!(icon.image));
            insert_opt(&mut style, "size", icon.size);
        }
        Symbolizer::Text(text) => {
            insert_opt(&mut style, "label", text.label.clone());
            insert_opt(
                &mut style,
                "fontFamily",
                text.font.as_ref().and_then(|f| f.first().cloned()),
            );
            insert_opt(&mut style, "fontSize", text.size);
            insert_opt(&mut style, "fillColor", text.color.clone());
            insert_opt(&mut style, "fillOpacity", text.opacity);
            insert_opt(&mut style, "color", text.halo_color.clone());
            insert_opt(&mut style, "weight", text.halo_width);
        }
        Symbolizer::Other(raw) => {
            debug!("No flat equivalent for {} symbolizer", raw["kind"]);
        }
    }
    style.values_mut().for_each(normalize_numbers);
    style
}

// ============================================================================
// Default style
// ============================================================================

/// Fallback style for layers that carry none
pub fn default_style() -> StructuredStyle {
    let rule = |name: &str, symbolizer: Symbolizer| Rule {
        name: name.to_string(),
        ..Rule::with_symbolizer(symbolizer)
    };
    StructuredStyle {
        format: StyleFormat::GeoStyler,
        body: StyleBody {
            name: "Default Style".to_string(),
            rules: vec![
                rule(
                    "Default Point Style",
                    Symbolizer::Mark(MarkSymbolizer {
                        well_known_name: "Circle".to_string(),
                        color: Some(DEFAULT_FILL_COLOR.to_string()),
                        fill_opacity: Some(DEFAULT_FILL_OPACITY),
                        opacity: Some(0.5),
                        stroke_color: Some(DEFAULT_STROKE_COLOR.to_string()),
                        stroke_opacity: Some(1.0),
                        stroke_width: Some(DEFAULT_STROKE_WIDTH),
                        radius: Some(DEFAULT_POINT_RADIUS),
                        ms_bring_to_front: Some(true),
                        ..Default::default()
                    }),
                ),
                rule(
                    "Default Line Style",
                    Symbolizer::Line(LineSymbolizer {
                        color: Some(DEFAULT_STROKE_COLOR.to_string()),
                        opacity: Some(1.0),
                        width: Some(DEFAULT_STROKE_WIDTH),
                        ..Default::default()
                    }),
                ),
                rule(
                    "Default Polygon Style",
                    Symbolizer::Fill(FillSymbolizer {
                        color: Some(DEFAULT_FILL_COLOR.to_string()),
                        fill_opacity: Some(DEFAULT_FILL_OPACITY),
                        outline_color: Some(DEFAULT_STROKE_COLOR.to_string()),
                        outline_opacity: Some(1.0),
                        outline_width: Some(DEFAULT_STROKE_WIDTH),
                        ..Default::default()
                    }),
                ),
            ],
            extra: Map::new(),
        },
        metadata: None,
        extra: Map::new(),
    }
}

/// Attach [`default_style`] to a layer with no (or an empty) style
pub fn apply_default_style_to_layer(mut layer: Layer) -> Layer {
    if layer.style.as_ref().map_or(true, LayerStyle::is_empty) {
        layer.style = Some(LayerStyle::Structured(default_style()));
    }
    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer(value: Value) -> Layer {
        serde_json::from_value(value).unwrap()
    }

    fn flat(value: Value) -> FlatStyle {
        value.as_object().cloned().unwrap()
    }

    fn annotation_style() -> Value {
        json!({
            "fillColor": "#ff0000",
            "fillOpacity": 0.5,
            "color": "#00ff00",
            "opacity": 0.25,
            "weight": 2
        })
    }

    fn expected_fill() -> Symbolizer {
        Symbolizer::Fill(FillSymbolizer {
            color: Some("#ff0000".to_string()),
            opacity: Some(0.5),
            fill_opacity: Some(0.5),
            outline_color: Some("#00ff00".to_string()),
            outline_opacity: Some(0.25),
            outline_width: Some(2.0),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_annotation_layer() {
        let layer = layer(json!({
            "type": "vector",
            "features": [{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"id": "annotation-id"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[7, 41], [14, 41], [14, 46], [7, 46], [7, 41]]]
                    },
                    "style": annotation_style()
                }]
            }]
        }));

        let style = layer_to_geostyler_style(&layer).await;
        assert_eq!(
            style,
            StructuredStyle::from_rules(vec![Rule {
                filter: Some(FilterExpression::comparison(
                    ComparisonOp::Eq,
                    "id",
                    json!("annotation-id")
                )),
                symbolizers: vec![expected_fill()],
                ..Default::default()
            }])
        );

        let serialized = serde_json::to_value(&style).unwrap();
        assert_eq!(serialized["format"], "geostyler");
        assert_eq!(serialized["metadata"], json!({"editorType": "visual"}));
        assert_eq!(
            serialized["body"]["rules"][0]["filter"],
            json!(["==", "id", "annotation-id"])
        );
        assert_eq!(serialized["body"]["rules"][0]["symbolizers"][0]["kind"], "Fill");
    }

    #[tokio::test]
    async fn test_layer_level_style() {
        let layer = layer(json!({
            "type": "vector",
            "features": [],
            "style": annotation_style()
        }));
        let style = layer_to_geostyler_style(&layer).await;
        assert_eq!(style.body.name, "");
        assert_eq!(
            style.body.rules,
            vec![
                Rule::with_symbolizer(Symbolizer::Line(LineSymbolizer {
                    color: Some("#00ff00".to_string()),
                    opacity: Some(0.25),
                    width: Some(2.0),
                    ..Default::default()
                })),
                Rule::with_symbolizer(expected_fill()),
            ]
        );
        assert!(style.body.rules.iter().all(|r| r.filter.is_none()));
    }

    #[tokio::test]
    async fn test_structured_style_passes_through() {
        let layer = layer(json!({
            "type": "vector",
            "features": [],
            "style": {"format": "geostyler", "body": {"name": "", "rules": []}}
        }));
        let Some(LayerStyle::Structured(original)) = layer.style.clone() else {
            panic!("expected a structured style");
        };
        let once = layer_to_geostyler_style(&layer).await;
        assert_eq!(once, original);

        let relayered = Layer {
            style: Some(LayerStyle::Structured(once.clone())),
            ..Default::default()
        };
        assert_eq!(layer_to_geostyler_style(&relayered).await, once);
    }

    #[test]
    fn test_structured_style_kept_verbatim() {
        let raster = json!({
            "format": "geostyler",
            "body": {
                "name": "Imagery",
                "rules": [{
                    "name": "raster",
                    "symbolizers": [{"kind": "Raster", "opacity": 0.8, "contrastEnhancement": {"gammaValue": 1}}]
                }]
            },
            "metadata": {"editorType": "visual"}
        });
        let marks = json!({
            "format": "geostyler",
            "body": {
                "name": "",
                "rules": [{
                    "name": "",
                    "filter": ["*=", "name", "A"],
                    "symbolizers": [{
                        "kind": "Mark",
                        "wellKnownName": "Circle",
                        "radius": 10,
                        "offset": [4, 4],
                        "visibility": true
                    }]
                }]
            }
        });

        for document in [raster, marks] {
            let style = translate_layer(&layer(json!({"style": document.clone()})));
            assert_eq!(style.body.rules.len(), 1);
            assert_eq!(serde_json::to_value(&style).unwrap(), document);
        }
    }

    #[test]
    fn test_null_properties_do_not_hide_annotations() {
        let layer = layer(json!({
            "features": [{
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "properties": null, "geometry": {"type": "Point", "coordinates": [0, 0]}},
                    {
                        "type": "Feature",
                        "properties": {"id": "annotation-id"},
                        "geometry": {"type": "Point", "coordinates": [7, 41]},
                        "style": annotation_style()
                    }
                ]
            }]
        }));
        let style = translate_layer(&layer);
        assert_eq!(style.body.rules.len(), 1);
        assert_eq!(style.body.rules[0].symbolizers, vec![expected_fill()]);
    }

    #[test]
    fn test_malformed_layer_yields_empty_rules() {
        let style = translate_layer(&Layer::default());
        assert!(style.body.rules.is_empty());
        assert_eq!(style.metadata.unwrap().editor_type, Some(EditorType::Visual));

        let garbage = layer(json!({"features": ["nope", 42]}));
        assert!(translate_layer(&garbage).body.rules.is_empty());
    }

    #[test]
    fn test_styled_feature_without_id_is_skipped() {
        let layer = layer(json!({
            "features": [
                {"type": "Feature", "properties": {}, "geometry": null, "style": {"color": "#000"}},
                {"type": "Feature", "properties": {"id": 7}, "geometry": null, "style": [{"color": "#000"}, {"radius": 4}]}
            ]
        }));
        let style = translate_layer(&layer);
        assert_eq!(style.body.rules.len(), 1);
        let rule = &style.body.rules[0];
        assert_eq!(
            rule.filter,
            Some(FilterExpression::comparison(ComparisonOp::Eq, "id", json!(7)))
        );
        assert_eq!(rule.symbolizers.len(), 2);
        assert_eq!(rule.symbolizers[0].kind(), "Line");
        assert_eq!(rule.symbolizers[1].kind(), "Mark");
    }

    #[test]
    fn test_single_style_precedence() {
        let kind = |v: Value| flat_style_to_symbolizer(&flat(v)).map(|s| &*Box::leak(s.kind().to_owned().into_boxed_str()));
        assert_eq!(kind(json!({"color": "#000", "weight": 3})), Some("Line"));
        assert_eq!(kind(json!({"color": "#000", "fillColor": "#fff"})), Some("Fill"));
        assert_eq!(kind(json!({"label": "x", "fillColor": "#fff"})), Some("Text"));
        assert_eq!(kind(json!({"radius": 4, "fillColor": "#fff"})), Some("Mark"));
        assert_eq!(kind(json!({"symbolUrl": "a.svg", "radius": 4})), Some("Icon"));
        assert_eq!(kind(json!({"title": "nothing"})), None);
    }

    #[test]
    fn test_circle_and_symbol_mappings() {
        let circle = flat_style_to_symbolizer(&flat(json!({
            "radius": 10, "fillColor": "#f2f2f2", "fillOpacity": 0.3,
            "color": "#3075e9", "opacity": 1, "weight": 2
        })));
        assert_eq!(
            circle,
            Some(Symbolizer::Mark(MarkSymbolizer {
                well_known_name: "Circle".to_string(),
                color: Some("#f2f2f2".to_string()),
                fill_opacity: Some(0.3),
                stroke_color: Some("#3075e9".to_string()),
                stroke_opacity: Some(1.0),
                stroke_width: Some(2.0),
                radius: Some(10.0),
                ..Default::default()
            }))
        );

        let icon = flat_style_to_symbolizer(&flat(json!({
            "symbolUrl": "/symbols/a.svg",
            "symbolUrlCustomized": "data:image/svg+xml;base64,AA==",
            "size": 32
        })));
        assert_eq!(
            icon,
            Some(Symbolizer::Icon(IconSymbolizer {
                image: "data:image/svg+xml;base64,AA==".to_string(),
                size: Some(32.0),
                ..Default::default()
            }))
        );
    }

    #[test]
    fn test_dasharray_parsing() {
        let line = line_symbolizer(&flat(json!({"dashArray": ["6", "6"]})));
        assert_eq!(line.dasharray, Some(vec![6.0, 6.0]));
        let line = line_symbolizer(&flat(json!({"dashArray": "1 4"})));
        assert_eq!(line.dasharray, Some(vec![1.0, 4.0]));
        let line = line_symbolizer(&flat(json!({"dashArray": ["a"]})));
        assert_eq!(line.dasharray, None);
    }

    #[test]
    fn test_text_mapping() {
        let text = text_symbolizer(&flat(json!({
            "label": "this is a text",
            "fontFamily": "Arial",
            "fontSize": "14",
            "color": "#000000",
            "weight": 1,
            "fillColor": "#ffffff",
            "fillOpacity": 1
        })));
        assert_eq!(text.label.as_deref(), Some("this is a text"));
        assert_eq!(text.font, Some(vec!["Arial".to_string()]));
        assert_eq!(text.size, Some(14.0));
        assert_eq!(text.color.as_deref(), Some("#ffffff"));
        assert_eq!(text.halo_color.as_deref(), Some("#000000"));
        assert_eq!(text.halo_width, Some(1.0));
    }

    #[test]
    fn test_symbolizer_to_flat_style_inverts_mappings() {
        for style in [
            annotation_style(),
            json!({"color": "#00ff00", "opacity": 0.25, "weight": 2}),
            json!({"fillColor": "#f2f2f2", "fillOpacity": 0.3, "color": "#3075e9", "opacity": 1, "weight": 2, "radius": 10}),
        ] {
            let style = flat(style);
            let symbolizer = flat_style_to_symbolizer(&style).unwrap();
            let back = symbolizer_to_flat_style(&symbolizer);
            assert_eq!(flat_style_to_symbolizer(&back), Some(symbolizer));
        }

        let line = symbolizer_to_flat_style(&Symbolizer::Line(LineSymbolizer {
            width: Some(2.0),
            dasharray: Some(vec![6.0, 1.5]),
            ..Default::default()
        }));
        assert_eq!(Value::Object(line).to_string(), r#"{"weight":2,"dashArray":[6,1.5]}"#);
    }

    #[test]
    fn test_default_style_document() {
        let layer = apply_default_style_to_layer(Layer::default());
        let style = serde_json::to_value(layer.style.unwrap()).unwrap();
        assert_eq!(
            style,
            json!({
                "format": "geostyler",
                "body": {
                    "name": "Default Style",
                    "rules": [
                        {
                            "name": "Default Point Style",
                            "symbolizers": [{
                                "kind": "Mark",
                                "wellKnownName": "Circle",
                                "color": "#f2f2f2",
                                "fillOpacity": 0.3,
                                "opacity": 0.5,
                                "strokeColor": "#3075e9",
                                "strokeOpacity": 1,
                                "strokeWidth": 2,
                                "radius": 10,
                                "msBringToFront": true
                            }]
                        },
                        {
                            "name": "Default Line Style",
                            "symbolizers": [{
                                "kind": "Line",
                                "color": "#3075e9",
                                "opacity": 1,
                                "width": 2
                            }]
                        },
                        {
                            "name": "Default Polygon Style",
                            "symbolizers": [{
                                "kind": "Fill",
                                "color": "#f2f2f2",
                                "fillOpacity": 0.3,
                                "outlineColor": "#3075e9",
                                "outlineOpacity": 1,
                                "outlineWidth": 2
                            }]
                        }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_default_style_keeps_existing_style() {
        let styled = layer(json!({"style": {"color": "#000"}}));
        assert_eq!(apply_default_style_to_layer(styled.clone()), styled);

        let empty = layer(json!({"style": {}}));
        let applied = apply_default_style_to_layer(empty);
        assert_eq!(applied.style, Some(LayerStyle::Structured(default_style())));
    }
}
