//! Named geometry functions
//!
//! Symbolizers may reference a geometry function by name to draw a derived
//! geometry instead of the feature's own (e.g. a marker at the end of a
//! line). Each function declares the geometry type it produces so renderers
//! can pick the right symbolizer before evaluating it.
//!
//! Built-ins: `centerPoint`, `startPoint`, `endPoint` (all `Point`) and
//! `lineToArc` (`LineString`).

use std::collections::HashMap;
use std::sync::Arc;

use crate::layer::{Geometry, GeometryType, Position};
use crate::{MapstyleError, Result};

/// Number of vertices each segment is densified into by `lineToArc`
pub const ARC_SEGMENT_POINTS: usize = 100;

/// Transform from a feature geometry to a derived one; `None` when the input
/// has nothing to derive from
pub type GeometryFn = Arc<dyn Fn(&Geometry) -> Option<Geometry> + Send + Sync>;

/// A registered geometry function and its declared output type
#[derive(Clone)]
pub struct GeometryFunction {
    func: GeometryFn,
    geometry_type: GeometryType,
}

impl GeometryFunction {
    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    pub fn apply(&self, geometry: &Geometry) -> Option<Geometry> {
        (self.func)(geometry)
    }
}

impl std::fmt::Debug for GeometryFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryFunction")
            .field("geometry_type", &self.geometry_type)
            .finish_non_exhaustive()
    }
}

/// Registry of geometry functions by name
#[derive(Debug, Clone)]
pub struct GeometryFunctionRegistry {
    functions: HashMap<String, GeometryFunction>,
}

impl Default for GeometryFunctionRegistry {
    fn default() -> Self {
        let mut functions = HashMap::new();
        let mut builtin = |name: &str, geometry_type, func: fn(&Geometry) -> Option<Geometry>| {
            functions.insert(
                name.to_string(),
                GeometryFunction {
                    func: Arc::new(func),
                    geometry_type,
                },
            );
        };
        builtin("centerPoint", GeometryType::Point, center_point);
        builtin("startPoint", GeometryType::Point, start_point);
        builtin("endPoint", GeometryType::Point, end_point);
        builtin("lineToArc", GeometryType::LineString, line_to_arc);
        Self { functions }
    }
}

impl GeometryFunctionRegistry {
    /// Registry holding the built-in functions
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a function
    ///
    /// All three parts are required.
    pub fn register(
        &mut self,
        name: Option<&str>,
        func: Option<GeometryFn>,
        geometry_type: Option<GeometryType>,
    ) -> Result<()> {
        let (Some(name), Some(func), Some(geometry_type)) = (name, func, geometry_type) else {
            return Err(MapstyleError::InvalidArgument(
                "specify all the params: functionName, func, type".to_string(),
            ));
        };
        self.functions.insert(
            name.to_string(),
            GeometryFunction {
                func,
                geometry_type,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&GeometryFunction> {
        self.functions.get(name)
    }

    /// Declared output type of a function
    pub fn geometry_type(&self, name: &str) -> Option<GeometryType> {
        self.get(name).map(GeometryFunction::geometry_type)
    }

    /// Apply a function by name; `None` for unknown names too
    pub fn apply(&self, name: &str, geometry: &Geometry) -> Option<Geometry> {
        self.get(name)?.apply(geometry)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

fn point(coordinates: Position) -> Geometry {
    Geometry::Point { coordinates }
}

/// Center of the bounding box of all positions
fn center_point(geometry: &Geometry) -> Option<Geometry> {
    let positions = geometry.positions();
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in positions.iter().filter(|p| p.len() >= 2) {
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }
    if !min_x.is_finite() {
        return None;
    }
    Some(point(vec![(min_x + max_x) / 2.0, (min_y + max_y) / 2.0]))
}

fn start_point(geometry: &Geometry) -> Option<Geometry> {
    geometry.positions().first().map(|p| point((*p).clone()))
}

fn end_point(geometry: &Geometry) -> Option<Geometry> {
    geometry.positions().last().map(|p| point((*p).clone()))
}

/// Replace every segment of a line with its great circle arc
fn line_to_arc(geometry: &Geometry) -> Option<Geometry> {
    let Geometry::LineString { coordinates } = geometry else {
        return None;
    };
    // Positions without both lon and lat can't be placed on the sphere
    let positions: Vec<&Position> = coordinates.iter().filter(|p| p.len() >= 2).collect();
    if positions.len() < 2 {
        return None;
    }
    let mut arc: Vec<Position> = Vec::with_capacity(positions.len() * ARC_SEGMENT_POINTS);
    for (i, pair) in positions.windows(2).enumerate() {
        let segment = great_circle(pair[0], pair[1], ARC_SEGMENT_POINTS);
        // Segments share their joint vertex
        let skip = if i == 0 { 0 } else { 1 };
        arc.extend(segment.into_iter().skip(skip));
    }
    Some(Geometry::LineString { coordinates: arc })
}

/// `n` points from `from` to `to` (inclusive) along the great circle, in
/// lon/lat degrees
fn great_circle(from: &Position, to: &Position, n: usize) -> Vec<Position> {
    let (lon1, lat1) = (from[0].to_radians(), from[1].to_radians());
    let (lon2, lat2) = (to[0].to_radians(), to[1].to_radians());

    let d = 2.0
        * (((lat2 - lat1) / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2))
        .sqrt()
        .asin();
    // Coincident or antipodal endpoints have no unique great circle
    if d == 0.0 || d.sin().abs() < 1e-12 || n < 2 {
        return vec![from.clone(), to.clone()];
    }

    (0..n)
        .map(|i| {
            let f = i as f64 / (n - 1) as f64;
            let a = ((1.0 - f) * d).sin() / d.sin();
            let b = (f * d).sin() / d.sin();
            let x = a * lat1.cos() * lon1.cos() + b * lat2.cos() * lon2.cos();
            let y = a * lat1.cos() * lon1.sin() + b * lat2.cos() * lon2.sin();
            let z = a * lat1.sin() + b * lat2.sin();
            let lat = z.atan2((x * x + y * y).sqrt());
            let lon = y.atan2(x);
            vec![lon.to_degrees(), lat.to_degrees()]
        })
        .collect()
}
