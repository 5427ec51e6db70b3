use crate::types::{Attributes, ReferencePoint, SurveyPoint};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use geo::Point;
use geojson::{GeoJson, Value};
use serde_json::Value as JsonValue;
use shapefile::dbase::FieldValue;
use shapefile::{Reader, Shape};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("column '{column}' not found in {path:?}")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("{path:?} line {line}: column '{column}' has invalid number '{value}'")]
    InvalidNumber {
        path: PathBuf,
        line: usize,
        column: &'static str,
        value: String,
    },
    #[error("{0:?} contains no points")]
    Empty(PathBuf),
    #[error("reference file has no geometry and no '{0}' column to take positions from")]
    MissingFallbackColumn(&'static str),
    #[error("reference feature #{index}: attribute '{column}' is not a number ({value})")]
    InvalidAttribute {
        index: usize,
        column: String,
        value: String,
    },
    #[error("reference feature #{0} has no geometry while others do")]
    MissingGeometry(usize),
    #[error("reference feature #{index}: {kind} geometry is not supported, expected a point")]
    UnsupportedGeometry { index: usize, kind: String },
    #[error("reference feature #{0}: malformed point coordinates")]
    MalformedPoint(usize),
}

/// Reads the survey TSV. Requires `lon`, `lat` and `concepts` columns.
pub fn load_survey_points(path: &Path) -> Result<Vec<SurveyPoint>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open survey TSV: {:?}", path))?;
    let points = read_survey_points(file, path)?;
    info!(count = points.len(), path = ?path, "loaded survey points");
    Ok(points)
}

pub fn read_survey_points<R: Read>(reader: R, source: &Path) -> Result<Vec<SurveyPoint>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| LoadError::MissingColumn { path: source.to_path_buf(), column: name })
    };
    let lon_idx = column("lon")?;
    let lat_idx = column("lat")?;
    let concepts_idx = column("concepts")?;

    let mut points = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read record {} of {:?}", i + 1, source))?;
        // header is line 1
        let line = i + 2;
        let number = |idx: usize, column: &'static str| {
            let raw = record.get(idx).unwrap_or("").trim();
            raw.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
                path: source.to_path_buf(),
                line,
                column,
                value: raw.to_string(),
            })
        };
        let lon = number(lon_idx, "lon")?;
        let lat = number(lat_idx, "lat")?;
        let concepts = record.get(concepts_idx).unwrap_or("");
        points.push(SurveyPoint::new(lon, lat, concepts));
    }

    if points.is_empty() {
        return Err(LoadError::Empty(source.to_path_buf()).into());
    }
    Ok(points)
}

/// A reference feature as read from disk, before the position fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    pub position: Option<Point<f64>>,
    pub attributes: Attributes,
}

/// Reads the reference file, picking the reader by extension.
pub fn load_reference_points(path: &Path) -> Result<Vec<ReferencePoint>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Reference file has no extension: {:?}", path))?;

    let features = match extension.as_str() {
        "shp" => read_shapefile_features(path)?,
        "json" | "geojson" => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
            read_geojson_features(BufReader::new(file))
                .with_context(|| format!("Failed to read GeoJSON file: {:?}", path))?
        }
        _ => return Err(anyhow!("Unsupported reference format: {}", extension)),
    };

    if features.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()).into());
    }
    let points = resolve_positions(features)?;
    info!(count = points.len(), path = ?path, "loaded reference points");
    Ok(points)
}

pub fn read_geojson_features<R: Read>(reader: R) -> Result<Vec<RawFeature>> {
    let mut json: JsonValue = serde_json::from_reader(reader).context("Failed to parse GeoJSON")?;
    clear_empty_geometries(&mut json);
    let geojson = GeoJson::from_json_value(json).context("Failed to parse GeoJSON")?;
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut features = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let position = match feature.geometry {
            Some(geometry) => point_from_geojson(index, geometry.value)?,
            None => None,
        };
        features.push(RawFeature {
            position,
            attributes: feature.properties.unwrap_or_default(),
        });
    }
    Ok(features)
}

/// Empty geometries (`"coordinates": []`) are valid GeoJSON but rejected by the
/// typed parser, so they are turned into `null` first.
fn clear_empty_geometries(json: &mut JsonValue) {
    let Some(features) = json.get_mut("features").and_then(JsonValue::as_array_mut) else {
        return;
    };
    for feature in features {
        if let Some(geometry) = feature.get_mut("geometry") {
            let empty = geometry
                .get("coordinates")
                .and_then(JsonValue::as_array)
                .map_or(false, |c| c.is_empty());
            if empty {
                *geometry = JsonValue::Null;
            }
        }
    }
}

fn point_from_geojson(index: usize, value: Value) -> Result<Option<Point<f64>>, LoadError> {
    let coords = |c: &[f64]| match c {
        [x, y, ..] => Ok(Point::new(*x, *y)),
        _ => Err(LoadError::MalformedPoint(index)),
    };
    match value {
        Value::Point(c) => coords(&c).map(Some),
        Value::MultiPoint(pts) if pts.is_empty() => Ok(None),
        Value::MultiPoint(pts) if pts.len() == 1 => coords(&pts[0]).map(Some),
        Value::GeometryCollection(gs) if gs.is_empty() => Ok(None),
        other => Err(LoadError::UnsupportedGeometry { index, kind: geometry_kind(&other).to_string() }),
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn read_shapefile_features(path: &Path) -> Result<Vec<RawFeature>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut features = Vec::new();
    for (index, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result.with_context(|| format!("Failed to read shape #{} of {:?}", index, path))?;

        let position = match shape {
            Shape::Point(p) => Some(Point::new(p.x, p.y)),
            Shape::PointM(p) => Some(Point::new(p.x, p.y)),
            Shape::PointZ(p) => Some(Point::new(p.x, p.y)),
            Shape::NullShape => None,
            other => {
                return Err(LoadError::UnsupportedGeometry {
                    index,
                    kind: format!("{:?}", other.shapetype()),
                }
                .into())
            }
        };

        let mut attributes = Attributes::new();
        for (name, value) in record {
            attributes.insert(name, field_to_json(value));
        }
        features.push(RawFeature { position, attributes });
    }
    Ok(features)
}

fn field_to_json(value: FieldValue) -> JsonValue {
    match value {
        FieldValue::Character(s) => s.map_or(JsonValue::Null, JsonValue::String),
        FieldValue::Numeric(n) => n.map_or(JsonValue::Null, |n| serde_json::json!(n)),
        FieldValue::Float(f) => f.map_or(JsonValue::Null, |f| serde_json::json!(f as f64)),
        FieldValue::Integer(i) => serde_json::json!(i),
        FieldValue::Double(d) => serde_json::json!(d),
        FieldValue::Logical(b) => b.map_or(JsonValue::Null, JsonValue::Bool),
        FieldValue::Memo(s) => JsonValue::String(s),
        other => JsonValue::String(format!("{:?}", other)),
    }
}

/// Turns raw features into reference points. When no feature carries a
/// geometry, positions come from the `long`/`lat` attributes (names matched
/// case-insensitively).
pub fn resolve_positions(features: Vec<RawFeature>) -> Result<Vec<ReferencePoint>, LoadError> {
    if features.iter().any(|f| f.position.is_some()) {
        return features
            .into_iter()
            .enumerate()
            .map(|(index, f)| {
                let p = f.position.ok_or(LoadError::MissingGeometry(index))?;
                Ok(ReferencePoint::with_attributes(p.x(), p.y(), f.attributes))
            })
            .collect();
    }

    let lon_key = find_column(&features, "long")?;
    let lat_key = find_column(&features, "lat")?;
    debug!(lon = %lon_key, lat = %lat_key, "reference geometry empty, using attribute columns");

    features
        .into_iter()
        .enumerate()
        .map(|(index, f)| {
            let lon = numeric_attribute(&f.attributes, &lon_key, index)?;
            let lat = numeric_attribute(&f.attributes, &lat_key, index)?;
            Ok(ReferencePoint::with_attributes(lon, lat, f.attributes))
        })
        .collect()
}

fn find_column(features: &[RawFeature], name: &'static str) -> Result<String, LoadError> {
    features
        .iter()
        .flat_map(|f| f.attributes.keys())
        .find(|k| k.eq_ignore_ascii_case(name))
        .cloned()
        .ok_or(LoadError::MissingFallbackColumn(name))
}

fn numeric_attribute(attributes: &Attributes, key: &str, index: usize) -> Result<f64, LoadError> {
    let value = attributes.get(key).unwrap_or(&JsonValue::Null);
    let parsed = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| LoadError::InvalidAttribute {
        index,
        column: key.to_string(),
        value: value.to_string(),
    })
}
