use geo::{Coord, Point};
use serde_json::{Map, Value};

/// Attribute columns attached to a reference point, kept as loaded.
pub type Attributes = Map<String, Value>;

/// Label used by the concept dropdown to mean "no concept filter".
pub const ALL_CONCEPTS: &str = "All visited locations";

#[derive(Debug, Clone, PartialEq)]
pub struct SurveyPoint {
    // x = longitude, y = latitude (WGS84)
    pub position: Point<f64>,
    pub concepts: String,
    pub concept_clean: String,
}

impl SurveyPoint {
    pub fn new(lon: f64, lat: f64, concepts: impl Into<String>) -> Self {
        let concepts = concepts.into();
        let concept_clean = clean_concept(&concepts);
        Self {
            position: Point::new(lon, lat),
            concepts,
            concept_clean,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePoint {
    pub position: Point<f64>,
    pub attributes: Attributes,
}

impl ReferencePoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self::with_attributes(lon, lat, Attributes::new())
    }

    pub fn with_attributes(lon: f64, lat: f64, attributes: Attributes) -> Self {
        Self {
            position: Point::new(lon, lat),
            attributes,
        }
    }
}

/// Survey point after matching. `planar` is the position in the metric CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedSurveyPoint {
    pub point: SurveyPoint,
    pub planar: Coord<f64>,
    pub matched: bool,
}

/// Reference point after matching. `planar` is the position in the metric CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitedReferencePoint {
    pub point: ReferencePoint,
    pub planar: Coord<f64>,
    pub visited: bool,
}

/// The grouping key of a raw concept tag: everything before the first `|`, trimmed.
pub fn clean_concept(raw: &str) -> String {
    raw.split('|').next().unwrap_or("").trim().to_string()
}
