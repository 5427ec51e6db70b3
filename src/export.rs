use crate::matching::MatchOutcome;
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const HIGHLIGHT_COLOR: &str = "#FFFF00";
pub const CONTENT_TYPE: &str = "application/geo+json";

/// Unvisited reference points, ready to be downloaded or written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub count: usize,
    pub collection: FeatureCollection,
}

impl Export {
    pub fn from_outcome(outcome: &MatchOutcome) -> Self {
        let features: Vec<Feature> = outcome
            .unvisited()
            .map(|r| {
                let mut properties = r.point.attributes.clone();
                properties.insert("visited".to_string(), json!(false));
                properties.insert("marker-color".to_string(), json!(HIGHLIGHT_COLOR));
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(vec![
                        r.point.position.x(),
                        r.point.position.y(),
                    ]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        debug!(count = features.len(), "export collection built");
        Self {
            count: features.len(),
            collection: FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            },
        }
    }

    pub fn filename(&self) -> String {
        format!("Groundtruth_{}_points.geojson", self.count)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.collection).context("Failed to serialize export collection")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write export file: {:?}", path))?;
        info!(count = self.count, path = ?path, "exported unvisited reference points");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{Radius, SpatialMatcher};
    use crate::projection::MetricCrs;
    use crate::types::{Attributes, ReferencePoint, SurveyPoint};
    use geojson::GeoJson;

    fn outcome(reference: Vec<ReferencePoint>) -> MatchOutcome {
        let survey = vec![SurveyPoint::new(5.0, 52.0, "Forest")];
        SpatialMatcher::new(MetricCrs::RdNew, Radius::new(50.0).unwrap())
            .run(&survey, &reference)
            .unwrap()
    }

    #[test]
    fn test_empty_export() {
        let export = Export::from_outcome(&outcome(vec![ReferencePoint::new(5.0, 52.0)]));
        assert_eq!(export.count, 0);
        assert!(export.collection.features.is_empty());
        assert_eq!(export.filename(), "Groundtruth_0_points.geojson");
        let parsed: GeoJson = export.to_json().unwrap().parse().unwrap();
        assert!(matches!(parsed, GeoJson::FeatureCollection(fc) if fc.features.is_empty()));
    }

    #[test]
    fn test_export_stamps_unvisited_points() {
        let mut attrs = Attributes::new();
        attrs.insert("name".to_string(), json!("plot 7"));
        let export = Export::from_outcome(&outcome(vec![
            ReferencePoint::new(5.0, 52.0),
            ReferencePoint::with_attributes(5.1, 52.1, attrs),
        ]));

        assert_eq!(export.count, 1);
        assert_eq!(export.filename(), "Groundtruth_1_points.geojson");

        let feature = &export.collection.features[0];
        let props = feature.properties.as_ref().unwrap();
        assert_eq!(props["name"], json!("plot 7"));
        assert_eq!(props["marker-color"], json!("#FFFF00"));
        assert_eq!(props["visited"], json!(false));
        assert_eq!(
            feature.geometry.as_ref().unwrap().value,
            Value::Point(vec![5.1, 52.1])
        );
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        let export = Export::from_outcome(&outcome(vec![ReferencePoint::new(6.0, 53.0)]));
        export.write_to(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: GeoJson = text.parse().unwrap();
        match parsed {
            GeoJson::FeatureCollection(fc) => assert_eq!(fc.features.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }
}
