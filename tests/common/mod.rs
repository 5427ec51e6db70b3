//! Shared fixtures for integration tests

#![allow(dead_code)]

use groundtruth_checker::config::AppConfig;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const SCENARIO_TSV: &str = "id\tlon\tlat\tconcepts\n1\t5.0\t52.0\tForest|x\n2\t5.001\t52.0\tWater\n";

pub const SCENARIO_GEOJSON: &str = r#"{"type":"FeatureCollection","features":[
  {"type":"Feature","geometry":{"type":"Point","coordinates":[5.0,52.0]},"properties":{"name":"plot 1"}}
]}"#;

pub const FALLBACK_GEOJSON: &str = r#"{"type":"FeatureCollection","features":[
  {"type":"Feature","geometry":null,"properties":{"name":"plot 1","LONG":5.0,"LAT":52.0}},
  {"type":"Feature","geometry":null,"properties":{"name":"plot 2","LONG":5.2,"LAT":52.2}},
  {"type":"Feature","geometry":null,"properties":{"name":"plot 3","LONG":"5.3","LAT":"52.3"}}
]}"#;

/// Writes the two input files into a fresh temp dir and returns a config for them.
pub fn workspace(tsv: &str, geojson: &str) -> (TempDir, AppConfig) {
    let dir = tempfile::tempdir().expect("tempdir");
    let survey = dir.path().join("input.tsv");
    let reference = dir.path().join("input.geojson");
    fs::write(&survey, tsv).expect("write tsv");
    fs::write(&reference, geojson).expect("write geojson");
    let config = config_for(&survey, &reference);
    (dir, config)
}

pub fn config_for(survey: &Path, reference: &Path) -> AppConfig {
    AppConfig::from_toml(&format!(
        "[input]\nsurvey_tsv = \"{}\"\nreference = \"{}\"\n",
        survey.display(),
        reference.display()
    ))
    .expect("config")
}
