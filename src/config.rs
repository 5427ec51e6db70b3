use crate::markers::Action;
use crate::matching::Radius;
use crate::projection::MetricCrs;
use crate::types::ALL_CONCEPTS;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub survey_tsv: PathBuf,
    pub reference: PathBuf, // .geojson/.json or .shp
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MatchingConfig {
    pub crs: MetricCrs,
    pub default_radius: f64, // meters
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            crs: MetricCrs::RdNew,
            default_radius: 10.0,
        }
    }
}

/// Initial form state for `GET /`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FormConfig {
    pub default_concept: String,
    pub default_action: Action,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_concept: ALL_CONCEPTS.to_string(),
            default_action: Action::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5002,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid server address {}:{}", self.host, self.port))
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        config.default_radius()?;
        Ok(config)
    }

    pub fn default_radius(&self) -> Result<Radius> {
        Radius::new(self.matching.default_radius)
            .with_context(|| "Invalid [matching] default_radius")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::View;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            survey_tsv = "input.tsv"
            reference = "input.geojson"
            "#,
        )
        .unwrap();

        assert_eq!(config.input.survey_tsv, PathBuf::from("input.tsv"));
        assert_eq!(config.matching.crs, MetricCrs::RdNew);
        assert_eq!(config.default_radius().unwrap().meters(), 10.0);
        assert_eq!(config.form.default_concept, ALL_CONCEPTS);
        assert_eq!(config.form.default_action, Action::Show(View::Matched));
        assert_eq!(config.server.addr().unwrap().port(), 5002);
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            survey_tsv = "data/survey.tsv"
            reference = "data/plots.shp"

            [matching]
            crs = "EPSG:32633"
            default_radius = 25.5

            [form]
            default_concept = "Forest"
            default_action = "all"

            [server]
            host = "0.0.0.0"
            port = 8080
            static_dir = "assets"
            "#,
        )
        .unwrap();

        assert_eq!(config.matching.crs, MetricCrs::Utm { zone: 33, north: true });
        assert_eq!(config.default_radius().unwrap().meters(), 25.5);
        assert_eq!(config.form.default_action, Action::Show(View::All));
        assert_eq!(config.server.addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.server.static_dir, PathBuf::from("assets"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let base = "[input]\nsurvey_tsv = \"a.tsv\"\nreference = \"b.geojson\"\n";
        assert!(AppConfig::from_toml(&format!("{base}[matching]\ncrs = \"EPSG:4326\"\n")).is_err());
        assert!(AppConfig::from_toml(&format!("{base}[matching]\ndefault_radius = 0.0\n")).is_err());
        assert!(AppConfig::from_toml(&format!("{base}[form]\ndefault_action = \"blue\"\n")).is_err());
        assert!(AppConfig::from_toml("[matching]\ndefault_radius = 5.0\n").is_err());
    }
}
