use crate::config::AppConfig;
use crate::markers::{Action, ConceptFilter, UnknownAction};
use crate::matching::Radius;
use serde::Deserialize;
use thiserror::Error;

/// Form fields exactly as posted. Absent fields fall back to configured defaults.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawForm {
    pub radius: Option<String>,
    pub concept: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("radius: '{0}' is not a positive number of meters")]
    Radius(String),
    #[error("action: {0}")]
    Action(#[from] UnknownAction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckRequest {
    pub radius: Radius,
    pub filter: ConceptFilter,
    pub action: Action,
}

impl CheckRequest {
    pub fn defaults(config: &AppConfig) -> Result<Self, ValidationError> {
        Self::from_form(RawForm::default(), config)
    }

    pub fn from_form(form: RawForm, config: &AppConfig) -> Result<Self, ValidationError> {
        let radius = match form.radius {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|r| Radius::new(r).ok())
                .ok_or(ValidationError::Radius(raw))?,
            None => Radius::new(config.matching.default_radius)
                .map_err(|_| ValidationError::Radius(config.matching.default_radius.to_string()))?,
        };
        let filter = ConceptFilter::from_form(
            form.concept.as_deref().unwrap_or(&config.form.default_concept),
        );
        let action = match form.action {
            Some(raw) => raw.parse()?,
            None => config.form.default_action,
        };
        Ok(Self { radius, filter, action })
    }
}
