use crate::matching::MatchOutcome;
use crate::types::ALL_CONCEPTS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown action '{0}' (expected green, orange, red, all or export)")]
pub struct UnknownAction(pub String);

/// Which markers to put on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Matched,
    MappedNotMatched,
    NotYetVisited,
    All,
}

/// What a form submission asks for, keyed by the button value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Action {
    Show(View),
    Export,
}

impl Default for Action {
    fn default() -> Self {
        Action::Show(View::Matched)
    }
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Show(View::Matched) => "green",
            Action::Show(View::MappedNotMatched) => "orange",
            Action::Show(View::NotYetVisited) => "red",
            Action::Show(View::All) => "all",
            Action::Export => "export",
        }
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "green" => Ok(Action::Show(View::Matched)),
            "orange" => Ok(Action::Show(View::MappedNotMatched)),
            "red" => Ok(Action::Show(View::NotYetVisited)),
            "all" => Ok(Action::Show(View::All)),
            "export" => Ok(Action::Export),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

impl TryFrom<String> for Action {
    type Error = UnknownAction;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConceptFilter {
    #[default]
    All,
    Only(String),
}

impl ConceptFilter {
    pub fn from_form(value: &str) -> Self {
        if value == ALL_CONCEPTS {
            ConceptFilter::All
        } else {
            ConceptFilter::Only(value.to_string())
        }
    }

    pub fn accepts(&self, concept: &str) -> bool {
        match self {
            ConceptFilter::All => true,
            ConceptFilter::Only(c) => c == concept,
        }
    }

    pub fn as_form_value(&self) -> &str {
        match self {
            ConceptFilter::All => ALL_CONCEPTS,
            ConceptFilter::Only(c) => c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Matched,
    Unmatched,
    Unvisited,
}

impl MarkerKind {
    pub fn color(&self) -> &'static str {
        match self {
            MarkerKind::Matched => "green",
            MarkerKind::Unmatched => "orange",
            MarkerKind::Unvisited => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub kind: MarkerKind,
    pub color: &'static str,
}

impl Marker {
    pub fn new(lon: f64, lat: f64, kind: MarkerKind) -> Self {
        Self { lat, lon, kind, color: kind.color() }
    }
}

/// Map center used when there is nothing to show.
pub const ORIGIN: MapCenter = MapCenter { lat: 0.0, lon: 0.0 };

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

/// Markers for `view`. The concept filter only narrows survey points; reference
/// points have no concept.
pub fn select_markers(outcome: &MatchOutcome, view: View, filter: &ConceptFilter) -> Vec<Marker> {
    let survey = |matched: bool, kind: MarkerKind| {
        outcome
            .survey
            .iter()
            .filter(move |s| s.matched == matched && filter.accepts(&s.point.concept_clean))
            .map(move |s| Marker::new(s.point.position.x(), s.point.position.y(), kind))
    };
    let unvisited = || {
        outcome
            .unvisited()
            .map(|r| Marker::new(r.point.position.x(), r.point.position.y(), MarkerKind::Unvisited))
    };

    match view {
        View::Matched => survey(true, MarkerKind::Matched).collect(),
        View::MappedNotMatched => survey(false, MarkerKind::Unmatched).collect(),
        View::NotYetVisited => unvisited().collect(),
        View::All => survey(true, MarkerKind::Matched)
            .chain(survey(false, MarkerKind::Unmatched))
            .chain(unvisited())
            .collect(),
    }
}

/// Mean latitude and longitude of the markers, or [`ORIGIN`] when empty.
pub fn map_center(markers: &[Marker]) -> MapCenter {
    if markers.is_empty() {
        return ORIGIN;
    }
    let n = markers.len() as f64;
    MapCenter {
        lat: markers.iter().map(|m| m.lat).sum::<f64>() / n,
        lon: markers.iter().map(|m| m.lon).sum::<f64>() / n,
    }
}
