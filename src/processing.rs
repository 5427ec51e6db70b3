use crate::config::AppConfig;
use crate::data;
use crate::export::Export;
use crate::matching::{MatchOutcome, Radius, SpatialMatcher};
use crate::summary::{summarize, RowKind, SummaryRow};
use anyhow::{Context, Result};
use tracing::debug;

/// One full pass over the input files for a given radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub outcome: MatchOutcome,
    pub rows: Vec<SummaryRow>,
}

impl Comparison {
    pub fn export(&self) -> Export {
        Export::from_outcome(&self.outcome)
    }

    /// Count shown on the "Not yet visited" row.
    pub fn not_yet_visited(&self) -> usize {
        self.rows
            .iter()
            .find(|r| r.kind == RowKind::NotYetVisited)
            .map_or(0, |r| r.not_matched)
    }
}

/// Loads both point sets fresh from disk, matches them and builds the summary.
pub fn compare(config: &AppConfig, radius: Radius) -> Result<Comparison> {
    let survey = data::load_survey_points(&config.input.survey_tsv)?;
    let reference = data::load_reference_points(&config.input.reference)?;
    debug!(
        survey = survey.len(),
        reference = reference.len(),
        radius = radius.meters(),
        crs = %config.matching.crs,
        "comparing point sets"
    );

    let outcome = SpatialMatcher::new(config.matching.crs, radius)
        .run(&survey, &reference)
        .context("Spatial matching failed")?;
    Ok(comparison_from(outcome))
}

pub fn comparison_from(outcome: MatchOutcome) -> Comparison {
    let rows = summarize(&outcome);
    if let Some(total) = rows.iter().find(|r| r.kind == RowKind::TotalVisited) {
        debug!(
            total_matched = total.matched.unwrap_or(0),
            total_not_matched = total.not_matched,
            not_visited = outcome.unvisited_count(),
            "summary built"
        );
    }
    Comparison { outcome, rows }
}

pub fn format_table(rows: &[SummaryRow]) -> String {
    let width = rows
        .iter()
        .map(|r| r.label.chars().count())
        .chain(std::iter::once("Mapped landcover".len()))
        .max()
        .unwrap_or(0);

    let mut out = format!("{:<width$}  {:>8}  {:>11}\n", "Mapped landcover", "Matched", "Not matched");
    for row in rows {
        let matched = row.matched.map(|m| m.to_string()).unwrap_or_default();
        out.push_str(&format!("{:<width$}  {:>8}  {:>11}\n", row.label, matched, row.not_matched));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::MetricCrs;
    use crate::types::{ReferencePoint, SurveyPoint};

    fn scenario() -> Comparison {
        let survey = vec![
            SurveyPoint::new(5.0, 52.0, "Forest|x"),
            SurveyPoint::new(5.001, 52.0, "Water"),
        ];
        let reference = vec![ReferencePoint::new(5.0, 52.0), ReferencePoint::new(5.5, 52.5)];
        let outcome = SpatialMatcher::new(MetricCrs::RdNew, Radius::new(50.0).unwrap())
            .run(&survey, &reference)
            .unwrap();
        comparison_from(outcome)
    }

    #[test]
    fn test_not_yet_visited_agrees_with_export() {
        let comparison = scenario();
        let export = comparison.export();
        assert_eq!(comparison.not_yet_visited(), 1);
        assert_eq!(export.count, comparison.not_yet_visited());
        assert_eq!(export.filename(), "Groundtruth_1_points.geojson");
    }

    #[test]
    fn test_format_table() {
        let table = format_table(&scenario().rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Mapped landcover"));
        assert!(lines[1].starts_with("Forest"));
        assert!(lines[4].starts_with("Not yet visited"));
        assert!(lines[4].trim_end().ends_with('1'));
    }
}
