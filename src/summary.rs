use crate::matching::MatchOutcome;

pub const TOTAL_VISITED: &str = "Total visited";
pub const NOT_YET_VISITED: &str = "Not yet visited";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Concept,
    TotalVisited,
    NotYetVisited,
}

/// One line of the summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub label: String,
    /// `None` on the "Not yet visited" row, which only counts reference points.
    pub matched: Option<usize>,
    pub not_matched: usize,
    pub kind: RowKind,
}

impl SummaryRow {
    pub fn is_total(&self) -> bool {
        self.kind != RowKind::Concept
    }
}

/// Per-concept counts in ascending label order, then the two total rows.
pub fn summarize(outcome: &MatchOutcome) -> Vec<SummaryRow> {
    let mut rows = Vec::with_capacity(outcome.concepts.len() + 2);
    let mut total_matched = 0;
    let mut total_not_matched = 0;

    for concept in &outcome.concepts {
        let (matched, not_matched) = outcome
            .survey
            .iter()
            .filter(|s| &s.point.concept_clean == concept)
            .fold((0, 0), |(m, n), s| if s.matched { (m + 1, n) } else { (m, n + 1) });

        total_matched += matched;
        total_not_matched += not_matched;
        rows.push(SummaryRow {
            label: concept.clone(),
            matched: Some(matched),
            not_matched,
            kind: RowKind::Concept,
        });
    }

    rows.push(SummaryRow {
        label: TOTAL_VISITED.to_string(),
        matched: Some(total_matched),
        not_matched: total_not_matched,
        kind: RowKind::TotalVisited,
    });
    rows.push(SummaryRow {
        label: NOT_YET_VISITED.to_string(),
        matched: None,
        not_matched: outcome.unvisited_count(),
        kind: RowKind::NotYetVisited,
    });

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{Radius, SpatialMatcher};
    use crate::projection::MetricCrs;
    use crate::types::{ReferencePoint, SurveyPoint};

    fn outcome(survey: &[SurveyPoint], reference: &[ReferencePoint], r: f64) -> MatchOutcome {
        SpatialMatcher::new(MetricCrs::RdNew, Radius::new(r).unwrap())
            .run(survey, reference)
            .unwrap()
    }

    #[test]
    fn test_scenario_rows() {
        let survey = vec![
            SurveyPoint::new(5.0, 52.0, "Forest|x"),
            SurveyPoint::new(5.001, 52.0, "Water"),
        ];
        let reference = vec![ReferencePoint::new(5.0, 52.0)];
        let rows = summarize(&outcome(&survey, &reference, 50.0));

        let got: Vec<(&str, Option<usize>, usize)> = rows
            .iter()
            .map(|r| (r.label.as_str(), r.matched, r.not_matched))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Forest", Some(1), 0),
                ("Water", Some(0), 1),
                (TOTAL_VISITED, Some(1), 1),
                (NOT_YET_VISITED, None, 0),
            ]
        );
        assert!(!rows[0].is_total());
        assert!(rows[2].is_total() && rows[3].is_total());
    }

    #[test]
    fn test_rows_sorted_and_counts_add_up() {
        let survey = vec![
            SurveyPoint::new(5.0, 52.0, "b"),
            SurveyPoint::new(5.2, 52.1, "a|extra"),
            SurveyPoint::new(5.0, 52.0, "b"),
            SurveyPoint::new(5.4, 52.3, ""),
            SurveyPoint::new(5.2, 52.1, "a"),
        ];
        let reference = vec![ReferencePoint::new(5.0, 52.0), ReferencePoint::new(6.0, 53.0)];
        let rows = summarize(&outcome(&survey, &reference, 10.0));

        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["", "a", "b", TOTAL_VISITED, NOT_YET_VISITED]);

        let per_concept: usize = rows
            .iter()
            .filter(|r| r.kind == RowKind::Concept)
            .map(|r| r.matched.unwrap_or(0) + r.not_matched)
            .sum();
        assert_eq!(per_concept, survey.len());
        assert_eq!(rows[3].matched, Some(2));
        assert_eq!(rows[3].not_matched, 3);
        assert_eq!(rows[4].not_matched, 1);
    }

    #[test]
    fn test_no_survey_points_still_has_totals() {
        let rows = summarize(&outcome(&[], &[ReferencePoint::new(5.0, 52.0)], 10.0));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].matched, Some(0));
        assert_eq!(rows[1].not_matched, 1);
    }
}
