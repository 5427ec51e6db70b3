//! Bidirectional proximity matching between survey and reference points.
//!
//! Both collections are projected into the configured metric CRS. Around every
//! reference point a disk of `radius` meters is drawn; the union of those disks
//! is the reference buffer, and a survey point is *matched* when it lies inside
//! it. The same is done the other way round to decide which reference points
//! have been *visited*.
//!
//! The buffer union is kept exactly, as the set of disk centers plus the radius.
//! A point lies inside a union of equal disks iff the nearest center is within
//! the radius, so containment is a single nearest-neighbor lookup in an R-tree
//! of centers. The boundary is inclusive.

use crate::projection::{MetricCrs, ProjectionError};
use crate::types::{MatchedSurveyPoint, ReferencePoint, SurveyPoint, VisitedReferencePoint};
use geo::{Coord, Point};
use rstar::RTree;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Slack on the inclusive boundary, absorbing rounding in projected coordinates.
pub const BOUNDARY_TOLERANCE_M: f64 = 1e-6;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("radius must be a positive number of meters, got {0}")]
    InvalidRadius(f64),
    #[error("{collection} point #{index} cannot be projected: {source}")]
    Projection {
        collection: &'static str,
        index: usize,
        #[source]
        source: ProjectionError,
    },
}

/// A strictly positive, finite distance in meters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Radius(f64);

impl Radius {
    pub fn new(meters: f64) -> Result<Self, MatchError> {
        if meters.is_finite() && meters > 0.0 {
            Ok(Radius(meters))
        } else {
            Err(MatchError::InvalidRadius(meters))
        }
    }

    pub fn meters(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Radius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Union of equal-radius disks in a planar CRS.
pub struct BufferUnion {
    centers: RTree<[f64; 2]>,
    radius: f64,
}

impl BufferUnion {
    pub fn new(centers: &[Coord<f64>], radius: Radius) -> Self {
        let centers = RTree::bulk_load(centers.iter().map(|c| [c.x, c.y]).collect());
        Self {
            centers,
            radius: radius.meters(),
        }
    }

    pub fn len(&self) -> usize {
        self.centers.size()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.size() == 0
    }

    /// Whether `p` lies in the union, boundary included.
    pub fn contains(&self, p: Coord<f64>) -> bool {
        self.centers
            .nearest_neighbor(&[p.x, p.y])
            .map_or(false, |c| {
                let d = ((c[0] - p.x).powi(2) + (c[1] - p.y).powi(2)).sqrt();
                d <= self.radius + BOUNDARY_TOLERANCE_M
            })
    }
}

/// Both collections after matching, plus the sorted distinct concept labels.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub survey: Vec<MatchedSurveyPoint>,
    pub reference: Vec<VisitedReferencePoint>,
    pub concepts: Vec<String>,
}

impl MatchOutcome {
    pub fn unvisited(&self) -> impl Iterator<Item = &VisitedReferencePoint> {
        self.reference.iter().filter(|r| !r.visited)
    }

    pub fn unvisited_count(&self) -> usize {
        self.unvisited().count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpatialMatcher {
    crs: MetricCrs,
    radius: Radius,
}

impl SpatialMatcher {
    pub fn new(crs: MetricCrs, radius: Radius) -> Self {
        Self { crs, radius }
    }

    /// Classify both collections. Inputs are copied, never modified.
    pub fn run(
        &self,
        survey: &[SurveyPoint],
        reference: &[ReferencePoint],
    ) -> Result<MatchOutcome, MatchError> {
        let survey_xy = self.project_all("survey", survey.iter().map(|p| p.position))?;
        let reference_xy = self.project_all("reference", reference.iter().map(|p| p.position))?;

        let reference_buffer = BufferUnion::new(&reference_xy, self.radius);
        let survey_buffer = BufferUnion::new(&survey_xy, self.radius);

        let survey: Vec<MatchedSurveyPoint> = survey
            .iter()
            .zip(&survey_xy)
            .map(|(point, &planar)| MatchedSurveyPoint {
                point: point.clone(),
                planar,
                matched: reference_buffer.contains(planar),
            })
            .collect();

        let reference: Vec<VisitedReferencePoint> = reference
            .iter()
            .zip(&reference_xy)
            .map(|(point, &planar)| VisitedReferencePoint {
                point: point.clone(),
                planar,
                visited: survey_buffer.contains(planar),
            })
            .collect();

        let concepts: BTreeSet<&str> = survey.iter().map(|s| s.point.concept_clean.as_str()).collect();
        let concepts = concepts.into_iter().map(str::to_string).collect();

        let visited = reference.iter().filter(|r| r.visited).count();
        debug!(
            crs = %self.crs,
            radius = self.radius.meters(),
            matched = survey.iter().filter(|s| s.matched).count(),
            visited,
            not_visited = reference.len() - visited,
            "matching complete"
        );

        Ok(MatchOutcome {
            survey,
            reference,
            concepts,
        })
    }

    fn project_all(
        &self,
        collection: &'static str,
        positions: impl Iterator<Item = Point<f64>>,
    ) -> Result<Vec<Coord<f64>>, MatchError> {
        positions
            .enumerate()
            .map(|(index, p)| {
                self.crs
                    .project(p.0)
                    .map_err(|source| MatchError::Projection { collection, index, source })
            })
            .collect()
    }
}
