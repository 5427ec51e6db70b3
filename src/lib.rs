pub mod types;
pub mod config;
pub mod projection;
pub mod data;
pub mod matching;
pub mod summary;
pub mod markers;
pub mod export;
pub mod processing;
pub mod request;
pub mod render;
pub mod server;

pub use matching::{MatchOutcome, Radius, SpatialMatcher};
pub use projection::MetricCrs;
pub use types::{ReferencePoint, SurveyPoint};
