//! Statistics and strategic sampling over playlist track metadata, producing
//! the payload consumed by vibe-check report generation.

pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;

#[cfg(test)]
mod analysis_tests;

pub use analysis::{
    AnalysisPayload, AnalysisSettings, SampleTrack, StatisticsSummary, analyze_playlist,
    compute_statistics, create_sample, project_sample,
};
pub use error::IngestError;
pub use models::{AudioFeature, Field, FieldValue, TrackRecord};
