pub mod config;
pub mod payload;
pub mod projection;
pub mod sampling;
pub mod stats;


pub use config::*;
pub use payload::*;
pub use projection::*;
pub use sampling::*;
pub use stats::*;

use crate::models::TrackRecord;

/// Aggregate statistics over the full collection
pub fn compute_statistics(tracks: &[TrackRecord]) -> StatisticsSummary {
    PlaylistStatistics::compute(tracks)
}
