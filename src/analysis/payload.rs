use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::config::AnalysisSettings;
use super::projection::{SampleTrack, project_sample};
use super::sampling::StrategicSampler;
use super::stats::{PlaylistStatistics, StatisticsSummary};
use crate::error::IngestError;
use crate::ingest::TrackSource;
use crate::models::TrackRecord;

/// Everything report generation needs about one playlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub playlist_name: String,
    pub basic_analysis: StatisticsSummary,
    pub track_samples: Vec<SampleTrack>,
    pub total_tracks: usize,
    pub analyzed_tracks: usize,
    pub generated_at: DateTime<Utc>,
}

/// Run the aggregator and the sampler over the same collection and package the results
pub fn analyze_playlist(
    tracks: &[TrackRecord],
    playlist_name: &str,
    settings: &AnalysisSettings,
) -> AnalysisPayload {
    let basic_analysis = PlaylistStatistics::compute_with_limit(tracks, settings.top_artist_limit);

    let sampler = StrategicSampler::new(settings.max_sample_size, settings.seed);
    let sample = sampler.sample(tracks);
    let track_samples = project_sample(&sample);

    info!(
        playlist = playlist_name,
        total = tracks.len(),
        sampled = track_samples.len(),
        "analyzed playlist"
    );

    AnalysisPayload {
        playlist_name: playlist_name.to_string(),
        basic_analysis,
        total_tracks: tracks.len(),
        analyzed_tracks: track_samples.len(),
        track_samples,
        generated_at: Utc::now(),
    }
}

/// Load tracks from a source and analyze them. Structural failures from the
/// source are returned unchanged; nothing is analyzed in that case.
pub fn analyze_source(
    source: &dyn TrackSource,
    playlist_name: &str,
    settings: &AnalysisSettings,
) -> Result<AnalysisPayload, IngestError> {
    let tracks = source.load_tracks()?;
    Ok(analyze_playlist(&tracks, playlist_name, settings))
}
