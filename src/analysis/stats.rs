use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::models::{AudioFeature, Field, TrackRecord};

pub const DEFAULT_TOP_ARTISTS: usize = 10;

/// Mean and sample standard deviation of one column
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub std: f64,
}

/// Aggregate descriptors computed over a whole track collection. Audio
/// features serialize as flat `avg_<feature>` / `std_<feature>` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub track_count: usize,
    pub artists_count: usize,
    pub albums_count: usize,
    pub avg_popularity: f64,
    pub duration_minutes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit_ratio: Option<f64>, // None when no record carries the flag
    pub top_artists: IndexMap<String, usize>,
    #[serde(flatten)]
    pub feature_metrics: IndexMap<String, f64>,
}

impl StatisticsSummary {
    pub fn feature(&self, feature: AudioFeature) -> FeatureStats {
        let lookup = |prefix: &str| {
            self.feature_metrics
                .get(&format!("{prefix}_{}", feature.key()))
                .copied()
                .unwrap_or_default()
        };
        FeatureStats {
            mean: lookup("avg"),
            std: lookup("std"),
        }
    }

    /// Flat lookup by report key, e.g. `avg_tempo`, `std_energy`, `explicit_ratio`
    pub fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "track_count" => Some(self.track_count as f64),
            "artists_count" => Some(self.artists_count as f64),
            "albums_count" => Some(self.albums_count as f64),
            "avg_popularity" => Some(self.avg_popularity),
            "duration_minutes" => Some(self.duration_minutes),
            "explicit_ratio" => self.explicit_ratio,
            _ => self.feature_metrics.get(key).copied(),
        }
    }
}

/// Aggregator over track collections
pub struct PlaylistStatistics;

impl PlaylistStatistics {
    /// Compute the summary with the default top-artist limit
    pub fn compute(tracks: &[TrackRecord]) -> StatisticsSummary {
        Self::compute_with_limit(tracks, DEFAULT_TOP_ARTISTS)
    }

    pub fn compute_with_limit(tracks: &[TrackRecord], top_artist_limit: usize) -> StatisticsSummary {
        let popularity: Vec<f64> = Self::valid_values(tracks, Field::Popularity).collect();
        let duration_ms: f64 = Self::valid_values(tracks, Field::DurationMs).sum();

        let mut feature_metrics = IndexMap::new();
        for feature in AudioFeature::ALL {
            let stats = Self::column_stats(tracks, feature.field());
            feature_metrics.insert(format!("avg_{}", feature.key()), stats.mean);
            feature_metrics.insert(format!("std_{}", feature.key()), stats.std);
        }

        let summary = StatisticsSummary {
            track_count: tracks.len(),
            artists_count: Self::distinct_count(tracks, Field::Artist),
            albums_count: Self::distinct_count(tracks, Field::Album),
            avg_popularity: zero_if_nan(mean(&popularity)),
            duration_minutes: duration_ms / 60000.0,
            explicit_ratio: Self::explicit_ratio(tracks),
            top_artists: Self::top_artists(tracks, top_artist_limit),
            feature_metrics,
        };

        debug!(
            tracks = summary.track_count,
            artists = summary.artists_count,
            albums = summary.albums_count,
            "computed playlist statistics"
        );
        summary
    }

    /// Finite numeric values of a column, skipping absent and invalid entries
    fn valid_values(tracks: &[TrackRecord], field: Field) -> impl Iterator<Item = f64> + '_ {
        tracks.iter().filter_map(move |track| track.number(field))
    }

    /// Mean and sample (n - 1) standard deviation; zero wherever undefined
    pub fn column_stats(tracks: &[TrackRecord], field: Field) -> FeatureStats {
        let values: Vec<f64> = Self::valid_values(tracks, field).collect();
        FeatureStats {
            mean: zero_if_nan(mean(&values)),
            std: zero_if_nan(sample_std(&values)),
        }
    }

    fn distinct_count(tracks: &[TrackRecord], field: Field) -> usize {
        tracks
            .iter()
            .filter_map(|track| track.text(field))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Fraction of flagged tracks over the whole collection; a record without
    /// the flag counts as not explicit once any record carries it
    fn explicit_ratio(tracks: &[TrackRecord]) -> Option<f64> {
        if !tracks.iter().any(|track| track.has(Field::Explicit)) {
            return None;
        }
        let flagged = tracks
            .iter()
            .filter(|track| track.get(Field::Explicit).is_some_and(|value| value.as_flag()))
            .count();
        Some(flagged as f64 / tracks.len() as f64)
    }

    /// Most frequent artists, descending by count; ties keep first-seen order
    fn top_artists(tracks: &[TrackRecord], limit: usize) -> IndexMap<String, usize> {
        let mut tally: IndexMap<String, usize> = IndexMap::new();
        for artist in tracks.iter().filter_map(|track| track.text(Field::Artist)) {
            *tally.entry(artist).or_insert(0) += 1;
        }

        let mut ranked: Vec<(String, usize)> = tally.into_iter().collect();
        // Stable: equal counts keep encounter order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(limit);
        ranked.into_iter().collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn zero_if_nan(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value }
}
