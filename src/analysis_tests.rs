// Behavioural tests for the aggregator, the sampler and the analysis pipeline

use crate::analysis::{
    AnalysisSettings, PlaylistStatistics, StatisticsSummary, StrategicSampler, StrategyBudgets, analyze_playlist,
    analyze_source, compute_statistics, create_sample, project_sample,
};
use crate::error::IngestError;
use crate::ingest::{MockTrackSource, parse_csv};
use crate::models::{AudioFeature, Field, TrackRecord};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    fn create_test_track(name: &str, artist: &str, popularity: f64) -> TrackRecord {
        TrackRecord::new()
            .with(Field::TrackName, name)
            .with(Field::Artist, artist)
            .with(Field::Album, format!("{artist} Album"))
            .with(Field::Popularity, popularity)
            .with(Field::DurationMs, 180_000.0)
    }

    /// Tracks with every field populated from simple position-derived values
    fn create_full_collection(size: usize) -> Vec<TrackRecord> {
        (0..size)
            .map(|i| {
                let spread = i as f64 / size.max(1) as f64;
                create_test_track(&format!("Track {i}"), &format!("Artist {}", i % 17), ((i * 37) % 101) as f64)
                    .with(Field::TrackId, format!("id-{i}"))
                    .with(Field::Explicit, i % 3 == 0)
                    .with(Field::Danceability, spread)
                    .with(Field::Energy, ((i * 7) % 100) as f64 / 100.0)
                    .with(Field::Valence, 1.0 - spread)
                    .with(Field::Acousticness, ((i * 13) % 100) as f64 / 100.0)
                    .with(Field::Tempo, 80.0 + (i % 60) as f64)
            })
            .collect()
    }

    fn sampled_positions(tracks: &[TrackRecord], max_size: usize, seed: u64) -> Vec<usize> {
        StrategicSampler::new(max_size, seed).sample_indices(tracks)
    }

    #[test]
    fn test_small_collection_passes_through() {
        let tracks = vec![
            create_test_track("Low", "A", 10.0),
            create_test_track("High", "B", 90.0),
            create_test_track("Mid", "C", 50.0),
        ];

        let sample = create_sample(&tracks, 3, 42);
        assert_eq!(sample, tracks);

        let stats = compute_statistics(&tracks);
        assert_relative_eq!(stats.avg_popularity, 50.0);
        assert_eq!(stats.metric("avg_popularity"), Some(50.0));
    }

    #[test]
    fn test_sample_size_is_bounded() {
        for size in [0, 1, 5, 50, 100, 101, 150, 257, 1000] {
            let tracks = create_full_collection(size);
            for max_size in [0, 1, 7, 10, 100] {
                let positions = sampled_positions(&tracks, max_size, 42);
                assert_eq!(
                    positions.len(),
                    size.min(max_size),
                    "size {size}, max {max_size}"
                );
            }
        }
    }

    #[test]
    fn test_sample_has_no_duplicates() {
        for size in [101, 120, 300, 2000] {
            let tracks = create_full_collection(size);
            let positions = sampled_positions(&tracks, 100, 42);
            let unique: HashSet<usize> = positions.iter().copied().collect();
            assert_eq!(unique.len(), positions.len());
            assert!(positions.iter().all(|&p| p < size));
        }
    }

    #[test]
    fn test_identical_records_are_kept_apart() {
        // Every record is equal, so only position identity can tell them apart
        let tracks: Vec<TrackRecord> = (0..150)
            .map(|_| create_test_track("Same", "Same Artist", 50.0))
            .collect();
        let positions = sampled_positions(&tracks, 100, 42);
        assert_eq!(positions.len(), 100);
        let unique: HashSet<usize> = positions.iter().copied().collect();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let tracks = create_full_collection(500);
        let first = create_sample(&tracks, 100, 42);
        let second = create_sample(&tracks, 100, 42);
        assert_eq!(first, second);
        assert_eq!(project_sample(&first), project_sample(&second));
    }

    #[test]
    fn test_different_seeds_change_random_picks() {
        let tracks = create_full_collection(2000);
        let a = sampled_positions(&tracks, 100, 42);
        let b = sampled_positions(&tracks, 100, 7);
        assert_ne!(a, b);
        // Popularity picks come first and do not depend on the seed
        assert_eq!(a[..40], b[..40]);
    }

    #[test]
    fn test_diversity_keeps_danceability_extremes() {
        let tracks: Vec<TrackRecord> = (0..250)
            .map(|i| {
                TrackRecord::new()
                    .with(Field::TrackName, format!("Track {i}"))
                    .with(Field::Danceability, i as f64 / 249.0)
            })
            .collect();

        let positions = sampled_positions(&tracks, 100, 42);
        assert_eq!(positions.len(), 100);
        for extreme in [0, 1, 2, 247, 248, 249] {
            assert!(positions.contains(&extreme), "missing extreme record {extreme}");
        }
    }

    #[test]
    fn test_popularity_strategy_leads_the_sample() {
        let tracks = create_full_collection(400);
        let positions = sampled_positions(&tracks, 100, 42);

        let mut by_popularity: Vec<usize> = (0..tracks.len()).collect();
        by_popularity.sort_by(|&a, &b| {
            let pa = tracks[a].number(Field::Popularity).unwrap_or(0.0);
            let pb = tracks[b].number(Field::Popularity).unwrap_or(0.0);
            pb.partial_cmp(&pa).unwrap()
        });
        assert_eq!(positions[..80], by_popularity[..80]);
    }

    #[test]
    fn test_missing_popularity_falls_back_to_original_order() {
        let tracks: Vec<TrackRecord> = (0..300)
            .map(|i| TrackRecord::new().with(Field::TrackName, format!("Track {i}")))
            .collect();
        let positions = sampled_positions(&tracks, 100, 42);
        assert_eq!(positions[..80], (0..80usize).collect::<Vec<_>>()[..]);
        assert_eq!(positions.len(), 100);
    }

    #[test]
    fn test_invalid_values_never_break_sampling() {
        let tracks: Vec<TrackRecord> = (0..200)
            .map(|i| {
                let record = TrackRecord::new().with(Field::TrackName, format!("Track {i}"));
                if i % 2 == 0 {
                    record
                        .with(Field::Popularity, f64::NAN)
                        .with(Field::Energy, "loud")
                } else {
                    record.with(Field::Popularity, i as f64).with(Field::Energy, 0.5)
                }
            })
            .collect();
        let positions = sampled_positions(&tracks, 50, 42);
        assert_eq!(positions.len(), 50);
        let unique: HashSet<usize> = positions.iter().copied().collect();
        assert_eq!(unique.len(), 50);
        // Top popularity picks only come from records with a valid value
        assert!(positions[..20].iter().all(|p| p % 2 == 1));
    }

    #[test]
    fn test_strategy_budgets() {
        assert_eq!(
            StrategyBudgets::for_size(100),
            StrategyBudgets { popularity: 40, diversity: 40, random: 20 }
        );
        assert_eq!(
            StrategyBudgets::for_size(7),
            StrategyBudgets { popularity: 2, diversity: 2, random: 3 }
        );
        assert_eq!(
            StrategyBudgets::for_size(0),
            StrategyBudgets { popularity: 0, diversity: 0, random: 0 }
        );
    }

    #[test]
    fn test_missing_tempo_defaults_to_zero() {
        let tracks = vec![
            create_test_track("One", "A", 40.0),
            create_test_track("Two", "B", 60.0),
        ];
        let stats = compute_statistics(&tracks);
        assert_eq!(stats.metric("avg_tempo"), Some(0.0));
        assert_eq!(stats.metric("std_tempo"), Some(0.0));
        assert!(!stats.feature(AudioFeature::Tempo).mean.is_nan());
    }

    #[test]
    fn test_all_invalid_feature_defaults_to_zero() {
        let tracks = vec![
            create_test_track("One", "A", 40.0).with(Field::Energy, f64::NAN),
            create_test_track("Two", "B", 60.0).with(Field::Energy, "n/a"),
        ];
        let stats = compute_statistics(&tracks);
        assert_eq!(stats.feature(AudioFeature::Energy).mean, 0.0);
        assert_eq!(stats.feature(AudioFeature::Energy).std, 0.0);
    }

    #[test]
    fn test_feature_mean_and_sample_std() {
        let tracks: Vec<TrackRecord> = [10.0, 90.0, 50.0]
            .iter()
            .map(|&p| create_test_track("T", "A", p).with(Field::Tempo, p))
            .collect();
        let stats = compute_statistics(&tracks);
        let tempo = stats.feature(AudioFeature::Tempo);
        assert_relative_eq!(tempo.mean, 50.0);
        assert_relative_eq!(tempo.std, 40.0);
    }

    #[test]
    fn test_invalid_values_excluded_from_mean() {
        let tracks = vec![
            create_test_track("One", "A", 20.0).with(Field::Valence, 0.2),
            create_test_track("Two", "B", 40.0).with(Field::Valence, f64::NAN),
            create_test_track("Three", "C", 60.0).with(Field::Valence, 0.6),
            create_test_track("Four", "D", 80.0),
        ];
        let stats = compute_statistics(&tracks);
        assert_relative_eq!(stats.feature(AudioFeature::Valence).mean, 0.4);
    }

    #[test]
    fn test_avg_popularity_skips_invalid_values() {
        let tracks = vec![
            create_test_track("A", "A", 30.0),
            TrackRecord::new().with(Field::Popularity, "unknown"),
            TrackRecord::new().with(Field::Popularity, f64::INFINITY),
            TrackRecord::new().with(Field::TrackName, "No popularity"),
            create_test_track("B", "B", 60.0),
        ];
        let stats = compute_statistics(&tracks);
        assert_relative_eq!(stats.avg_popularity, 45.0);
        assert_eq!(stats.metric("avg_popularity"), Some(45.0));
    }

    #[test]
    fn test_explicit_text_true_gives_full_ratio() {
        let tracks: Vec<TrackRecord> = (0..5)
            .map(|i| create_test_track(&format!("T{i}"), "A", 50.0).with(Field::Explicit, "True"))
            .collect();
        assert_eq!(compute_statistics(&tracks).explicit_ratio, Some(1.0));
    }

    #[test]
    fn test_explicit_ratio_mixed_representations() {
        let tracks = vec![
            create_test_track("A", "A", 1.0).with(Field::Explicit, true),
            create_test_track("B", "A", 1.0).with(Field::Explicit, false),
            create_test_track("C", "A", 1.0).with(Field::Explicit, "TRUE"),
            create_test_track("D", "A", 1.0).with(Field::Explicit, "no"),
        ];
        let ratio = compute_statistics(&tracks).explicit_ratio.unwrap();
        assert_relative_eq!(ratio, 0.5);
        assert!((0.0..=1.0).contains(&ratio));
    }

    #[test]
    fn test_blank_explicit_cells_count_as_not_explicit() {
        let content = "Track Name,Explicit\nA,True\nB,\nC,\nD,False\n";
        let tracks = parse_csv(content.as_bytes()).unwrap();
        assert!(!tracks[1].has(Field::Explicit));

        let ratio = compute_statistics(&tracks).explicit_ratio.unwrap();
        assert_relative_eq!(ratio, 0.25);
    }

    #[test]
    fn test_summary_serializes_flat_feature_keys() {
        let tracks = vec![
            create_test_track("One", "A", 40.0)
                .with(Field::Danceability, 0.7)
                .with(Field::Tempo, 120.0),
        ];
        let stats = compute_statistics(&tracks);
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["avg_danceability"], 0.7);
        assert_eq!(json["avg_tempo"], 120.0);
        assert_eq!(json["std_tempo"], 0.0);
        assert_eq!(json["avg_energy"], 0.0);
        for feature in AudioFeature::ALL {
            assert!(json.get(format!("avg_{}", feature.key())).is_some());
            assert!(json.get(format!("std_{}", feature.key())).is_some());
        }

        let restored: StatisticsSummary = serde_json::from_value(json).unwrap();
        assert_eq!(restored, stats);
        assert_eq!(restored.metric("avg_tempo"), Some(120.0));
    }

    #[test]
    fn test_explicit_ratio_omitted_without_flag() {
        let tracks = vec![create_test_track("A", "A", 1.0)];
        let stats = compute_statistics(&tracks);
        assert_eq!(stats.explicit_ratio, None);
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("explicit_ratio").is_none());
    }

    #[test]
    fn test_empty_collection_yields_zero_summary() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.track_count, 0);
        assert_eq!(stats.artists_count, 0);
        assert_eq!(stats.albums_count, 0);
        assert_eq!(stats.avg_popularity, 0.0);
        assert_eq!(stats.duration_minutes, 0.0);
        assert_eq!(stats.explicit_ratio.unwrap_or(0.0), 0.0);
        for feature in AudioFeature::ALL {
            assert_eq!(stats.feature(feature).mean, 0.0);
            assert_eq!(stats.feature(feature).std, 0.0);
        }
        assert!(stats.top_artists.is_empty());
        assert!(create_sample(&[], 100, 42).is_empty());
    }

    #[test]
    fn test_duration_reported_in_minutes() {
        let tracks = vec![
            create_test_track("A", "A", 1.0),
            create_test_track("B", "B", 1.0),
        ];
        // Two 3-minute tracks
        assert_relative_eq!(compute_statistics(&tracks).duration_minutes, 6.0);
    }

    #[test]
    fn test_distinct_counts_ignore_absent_values() {
        let tracks = vec![
            create_test_track("A", "Artist", 1.0),
            create_test_track("B", "Artist", 1.0),
            create_test_track("C", "", 1.0),
            TrackRecord::new().with(Field::TrackName, "No artist"),
        ];
        let stats = compute_statistics(&tracks);
        // "Artist" and the explicit empty string
        assert_eq!(stats.artists_count, 2);
        assert_eq!(stats.albums_count, 2);
    }

    #[test]
    fn test_top_artists_ranked_with_stable_ties() {
        let tracks: Vec<TrackRecord> = ["A", "B", "B", "C", "A", "D"]
            .iter()
            .map(|artist| create_test_track("T", artist, 1.0))
            .collect();
        let stats = compute_statistics(&tracks);
        let ranked: Vec<(&str, usize)> = stats
            .top_artists
            .iter()
            .map(|(artist, count)| (artist.as_str(), *count))
            .collect();
        assert_eq!(ranked, vec![("A", 2), ("B", 2), ("C", 1), ("D", 1)]);
    }

    #[test]
    fn test_top_artists_limited_to_ten() {
        let tracks: Vec<TrackRecord> = (0..30)
            .map(|i| create_test_track("T", &format!("Artist {i}"), 1.0))
            .collect();
        let stats = compute_statistics(&tracks);
        assert_eq!(stats.top_artists.len(), 10);
        assert_eq!(stats.top_artists.get_index(0).map(|(a, _)| a.as_str()), Some("Artist 0"));

        let limited = PlaylistStatistics::compute_with_limit(&tracks, 3);
        assert_eq!(limited.top_artists.len(), 3);
    }

    #[test]
    fn test_projection_defaults() {
        let records = vec![
            TrackRecord::new(),
            create_test_track("Song", "Band", 77.0)
                .with(Field::Danceability, 0.8)
                .with(Field::Energy, "bad"),
        ];
        let projected = project_sample(&records);

        assert_eq!(projected[0].name, "Unknown Track");
        assert_eq!(projected[0].artist, "Unknown Artist");
        assert_eq!(projected[0].popularity, 0.0);
        assert_eq!(projected[0].danceability, None);

        assert_eq!(projected[1].name, "Song");
        assert_eq!(projected[1].popularity, 77.0);
        assert_eq!(projected[1].danceability, Some(0.8));
        assert_eq!(projected[1].energy, Some(0.0));
        assert_eq!(projected[1].valence, None);
    }

    #[test]
    fn test_analyze_playlist_packages_counts() {
        let tracks = create_full_collection(250);
        let settings = AnalysisSettings {
            max_sample_size: 60,
            ..AnalysisSettings::default()
        };
        let payload = analyze_playlist(&tracks, "Road Trip", &settings);

        assert_eq!(payload.playlist_name, "Road Trip");
        assert_eq!(payload.total_tracks, 250);
        assert_eq!(payload.analyzed_tracks, 60);
        assert_eq!(payload.track_samples.len(), 60);
        assert_eq!(payload.basic_analysis.track_count, 250);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["analyzed_tracks"], 60);
        assert!(json["basic_analysis"]["avg_tempo"].is_number());
        assert!(json["basic_analysis"]["std_danceability"].is_number());
        assert!(json["basic_analysis"].get("audio_features").is_none());
    }

    #[test]
    fn test_analyze_source_uses_loaded_tracks() {
        let mut source = MockTrackSource::new();
        source
            .expect_load_tracks()
            .times(1)
            .returning(|| Ok(create_full_collection(20)));

        let payload = analyze_source(&source, "Mocked", &AnalysisSettings::default()).unwrap();
        assert_eq!(payload.total_tracks, 20);
        assert_eq!(payload.analyzed_tracks, 20);
    }

    #[test]
    fn test_analyze_source_surfaces_structural_errors() {
        let mut source = MockTrackSource::new();
        source
            .expect_load_tracks()
            .times(1)
            .returning(|| Err(IngestError::Structural("element 0 is not an object".to_string())));

        let result = analyze_source(&source, "Broken", &AnalysisSettings::default());
        assert!(matches!(result, Err(IngestError::Structural(_))));
    }
}
