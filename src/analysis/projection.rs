use serde::{Deserialize, Serialize};

use crate::models::{AudioFeature, Field, TrackRecord};

/// Reduced view of a sampled track handed to report generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleTrack {
    pub name: String,
    pub artist: String,
    pub popularity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danceability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acousticness: Option<f64>,
}

impl SampleTrack {
    /// Project a record. Features the record carries are kept (invalid values
    /// become 0); features it lacks are left out.
    pub fn from_record(record: &TrackRecord) -> Self {
        let feature = |feature: AudioFeature| {
            record
                .has(feature.field())
                .then(|| record.number(feature.field()).unwrap_or(0.0))
        };

        SampleTrack {
            name: record
                .text(Field::TrackName)
                .unwrap_or_else(|| "Unknown Track".to_string()),
            artist: record
                .text(Field::Artist)
                .unwrap_or_else(|| "Unknown Artist".to_string()),
            popularity: record.number(Field::Popularity).unwrap_or(0.0),
            danceability: feature(AudioFeature::Danceability),
            energy: feature(AudioFeature::Energy),
            valence: feature(AudioFeature::Valence),
            acousticness: feature(AudioFeature::Acousticness),
        }
    }
}

/// Projection step applied after selection
pub fn project_sample(records: &[TrackRecord]) -> Vec<SampleTrack> {
    records.iter().map(SampleTrack::from_record).collect()
}
