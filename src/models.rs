use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable field schema shared by every ingestion adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TrackName,
    Artist,
    Album,
    TrackId,
    Popularity,
    DurationMs,
    Explicit,
    Danceability,
    Energy,
    Valence,
    Acousticness,
    Instrumentalness,
    Liveness,
    Speechiness,
    Tempo,
}

impl Field {
    /// Canonical snake_case key used in JSON input and output
    pub fn key(self) -> &'static str {
        match self {
            Field::TrackName => "track_name",
            Field::Artist => "artist",
            Field::Album => "album",
            Field::TrackId => "track_id",
            Field::Popularity => "popularity",
            Field::DurationMs => "duration_ms",
            Field::Explicit => "explicit",
            Field::Danceability => "danceability",
            Field::Energy => "energy",
            Field::Valence => "valence",
            Field::Acousticness => "acousticness",
            Field::Instrumentalness => "instrumentalness",
            Field::Liveness => "liveness",
            Field::Speechiness => "speechiness",
            Field::Tempo => "tempo",
        }
    }

    /// Resolve an upstream column name (Exportify header, API key or canonical key)
    pub fn from_header(header: &str) -> Option<Field> {
        let normalized = header.trim().to_lowercase();
        let field = match normalized.as_str() {
            "track name" | "track_name" | "name" | "title" => Field::TrackName,
            "artist name(s)" | "artist names" | "artist" | "artists" => Field::Artist,
            "album name" | "album" | "album_name" => Field::Album,
            "track id" | "track_id" | "id" | "track uri" => Field::TrackId,
            "popularity" => Field::Popularity,
            "duration (ms)" | "duration_ms" | "duration" => Field::DurationMs,
            "explicit" => Field::Explicit,
            "danceability" => Field::Danceability,
            "energy" => Field::Energy,
            "valence" => Field::Valence,
            "acousticness" => Field::Acousticness,
            "instrumentalness" => Field::Instrumentalness,
            "liveness" => Field::Liveness,
            "speechiness" => Field::Speechiness,
            "tempo" => Field::Tempo,
            _ => return None,
        };
        Some(field)
    }
}

/// Numeric descriptors of a track's musical character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFeature {
    Danceability,
    Energy,
    Valence,
    Acousticness,
    Instrumentalness,
    Liveness,
    Speechiness,
    Tempo,
}

impl AudioFeature {
    pub const ALL: [AudioFeature; 8] = [
        AudioFeature::Danceability,
        AudioFeature::Energy,
        AudioFeature::Valence,
        AudioFeature::Acousticness,
        AudioFeature::Instrumentalness,
        AudioFeature::Liveness,
        AudioFeature::Speechiness,
        AudioFeature::Tempo,
    ];

    /// Features carried into the projected sample and used for diversity selection
    pub const PRIMARY: [AudioFeature; 4] = [
        AudioFeature::Danceability,
        AudioFeature::Energy,
        AudioFeature::Valence,
        AudioFeature::Acousticness,
    ];

    pub fn field(self) -> Field {
        match self {
            AudioFeature::Danceability => Field::Danceability,
            AudioFeature::Energy => Field::Energy,
            AudioFeature::Valence => Field::Valence,
            AudioFeature::Acousticness => Field::Acousticness,
            AudioFeature::Instrumentalness => Field::Instrumentalness,
            AudioFeature::Liveness => Field::Liveness,
            AudioFeature::Speechiness => Field::Speechiness,
            AudioFeature::Tempo => Field::Tempo,
        }
    }

    pub fn key(self) -> &'static str {
        self.field().key()
    }
}

/// A single field value as delivered by an upstream adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Interpret the value as a finite number; NaN, infinities and unparseable text are rejected
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Truthiness used for the explicit flag: booleans as-is, text compared against "true"
    pub fn as_flag(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Text(s) => s.trim().eq_ignore_ascii_case("true"),
            FieldValue::Number(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// One playlist entry. Fields that were never delivered are absent, which is
/// distinct from a field present with a zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackRecord {
    fields: BTreeMap<Field, FieldValue>,
}

impl TrackRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: impl Into<FieldValue>) {
        self.fields.insert(field, value.into());
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn has(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    /// Numeric value of a field, `None` when absent or invalid
    pub fn number(&self, field: Field) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    /// Text rendering of a field, `None` when absent
    pub fn text(&self, field: Field) -> Option<String> {
        self.get(field).map(|value| value.to_string())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
