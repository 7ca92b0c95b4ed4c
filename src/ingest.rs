use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::models::{AudioFeature, Field, FieldValue, TrackRecord};

/// Anything that can hand the core a track collection
#[cfg_attr(test, mockall::automock)]
pub trait TrackSource {
    fn load_tracks(&self) -> Result<Vec<TrackRecord>, IngestError>;
}

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    /// Exportify-style CSV export
    Csv,
    /// JSON array of track objects
    Json,
    /// Saved Spotify playlist API response with audio features
    Spotify,
}

impl InputFormat {
    /// Guess the format from the file extension and, for JSON, the document shape
    pub fn detect(path: &Path, content: &str) -> Result<InputFormat, IngestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "json" => {
                let value: serde_json::Value = serde_json::from_str(content)?;
                if value.get("tracks").is_some() {
                    Ok(InputFormat::Spotify)
                } else {
                    Ok(InputFormat::Json)
                }
            }
            other => Err(IngestError::UnsupportedFormat(format!(
                "cannot infer format from extension '{other}', pass --format"
            ))),
        }
    }
}

/// Tracks plus the playlist name when the input carries one
#[derive(Debug, Clone)]
pub struct LoadedPlaylist {
    pub name: Option<String>,
    pub tracks: Vec<TrackRecord>,
}

/// Read a file in the given (or detected) format
pub fn load_from_path(path: &Path, format: Option<InputFormat>) -> Result<LoadedPlaylist, IngestError> {
    let content = std::fs::read_to_string(path)?;
    let format = match format {
        Some(format) => format,
        None => InputFormat::detect(path, &content)?,
    };
    debug!(path = %path.display(), ?format, "loading track collection");

    let playlist = match format {
        InputFormat::Csv => LoadedPlaylist {
            name: None,
            tracks: parse_csv(content.as_bytes())?,
        },
        InputFormat::Json => LoadedPlaylist {
            name: None,
            tracks: parse_json_records(&content)?,
        },
        InputFormat::Spotify => parse_spotify_dump(&content)?,
    };

    info!(tracks = playlist.tracks.len(), "loaded track collection");
    Ok(playlist)
}

/// Exportify CSV file on disk
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TrackSource for CsvSource {
    fn load_tracks(&self) -> Result<Vec<TrackRecord>, IngestError> {
        let file = std::fs::File::open(&self.path)?;
        parse_csv(file)
    }
}

/// JSON array of track objects on disk
pub struct JsonRecordsSource {
    path: PathBuf,
}

impl JsonRecordsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TrackSource for JsonRecordsSource {
    fn load_tracks(&self) -> Result<Vec<TrackRecord>, IngestError> {
        let content = std::fs::read_to_string(&self.path)?;
        parse_json_records(&content)
    }
}

/// Saved Spotify playlist response on disk
pub struct SpotifyDumpSource {
    path: PathBuf,
}

impl SpotifyDumpSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load_playlist(&self) -> Result<LoadedPlaylist, IngestError> {
        let content = std::fs::read_to_string(&self.path)?;
        parse_spotify_dump(&content)
    }
}

impl TrackSource for SpotifyDumpSource {
    fn load_tracks(&self) -> Result<Vec<TrackRecord>, IngestError> {
        Ok(self.load_playlist()?.tracks)
    }
}

/// Parse CSV with a header row. Recognized columns are mapped onto the field
/// schema, unknown columns are ignored and empty cells are left absent.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<TrackRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut columns: Vec<Option<Field>> = Vec::new();
    let mut ignored = Vec::new();
    for header in reader.headers()?.iter() {
        match Field::from_header(header) {
            Some(field) if !columns.contains(&Some(field)) => columns.push(Some(field)),
            _ => {
                ignored.push(header.to_string());
                columns.push(None);
            }
        }
    }
    if !ignored.is_empty() {
        debug!(?ignored, "ignoring unrecognized or duplicate CSV columns");
    }

    let mut tracks = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            if matches!(e.kind(), csv::ErrorKind::UnequalLengths { .. }) {
                IngestError::Structural(format!("row {} does not match the header: {e}", row + 1))
            } else {
                IngestError::Csv(e)
            }
        })?;

        let mut track = TrackRecord::new();
        for (field, cell) in columns.iter().zip(record.iter()) {
            if let Some(field) = field {
                if !cell.is_empty() {
                    track.set(*field, cell);
                }
            }
        }
        tracks.push(track);
    }

    Ok(tracks)
}

/// Parse a JSON array of objects keyed by field names or upstream aliases
pub fn parse_json_records(content: &str) -> Result<Vec<TrackRecord>, IngestError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let items = value.as_array().ok_or_else(|| {
        IngestError::Structural("expected a JSON array of track objects".to_string())
    })?;

    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let object = item.as_object().ok_or_else(|| {
                IngestError::Structural(format!("element {position} is not an object"))
            })?;

            let mut track = TrackRecord::new();
            for (key, raw) in object {
                let Some(field) = Field::from_header(key) else {
                    continue;
                };
                if let Some(value) = json_field_value(raw) {
                    track.set(field, value);
                }
            }
            Ok(track)
        })
        .collect()
}

fn json_field_value(raw: &serde_json::Value) -> Option<FieldValue> {
    use serde_json::Value;
    match raw {
        Value::Null => None,
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => n.as_f64().map(FieldValue::Number),
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Array(items) => {
            let names: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            Some(FieldValue::Text(names.join(", ")))
        }
        Value::Object(_) => Some(FieldValue::Text(raw.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct SpotifyPlaylistDump {
    name: Option<String>,
    tracks: SpotifyTracks,
    #[serde(default)]
    audio_features: Vec<Option<SpotifyAudioFeatures>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpotifyTracks {
    Paged { items: Vec<SpotifyItem> },
    Items(Vec<SpotifyItem>),
}

#[derive(Debug, Deserialize)]
struct SpotifyItem {
    track: Option<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    album: Option<SpotifyAlbum>,
    popularity: Option<f64>,
    duration_ms: Option<f64>,
    explicit: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyAudioFeatures {
    id: String,
    danceability: Option<f64>,
    energy: Option<f64>,
    valence: Option<f64>,
    acousticness: Option<f64>,
    instrumentalness: Option<f64>,
    liveness: Option<f64>,
    speechiness: Option<f64>,
    tempo: Option<f64>,
}

impl SpotifyAudioFeatures {
    fn value(&self, feature: AudioFeature) -> Option<f64> {
        match feature {
            AudioFeature::Danceability => self.danceability,
            AudioFeature::Energy => self.energy,
            AudioFeature::Valence => self.valence,
            AudioFeature::Acousticness => self.acousticness,
            AudioFeature::Instrumentalness => self.instrumentalness,
            AudioFeature::Liveness => self.liveness,
            AudioFeature::Speechiness => self.speechiness,
            AudioFeature::Tempo => self.tempo,
        }
    }
}

/// Normalize a saved Spotify playlist response into track records. Null
/// tracks and tracks without an id are skipped.
pub fn parse_spotify_dump(content: &str) -> Result<LoadedPlaylist, IngestError> {
    let dump: SpotifyPlaylistDump = serde_json::from_str(content).map_err(|e| {
        if e.is_data() {
            IngestError::Structural(format!("not a Spotify playlist response: {e}"))
        } else {
            IngestError::Json(e)
        }
    })?;

    let features: HashMap<String, SpotifyAudioFeatures> = dump
        .audio_features
        .into_iter()
        .flatten()
        .map(|f| (f.id.clone(), f))
        .collect();

    let items = match dump.tracks {
        SpotifyTracks::Paged { items } => items,
        SpotifyTracks::Items(items) => items,
    };

    let mut skipped = 0;
    let mut tracks = Vec::new();
    for track in items.into_iter().map(|item| item.track) {
        let Some(track) = track else {
            skipped += 1;
            continue;
        };
        let Some(id) = track.id.filter(|id| !id.is_empty()) else {
            skipped += 1;
            continue;
        };

        let artists: Vec<String> = track.artists.into_iter().filter_map(|a| a.name).collect();
        let mut record = TrackRecord::new()
            .with(Field::TrackName, track.name.unwrap_or_default())
            .with(Field::Artist, artists.join(", "))
            .with(
                Field::Album,
                track.album.and_then(|a| a.name).unwrap_or_default(),
            );

        if let Some(popularity) = track.popularity {
            record.set(Field::Popularity, popularity);
        }
        if let Some(duration) = track.duration_ms {
            record.set(Field::DurationMs, duration);
        }
        record.set(Field::Explicit, track.explicit.unwrap_or(false));

        match features.get(&id) {
            Some(audio) => {
                for feature in AudioFeature::ALL {
                    if let Some(value) = audio.value(feature) {
                        record.set(feature.field(), value);
                    }
                }
            }
            None => debug!(track_id = %id, "no audio features for track"),
        }

        record.set(Field::TrackId, id);
        tracks.push(record);
    }

    if skipped > 0 {
        warn!(skipped, "skipped null or id-less tracks in Spotify response");
    }

    Ok(LoadedPlaylist {
        name: dump.name,
        tracks,
    })
}
