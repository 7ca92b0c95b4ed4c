use thiserror::Error;

/// Failures at the ingestion boundary. Missing columns and invalid values are
/// absorbed by the aggregator and sampler; only input whose shape is not an
/// ordered sequence of records surfaces here.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input is not a sequence of track mappings
    #[error("Malformed track collection: {0}")]
    Structural(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
}
