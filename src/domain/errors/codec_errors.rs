use thiserror::Error;

/// Failures of the JSON + gzip payload pipeline
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to serialize value to JSON: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to compress payload: {0}")]
    Compress(#[source] std::io::Error),

    #[error("failed to decompress payload: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("failed to deserialize JSON payload: {0}")]
    Deserialize(#[source] serde_json::Error),
}
