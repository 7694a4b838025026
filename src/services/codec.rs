//! Payload pipeline: JSON, then gzip.
//!
//! This is the persisted wire format. Blobs written by earlier releases
//! (gzip-compressed UTF-8 JSON, possibly with a trailing newline or as a
//! multi-member gzip stream) must keep decoding.

use bytes::Bytes;
use flate2::{Compression, read::MultiGzDecoder, write::GzEncoder};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::io::Read;

use crate::domain::errors::CodecError;

/// Serialize `value` to JSON and gzip the result
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Bytes, CodecError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    serde_json::to_writer(&mut encoder, value).map_err(CodecError::Serialize)?;
    let compressed = encoder.finish().map_err(CodecError::Compress)?;

    Ok(Bytes::from(compressed))
}

/// Gunzip `bytes` and deserialize the JSON into `T`.
///
/// Fields unknown to `T` are dropped. Fields missing from the blob fall back
/// to their default only when `T` opts into `#[serde(default)]`; see
/// [`decode_with_defaults`] for types that do not.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut json = Vec::new();
    MultiGzDecoder::new(bytes)
        .read_to_end(&mut json)
        .map_err(CodecError::Decompress)?;

    serde_json::from_slice(&json).map_err(CodecError::Deserialize)
}

/// Decode `bytes` on top of `T::default()`.
///
/// Every field the blob does not carry keeps its value from `T::default()`,
/// so blobs written by an older schema decode into a newer one without any
/// serde attributes. A JSON `null` also keeps the default.
pub fn decode_with_defaults<T>(bytes: &[u8]) -> Result<T, CodecError>
where
    T: Serialize + DeserializeOwned + Default,
{
    let stored: Value = decode(bytes)?;
    let mut merged = serde_json::to_value(T::default()).map_err(CodecError::Serialize)?;
    overlay(&mut merged, stored);

    serde_json::from_value(merged).map_err(CodecError::Deserialize)
}

/// Write `stored` over `base`, merging nested objects key by key
fn overlay(base: &mut Value, stored: Value) {
    match (base, stored) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(stored)) => {
            for (key, value) in stored {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, stored) => *base = stored,
    }
}
