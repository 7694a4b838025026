use serde::{Serialize, de::DeserializeOwned};

/// A value that can be persisted through the typed store.
///
/// `TYPE_TAG` becomes a path segment of every key written for the type, so
/// it must stay stable across releases and must not contain `/`.
///
/// Typed reads decode onto `Self::default()`: unknown fields are dropped and
/// fields missing from the blob keep their default, so blobs written by an
/// older schema load without serde attributes.
pub trait StoredObject: Serialize + DeserializeOwned + Default + Send + Sync {
    const TYPE_TAG: &'static str;
}
