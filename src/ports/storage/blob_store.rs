use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{
    errors::BlobResult,
    value_objects::{BucketName, ObjectKey},
};

/// One page of a key listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    /// Token to pass to the next `list_page` call when `truncated` is set
    pub next_token: Option<String>,
    pub truncated: bool,
}

impl ListPage {
    /// A final page holding `keys`
    pub fn complete(keys: Vec<String>) -> Self {
        Self {
            keys,
            next_token: None,
            truncated: false,
        }
    }
}

/// Port for the raw blob primitives of an S3-compatible store.
///
/// Implementations own transport concerns (sessions, credentials, retries).
/// Every method must be safe to call concurrently on a shared handle.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Store `body` under `key`, replacing any existing blob
    async fn put_blob(&self, bucket: &BucketName, key: &ObjectKey, body: Bytes) -> BlobResult<()>;

    /// Fetch the blob stored under `key`.
    /// Returns `NoSuchKey` or `NoSuchBucket` when it does not exist.
    async fn get_blob(&self, bucket: &BucketName, key: &ObjectKey) -> BlobResult<Bytes>;

    /// List one page of keys starting with `prefix`
    async fn list_page(
        &self,
        bucket: &BucketName,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> BlobResult<ListPage>;

    /// Delete `keys` in one logical request.
    /// Missing keys are not an error; per-key failures are aggregated into
    /// `BatchDelete` and the keys that succeeded stay deleted.
    async fn delete_batch(&self, bucket: &BucketName, keys: &[String]) -> BlobResult<()>;

    /// Returns `BucketAlreadyOwnedByYou` or `BucketAlreadyExists` when the
    /// bucket is already there.
    async fn create_bucket(&self, bucket: &BucketName) -> BlobResult<()>;

    /// Returns `BucketNotEmpty` while objects remain and `NoSuchBucket`
    /// when the bucket is absent.
    async fn delete_bucket(&self, bucket: &BucketName) -> BlobResult<()>;
}
