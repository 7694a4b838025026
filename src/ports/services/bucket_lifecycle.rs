use async_trait::async_trait;

use crate::domain::errors::TypedStoreResult;

/// Port for bucket lifecycle management
///
/// Bucket names are validated before any store call; an invalid name is a
/// `TypedStoreError::Config`.
#[async_trait]
pub trait BucketLifecycle: Send + Sync + 'static {
    /// Create the bucket. Succeeds if the caller already owns it; a bucket
    /// owned by another account is a `TypedStoreError::Create`.
    async fn create_bucket(&self, bucket: &str) -> TypedStoreResult<()>;

    /// Delete an empty bucket. An absent bucket counts as deleted; a bucket
    /// with objects left is `TypedStoreError::NotEmpty`.
    async fn delete_bucket(&self, bucket: &str) -> TypedStoreResult<()>;

    /// Delete every object in the bucket, then the bucket itself. A bucket
    /// that is already absent is a no-op.
    async fn purge_bucket(&self, bucket: &str) -> TypedStoreResult<()>;
}
