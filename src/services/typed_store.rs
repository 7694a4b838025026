use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt::Debug, sync::Arc};
use tracing::{debug, warn};

use crate::{
    domain::{
        errors::{OpContext, Operation, TypedStoreError, TypedStoreResult},
        models::{KeyListing, PersistentVolume, StoredObject},
        value_objects::{BucketName, ObjectKey, TypeTag},
    },
    ports::storage::BlobStore,
    services::{batch_delete, codec, key_scheme, paginator::Paginator},
};

/// Number of objects `download_all_of_type` fetches at once by default
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 8;

/// Typed object persistence over a single bucket.
///
/// Objects are stored as gzip-compressed JSON. Typed operations place them
/// under `<prefix><TYPE_TAG>/<suffix>`. All per-call state is local, so one
/// store may be cloned and shared freely between tasks. Writers racing on
/// the same key are resolved by the blob store (last write wins).
#[derive(Clone)]
pub struct TypedObjectStore {
    blobs: Arc<dyn BlobStore>,
    paginator: Paginator,
    bucket: BucketName,
    caller: String,
    download_concurrency: usize,
}

impl TypedObjectStore {
    /// `caller` identifies the calling subsystem in logs and error context
    pub fn new(blobs: Arc<dyn BlobStore>, bucket: BucketName, caller: impl Into<String>) -> Self {
        Self {
            paginator: Paginator::new(blobs.clone()),
            blobs,
            bucket,
            caller: caller.into(),
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
        }
    }

    pub fn with_download_concurrency(mut self, limit: usize) -> Self {
        self.download_concurrency = limit.max(1);
        self
    }

    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    pub fn caller_tag(&self) -> &str {
        &self.caller
    }

    fn ctx(&self, operation: Operation, target: &str) -> OpContext {
        OpContext::new(operation, &self.caller, self.bucket.as_str()).with_target(target)
    }

    fn object_key(&self, operation: Operation, key: &str) -> TypedStoreResult<ObjectKey> {
        ObjectKey::new(key).map_err(|source| TypedStoreError::Config {
            ctx: self.ctx(operation, key),
            source,
        })
    }

    fn type_tag<T: StoredObject>(&self, operation: Operation, prefix: &str) -> TypedStoreResult<TypeTag> {
        TypeTag::of::<T>().map_err(|source| TypedStoreError::Config {
            ctx: self.ctx(operation, prefix),
            source,
        })
    }

    /// Encode `value` and store it under `key`
    pub async fn upload_object<T>(&self, key: &str, value: &T) -> TypedStoreResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.upload_as(Operation::UploadObject, key, value).await
    }

    /// Store `value` under `<prefix><T::TYPE_TAG>/<suffix>`.
    /// `prefix` must already end with any delimiter it needs.
    pub async fn upload_typed_object<T: StoredObject>(
        &self,
        prefix: &str,
        suffix: &str,
        value: &T,
    ) -> TypedStoreResult<()> {
        let operation = Operation::UploadTypedObject;
        let tag = self.type_tag::<T>(operation, prefix)?;
        let key = key_scheme::build_key(prefix, &tag, suffix);

        self.upload_as(operation, &key, value).await
    }

    /// Download the object at `<prefix><T::TYPE_TAG>/<suffix>` and compare it
    /// with `expected`.
    ///
    /// A missing or undecodable object surfaces as `NotFound` or `Decode`;
    /// only a cleanly decoded object that differs is a `VerificationMismatch`.
    pub async fn verify_upload<T>(&self, prefix: &str, suffix: &str, expected: &T) -> TypedStoreResult<()>
    where
        T: StoredObject + PartialEq + Debug,
    {
        let operation = Operation::VerifyUpload;
        let tag = self.type_tag::<T>(operation, prefix)?;
        let key = key_scheme::build_key(prefix, &tag, suffix);

        let actual: T = self.download_typed(operation, &key).await?;
        if &actual != expected {
            warn!(bucket = %self.bucket, key = %key, caller = %self.caller, "uploaded object does not match");
            return Err(TypedStoreError::VerificationMismatch {
                ctx: self.ctx(operation, &key),
                expected: format!("{:?}", expected),
                actual: format!("{:?}", actual),
            });
        }

        Ok(())
    }

    /// Fetch and decode the object stored under `key`.
    ///
    /// `T` only needs to be deserializable, so missing fields follow its
    /// serde attributes. Typed reads (`verify_upload`, `download_all_of_type`)
    /// fill them from `T::default()`.
    pub async fn download_object<T>(&self, key: &str) -> TypedStoreResult<T>
    where
        T: DeserializeOwned + Send,
    {
        self.download_as(Operation::DownloadObject, key).await
    }

    /// Download every object of type `T` stored under `prefix`.
    ///
    /// All or nothing: if any single download fails the whole call fails and
    /// nothing is returned. The order of the result is unspecified.
    pub async fn download_all_of_type<T: StoredObject>(&self, prefix: &str) -> TypedStoreResult<Vec<T>> {
        let operation = Operation::DownloadAllOfType;
        let tag = self.type_tag::<T>(operation, prefix)?;
        let type_prefix = key_scheme::type_prefix(prefix, &tag);
        let listing = self.list_as(operation, &type_prefix).await?;

        let objects: Vec<T> = stream::iter(listing.into_keys())
            .map(|key| async move { self.download_typed::<T>(operation, &key).await })
            .buffer_unordered(self.download_concurrency)
            .try_collect()
            .await?;

        debug!(
            bucket = %self.bucket,
            prefix = %type_prefix,
            count = objects.len(),
            caller = %self.caller,
            "downloaded objects"
        );

        Ok(objects)
    }

    /// List every key under `prefix`
    pub async fn list_keys(&self, prefix: &str) -> TypedStoreResult<Vec<String>> {
        Ok(self.list_as(Operation::ListKeys, prefix).await?.into_keys())
    }

    /// Delete every object whose key starts with `prefix`.
    ///
    /// At-least-once and not atomic: when the batch reports failures some
    /// keys may already be gone, and nothing is restored. Calling again
    /// retries whatever is left.
    pub async fn delete_by_prefix(&self, prefix: &str) -> TypedStoreResult<()> {
        let operation = Operation::DeleteByPrefix;
        let listing = self.list_as(operation, prefix).await?;

        batch_delete::delete_keys(
            self.blobs.as_ref(),
            &self.bucket,
            listing.keys(),
            self.ctx(operation, prefix),
        )
        .await
    }

    /// Delete exactly one key. Deleting a key that does not exist succeeds.
    pub async fn delete_object(&self, key: &str) -> TypedStoreResult<()> {
        let operation = Operation::DeleteObject;
        let object_key = self.object_key(operation, key)?;
        let keys = [object_key.into_string()];

        match self.blobs.delete_batch(&self.bucket, &keys).await {
            Ok(()) => {
                debug!(bucket = %self.bucket, key, caller = %self.caller, "deleted object");
                Ok(())
            }
            Err(source) if source.is_no_such_bucket() => Err(TypedStoreError::NotFound {
                ctx: self.ctx(operation, key),
                source,
            }),
            Err(source) => Err(TypedStoreError::from_delete(
                self.ctx(operation, key),
                source,
                &keys,
            )),
        }
    }

    /// Upload a persistent volume under `<prefix>PersistentVolume/<suffix>`
    pub async fn upload_pv(&self, prefix: &str, suffix: &str, pv: &PersistentVolume) -> TypedStoreResult<()> {
        self.upload_typed_object(prefix, suffix, pv).await
    }

    pub async fn verify_pv_upload(
        &self,
        prefix: &str,
        suffix: &str,
        pv: &PersistentVolume,
    ) -> TypedStoreResult<()> {
        self.verify_upload(prefix, suffix, pv).await
    }

    /// Download every persistent volume stored under `prefix`
    pub async fn download_pvs(&self, prefix: &str) -> TypedStoreResult<Vec<PersistentVolume>> {
        self.download_all_of_type(prefix).await
    }

    async fn upload_as<T>(&self, operation: Operation, key: &str, value: &T) -> TypedStoreResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let object_key = self.object_key(operation, key)?;
        let body = codec::encode(value).map_err(|source| TypedStoreError::Encode {
            ctx: self.ctx(operation, key),
            source,
        })?;
        let size = body.len();

        self.blobs
            .put_blob(&self.bucket, &object_key, body)
            .await
            .map_err(|source| TypedStoreError::from_blob(self.ctx(operation, key), source))?;

        debug!(bucket = %self.bucket, key, size, caller = %self.caller, "uploaded object");
        Ok(())
    }

    async fn download_as<T>(&self, operation: Operation, key: &str) -> TypedStoreResult<T>
    where
        T: DeserializeOwned,
    {
        let body = self.fetch(operation, key).await?;
        codec::decode(&body).map_err(|source| TypedStoreError::Decode {
            ctx: self.ctx(operation, key),
            source,
        })
    }

    /// Decode onto `T::default()` so objects written by an older schema load
    async fn download_typed<T: StoredObject>(&self, operation: Operation, key: &str) -> TypedStoreResult<T> {
        let body = self.fetch(operation, key).await?;
        codec::decode_with_defaults(&body).map_err(|source| TypedStoreError::Decode {
            ctx: self.ctx(operation, key),
            source,
        })
    }

    async fn fetch(&self, operation: Operation, key: &str) -> TypedStoreResult<Bytes> {
        let object_key = self.object_key(operation, key)?;
        let body = self
            .blobs
            .get_blob(&self.bucket, &object_key)
            .await
            .map_err(|source| TypedStoreError::from_blob(self.ctx(operation, key), source))?;

        debug!(bucket = %self.bucket, key, size = body.len(), caller = %self.caller, "downloaded object");
        Ok(body)
    }

    async fn list_as(&self, operation: Operation, prefix: &str) -> TypedStoreResult<KeyListing> {
        self.paginator
            .list_all_keys(&self.bucket, prefix)
            .await
            .map_err(|source| TypedStoreError::List {
                ctx: self.ctx(operation, prefix),
                source,
            })
    }
}
