use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::{ObjectStore, PutPayload, path::Path as ObjectPath};
use std::collections::HashSet;
use std::sync::Arc;

use super::bucket_provider::{BucketProvider, InMemoryBuckets};
use super::error::{from_object_store, invalid_path};
use super::in_memory_blob_store::DEFAULT_PAGE_SIZE;
use crate::{
    domain::{
        errors::{BlobResult, BlobStoreError, DeleteFailure},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{BlobStore, ListPage},
};

/// Adapter that implements BlobStore using Apache object_store.
///
/// object_store handles are scoped to a single bucket, so handles and the
/// bucket-level operations come from a `BucketProvider`.
#[derive(Clone)]
pub struct ObjectStoreBlobStore {
    provider: Arc<dyn BucketProvider>,
    page_size: usize,
}

impl ObjectStoreBlobStore {
    pub fn new(provider: Arc<dyn BucketProvider>) -> Self {
        Self {
            provider,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Adapter whose buckets are backed by `object_store::memory::InMemory`
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBuckets::new()))
    }

    /// Maximum number of keys returned by one `list_page` call
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Keys are passed through verbatim; anything object_store would
    /// normalize (leading, trailing or doubled `/`) is rejected.
    fn path(key: &str) -> BlobResult<ObjectPath> {
        let path = ObjectPath::parse(key).map_err(|err| invalid_path(key, err))?;
        if path.as_ref() != key {
            return Err(BlobStoreError::InvalidRequest {
                message: format!("object key {key:?} is not representable by this store"),
            });
        }
        Ok(path)
    }

    /// Directory that contains every key starting with `prefix`
    fn list_root(prefix: &str) -> BlobResult<Option<ObjectPath>> {
        match prefix.rfind('/') {
            Some(idx) if idx > 0 => Ok(Some(Self::path(&prefix[..idx])?)),
            _ => Ok(None),
        }
    }

    /// Map a failed listing. Some S3-compatible services reject a listing
    /// of a missing bucket without an error code; HeadBucket settles it.
    async fn listing_error(
        &self,
        err: object_store::Error,
        bucket: &BucketName,
        prefix: &str,
    ) -> BlobStoreError {
        let mapped = from_object_store(err, bucket, prefix);
        if matches!(mapped, BlobStoreError::Transport { .. })
            && matches!(self.provider.bucket_exists(bucket).await, Ok(false))
        {
            return BlobStoreError::NoSuchBucket {
                bucket: bucket.to_string(),
            };
        }
        mapped
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBlobStore {
    async fn put_blob(&self, bucket: &BucketName, key: &ObjectKey, body: Bytes) -> BlobResult<()> {
        let store = self.provider.open(bucket).await?;
        let path = Self::path(key.as_str())?;

        store
            .put(&path, PutPayload::from(body))
            .await
            .map_err(|e| from_object_store(e, bucket, key.as_str()))?;

        Ok(())
    }

    async fn get_blob(&self, bucket: &BucketName, key: &ObjectKey) -> BlobResult<Bytes> {
        let store = self.provider.open(bucket).await?;
        let path = Self::path(key.as_str())?;

        let result = store
            .get(&path)
            .await
            .map_err(|e| from_object_store(e, bucket, key.as_str()))?;

        result
            .bytes()
            .await
            .map_err(|e| from_object_store(e, bucket, key.as_str()))
    }

    /// Reads the listing stream only until the page is full. S3 and
    /// `InMemory` both list in lexical key order, so matches for `prefix`
    /// form one contiguous run.
    async fn list_page(
        &self,
        bucket: &BucketName,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> BlobResult<ListPage> {
        let store = self.provider.open(bucket).await?;
        let root = Self::list_root(prefix)?;

        let mut stream = match continuation_token {
            Some(token) => {
                let offset = Self::path(token)?;
                store.list_with_offset(root.as_ref(), &offset)
            }
            None => store.list(root.as_ref()),
        };

        let mut keys = Vec::new();
        let mut truncated = false;
        while let Some(item) = stream.next().await {
            let meta = match item {
                Ok(meta) => meta,
                Err(err) => return Err(self.listing_error(err, bucket, prefix).await),
            };
            let key = meta.location.to_string();

            if continuation_token.is_some_and(|token| key.as_str() <= token) {
                continue;
            }
            if !key.starts_with(prefix) {
                if key.as_str() > prefix {
                    break;
                }
                continue;
            }
            if keys.len() == self.page_size {
                truncated = true;
                break;
            }
            keys.push(key);
        }

        if !truncated {
            return Ok(ListPage::complete(keys));
        }

        let next_token = keys.last().cloned();
        Ok(ListPage {
            keys,
            next_token,
            truncated,
        })
    }

    async fn delete_batch(&self, bucket: &BucketName, keys: &[String]) -> BlobResult<()> {
        let store = self.provider.open(bucket).await?;

        let mut failures = Vec::new();
        let mut paths = Vec::with_capacity(keys.len());
        for key in keys {
            match Self::path(key) {
                Ok(path) => paths.push(path),
                Err(err) => failures.push(DeleteFailure {
                    key: key.clone(),
                    message: err.to_string(),
                }),
            }
        }

        // S3 turns this into bulk DeleteObjects requests
        let locations = futures::stream::iter(paths.into_iter().map(Ok)).boxed();
        let results: Vec<object_store::Result<ObjectPath>> =
            store.delete_stream(locations).collect().await;

        let mut deleted = HashSet::new();
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(path) => {
                    deleted.insert(path.to_string());
                }
                Err(err) => {
                    let missing_key = match &err {
                        object_store::Error::NotFound { path, .. } => Some(path.clone()),
                        _ => None,
                    };
                    match from_object_store(err, bucket, "") {
                        missing @ BlobStoreError::NoSuchBucket { .. } => return Err(missing),
                        BlobStoreError::NoSuchKey { .. } => {
                            if let Some(path) = missing_key {
                                deleted.insert(path);
                            }
                        }
                        other => errors.push(other.to_string()),
                    }
                }
            }
        }

        let message = if errors.is_empty() {
            "not deleted".to_string()
        } else {
            errors.join("; ")
        };
        let rejected: HashSet<String> = failures.iter().map(|f| f.key.clone()).collect();
        for key in keys {
            if !deleted.contains(key.as_str()) && !rejected.contains(key.as_str()) {
                failures.push(DeleteFailure {
                    key: key.clone(),
                    message: message.clone(),
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BlobStoreError::BatchDelete {
                bucket: bucket.to_string(),
                failures,
            })
        }
    }

    async fn create_bucket(&self, bucket: &BucketName) -> BlobResult<()> {
        self.provider.create_bucket(bucket).await
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> BlobResult<()> {
        self.provider.delete_bucket(bucket).await
    }
}
