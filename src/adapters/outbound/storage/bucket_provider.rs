use async_trait::async_trait;
use futures::StreamExt;
use object_store::{ObjectStore, memory::InMemory};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::from_object_store;
use crate::domain::{
    errors::{BlobResult, BlobStoreError},
    value_objects::BucketName,
};

/// Bucket-level operations that object_store handles cannot perform.
///
/// object_store handles are scoped to one bucket; a provider opens them and
/// owns the create, delete and existence checks of the backing service.
#[async_trait]
pub trait BucketProvider: Send + Sync + 'static {
    /// Handle for the objects stored in `bucket`
    async fn open(&self, bucket: &BucketName) -> BlobResult<Arc<dyn ObjectStore>>;

    /// Returns `BucketAlreadyOwnedByYou` or `BucketAlreadyExists` when the
    /// bucket is already there.
    async fn create_bucket(&self, bucket: &BucketName) -> BlobResult<()>;

    /// Returns `BucketNotEmpty` while objects remain and `NoSuchBucket`
    /// when the bucket is absent.
    async fn delete_bucket(&self, bucket: &BucketName) -> BlobResult<()>;

    async fn bucket_exists(&self, bucket: &BucketName) -> BlobResult<bool>;
}

/// Buckets held in process, each backed by its own `InMemory` store
#[derive(Debug, Default)]
pub struct InMemoryBuckets {
    buckets: RwLock<HashMap<String, Arc<InMemory>>>,
}

impl InMemoryBuckets {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BucketProvider for InMemoryBuckets {
    async fn open(&self, bucket: &BucketName) -> BlobResult<Arc<dyn ObjectStore>> {
        let buckets = self.buckets.read().await;
        match buckets.get(bucket.as_str()) {
            Some(store) => Ok(store.clone()),
            None => Err(BlobStoreError::NoSuchBucket {
                bucket: bucket.to_string(),
            }),
        }
    }

    async fn create_bucket(&self, bucket: &BucketName) -> BlobResult<()> {
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(bucket.as_str()) {
            return Err(BlobStoreError::BucketAlreadyOwnedByYou {
                bucket: bucket.to_string(),
            });
        }

        buckets.insert(bucket.to_string(), Arc::new(InMemory::new()));
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> BlobResult<()> {
        let mut buckets = self.buckets.write().await;
        let store = buckets
            .get(bucket.as_str())
            .cloned()
            .ok_or_else(|| BlobStoreError::NoSuchBucket {
                bucket: bucket.to_string(),
            })?;

        match store.list(None).next().await {
            Some(Ok(_)) => {
                return Err(BlobStoreError::BucketNotEmpty {
                    bucket: bucket.to_string(),
                });
            }
            Some(Err(err)) => return Err(from_object_store(err, bucket, "")),
            None => {}
        }

        buckets.remove(bucket.as_str());
        Ok(())
    }

    async fn bucket_exists(&self, bucket: &BucketName) -> BlobResult<bool> {
        Ok(self.buckets.read().await.contains_key(bucket.as_str()))
    }
}
