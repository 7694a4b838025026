use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    domain::{
        errors::{BlobResult, BlobStoreError, DeleteFailure},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{BlobStore, ListPage},
};

pub const DEFAULT_PAGE_SIZE: usize = 1000;

const DEFAULT_OWNER: &str = "local";

/// In-memory implementation of BlobStore for testing and development.
///
/// Buckets carry an owner so that ownership conflicts can be reproduced.
/// Clones share the same buckets.
#[derive(Clone)]
pub struct InMemoryBlobStore {
    data: Arc<RwLock<StoreData>>,
    page_size: usize,
    owner: String,
}

#[derive(Default)]
struct StoreData {
    buckets: HashMap<String, BucketData>,
    // Keys whose deletion is reported as a per-key failure
    failing_deletes: HashSet<String>,
    delete_batch_calls: usize,
}

struct BucketData {
    owner: String,
    objects: BTreeMap<String, Bytes>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(StoreData::default())),
            page_size: DEFAULT_PAGE_SIZE,
            owner: DEFAULT_OWNER.to_string(),
        }
    }

    /// Maximum number of keys returned by one `list_page` call
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Account that owns buckets created through this handle
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Register a bucket that belongs to another account
    pub async fn insert_foreign_bucket(&self, bucket: &BucketName, owner: impl Into<String>) {
        let mut data = self.data.write().await;
        data.buckets.insert(
            bucket.to_string(),
            BucketData {
                owner: owner.into(),
                objects: BTreeMap::new(),
            },
        );
    }

    /// Make every later batch delete report a failure for `key`
    pub async fn fail_deletes_for(&self, key: impl Into<String>) {
        self.data.write().await.failing_deletes.insert(key.into());
    }

    /// Number of `delete_batch` calls served so far
    pub async fn delete_batch_calls(&self) -> usize {
        self.data.read().await.delete_batch_calls
    }

    /// Number of objects stored in `bucket`, if it exists
    pub async fn object_count(&self, bucket: &BucketName) -> Option<usize> {
        let data = self.data.read().await;
        data.buckets.get(bucket.as_str()).map(|b| b.objects.len())
    }

    pub async fn bucket_exists(&self, bucket: &BucketName) -> bool {
        self.data.read().await.buckets.contains_key(bucket.as_str())
    }

    fn no_such_bucket(bucket: &BucketName) -> BlobStoreError {
        BlobStoreError::NoSuchBucket {
            bucket: bucket.to_string(),
        }
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put_blob(&self, bucket: &BucketName, key: &ObjectKey, body: Bytes) -> BlobResult<()> {
        let mut data = self.data.write().await;
        let entry = data
            .buckets
            .get_mut(bucket.as_str())
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        entry.objects.insert(key.to_string(), body);
        Ok(())
    }

    async fn get_blob(&self, bucket: &BucketName, key: &ObjectKey) -> BlobResult<Bytes> {
        let data = self.data.read().await;
        let entry = data
            .buckets
            .get(bucket.as_str())
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        entry
            .objects
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| BlobStoreError::NoSuchKey {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn list_page(
        &self,
        bucket: &BucketName,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> BlobResult<ListPage> {
        let data = self.data.read().await;
        let entry = data
            .buckets
            .get(bucket.as_str())
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        // The token is the last key of the previous page
        let start = match continuation_token {
            Some(token) => Bound::Excluded(token.to_string()),
            None => Bound::Included(prefix.to_string()),
        };

        let mut matching = entry
            .objects
            .range((start, Bound::Unbounded))
            .map(|(key, _)| key)
            .skip_while(|key| key.as_str() < prefix)
            .take_while(|key| key.starts_with(prefix));

        let keys: Vec<String> = matching.by_ref().take(self.page_size).cloned().collect();
        if matching.next().is_none() {
            return Ok(ListPage::complete(keys));
        }

        let next_token = keys.last().cloned();
        Ok(ListPage {
            keys,
            next_token,
            truncated: true,
        })
    }

    async fn delete_batch(&self, bucket: &BucketName, keys: &[String]) -> BlobResult<()> {
        let mut data = self.data.write().await;
        data.delete_batch_calls += 1;

        let StoreData {
            buckets,
            failing_deletes,
            ..
        } = &mut *data;
        let entry = buckets
            .get_mut(bucket.as_str())
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        let mut failures = Vec::new();
        for key in keys {
            if failing_deletes.contains(key) {
                failures.push(DeleteFailure {
                    key: key.clone(),
                    message: "AccessDenied".to_string(),
                });
                continue;
            }
            entry.objects.remove(key);
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
        let mut data = self.data.write().await;

        if let Some(existing) = data.buckets.get(bucket.as_str()) {
            return Err(if existing.owner == self.owner {
                BlobStoreError::BucketAlreadyOwnedByYou {
                    bucket: bucket.to_string(),
                }
            } else {
                BlobStoreError::BucketAlreadyExists {
                    bucket: bucket.to_string(),
                }
            });
        }

        data.buckets.insert(
            bucket.to_string(),
            BucketData {
                owner: self.owner.clone(),
                objects: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> BlobResult<()> {
        let mut data = self.data.write().await;
        let entry = data
            .buckets
            .get(bucket.as_str())
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        if !entry.objects.is_empty() {
            return Err(BlobStoreError::BucketNotEmpty {
                bucket: bucket.to_string(),
            });
        }

        data.buckets.remove(bucket.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> BucketName {
        BucketName::new("mem-bucket").unwrap()
    }

    fn key(k: &str) -> ObjectKey {
        ObjectKey::new(k).unwrap()
    }

    async fn seeded(page_size: usize, keys: &[&str]) -> InMemoryBlobStore {
        let store = InMemoryBlobStore::new().with_page_size(page_size);
        store.create_bucket(&bucket()).await.unwrap();
        for k in keys {
            store
                .put_blob(&bucket(), &key(k), Bytes::from_static(b"x"))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let store = seeded(10, &[]).await;
        store
            .put_blob(&bucket(), &key("a"), Bytes::from_static(b"one"))
            .await
            .unwrap();
        store
            .put_blob(&bucket(), &key("a"), Bytes::from_static(b"two"))
            .await
            .unwrap();

        let body = store.get_blob(&bucket(), &key("a")).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"two"));
    }

    #[tokio::test]
    async fn test_missing_key_and_bucket() {
        let store = seeded(10, &[]).await;
        let err = store.get_blob(&bucket(), &key("nope")).await.unwrap_err();
        assert!(matches!(err, BlobStoreError::NoSuchKey { .. }));

        let other = BucketName::new("other-bucket").unwrap();
        let err = store.get_blob(&other, &key("nope")).await.unwrap_err();
        assert!(err.is_no_such_bucket());
    }

    #[tokio::test]
    async fn test_pages_are_prefix_bounded() {
        let store = seeded(2, &["a/1", "b/1", "b/2", "b/3", "c/1"]).await;

        let first = store.list_page(&bucket(), "b/", None).await.unwrap();
        assert_eq!(first.keys, vec!["b/1", "b/2"]);
        assert!(first.truncated);

        let second = store
            .list_page(&bucket(), "b/", first.next_token.as_deref())
            .await
            .unwrap();
        assert_eq!(second.keys, vec!["b/3"]);
        assert!(!second.truncated);
        assert_eq!(second.next_token, None);
    }

    #[tokio::test]
    async fn test_exact_page_is_not_truncated() {
        let store = seeded(2, &["p/1", "p/2"]).await;
        let page = store.list_page(&bucket(), "p/", None).await.unwrap();
        assert_eq!(page.keys.len(), 2);
        assert!(!page.truncated);
    }

    #[tokio::test]
    async fn test_delete_batch_tolerates_missing_keys() {
        let store = seeded(10, &["k/1"]).await;
        store
            .delete_batch(&bucket(), &["k/1".to_string(), "k/ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(store.object_count(&bucket()).await, Some(0));
        assert_eq!(store.delete_batch_calls().await, 1);
    }

    #[tokio::test]
    async fn test_delete_batch_reports_failed_keys() {
        let store = seeded(10, &["k/1", "k/2"]).await;
        store.fail_deletes_for("k/2").await;

        let err = store
            .delete_batch(&bucket(), &["k/1".to_string(), "k/2".to_string()])
            .await
            .unwrap_err();

        match err {
            BlobStoreError::BatchDelete { failures, .. } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].key, "k/2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.object_count(&bucket()).await, Some(1));
    }

    #[tokio::test]
    async fn test_bucket_ownership() {
        let store = seeded(10, &[]).await;
        let err = store.create_bucket(&bucket()).await.unwrap_err();
        assert!(matches!(err, BlobStoreError::BucketAlreadyOwnedByYou { .. }));

        let foreign = BucketName::new("foreign-bucket").unwrap();
        store.insert_foreign_bucket(&foreign, "someone-else").await;
        let err = store.create_bucket(&foreign).await.unwrap_err();
        assert!(matches!(err, BlobStoreError::BucketAlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_delete_bucket_requires_empty() {
        let store = seeded(10, &["x"]).await;
        let err = store.delete_bucket(&bucket()).await.unwrap_err();
        assert!(matches!(err, BlobStoreError::BucketNotEmpty { .. }));

        store.delete_batch(&bucket(), &["x".to_string()]).await.unwrap();
        store.delete_bucket(&bucket()).await.unwrap();
        assert!(!store.bucket_exists(&bucket()).await);

        let err = store.delete_bucket(&bucket()).await.unwrap_err();
        assert!(err.is_no_such_bucket());
    }
}
