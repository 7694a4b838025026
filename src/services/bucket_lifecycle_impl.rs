use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    domain::{
        errors::{BlobStoreError, OpContext, Operation, TypedStoreError, TypedStoreResult},
        value_objects::BucketName,
    },
    ports::{services::BucketLifecycle, storage::BlobStore},
    services::{batch_delete, paginator::Paginator},
};

/// Implementation of BucketLifecycle over a blob store
#[derive(Clone)]
pub struct BucketLifecycleServiceImpl {
    blobs: Arc<dyn BlobStore>,
    paginator: Paginator,
    caller: String,
}

impl BucketLifecycleServiceImpl {
    /// Create a new BucketLifecycleServiceImpl instance
    pub fn new(blobs: Arc<dyn BlobStore>, caller: impl Into<String>) -> Self {
        Self {
            paginator: Paginator::new(blobs.clone()),
            blobs,
            caller: caller.into(),
        }
    }

    fn ctx(&self, operation: Operation, bucket: &str) -> OpContext {
        OpContext::new(operation, &self.caller, bucket)
    }

    fn bucket_name(&self, operation: Operation, bucket: &str) -> TypedStoreResult<BucketName> {
        BucketName::new(bucket).map_err(|source| TypedStoreError::Config {
            ctx: self.ctx(operation, bucket),
            source,
        })
    }

    async fn remove_bucket(&self, operation: Operation, bucket: &BucketName) -> TypedStoreResult<()> {
        match self.blobs.delete_bucket(bucket).await {
            Ok(()) => {
                info!(bucket = %bucket, caller = %self.caller, "deleted bucket");
                Ok(())
            }
            Err(err) if err.is_no_such_bucket() => {
                debug!(bucket = %bucket, caller = %self.caller, "bucket already absent");
                Ok(())
            }
            Err(BlobStoreError::BucketNotEmpty { .. }) => Err(TypedStoreError::NotEmpty {
                ctx: self.ctx(operation, bucket.as_str()),
            }),
            Err(source) => Err(TypedStoreError::Transport {
                ctx: self.ctx(operation, bucket.as_str()),
                source,
            }),
        }
    }
}

#[async_trait]
impl BucketLifecycle for BucketLifecycleServiceImpl {
    async fn create_bucket(&self, bucket: &str) -> TypedStoreResult<()> {
        let operation = Operation::CreateBucket;
        let name = self.bucket_name(operation, bucket)?;

        match self.blobs.create_bucket(&name).await {
            Ok(()) => {
                info!(bucket = %name, caller = %self.caller, "created bucket");
                Ok(())
            }
            Err(BlobStoreError::BucketAlreadyOwnedByYou { .. }) => {
                debug!(bucket = %name, caller = %self.caller, "bucket already exists");
                Ok(())
            }
            Err(source) => Err(TypedStoreError::Create {
                ctx: self.ctx(operation, bucket),
                source,
            }),
        }
    }

    async fn delete_bucket(&self, bucket: &str) -> TypedStoreResult<()> {
        let operation = Operation::DeleteBucket;
        let name = self.bucket_name(operation, bucket)?;

        self.remove_bucket(operation, &name).await
    }

    async fn purge_bucket(&self, bucket: &str) -> TypedStoreResult<()> {
        let operation = Operation::PurgeBucket;
        let name = self.bucket_name(operation, bucket)?;

        let listing = match self.paginator.list_all_keys(&name, "").await {
            Ok(listing) => listing,
            Err(err) if err.is_no_such_bucket() => {
                debug!(bucket = %name, caller = %self.caller, "bucket absent, nothing to purge");
                return Ok(());
            }
            Err(source) => {
                return Err(TypedStoreError::List {
                    ctx: self.ctx(operation, bucket),
                    source,
                });
            }
        };

        batch_delete::delete_keys(
            self.blobs.as_ref(),
            &name,
            listing.keys(),
            self.ctx(operation, bucket),
        )
        .await?;

        self.remove_bucket(operation, &name).await?;

        info!(bucket = %name, objects = listing.len(), caller = %self.caller, "purged bucket");
        Ok(())
    }
}
