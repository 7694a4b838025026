use tracing::{debug, info, warn};

use crate::{
    domain::{
        errors::{OpContext, TypedStoreError, TypedStoreResult},
        value_objects::BucketName,
    },
    ports::storage::BlobStore,
};

/// Delete a complete listing in one logical batch.
///
/// Not atomic: on failure the keys the store did remove stay removed, and
/// the error lists the keys that are left.
pub(crate) async fn delete_keys(
    blobs: &dyn BlobStore,
    bucket: &BucketName,
    keys: &[String],
    ctx: OpContext,
) -> TypedStoreResult<()> {
    if keys.is_empty() {
        debug!(bucket = %bucket, caller = %ctx.caller, "nothing to delete");
        return Ok(());
    }

    match blobs.delete_batch(bucket, keys).await {
        Ok(()) => {
            info!(
                bucket = %bucket,
                count = keys.len(),
                caller = %ctx.caller,
                operation = %ctx.operation,
                "deleted objects"
            );
            Ok(())
        }
        Err(source) => {
            let err = TypedStoreError::from_delete(ctx, source, keys);
            warn!(bucket = %bucket, attempted = keys.len(), error = %err, "batch delete failed");
            Err(err)
        }
    }
}
