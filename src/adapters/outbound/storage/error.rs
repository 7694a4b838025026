use crate::domain::{errors::BlobStoreError, value_objects::BucketName};

/// S3 error code sent when the addressed bucket does not exist
const NO_SUCH_BUCKET_CODE: &str = "<Code>NoSuchBucket</Code>";

/// Map an object_store error raised while working on `key` in `bucket`.
///
/// object_store surfaces a missing S3 bucket as `NotFound` (object requests)
/// or `Generic` (listings). The S3 error body is part of the message, so the
/// error code tells the two cases apart.
pub(crate) fn from_object_store(
    err: object_store::Error,
    bucket: &BucketName,
    key: &str,
) -> BlobStoreError {
    if names_missing_bucket(&err) {
        return BlobStoreError::NoSuchBucket {
            bucket: bucket.to_string(),
        };
    }

    match err {
        object_store::Error::NotFound { .. } => BlobStoreError::NoSuchKey {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        object_store::Error::InvalidPath { source } => BlobStoreError::InvalidRequest {
            message: format!("invalid object path {key:?}: {source}"),
        },
        object_store::Error::NotSupported { .. } | object_store::Error::NotImplemented => {
            BlobStoreError::InvalidRequest {
                message: err.to_string(),
            }
        }
        _ => BlobStoreError::Transport {
            message: err.to_string(),
        },
    }
}

fn names_missing_bucket(err: &object_store::Error) -> bool {
    matches!(
        err,
        object_store::Error::NotFound { .. } | object_store::Error::Generic { .. }
    ) && err.to_string().contains(NO_SUCH_BUCKET_CODE)
}

/// Map a key that object_store cannot represent as a path
pub(crate) fn invalid_path(key: &str, err: object_store::path::Error) -> BlobStoreError {
    BlobStoreError::InvalidRequest {
        message: format!("invalid object path {key:?}: {err}"),
    }
}
