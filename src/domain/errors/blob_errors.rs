use thiserror::Error;

/// A key that a batch delete failed to remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub key: String,
    pub message: String,
}

/// Errors reported by a blob store primitive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobStoreError {
    #[error("bucket {bucket} does not exist")]
    NoSuchBucket { bucket: String },

    #[error("key {key} does not exist in bucket {bucket}")]
    NoSuchKey { bucket: String, key: String },

    #[error("bucket {bucket} already exists and is owned by you")]
    BucketAlreadyOwnedByYou { bucket: String },

    #[error("bucket {bucket} already exists and is owned by another account")]
    BucketAlreadyExists { bucket: String },

    #[error("bucket {bucket} is not empty")]
    BucketNotEmpty { bucket: String },

    #[error("batch delete in bucket {bucket} failed for {} key(s)", .failures.len())]
    BatchDelete {
        bucket: String,
        failures: Vec<DeleteFailure>,
    },

    #[error("listing of {bucket}:{prefix} was truncated without a continuation token")]
    MissingContinuationToken { bucket: String, prefix: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("transport error: {message}")]
    Transport { message: String },
}

impl BlobStoreError {
    /// True when the store reports that the bucket or key does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BlobStoreError::NoSuchBucket { .. } | BlobStoreError::NoSuchKey { .. }
        )
    }

    pub fn is_no_such_bucket(&self) -> bool {
        matches!(self, BlobStoreError::NoSuchBucket { .. })
    }
}

/// Result type for blob store primitives
pub type BlobResult<T> = Result<T, BlobStoreError>;
