use thiserror::Error;

use super::{BlobStoreError, CodecError, ValidationError};

/// Operations exposed by the typed store and bucket lifecycle services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    UploadObject,
    UploadTypedObject,
    VerifyUpload,
    DownloadObject,
    DownloadAllOfType,
    ListKeys,
    DeleteObject,
    DeleteByPrefix,
    CreateBucket,
    DeleteBucket,
    PurgeBucket,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::UploadObject => "upload_object",
            Operation::UploadTypedObject => "upload_typed_object",
            Operation::VerifyUpload => "verify_upload",
            Operation::DownloadObject => "download_object",
            Operation::DownloadAllOfType => "download_all_of_type",
            Operation::ListKeys => "list_keys",
            Operation::DeleteObject => "delete_object",
            Operation::DeleteByPrefix => "delete_by_prefix",
            Operation::CreateBucket => "create_bucket",
            Operation::DeleteBucket => "delete_bucket",
            Operation::PurgeBucket => "purge_bucket",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an error happened: operation, calling subsystem, bucket and key or prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpContext {
    pub operation: Operation,
    pub caller: String,
    pub bucket: String,
    pub target: Option<String>,
}

impl OpContext {
    pub fn new(operation: Operation, caller: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            operation,
            caller: caller.into(),
            bucket: bucket.into(),
            target: None,
        }
    }

    /// Attach the key or prefix the operation was acting on
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl std::fmt::Display for OpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} for caller {} on bucket {}",
            self.operation, self.caller, self.bucket
        )?;
        if let Some(target) = &self.target {
            write!(f, " key {:?}", target)?;
        }
        Ok(())
    }
}

/// Errors returned by the typed store and bucket lifecycle services
#[derive(Debug, Error)]
pub enum TypedStoreError {
    /// Invalid bucket, key or type tag, detected before any store call
    #[error("{ctx}: invalid input: {source}")]
    Config {
        ctx: OpContext,
        source: ValidationError,
    },

    /// The store could not be reached or rejected the request
    #[error("{ctx}: transport failure: {source}")]
    Transport {
        ctx: OpContext,
        source: BlobStoreError,
    },

    /// No such bucket or key
    #[error("{ctx}: not found: {source}")]
    NotFound {
        ctx: OpContext,
        source: BlobStoreError,
    },

    #[error("{ctx}: failed to encode object: {source}")]
    Encode { ctx: OpContext, source: CodecError },

    #[error("{ctx}: failed to decode object: {source}")]
    Decode { ctx: OpContext, source: CodecError },

    /// The stored object decoded cleanly but differs from the expected value
    #[error("{ctx}: verification failed, want {expected} got {actual}")]
    VerificationMismatch {
        ctx: OpContext,
        expected: String,
        actual: String,
    },

    #[error("{ctx}: failed to list keys: {source}")]
    List {
        ctx: OpContext,
        source: BlobStoreError,
    },

    /// Some or all keys of a batch delete were not removed. Deletion is not
    /// rolled back, so keys absent from `failed_keys` may already be gone.
    #[error("{ctx}: failed to delete {} key(s): {source}", .failed_keys.len())]
    Delete {
        ctx: OpContext,
        failed_keys: Vec<String>,
        source: BlobStoreError,
    },

    #[error("{ctx}: failed to create bucket: {source}")]
    Create {
        ctx: OpContext,
        source: BlobStoreError,
    },

    #[error("{ctx}: bucket still contains objects")]
    NotEmpty { ctx: OpContext },
}

impl TypedStoreError {
    pub fn context(&self) -> &OpContext {
        match self {
            TypedStoreError::Config { ctx, .. }
            | TypedStoreError::Transport { ctx, .. }
            | TypedStoreError::NotFound { ctx, .. }
            | TypedStoreError::Encode { ctx, .. }
            | TypedStoreError::Decode { ctx, .. }
            | TypedStoreError::VerificationMismatch { ctx, .. }
            | TypedStoreError::List { ctx, .. }
            | TypedStoreError::Delete { ctx, .. }
            | TypedStoreError::Create { ctx, .. }
            | TypedStoreError::NotEmpty { ctx } => ctx,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TypedStoreError::NotFound { .. })
    }

    /// Classify a failed get/put against a single key
    pub(crate) fn from_blob(ctx: OpContext, source: BlobStoreError) -> Self {
        if source.is_not_found() {
            TypedStoreError::NotFound { ctx, source }
        } else {
            TypedStoreError::Transport { ctx, source }
        }
    }

    /// Classify a failed batch delete, keeping the keys that were left behind
    pub(crate) fn from_delete(ctx: OpContext, source: BlobStoreError, attempted: &[String]) -> Self {
        let failed_keys = match &source {
            BlobStoreError::BatchDelete { failures, .. } => {
                failures.iter().map(|f| f.key.clone()).collect()
            }
            _ => attempted.to_vec(),
        };
        TypedStoreError::Delete {
            ctx,
            failed_keys,
            source,
        }
    }
}

/// Result type for typed store operations
pub type TypedStoreResult<T> = Result<T, TypedStoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DeleteFailure;

    #[test]
    fn test_context_display() {
        let ctx = OpContext::new(Operation::DownloadObject, "vrg-controller", "backups")
            .with_target("ns/vrg/PersistentVolume/pv1");
        assert_eq!(
            ctx.to_string(),
            "download_object for caller vrg-controller on bucket backups key \"ns/vrg/PersistentVolume/pv1\""
        );
    }

    #[test]
    fn test_blob_error_classification() {
        let ctx = OpContext::new(Operation::DownloadObject, "c", "b");
        let err = TypedStoreError::from_blob(
            ctx.clone(),
            BlobStoreError::NoSuchKey {
                bucket: "b".to_string(),
                key: "k".to_string(),
            },
        );
        assert!(err.is_not_found());

        let err = TypedStoreError::from_blob(
            ctx,
            BlobStoreError::Transport {
                message: "connection reset".to_string(),
            },
        );
        assert!(matches!(err, TypedStoreError::Transport { .. }));
        assert_eq!(err.context().caller, "c");
    }

    #[test]
    fn test_delete_error_keeps_failed_keys() {
        let ctx = OpContext::new(Operation::DeleteByPrefix, "c", "b").with_target("p/");
        let source = BlobStoreError::BatchDelete {
            bucket: "b".to_string(),
            failures: vec![DeleteFailure {
                key: "p/3".to_string(),
                message: "access denied".to_string(),
            }],
        };
        let attempted = vec!["p/1".to_string(), "p/3".to_string()];

        match TypedStoreError::from_delete(ctx, source, &attempted) {
            TypedStoreError::Delete { failed_keys, .. } => {
                assert_eq!(failed_keys, vec!["p/3".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
