// Infrastructure error mapping
mod error;

// Storage implementations
pub mod bucket_provider;
pub mod in_memory_blob_store;
pub mod object_store_adapter;

// Provider-specific implementations
pub mod s3;

// Re-export key types
pub use bucket_provider::{BucketProvider, InMemoryBuckets};
pub use in_memory_blob_store::InMemoryBlobStore;
pub use object_store_adapter::ObjectStoreBlobStore;
pub use s3::{S3Buckets, S3Config, create_s3_blob_store, create_s3_client};
