pub mod services;
pub mod storage;

// Re-export all port traits for convenience
pub use services::BucketLifecycle;
pub use storage::{BlobStore, ListPage};
