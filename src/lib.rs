pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - core business entities and value objects
pub use domain::{
    // Errors
    BlobStoreError,
    // Value objects
    BucketName,
    CodecError,
    // Models
    KeyListing,
    ObjectKey,
    OpContext,
    Operation,
    PersistentVolume,
    PersistentVolumeClaim,
    StoredObject,
    TypeTag,
    TypedStoreError,
    TypedStoreResult,
    ValidationError,
};

// Port types - interfaces for external systems
pub use ports::{
    // Storage ports
    BlobStore,
    // Service ports
    BucketLifecycle,
    ListPage,
};

// Service implementations - business logic
pub use services::{BucketLifecycleServiceImpl, Paginator, TypedObjectStore};

// Application factory and configuration
pub use app::{
    AppBuilder, AppConfig, AppDependencies, AppError, AppServices, StorageBackend,
    create_app_from_env, create_in_memory_app, create_s3_app,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{InMemoryBlobStore, ObjectStoreBlobStore, S3Config};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        AppBuilder, AppServices, BlobStore, BucketLifecycle, BucketLifecycleServiceImpl,
        BucketName, InMemoryBlobStore, ObjectKey, ObjectStoreBlobStore, StoredObject,
        TypedObjectStore, TypedStoreError, create_in_memory_app, create_s3_app,
    };
}
