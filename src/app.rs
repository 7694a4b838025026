use std::sync::Arc;

use crate::{
    adapters::outbound::storage::{
        InMemoryBlobStore, S3Config, create_s3_blob_store, s3::DEFAULT_REGION,
    },
    domain::value_objects::BucketName,
    ports::storage::BlobStore,
    services::{BucketLifecycleServiceImpl, TypedObjectStore},
};

pub const DEFAULT_BUCKET: &str = "typed-object-store";
pub const DEFAULT_CALLER_TAG: &str = "typed-object-store";

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    /// Bucket the typed store handle works on
    pub bucket: String,
    /// Identifies the caller in logs and error contexts
    pub caller_tag: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::InMemory,
            bucket: DEFAULT_BUCKET.to_string(),
            caller_tag: DEFAULT_CALLER_TAG.to_string(),
        }
    }
}

impl AppConfig {
    /// Read the configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        let storage_backend = match std::env::var("STORAGE_BACKEND").as_deref() {
            Ok("s3") => StorageBackend::S3(S3Config {
                region: std::env::var("S3_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
                endpoint: std::env::var("S3_ENDPOINT").ok(),
                access_key: std::env::var("S3_ACCESS_KEY").ok(),
                secret_key: std::env::var("S3_SECRET_KEY").ok(),
                allow_http: std::env::var("S3_ALLOW_HTTP")
                    .map(|v| v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
            }),
            Ok("memory") | Ok("") | Err(_) => StorageBackend::InMemory,
            Ok(other) => {
                return Err(AppError::Configuration {
                    message: format!("unknown STORAGE_BACKEND {other:?}, expected s3 or memory"),
                });
            }
        };

        let bucket = match (&storage_backend, std::env::var("S3_BUCKET")) {
            (_, Ok(bucket)) => bucket,
            (StorageBackend::InMemory, Err(_)) => DEFAULT_BUCKET.to_string(),
            (StorageBackend::S3(_), Err(_)) => {
                return Err(AppError::Configuration {
                    message: "S3_BUCKET environment variable required".to_string(),
                });
            }
        };

        let caller_tag =
            std::env::var("CALLER_TAG").unwrap_or_else(|_| DEFAULT_CALLER_TAG.to_string());

        Ok(Self {
            storage_backend,
            bucket,
            caller_tag,
        })
    }
}

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    S3(S3Config),
}

/// Application dependencies container
pub struct AppDependencies {
    pub blob_store: Arc<dyn BlobStore>,
}

/// Application services container
pub struct AppServices {
    pub typed_store: TypedObjectStore,
    pub bucket_lifecycle: BucketLifecycleServiceImpl,
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
    blob_store: Option<Arc<dyn BlobStore>>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            blob_store: None,
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.bucket = bucket.into();
        self
    }

    pub fn with_caller_tag(mut self, caller_tag: impl Into<String>) -> Self {
        self.config.caller_tag = caller_tag.into();
        self
    }

    /// Use an existing blob store instead of building one from the backend
    pub fn with_blob_store(mut self, blob_store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(blob_store);
        self
    }

    /// Build the application dependencies
    pub async fn build_dependencies(&self) -> Result<AppDependencies, AppError> {
        if let Some(blob_store) = &self.blob_store {
            return Ok(AppDependencies {
                blob_store: blob_store.clone(),
            });
        }

        let blob_store = self.create_blob_store().await?;
        Ok(AppDependencies { blob_store })
    }

    /// Build the complete application with services
    pub async fn build(self) -> Result<AppServices, AppError> {
        let bucket = self.bucket_name()?;
        let deps = self.build_dependencies().await?;

        let typed_store =
            TypedObjectStore::new(deps.blob_store.clone(), bucket, &self.config.caller_tag);
        let bucket_lifecycle =
            BucketLifecycleServiceImpl::new(deps.blob_store.clone(), &self.config.caller_tag);

        Ok(AppServices {
            typed_store,
            bucket_lifecycle,
        })
    }

    fn bucket_name(&self) -> Result<BucketName, AppError> {
        BucketName::new(self.config.bucket.as_str()).map_err(|err| AppError::Configuration {
            message: format!("invalid bucket {:?}: {err}", self.config.bucket),
        })
    }

    /// Create the blob store based on configuration
    async fn create_blob_store(&self) -> Result<Arc<dyn BlobStore>, AppError> {
        match &self.config.storage_backend {
            StorageBackend::InMemory => Ok(Arc::new(InMemoryBlobStore::new())),
            StorageBackend::S3(s3) => {
                let store = create_s3_blob_store(s3.clone()).map_err(|err| AppError::StorageInit {
                    message: format!("{err:#}"),
                })?;
                Ok(Arc::new(store))
            }
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    StorageInit { message: String },
}

/// Convenience functions for common configurations
///
/// Create an in-memory application for testing and development
pub async fn create_in_memory_app() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory)
        .build()
        .await
}

/// Create an S3-backed application working on `bucket`
pub async fn create_s3_app(
    bucket: impl Into<String>,
    config: S3Config,
) -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::S3(config))
        .with_bucket(bucket)
        .build()
        .await
}

/// Create application from environment variables
pub async fn create_app_from_env() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_config(AppConfig::from_env()?)
        .build()
        .await
}
