//! S3 bucket handles built with the object_store crate

use anyhow::{Context, Result};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use std::sync::Arc;

use crate::{adapters::outbound::storage::ObjectStoreBlobStore, domain::value_objects::BucketName};

mod buckets;

pub use buckets::S3Buckets;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for an S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Required for plain-http endpoints such as a local MinIO
    pub allow_http: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            allow_http: false,
        }
    }
}

/// Create an S3 client for one bucket from configuration
pub fn create_s3_client(config: &S3Config, bucket: &BucketName) -> Result<AmazonS3> {
    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(bucket.as_str())
        .with_region(&config.region)
        .with_allow_http(config.allow_http);

    if let Some(access_key) = &config.access_key {
        builder = builder.with_access_key_id(access_key);
    }

    if let Some(secret_key) = &config.secret_key {
        builder = builder.with_secret_access_key(secret_key);
    }

    if let Some(endpoint) = &config.endpoint {
        // Custom endpoints (MinIO, Ceph) are addressed path-style
        builder = builder
            .with_endpoint(endpoint)
            .with_virtual_hosted_style_request(false);
    }

    builder
        .build()
        .with_context(|| format!("Failed to build S3 client for bucket {bucket}"))
}

/// Create a blob store over every bucket of the configured endpoint
pub fn create_s3_blob_store(config: S3Config) -> Result<ObjectStoreBlobStore> {
    let buckets = S3Buckets::new(config)?;
    Ok(ObjectStoreBlobStore::new(Arc::new(buckets)))
}
