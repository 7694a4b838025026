use anyhow::Context;
use async_trait::async_trait;
use object_store::{ObjectStore, aws::AmazonS3, path::Path as ObjectPath, signer::Signer};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use super::{DEFAULT_REGION, S3Config, create_s3_client};
use crate::{
    adapters::outbound::storage::BucketProvider,
    domain::{
        errors::{BlobResult, BlobStoreError},
        value_objects::BucketName,
    },
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SIGNED_URL_TTL: Duration = Duration::from_secs(300);

/// Error document returned by S3 for failed requests
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct S3ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

/// Buckets on an S3-compatible endpoint.
///
/// Object traffic goes through one cached `AmazonS3` handle per bucket.
/// Bucket requests (CreateBucket, DeleteBucket, HeadBucket) are not part of
/// object_store, so they are sent with reqwest to a URL presigned by that
/// same handle.
#[derive(Debug)]
pub struct S3Buckets {
    config: S3Config,
    http_client: Client,
    clients: RwLock<HashMap<String, Arc<AmazonS3>>>,
}

impl S3Buckets {
    pub fn new(config: S3Config) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
            clients: RwLock::new(HashMap::new()),
        })
    }

    async fn client(&self, bucket: &BucketName) -> BlobResult<Arc<AmazonS3>> {
        if let Some(client) = self.clients.read().await.get(bucket.as_str()) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(bucket.as_str()) {
            return Ok(client.clone());
        }

        let client = Arc::new(create_s3_client(&self.config, bucket).map_err(|err| {
            BlobStoreError::InvalidRequest {
                message: format!("{err:#}"),
            }
        })?);
        clients.insert(bucket.to_string(), client.clone());
        Ok(client)
    }

    /// Send a bucket-level request and return the raw response
    async fn send(&self, method: Method, bucket: &BucketName, body: String) -> BlobResult<Response> {
        let client = self.client(bucket).await?;
        let url = client
            .signed_url(method.clone(), &ObjectPath::default(), SIGNED_URL_TTL)
            .await
            .map_err(|err| BlobStoreError::Transport {
                message: format!("failed to sign {method} request for bucket {bucket}: {err}"),
            })?;

        debug!(bucket = %bucket, method = %method, "sending bucket request");
        self.http_client
            .request(method.clone(), url.as_str())
            .body(body)
            .send()
            .await
            .map_err(|err| BlobStoreError::Transport {
                message: format!("{method} bucket {bucket} failed: {err}"),
            })
    }

    /// CreateBucket needs a location constraint outside the default region
    fn create_bucket_body(&self) -> String {
        if self.config.region == DEFAULT_REGION {
            String::new()
        } else {
            format!(
                "<CreateBucketConfiguration><LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>",
                self.config.region
            )
        }
    }
}

/// Classify a failed bucket request by its S3 error code
async fn service_error(bucket: &BucketName, response: Response) -> BlobStoreError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body = quick_xml::de::from_str::<S3ErrorBody>(&text).ok();
    let bucket = bucket.to_string();

    match (body.as_ref().map(|b| b.code.as_str()), status) {
        (Some("NoSuchBucket"), _) | (None, StatusCode::NOT_FOUND) => {
            BlobStoreError::NoSuchBucket { bucket }
        }
        (Some("BucketAlreadyOwnedByYou"), _) => BlobStoreError::BucketAlreadyOwnedByYou { bucket },
        (Some("BucketAlreadyExists"), _) => BlobStoreError::BucketAlreadyExists { bucket },
        (Some("BucketNotEmpty"), _) => BlobStoreError::BucketNotEmpty { bucket },
        (Some(code), _) => BlobStoreError::Transport {
            message: format!(
                "bucket {bucket}: {status}: {code}: {}",
                body.as_ref().map(|b| b.message.as_str()).unwrap_or_default()
            ),
        },
        (None, _) => BlobStoreError::Transport {
            message: format!("bucket {bucket}: {status}"),
        },
    }
}

#[async_trait]
impl BucketProvider for S3Buckets {
    async fn open(&self, bucket: &BucketName) -> BlobResult<Arc<dyn ObjectStore>> {
        let client: Arc<dyn ObjectStore> = self.client(bucket).await?;
        Ok(client)
    }

    async fn create_bucket(&self, bucket: &BucketName) -> BlobResult<()> {
        let response = self.send(Method::PUT, bucket, self.create_bucket_body()).await?;
        if !response.status().is_success() {
            return Err(service_error(bucket, response).await);
        }

        debug!(bucket = %bucket, region = %self.config.region, "created bucket");
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> BlobResult<()> {
        let response = self.send(Method::DELETE, bucket, String::new()).await?;
        if !response.status().is_success() {
            return Err(service_error(bucket, response).await);
        }

        self.clients.write().await.remove(bucket.as_str());
        debug!(bucket = %bucket, "deleted bucket");
        Ok(())
    }

    async fn bucket_exists(&self, bucket: &BucketName) -> BlobResult<bool> {
        let response = self.send(Method::HEAD, bucket, String::new()).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            // the bucket exists but belongs to another account
            StatusCode::FORBIDDEN => Ok(true),
            _ => Err(service_error(bucket, response).await),
        }
    }
}
