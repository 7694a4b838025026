use std::sync::Arc;
use tracing::debug;

use crate::{
    domain::{
        errors::{BlobResult, BlobStoreError},
        models::KeyListing,
        value_objects::BucketName,
    },
    ports::storage::BlobStore,
};

/// Drives a possibly truncated list primitive to an exhaustive listing
#[derive(Clone)]
pub struct Paginator {
    blobs: Arc<dyn BlobStore>,
}

impl Paginator {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// List every key under `prefix`, following continuation tokens until
    /// the store reports a page that is not truncated.
    ///
    /// There is no bound on the number of pages. Keys are not de-duplicated:
    /// the store is expected to put each key on exactly one page.
    pub async fn list_all_keys(&self, bucket: &BucketName, prefix: &str) -> BlobResult<KeyListing> {
        let mut listing = KeyListing::new(prefix);
        let mut token: Option<String> = None;

        loop {
            let page = self
                .blobs
                .list_page(bucket, prefix, token.as_deref())
                .await?;
            listing.push_page(page.keys);

            if !page.truncated {
                break;
            }

            // Restarting without a token would list the first page forever
            match page.next_token {
                Some(next) => token = Some(next),
                None => {
                    return Err(BlobStoreError::MissingContinuationToken {
                        bucket: bucket.to_string(),
                        prefix: prefix.to_string(),
                    });
                }
            }
        }

        debug!(
            bucket = %bucket,
            prefix,
            keys = listing.len(),
            pages = listing.pages(),
            "listed keys"
        );

        Ok(listing)
    }
}
