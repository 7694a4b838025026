mod batch_delete;
mod bucket_lifecycle_impl;
pub mod codec;
pub mod key_scheme;
mod paginator;
mod typed_store;

pub use bucket_lifecycle_impl::BucketLifecycleServiceImpl;
pub use paginator::Paginator;
pub use typed_store::{DEFAULT_DOWNLOAD_CONCURRENCY, TypedObjectStore};
