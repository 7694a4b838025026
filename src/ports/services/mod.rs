mod bucket_lifecycle;

pub use bucket_lifecycle::BucketLifecycle;
