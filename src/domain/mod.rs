pub mod errors;
pub mod models;
pub mod value_objects;

// Re-export commonly used types
pub use errors::{
    BlobResult, BlobStoreError, CodecError, DeleteFailure, OpContext, Operation, TypedStoreError,
    TypedStoreResult, ValidationError,
};
pub use models::*;
pub use value_objects::*;
