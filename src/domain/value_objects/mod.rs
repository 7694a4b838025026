mod bucket_name;
mod object_key;
mod type_tag;

pub use bucket_name::BucketName;
pub use object_key::{MAX_OBJECT_KEY_LEN, ObjectKey};
pub use type_tag::TypeTag;
