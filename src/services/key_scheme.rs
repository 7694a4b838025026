//! Key layout: `<prefix><typeTag>/<suffix>`.
//!
//! The prefix is caller supplied and carries its own trailing delimiter.
//! Nothing is normalised here: `"a/" + "T" + "/" + "/x"` stays `a/T//x`.

use crate::domain::{errors::ValidationError, models::StoredObject, value_objects::TypeTag};

/// Key of the object of type `tag` stored under `prefix` with `suffix`
pub fn build_key(prefix: &str, tag: &TypeTag, suffix: &str) -> String {
    let mut key = type_prefix(prefix, tag);
    key.push_str(suffix);
    key
}

/// Prefix shared by every object of type `tag` under `prefix`
pub fn type_prefix(prefix: &str, tag: &TypeTag) -> String {
    let mut key = String::with_capacity(prefix.len() + tag.as_str().len() + 1);
    key.push_str(prefix);
    key.push_str(tag.as_str());
    key.push('/');
    key
}

/// `build_key` with the registered tag of `T`
pub fn typed_key<T: StoredObject>(prefix: &str, suffix: &str) -> Result<String, ValidationError> {
    Ok(build_key(prefix, &TypeTag::of::<T>()?, suffix))
}
