use crate::domain::errors::ValidationError;

/// Maximum key length accepted by S3-compatible stores, in bytes
pub const MAX_OBJECT_KEY_LEN: usize = 1024;

/// A validated object key in a bucket.
///
/// Keys are taken verbatim: leading or repeated `/` characters are kept as-is,
/// and any normalisation is left to the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new ObjectKey with validation
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::EmptyObjectKey);
        }

        if value.len() > MAX_OBJECT_KEY_LEN {
            return Err(ValidationError::ObjectKeyTooLong {
                actual: value.len(),
                max: MAX_OBJECT_KEY_LEN,
            });
        }

        if let Some(c) = value.chars().find(|c| *c == '\0') {
            return Err(ValidationError::InvalidObjectKeyCharacter(c));
        }

        Ok(Self(value))
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_object_key() {
        assert!(ObjectKey::new("file.json").is_ok());
        assert!(ObjectKey::new("ns/vrg/PersistentVolume/pv1").is_ok());
        // repeated delimiters are the store's concern
        assert!(ObjectKey::new("ns//vrg/pv").is_ok());
        assert!(ObjectKey::new("/leading").is_ok());
    }

    #[test]
    fn test_invalid_object_key() {
        assert_eq!(ObjectKey::new(""), Err(ValidationError::EmptyObjectKey));
        assert_eq!(
            ObjectKey::new("null\0byte"),
            Err(ValidationError::InvalidObjectKeyCharacter('\0'))
        );
        assert_eq!(
            ObjectKey::new("x".repeat(1025)),
            Err(ValidationError::ObjectKeyTooLong {
                actual: 1025,
                max: 1024
            })
        );
    }
}
