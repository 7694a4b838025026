use crate::domain::{errors::ValidationError, models::StoredObject};

/// Stable identifier of a stored schema, used as a key path segment.
///
/// Tags are part of the persisted key layout: changing a type's tag orphans
/// every object already written under the old one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeTag(String);

impl TypeTag {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::EmptyTypeTag);
        }

        if value.contains('/') {
            return Err(ValidationError::TypeTagContainsSeparator(value));
        }

        if let Some(c) = value.chars().find(|c| c.is_control() || c.is_whitespace()) {
            return Err(ValidationError::InvalidTypeTagCharacter(c));
        }

        Ok(Self(value))
    }

    /// The registered tag of `T`
    pub fn of<T: StoredObject>() -> Result<Self, ValidationError> {
        Self::new(T::TYPE_TAG)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{PersistentVolume, PersistentVolumeClaim};

    #[test]
    fn test_registered_tags() {
        assert_eq!(
            TypeTag::of::<PersistentVolume>().unwrap().as_str(),
            "PersistentVolume"
        );
        assert_eq!(
            TypeTag::of::<PersistentVolumeClaim>().unwrap().as_str(),
            "PersistentVolumeClaim"
        );
    }

    #[test]
    fn test_invalid_tags() {
        assert_eq!(TypeTag::new(""), Err(ValidationError::EmptyTypeTag));
        assert!(matches!(
            TypeTag::new("v1/PersistentVolume"),
            Err(ValidationError::TypeTagContainsSeparator(_))
        ));
        assert_eq!(
            TypeTag::new("Persistent Volume"),
            Err(ValidationError::InvalidTypeTagCharacter(' '))
        );
        assert!(TypeTag::new("v1.PersistentVolume").is_ok());
    }
}
