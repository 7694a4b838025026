/// Validation errors for domain value objects
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    // ObjectKey validation errors
    EmptyObjectKey,
    ObjectKeyTooLong {
        actual: usize,
        max: usize,
    },
    InvalidObjectKeyCharacter(char),

    // BucketName validation errors
    EmptyBucketName,
    BucketNameTooShort {
        actual: usize,
        min: usize,
    },
    BucketNameTooLong {
        actual: usize,
        max: usize,
    },
    BucketNameInvalidStart,
    BucketNameInvalidEnd,
    BucketNameInvalidCharacter(char),
    BucketNameConsecutiveDots,
    BucketNameLooksLikeIpAddress,

    // TypeTag validation errors
    EmptyTypeTag,
    TypeTagContainsSeparator(String),
    InvalidTypeTagCharacter(char),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ObjectKey errors
            ValidationError::EmptyObjectKey => write!(f, "Object key cannot be empty"),
            ValidationError::ObjectKeyTooLong { actual, max } => {
                write!(f, "Object key too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidObjectKeyCharacter(c) => {
                write!(f, "Invalid character in object key: {:?}", c)
            }

            // BucketName errors
            ValidationError::EmptyBucketName => write!(f, "Bucket name cannot be empty"),
            ValidationError::BucketNameTooShort { actual, min } => {
                write!(
                    f,
                    "Bucket name too short: {} characters (min: {})",
                    actual, min
                )
            }
            ValidationError::BucketNameTooLong { actual, max } => {
                write!(
                    f,
                    "Bucket name too long: {} characters (max: {})",
                    actual, max
                )
            }
            ValidationError::BucketNameInvalidStart => {
                write!(f, "Bucket name must start with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidEnd => {
                write!(f, "Bucket name must end with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidCharacter(c) => {
                write!(
                    f,
                    "Invalid character in bucket name: '{}'. Only lowercase letters, numbers, dots and hyphens allowed",
                    c
                )
            }
            ValidationError::BucketNameConsecutiveDots => {
                write!(f, "Bucket name cannot contain consecutive dots")
            }
            ValidationError::BucketNameLooksLikeIpAddress => {
                write!(f, "Bucket name cannot be formatted as an IP address")
            }

            // TypeTag errors
            ValidationError::EmptyTypeTag => write!(f, "Type tag cannot be empty"),
            ValidationError::TypeTagContainsSeparator(tag) => {
                write!(f, "Type tag '{}' cannot contain '/'", tag)
            }
            ValidationError::InvalidTypeTagCharacter(c) => {
                write!(f, "Invalid character in type tag: {:?}", c)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
