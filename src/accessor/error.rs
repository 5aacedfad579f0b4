//! Accessor error types
//!
//! Every failure of a get/set/realize call surfaces as one of these,
//! synchronously, to the immediate caller.

use crate::core::DbError;
use thiserror::Error;

pub type AccessorResult<T> = Result<T, AccessorError>;

#[derive(Debug, Error)]
pub enum AccessorError {
    /// `target` is `Type.property`, or just `Type` for a whole object input.
    #[error("Type mismatch for '{target}': expected {expected}, got {found}")]
    TypeMismatch {
        target: String,
        expected: String,
        found: String,
    },

    #[error("Missing value for required property '{object_type}.{property}'")]
    MissingRequiredValue {
        object_type: String,
        property: String,
    },

    #[error("Attempting to create an object of type '{object_type}' with an existing primary key value {key}")]
    DuplicatePrimaryKey { object_type: String, key: String },

    #[error("Primary key '{object_type}.{property}' can't be changed after an object is inserted")]
    PrimaryKeyImmutable {
        object_type: String,
        property: String,
    },

    #[error("Unsupported conversion: {0}")]
    UnsupportedConversion(String),

    #[error("Storage engine failure: {0}")]
    StorageEngineFailure(#[from] DbError),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Object type '{0}' not found in schema")]
    UnknownObjectType(String),

    #[error("Property '{property}' not found on object type '{object_type}'")]
    UnknownProperty {
        object_type: String,
        property: String,
    },
}

impl AccessorError {
    pub(crate) fn type_mismatch(
        object_type: &str,
        property: &str,
        expected: impl ToString,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            target: format!("{}.{}", object_type, property),
            expected: expected.to_string(),
            found: found.into(),
        }
    }

    pub(crate) fn object_mismatch(
        object_type: &str,
        expected: impl ToString,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            target: object_type.to_string(),
            expected: expected.to_string(),
            found: found.into(),
        }
    }

    pub(crate) fn missing(object_type: &str, property: &str) -> Self {
        Self::MissingRequiredValue {
            object_type: object_type.to_string(),
            property: property.to_string(),
        }
    }
}
