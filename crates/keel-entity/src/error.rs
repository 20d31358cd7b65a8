use keel_types::{TypeError, ValueType};
use thiserror::Error;

/// Errors from entity registration, destructuring, and reconstruction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntityError {
    /// No entity type registered under this name.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// Two entity types were registered under the same name.
    #[error("duplicate entity type: {0}")]
    DuplicateEntityType(String),

    /// A property definition is invalid.
    #[error("invalid property {prop} on {entity}: {reason}")]
    InvalidProp {
        entity: String,
        prop: String,
        reason: String,
    },

    /// An object carries a field its entity type does not declare.
    #[error("undeclared field {field} on {entity}")]
    UndeclaredField { entity: String, field: String },

    /// A field's scalar value does not match the declared type.
    #[error("field {field} on {entity}: expected {expected}, got {actual}")]
    FieldTypeMismatch {
        entity: String,
        field: String,
        expected: ValueType,
        actual: ValueType,
    },

    /// A field's shape (scalar vs object vs list) does not match the
    /// declared property kind.
    #[error("field {field} on {entity} has the wrong shape: expected {expected}")]
    FieldShapeMismatch {
        entity: String,
        field: String,
        expected: &'static str,
    },

    /// A nested object's entity type does not match the declared target.
    #[error("field {field} on {entity}: expected entity {expected}, got {actual}")]
    ReferenceTypeMismatch {
        entity: String,
        field: String,
        expected: String,
        actual: String,
    },

    /// A stored reference value was not a `Ref`.
    #[error("field {field} on {entity}: stored value is not a reference")]
    NotAReference { entity: String, field: String },

    /// Reference-typed values have no scalar default.
    #[error("no default value for reference-typed properties")]
    NoReferenceDefault,

    /// Entity id allocation failed.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for entity-mapping operations.
pub type EntityResult<T> = Result<T, EntityError>;
