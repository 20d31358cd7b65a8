use keel_types::ValueType;
use thiserror::Error;

/// Errors from schema construction and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// An attribute name is not in `Type.prop` form.
    #[error("invalid attribute name {name:?}: {reason}")]
    InvalidAttributeName { name: String, reason: String },

    /// Two definitions of the same attribute name disagree.
    #[error("conflicting definitions for attribute {name}")]
    ConflictingDefinition { name: String },

    /// Unique constraints only apply to single-valued attributes.
    #[error("unique attribute {name} cannot be list-valued")]
    UniqueListAttribute { name: String },

    /// A fact referenced an attribute the schema does not declare.
    #[error("undeclared attribute: {0}")]
    UndeclaredAttribute(String),

    /// A fact's value does not match the attribute's declared type.
    #[error("type mismatch on {attr}: expected {expected}, got {actual}")]
    TypeMismatch {
        attr: String,
        expected: ValueType,
        actual: ValueType,
    },

    /// A lookup required a unique attribute but the attribute is not unique.
    #[error("attribute {0} is not unique")]
    NotUnique(String),

    /// The reserved entity id range cannot hold this many attributes.
    #[error("reserved entity id range exhausted: {count} attributes, {max} slots")]
    ReservedEidsExhausted { count: usize, max: usize },

    /// Persisted schema facts are malformed.
    #[error("malformed schema facts: {0}")]
    MalformedSchemaFacts(String),
}

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
