use keel_schema::SchemaError;
use keel_types::{Eid, Value};
use thiserror::Error;

/// Errors from folding facts into an index.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// The fact violates the schema (undeclared attribute, type mismatch).
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A unique attribute's value is already held by another entity.
    #[error("uniqueness violation on {attr}: value {value} already held by {existing}, asserted for {new}")]
    UniquenessViolation {
        attr: String,
        value: Value,
        existing: Eid,
        new: Eid,
    },
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
