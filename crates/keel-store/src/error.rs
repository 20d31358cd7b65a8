use crate::key::Key;

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `add` was called on a key that already exists.
    #[error("key already exists: {0}")]
    AlreadyExists(Key),

    /// `overwrite` was called on a key that does not exist.
    #[error("key not found: {0}")]
    NotFound(Key),

    /// A namespace segment or key name failed validation.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// I/O error from the underlying backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
