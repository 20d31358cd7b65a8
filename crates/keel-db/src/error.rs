use keel_dag::DagError;
use keel_entity::EntityError;
use keel_index::IndexError;
use keel_schema::SchemaError;
use keel_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the database façade.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dag(#[from] DagError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    /// The denormalized schema mirror could not be serialized.
    #[error("schema mirror serialization failed: {0}")]
    SchemaMirror(String),
}

/// Result alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
