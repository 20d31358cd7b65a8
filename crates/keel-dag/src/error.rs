use keel_codec::CodecError;
use keel_store::StoreError;
use keel_types::NodeHash;
use thiserror::Error;

/// Errors from node serialization, storage, and replay.
#[derive(Debug, Error)]
pub enum DagError {
    /// The node bytes are malformed or the parent combination is illegal.
    #[error("corrupted node: {reason}")]
    CorruptedNode { reason: String },

    /// Stored bytes do not hash to the id they were stored under.
    #[error("hash mismatch: stored under {stored}, bytes hash to {computed}")]
    HashMismatch { stored: NodeHash, computed: NodeHash },

    /// A parent hash does not resolve to a stored node.
    #[error("missing node: {0}")]
    MissingNode(NodeHash),

    /// Value-level encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for DAG operations.
pub type DagResult<T> = Result<T, DagError>;
