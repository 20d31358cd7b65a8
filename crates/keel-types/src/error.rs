use thiserror::Error;

/// Failures in the foundation types: entity id allocation and the textual
/// node-hash form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// The per-instance entity counter ran past the packable range; this
    /// instance can never allocate again (ids are not recycled).
    #[error("no entity ids left under instance {iid}")]
    EidSpaceExhausted { iid: u32 },

    /// A node-hash string (storage key or head ref) is not valid hex.
    #[error("unparseable node hash {text:?}: {reason}")]
    BadHashHex { text: String, reason: String },

    /// A node-hash string decoded to the wrong number of bytes.
    #[error("node hash must be {expected} bytes wide, got {actual}")]
    BadHashWidth { expected: usize, actual: usize },
}
