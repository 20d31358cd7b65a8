use thiserror::Error;

/// Errors from encoding or decoding values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The input starts with a tag byte the decoder does not recognize.
    #[error("unknown type tag: 0x{0:02x}")]
    UnknownTag(u8),

    /// The input ended before a complete payload could be read.
    #[error("unexpected end of input: {needed} more bytes needed")]
    UnexpectedEof { needed: usize },

    /// A payload is structurally invalid (bad bool byte, negative length,
    /// out-of-range nanos, non-UTF-8 string bytes).
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The value cannot be represented in the wire format.
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
