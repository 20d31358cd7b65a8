use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Width of a node hash in bytes.
pub const HASH_WIDTH: usize = 32;

/// Identity of a committed node: the BLAKE3 digest of its canonical bytes.
///
/// Nodes reference their parents by hash, so comparing two hashes compares
/// whole histories. A hash is only ever produced two ways: by digesting a
/// node's canonical serialization, or by reading a digest back out of a
/// serialized parent slot. The all-zero digest never names a real node;
/// the wire format spends it on marking a parent slot empty.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHash([u8; HASH_WIDTH]);

impl NodeHash {
    /// The empty-parent-slot sentinel: all zero bytes.
    pub const NULL: NodeHash = NodeHash([0; HASH_WIDTH]);

    /// Digest the canonical serialization of a node.
    ///
    /// Callers are expected to pass the exact bytes that get stored; the
    /// digest of anything else names nothing.
    pub fn digest(canonical_bytes: &[u8]) -> Self {
        Self(*blake3::hash(canonical_bytes).as_bytes())
    }

    /// Adopt a digest read back out of a parent slot.
    pub const fn from_digest(digest: [u8; HASH_WIDTH]) -> Self {
        Self(digest)
    }

    /// Whether this is the empty-parent-slot sentinel.
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// The raw digest, as written into parent slots.
    pub fn as_bytes(&self) -> &[u8; HASH_WIDTH] {
        &self.0
    }

    /// Lowercase hex: the node's storage key under `nodes/` and the text
    /// form kept in the head ref.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the hex form used by storage keys and the head ref.
    pub fn from_hex(text: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(text).map_err(|e| TypeError::BadHashHex {
            text: text.to_string(),
            reason: e.to_string(),
        })?;
        let digest: [u8; HASH_WIDTH] =
            bytes
                .try_into()
                .map_err(|rest: Vec<u8>| TypeError::BadHashWidth {
                    expected: HASH_WIDTH,
                    actual: rest.len(),
                })?;
        Ok(Self(digest))
    }

    /// First four bytes in hex, for log lines.
    pub fn abbrev(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeHash").field(&self.abbrev()).finish()
    }
}

impl fmt::Display for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
