use tracing::debug;

use keel_store::{Key, KvStore, Namespace, StoreError};
use keel_types::NodeHash;

use crate::error::{DagError, DagResult};
use crate::node::Node;
use crate::serial::{canonical_bytes, decode_node};

/// Node persistence over any [`KvStore`].
///
/// Nodes live under `nodes/<hex-hash>`; the current head hash lives as hex
/// text under `refs/head`. Node writes use the create-only path; an
/// `AlreadyExists` is success, because under content addressing an existing
/// entry holds the identical bytes. Reads verify the digest before
/// returning.
#[derive(Clone, Debug)]
pub struct NodeStore<S> {
    store: S,
}

/// Name of the head pointer under the refs namespace.
pub const HEAD_NAME: &str = "head";

impl<S: KvStore> NodeStore<S> {
    /// Wrap a key/value store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying key/value store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    fn nodes_ns() -> Namespace {
        Namespace::root()
            .child("nodes")
            .expect("static segment is valid")
    }

    fn head_key() -> Key {
        Namespace::root()
            .child("refs")
            .expect("static segment is valid")
            .key(HEAD_NAME)
            .expect("static name is valid")
    }

    fn node_key(hash: &NodeHash) -> Key {
        Self::nodes_ns()
            .key(&hash.to_hex())
            .expect("hex hash is a valid name")
    }

    // ---------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------

    /// Serialize and store a node, returning its content hash.
    ///
    /// Idempotent: storing a node that already exists succeeds.
    pub fn put(&self, node: &Node) -> DagResult<NodeHash> {
        let bytes = canonical_bytes(node)?;
        let hash = NodeHash::digest(&bytes);
        match self.store.add(&Self::node_key(&hash), &bytes) {
            Ok(()) => {
                debug!(node = %hash.abbrev(), facts = node.facts().len(), "stored node");
            }
            // Content-addressed: the existing entry holds the same bytes.
            Err(StoreError::AlreadyExists(_)) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(hash)
    }

    /// Load and decode a node, verifying its digest.
    pub fn get(&self, hash: &NodeHash) -> DagResult<Option<Node>> {
        let Some(bytes) = self.store.load(&Self::node_key(hash))? else {
            return Ok(None);
        };
        let computed = NodeHash::digest(&bytes);
        if computed != *hash {
            return Err(DagError::HashMismatch {
                stored: *hash,
                computed,
            });
        }
        Ok(Some(decode_node(&bytes)?))
    }

    /// Load a node that must exist.
    pub fn require(&self, hash: &NodeHash) -> DagResult<Node> {
        self.get(hash)?.ok_or(DagError::MissingNode(*hash))
    }

    /// Check whether a node is stored.
    pub fn contains(&self, hash: &NodeHash) -> DagResult<bool> {
        Ok(self.store.has_key(&Self::node_key(hash))?)
    }

    /// All stored node hashes, sorted.
    pub fn node_hashes(&self) -> DagResult<Vec<NodeHash>> {
        let mut hashes = Vec::new();
        for name in self.store.keys(&Self::nodes_ns())? {
            if let Ok(hash) = NodeHash::from_hex(&name) {
                hashes.push(hash);
            }
        }
        Ok(hashes)
    }

    // ---------------------------------------------------------------
    // Head pointer
    // ---------------------------------------------------------------

    /// Read the current head hash, if one has been set.
    pub fn head(&self) -> DagResult<Option<NodeHash>> {
        let Some(bytes) = self.store.load(&Self::head_key())? else {
            return Ok(None);
        };
        let text = std::str::from_utf8(&bytes).map_err(|_| DagError::CorruptedNode {
            reason: "head ref is not UTF-8".to_string(),
        })?;
        let hash = NodeHash::from_hex(text.trim()).map_err(|e| DagError::CorruptedNode {
            reason: format!("head ref is not a hash: {e}"),
        })?;
        Ok(Some(hash))
    }

    /// Advance the head pointer. Creates the ref on first use.
    pub fn set_head(&self, hash: &NodeHash) -> DagResult<()> {
        let key = Self::head_key();
        let text = hash.to_hex();
        if self.store.has_key(&key)? {
            self.store.overwrite(&key, text.as_bytes())?;
        } else {
            self.store.add(&key, text.as_bytes())?;
        }
        debug!(head = %hash.abbrev(), "advanced head");
        Ok(())
    }
}
