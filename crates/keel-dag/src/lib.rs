//! The transaction node DAG.
//!
//! Every commit is a [`Node`]: a batch of facts plus a header naming the
//! writer and timestamp, linked to its parents by content hash. Roots have
//! no parents, leaves one, merges two. A node's identity is the BLAKE3
//! digest of its canonical bytes, so equal content always has equal
//! identity and the graph is acyclic by construction: a new node can only
//! reference hashes that already exist.
//!
//! [`NodeStore`] persists nodes under `nodes/<hex-hash>` in any
//! [`KvStore`](keel_store::KvStore) and maintains the mutable `refs/head`
//! pointer. [`replay`] walks parents from a head and yields facts in
//! parents-before-children order.

pub mod error;
pub mod node;
pub mod replay;
pub mod serial;
pub mod store;

pub use error::{DagError, DagResult};
pub use node::Node;
pub use replay::{reachable, replay};
pub use serial::{canonical_bytes, decode_node};
pub use store::NodeStore;
