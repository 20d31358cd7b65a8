use serde::{Deserialize, Serialize};

use keel_types::{Fact, NodeHash, Source};

use crate::error::DagResult;
use crate::serial::canonical_bytes;

/// One vertex in the transaction DAG.
///
/// Nodes are immutable once hashed and stored. The variant is determined by
/// the parent count; all variants share the `(source, timestamp, facts)`
/// header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// First node of a history: no parents.
    Root {
        source: Source,
        timestamp: i64,
        facts: Vec<Fact>,
    },
    /// Linear commit: one parent.
    Leaf {
        parent: NodeHash,
        source: Source,
        timestamp: i64,
        facts: Vec<Fact>,
    },
    /// Join of two divergent histories.
    Merge {
        parent1: NodeHash,
        parent2: NodeHash,
        source: Source,
        timestamp: i64,
        facts: Vec<Fact>,
    },
}

impl Node {
    /// Create a root node.
    pub fn root(source: Source, timestamp: i64, facts: Vec<Fact>) -> Self {
        Node::Root {
            source,
            timestamp,
            facts,
        }
    }

    /// Create a leaf node on `parent`.
    pub fn leaf(parent: NodeHash, source: Source, timestamp: i64, facts: Vec<Fact>) -> Self {
        Node::Leaf {
            parent,
            source,
            timestamp,
            facts,
        }
    }

    /// Create a merge node joining `parent1` and `parent2`.
    pub fn merge(
        parent1: NodeHash,
        parent2: NodeHash,
        source: Source,
        timestamp: i64,
        facts: Vec<Fact>,
    ) -> Self {
        Node::Merge {
            parent1,
            parent2,
            source,
            timestamp,
            facts,
        }
    }

    /// The facts this node commits.
    pub fn facts(&self) -> &[Fact] {
        match self {
            Node::Root { facts, .. } | Node::Leaf { facts, .. } | Node::Merge { facts, .. } => {
                facts
            }
        }
    }

    /// The writer that produced this node.
    pub fn source(&self) -> Source {
        match self {
            Node::Root { source, .. }
            | Node::Leaf { source, .. }
            | Node::Merge { source, .. } => *source,
        }
    }

    /// Commit time, epoch milliseconds UTC.
    pub fn timestamp(&self) -> i64 {
        match self {
            Node::Root { timestamp, .. }
            | Node::Leaf { timestamp, .. }
            | Node::Merge { timestamp, .. } => *timestamp,
        }
    }

    /// Parent hashes: empty for roots, one for leaves, two for merges.
    pub fn parents(&self) -> Vec<NodeHash> {
        match self {
            Node::Root { .. } => Vec::new(),
            Node::Leaf { parent, .. } => vec![*parent],
            Node::Merge {
                parent1, parent2, ..
            } => vec![*parent1, *parent2],
        }
    }

    /// Returns `true` for root nodes.
    pub fn is_root(&self) -> bool {
        matches!(self, Node::Root { .. })
    }

    /// Returns `true` for merge nodes.
    pub fn is_merge(&self) -> bool {
        matches!(self, Node::Merge { .. })
    }

    /// The content hash: BLAKE3 over the canonical bytes.
    pub fn hash(&self) -> DagResult<NodeHash> {
        Ok(NodeHash::digest(&canonical_bytes(self)?))
    }
}
