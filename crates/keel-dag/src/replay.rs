//! History replay: walk parents from a head and fold facts forward.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use keel_store::KvStore;
use keel_types::{Fact, NodeHash};

use crate::error::DagResult;
use crate::store::NodeStore;

/// Accumulate the facts of every node reachable from `head`, in
/// parents-before-children order.
///
/// Each node is visited once even when reachable along several paths (as
/// under a merge diamond), so its facts appear once. Within a node, facts
/// keep their stored order; across nodes, a node's facts always follow all
/// of its ancestors' facts, so retractions land after the assertions they
/// hide.
pub fn replay<S: KvStore>(nodes: &NodeStore<S>, head: &NodeHash) -> DagResult<Vec<Fact>> {
    let order = traversal_order(nodes, head)?;
    let mut facts = Vec::new();
    for hash in &order.sequence {
        let node = &order.loaded[hash];
        facts.extend_from_slice(node.facts());
    }
    debug!(
        head = %head.abbrev(),
        nodes = order.sequence.len(),
        facts = facts.len(),
        "replayed history"
    );
    Ok(facts)
}

/// The closed set of node hashes reachable from `head` (inclusive).
pub fn reachable<S: KvStore>(nodes: &NodeStore<S>, head: &NodeHash) -> DagResult<BTreeSet<NodeHash>> {
    let order = traversal_order(nodes, head)?;
    Ok(order.sequence.into_iter().collect())
}

struct Traversal {
    sequence: Vec<NodeHash>,
    loaded: HashMap<NodeHash, crate::node::Node>,
}

/// Iterative post-order walk: a node enters the sequence only after every
/// ancestor has. Parent slots are explored first-to-second, so the order is
/// deterministic for a given graph.
fn traversal_order<S: KvStore>(nodes: &NodeStore<S>, head: &NodeHash) -> DagResult<Traversal> {
    let mut sequence = Vec::new();
    let mut loaded = HashMap::new();
    let mut visited = BTreeSet::new();
    let mut stack = vec![(*head, false)];

    while let Some((hash, expanded)) = stack.pop() {
        if expanded {
            sequence.push(hash);
            continue;
        }
        if !visited.insert(hash) {
            continue;
        }
        let node = nodes.require(&hash)?;
        stack.push((hash, true));
        for parent in node.parents().iter().rev() {
            if !visited.contains(parent) {
                stack.push((*parent, false));
            }
        }
        loaded.insert(hash, node);
    }

    Ok(Traversal { sequence, loaded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_store::MemoryStore;
    use keel_types::{Eid, Source, Value};

    use crate::node::Node;

    fn src() -> Source {
        Source::new(1, 0)
    }

    fn fact(local: u64, value: i32) -> Fact {
        Fact::assertion(Eid::new(1, local), "User.age", Value::Int(value))
    }

    fn store() -> NodeStore<MemoryStore> {
        NodeStore::new(MemoryStore::new())
    }

    #[test]
    fn single_root() {
        let nodes = store();
        let root = Node::root(src(), 1, vec![fact(1000, 1), fact(1001, 2)]);
        let hash = nodes.put(&root).unwrap();

        let facts = replay(&nodes, &hash).unwrap();
        assert_eq!(facts, root.facts());
    }

    #[test]
    fn linear_chain_in_commit_order() {
        let nodes = store();
        let root = Node::root(src(), 1, vec![fact(1000, 1)]);
        let h0 = nodes.put(&root).unwrap();
        let l1 = Node::leaf(h0, src(), 2, vec![fact(1001, 2)]);
        let h1 = nodes.put(&l1).unwrap();
        let l2 = Node::leaf(h1, src(), 3, vec![fact(1002, 3)]);
        let h2 = nodes.put(&l2).unwrap();

        let facts = replay(&nodes, &h2).unwrap();
        assert_eq!(facts.len(), 3);
        assert_eq!(facts[0], fact(1000, 1));
        assert_eq!(facts[1], fact(1001, 2));
        assert_eq!(facts[2], fact(1002, 3));
    }

    #[test]
    fn diamond_visits_shared_ancestor_once() {
        let nodes = store();
        let root = Node::root(src(), 1, vec![fact(1000, 1)]);
        let h0 = nodes.put(&root).unwrap();
        let left = Node::leaf(h0, src(), 2, vec![fact(1001, 2)]);
        let hl = nodes.put(&left).unwrap();
        let right = Node::leaf(h0, src(), 2, vec![fact(1002, 3)]);
        let hr = nodes.put(&right).unwrap();
        let merge = Node::merge(hl, hr, src(), 3, vec![fact(1003, 4)]);
        let hm = nodes.put(&merge).unwrap();

        let facts = replay(&nodes, &hm).unwrap();
        assert_eq!(facts.len(), 4);
        // Root first, merge last; shared ancestor not duplicated.
        assert_eq!(facts[0], fact(1000, 1));
        assert_eq!(facts[3], fact(1003, 4));
    }

    #[test]
    fn ancestors_precede_descendants() {
        let nodes = store();
        let root = Node::root(src(), 1, vec![]);
        let h0 = nodes.put(&root).unwrap();
        let l1 = Node::leaf(h0, src(), 2, vec![]);
        let h1 = nodes.put(&l1).unwrap();

        let set = reachable(&nodes, &h1).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&h0));
        assert!(set.contains(&h1));
    }

    #[test]
    fn missing_parent_fails() {
        let nodes = store();
        let dangling = NodeHash::digest(b"never stored");
        let leaf = Node::leaf(dangling, src(), 1, vec![]);
        let hash = nodes.put(&leaf).unwrap();

        assert!(matches!(
            replay(&nodes, &hash).unwrap_err(),
            crate::error::DagError::MissingNode(_)
        ));
    }

    #[test]
    fn replay_is_deterministic() {
        let nodes = store();
        let root = Node::root(src(), 1, vec![fact(1000, 1)]);
        let h0 = nodes.put(&root).unwrap();
        let left = Node::leaf(h0, src(), 2, vec![fact(1001, 2)]);
        let hl = nodes.put(&left).unwrap();
        let right = Node::leaf(h0, src(), 2, vec![fact(1002, 3)]);
        let hr = nodes.put(&right).unwrap();
        let merge = Node::merge(hl, hr, src(), 3, vec![]);
        let hm = nodes.put(&merge).unwrap();

        let once = replay(&nodes, &hm).unwrap();
        let twice = replay(&nodes, &hm).unwrap();
        assert_eq!(once, twice);
    }
}
