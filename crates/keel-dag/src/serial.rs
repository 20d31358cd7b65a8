//! Canonical node serialization.
//!
//! Layout, all values in the tagged wire encoding of `keel-codec`:
//!
//! ```text
//! bytes(parent1_hash) bytes(parent2_hash)
//! i(iid) b(instance_bits) l(timestamp)
//! i(fact_count) { e(eid) s(attr) <value> B(retracted) }*
//! ```
//!
//! The null (all-zero) hash marks an absent parent: roots write two null
//! hashes, leaves write their single parent in the second slot, merges
//! write both. Facts are sorted by `(eid, attr)` before encoding so equal
//! fact sets yield equal bytes; the sort is stable, so the relative order
//! of a list attribute's values is part of the canonical form and survives
//! the round trip. These bytes are the content-hash input; any change here is a
//! format break.

use keel_codec::{CodecError, Decoder, Encoder};
use keel_types::{Eid, Fact, NodeHash, Source, Value, HASH_WIDTH};

use crate::error::{DagError, DagResult};
use crate::node::Node;

/// Encode a node into its canonical byte form.
pub fn canonical_bytes(node: &Node) -> DagResult<Vec<u8>> {
    let (parent1, parent2) = match node {
        Node::Root { .. } => (NodeHash::NULL, NodeHash::NULL),
        Node::Leaf { parent, .. } => (NodeHash::NULL, *parent),
        Node::Merge {
            parent1, parent2, ..
        } => (*parent1, *parent2),
    };

    let mut facts: Vec<&Fact> = node.facts().iter().collect();
    facts.sort_by(|a, b| (a.eid, &a.attr).cmp(&(b.eid, &b.attr)));

    let source = node.source();
    let mut enc = Encoder::new();
    enc.put_bytes(parent1.as_bytes()).map_err(DagError::Codec)?;
    enc.put_bytes(parent2.as_bytes()).map_err(DagError::Codec)?;
    enc.put_int(source.iid as i32);
    enc.put_byte(source.instance_bits);
    enc.put_long(node.timestamp());

    let count = i32::try_from(facts.len()).map_err(|_| {
        DagError::Codec(CodecError::UnsupportedValue(format!(
            "too many facts in one node: {}",
            facts.len()
        )))
    })?;
    enc.put_int(count);
    for fact in facts {
        enc.put_eid(fact.eid).map_err(DagError::Codec)?;
        enc.put_str(&fact.attr).map_err(DagError::Codec)?;
        enc.put_value(&fact.value).map_err(DagError::Codec)?;
        enc.put_bool(fact.retracted);
    }
    Ok(enc.into_bytes())
}

/// Decode a node from its canonical byte form.
///
/// Classifies the variant by parent null-ness; `parent1` set while
/// `parent2` is null is an illegal combination.
pub fn decode_node(bytes: &[u8]) -> DagResult<Node> {
    let mut dec = Decoder::new(bytes);

    let parent1 = take_hash(&mut dec, "parent1")?;
    let parent2 = take_hash(&mut dec, "parent2")?;
    let iid = take_int(&mut dec, "iid")? as u32;
    let instance_bits = take_byte(&mut dec, "instance_bits")?;
    let timestamp = take_long(&mut dec, "timestamp")?;
    let source = Source::new(iid, instance_bits);

    let count = take_int(&mut dec, "fact_count")?;
    if count < 0 {
        return Err(corrupt(format!("negative fact count: {count}")));
    }
    let mut facts = Vec::with_capacity(count as usize);
    for i in 0..count {
        let eid = take_eid(&mut dec, i)?;
        let attr = take_text(&mut dec, i)?;
        let value = dec.take_value().map_err(DagError::Codec)?;
        let retracted = take_bool(&mut dec, i)?;
        facts.push(Fact {
            eid,
            attr,
            value,
            retracted,
        });
    }

    if !dec.is_exhausted() {
        return Err(corrupt(format!(
            "{} trailing bytes after fact list",
            dec.remaining()
        )));
    }

    match (parent1.is_null(), parent2.is_null()) {
        (true, true) => Ok(Node::root(source, timestamp, facts)),
        (true, false) => Ok(Node::leaf(parent2, source, timestamp, facts)),
        (false, false) => Ok(Node::merge(parent1, parent2, source, timestamp, facts)),
        (false, true) => Err(corrupt(
            "parent1 set while parent2 is null".to_string(),
        )),
    }
}

fn corrupt(reason: String) -> DagError {
    DagError::CorruptedNode { reason }
}

fn take_hash(dec: &mut Decoder<'_>, slot: &str) -> DagResult<NodeHash> {
    match dec.take_value().map_err(DagError::Codec)? {
        Value::Bytes(bytes) => {
            let digest: [u8; HASH_WIDTH] = bytes.as_slice().try_into().map_err(|_| {
                corrupt(format!(
                    "{slot} hash must be {HASH_WIDTH} bytes, got {}",
                    bytes.len()
                ))
            })?;
            Ok(NodeHash::from_digest(digest))
        }
        other => Err(corrupt(format!(
            "{slot} must be a bytes value, got {}",
            other.value_type()
        ))),
    }
}

fn take_int(dec: &mut Decoder<'_>, slot: &str) -> DagResult<i32> {
    match dec.take_value().map_err(DagError::Codec)? {
        Value::Int(v) => Ok(v),
        other => Err(corrupt(format!(
            "{slot} must be an int value, got {}",
            other.value_type()
        ))),
    }
}

fn take_long(dec: &mut Decoder<'_>, slot: &str) -> DagResult<i64> {
    match dec.take_value().map_err(DagError::Codec)? {
        Value::Long(v) => Ok(v),
        other => Err(corrupt(format!(
            "{slot} must be a long value, got {}",
            other.value_type()
        ))),
    }
}

fn take_byte(dec: &mut Decoder<'_>, slot: &str) -> DagResult<u8> {
    match dec.take_value().map_err(DagError::Codec)? {
        Value::Byte(v) => Ok(v),
        other => Err(corrupt(format!(
            "{slot} must be a byte value, got {}",
            other.value_type()
        ))),
    }
}

fn take_eid(dec: &mut Decoder<'_>, i: i32) -> DagResult<Eid> {
    match dec.take_value().map_err(DagError::Codec)? {
        Value::Ref(eid) => Ok(eid),
        other => Err(corrupt(format!(
            "fact {i}: eid must be an eid value, got {}",
            other.value_type()
        ))),
    }
}

fn take_text(dec: &mut Decoder<'_>, i: i32) -> DagResult<String> {
    match dec.take_value().map_err(DagError::Codec)? {
        Value::Text(s) => Ok(s),
        other => Err(corrupt(format!(
            "fact {i}: attr must be a string value, got {}",
            other.value_type()
        ))),
    }
}

fn take_bool(dec: &mut Decoder<'_>, i: i32) -> DagResult<bool> {
    match dec.take_value().map_err(DagError::Codec)? {
        Value::Bool(b) => Ok(b),
        other => Err(corrupt(format!(
            "fact {i}: retracted flag must be a bool value, got {}",
            other.value_type()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src() -> Source {
        Source::new(1, 0)
    }

    fn fact(local: u64, attr: &str, value: Value) -> Fact {
        Fact::assertion(Eid::new(1, local), attr, value)
    }

    fn roundtrip(node: &Node) -> Node {
        let bytes = canonical_bytes(node).unwrap();
        decode_node(&bytes).unwrap()
    }

    // -----------------------------------------------------------------
    // Round trips
    // -----------------------------------------------------------------

    #[test]
    fn root_roundtrip_is_byte_stable() {
        let node = Node::root(src(), 42, vec![fact(1000, "User.age", Value::Int(1))]);
        let bytes = canonical_bytes(&node).unwrap();
        let decoded = decode_node(&bytes).unwrap();
        assert_eq!(decoded, node);
        // Re-serializing the decoded node reproduces the identical bytes.
        assert_eq!(canonical_bytes(&decoded).unwrap(), bytes);
    }

    #[test]
    fn leaf_roundtrip() {
        let parent = NodeHash::digest(b"parent");
        let node = Node::leaf(parent, src(), 7, vec![fact(1000, "User.age", Value::Int(1))]);
        assert_eq!(roundtrip(&node), node);
    }

    #[test]
    fn merge_roundtrip() {
        let p1 = NodeHash::digest(b"one");
        let p2 = NodeHash::digest(b"two");
        let node = Node::merge(p1, p2, src(), 9, vec![]);
        assert_eq!(roundtrip(&node), node);
    }

    #[test]
    fn retraction_roundtrip() {
        let node = Node::root(
            src(),
            1,
            vec![Fact::retraction(
                Eid::new(1, 1000),
                "User.login",
                Value::text("a"),
            )],
        );
        let decoded = roundtrip(&node);
        assert!(decoded.facts()[0].retracted);
    }

    // -----------------------------------------------------------------
    // Canonical ordering
    // -----------------------------------------------------------------

    #[test]
    fn fact_order_is_canonicalized() {
        let a = Node::root(
            src(),
            1,
            vec![
                fact(1001, "User.age", Value::Int(2)),
                fact(1000, "User.age", Value::Int(1)),
            ],
        );
        let b = Node::root(
            src(),
            1,
            vec![
                fact(1000, "User.age", Value::Int(1)),
                fact(1001, "User.age", Value::Int(2)),
            ],
        );
        assert_eq!(canonical_bytes(&a).unwrap(), canonical_bytes(&b).unwrap());
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
    }

    #[test]
    fn list_value_order_is_preserved() {
        let node = Node::root(
            src(),
            1,
            vec![
                fact(1000, "User.strs", Value::text("x")),
                fact(1000, "User.strs", Value::text("y")),
            ],
        );
        let decoded = roundtrip(&node);
        let values: Vec<&Value> = decoded.facts().iter().map(|f| &f.value).collect();
        assert_eq!(values, vec![&Value::text("x"), &Value::text("y")]);
    }

    // -----------------------------------------------------------------
    // Corruption
    // -----------------------------------------------------------------

    #[test]
    fn illegal_parent_combination() {
        // parent1 set, parent2 null: serialize a merge by hand.
        let mut enc = Encoder::new();
        enc.put_bytes(NodeHash::digest(b"set").as_bytes()).unwrap();
        enc.put_bytes(NodeHash::NULL.as_bytes()).unwrap();
        enc.put_int(1);
        enc.put_byte(0);
        enc.put_long(0);
        enc.put_int(0);
        let err = decode_node(&enc.into_bytes()).unwrap_err();
        assert!(matches!(err, DagError::CorruptedNode { .. }));
    }

    #[test]
    fn wrong_hash_width_rejected() {
        let mut enc = Encoder::new();
        enc.put_bytes(&[0u8; 16]).unwrap();
        enc.put_bytes(NodeHash::NULL.as_bytes()).unwrap();
        let err = decode_node(&enc.into_bytes()).unwrap_err();
        assert!(matches!(err, DagError::CorruptedNode { .. }));
    }

    #[test]
    fn truncated_input_rejected() {
        let node = Node::root(src(), 1, vec![fact(1000, "User.age", Value::Int(1))]);
        let bytes = canonical_bytes(&node).unwrap();
        let err = decode_node(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, DagError::Codec(_)));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let node = Node::root(src(), 1, vec![]);
        let mut bytes = canonical_bytes(&node).unwrap();
        bytes.push(0);
        let err = decode_node(&bytes).unwrap_err();
        assert!(matches!(err, DagError::CorruptedNode { .. }));
    }

    #[test]
    fn wrong_header_kind_rejected() {
        // A string where the iid int should be.
        let mut enc = Encoder::new();
        enc.put_bytes(NodeHash::NULL.as_bytes()).unwrap();
        enc.put_bytes(NodeHash::NULL.as_bytes()).unwrap();
        enc.put_str("not an int").unwrap();
        let err = decode_node(&enc.into_bytes()).unwrap_err();
        assert!(matches!(err, DagError::CorruptedNode { .. }));
    }
}
