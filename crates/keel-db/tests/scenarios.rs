//! End-to-end scenarios over the full stack: entity mapping, index,
//! node DAG, and storage backends.

use std::sync::Arc;

use keel_dag::{canonical_bytes, decode_node, reachable, DagError, Node};
use keel_db::{Database, DbError};
use keel_entity::{EntityRegistry, EntityType, FieldValue, Obj, Prop, Query};
use keel_index::IndexError;
use keel_store::{FsStore, KvStore, MemoryStore, Namespace, StoreError};
use keel_types::{Eid, Fact, NodeHash, Source, Value, ValueType};

fn registry() -> EntityRegistry {
    EntityRegistry::new(vec![
        EntityType::new(
            "User",
            vec![
                Prop::scalar("login", ValueType::Text).unique(),
                Prop::scalar_list("strs", ValueType::Text),
                Prop::reference("addr", "Addr"),
                Prop::optional_reference("optAddr", "Addr"),
                Prop::reference_list("addrs", "Addr"),
            ],
        ),
        EntityType::new("Addr", vec![Prop::scalar("addr", ValueType::Text)]),
    ])
    .unwrap()
}

fn open_memory() -> Database {
    Database::open(Arc::new(MemoryStore::new()), registry(), Source::new(1, 0)).unwrap()
}

fn sample_user() -> Obj {
    Obj::new("User")
        .scalar("login", Value::text("a"))
        .field("strs", vec![Value::text("x"), Value::text("y")])
        .field("addr", Obj::new("Addr").scalar("addr", Value::text("h")))
        .field("optAddr", Option::<Obj>::None)
        .field("addrs", vec![Obj::new("Addr").scalar("addr", Value::text("l"))])
}

// ---------------------------------------------------------------------
// Destructure / reconstruct round trip
// ---------------------------------------------------------------------

#[test]
fn destructure_then_reconstruct_roundtrip() {
    let db = open_memory();
    let (db, root) = db.save(&sample_user()).unwrap();

    // Empty query: optional stays absent, lists and scalars read back.
    let user = db.pull("User", root, &Query::empty()).unwrap();
    assert_eq!(user.get_scalar("login"), Some(&Value::text("a")));
    assert_eq!(
        user.get("strs"),
        Some(&FieldValue::Scalars(vec![Value::text("x"), Value::text("y")]))
    );
    assert_eq!(user.get("optAddr"), Some(&FieldValue::Optional(None)));

    // The absent optional emitted no fact, so opting in still yields None.
    let user = db.pull("User", root, &Query::empty().resolve("optAddr")).unwrap();
    assert_eq!(user.get("optAddr"), Some(&FieldValue::Optional(None)));

    // The reference list traverses on request.
    let user = db.pull("User", root, &Query::empty().resolve("addrs")).unwrap();
    match user.get("addrs") {
        Some(FieldValue::Objects(addrs)) => {
            assert_eq!(addrs.len(), 1);
            assert_eq!(addrs[0].get_scalar("addr"), Some(&Value::text("l")));
        }
        other => panic!("expected object list, got {other:?}"),
    }
}

#[test]
fn present_optional_is_opt_in_only() {
    let db = open_memory();
    let user = Obj::new("User")
        .scalar("login", Value::text("b"))
        .field(
            "optAddr",
            Some(Obj::new("Addr").scalar("addr", Value::text("home"))),
        );
    let (db, root) = db.save(&user).unwrap();

    // The fact exists, yet the empty query reports absence.
    let pulled = db.pull("User", root, &Query::empty()).unwrap();
    assert_eq!(pulled.get("optAddr"), Some(&FieldValue::Optional(None)));

    // Only the query reveals it.
    let pulled = db.pull("User", root, &Query::empty().resolve("optAddr")).unwrap();
    match pulled.get("optAddr") {
        Some(FieldValue::Optional(Some(addr))) => {
            assert_eq!(addr.get_scalar("addr"), Some(&Value::text("home")));
        }
        other => panic!("expected present optional, got {other:?}"),
    }
}

// ---------------------------------------------------------------------
// Uniqueness
// ---------------------------------------------------------------------

#[test]
fn second_login_is_rejected_and_nothing_changes() {
    let db = open_memory();
    let (db, first) = db
        .save(&Obj::new("User").scalar("login", Value::text("a")))
        .unwrap();
    let head_before = db.head();
    let nodes_before = db.nodes().node_hashes().unwrap().len();

    let err = db
        .save(&Obj::new("User").scalar("login", Value::text("a")))
        .unwrap_err();
    match err {
        DbError::Index(IndexError::UniquenessViolation { existing, .. }) => {
            assert_eq!(existing, first);
        }
        other => panic!("expected uniqueness violation, got {other:?}"),
    }

    // Head unchanged, no node written, index unchanged.
    assert_eq!(db.head(), head_before);
    assert_eq!(db.nodes().node_hashes().unwrap().len(), nodes_before);
    assert_eq!(db.entity("User.login", &Value::text("a")).unwrap(), Some(first));
}

// ---------------------------------------------------------------------
// Retraction
// ---------------------------------------------------------------------

#[test]
fn retraction_frees_the_unique_value() {
    let db = open_memory();
    let (db, e) = db
        .save(&Obj::new("User").scalar("login", Value::text("a")))
        .unwrap();

    let db = db
        .transact(vec![Fact::retraction(e, "User.login", Value::text("a"))])
        .unwrap();
    assert_eq!(db.entity("User.login", &Value::text("a")).unwrap(), None);

    let (db, e2) = db
        .save(&Obj::new("User").scalar("login", Value::text("a")))
        .unwrap();
    assert_ne!(e2, e);
    assert_eq!(db.entity("User.login", &Value::text("a")).unwrap(), Some(e2));
}

// ---------------------------------------------------------------------
// Reopen and replay
// ---------------------------------------------------------------------

#[test]
fn reopen_replays_to_the_same_state() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let db = Database::open(Arc::clone(&store), registry(), Source::new(1, 0)).unwrap();

    let e1 = Eid::new(1, 1000);
    let e2 = Eid::new(1, 1001);
    // Three facts, then two, then one retraction: three chained leaves.
    let db = db
        .transact(vec![
            Fact::assertion(e1, "User.login", Value::text("a")),
            Fact::assertion(e1, "User.strs", Value::text("x")),
            Fact::assertion(e1, "User.strs", Value::text("y")),
        ])
        .unwrap();
    let db = db
        .transact(vec![
            Fact::assertion(e2, "User.login", Value::text("b")),
            Fact::assertion(e2, "User.strs", Value::text("z")),
        ])
        .unwrap();
    let db = db
        .transact(vec![Fact::retraction(e1, "User.strs", Value::text("x"))])
        .unwrap();

    let reopened = Database::open(store, registry(), Source::new(1, 0)).unwrap();
    assert_eq!(reopened.head(), db.head());
    assert_eq!(
        reopened.index().values_of(e1, "User.strs"),
        &[Value::text("y")]
    );
    assert_eq!(
        reopened.entity("User.login", &Value::text("b")).unwrap(),
        Some(e2)
    );
    assert_eq!(
        reopened.index().values_of(e2, "User.strs"),
        db.index().values_of(e2, "User.strs")
    );
}

// ---------------------------------------------------------------------
// Corrupted nodes
// ---------------------------------------------------------------------

#[test]
fn parent1_without_parent2_is_corrupt() {
    // Encode a valid merge, then re-encode with parent2 nulled.
    let p1 = NodeHash::digest(b"p1");
    let node = Node::merge(p1, NodeHash::digest(b"p2"), Source::new(1, 0), 1, vec![]);
    let good = canonical_bytes(&node).unwrap();
    assert!(decode_node(&good).is_ok());

    let bad_node = Node::merge(p1, NodeHash::NULL, Source::new(1, 0), 1, vec![]);
    let bad = canonical_bytes(&bad_node).unwrap();
    let err = decode_node(&bad).unwrap_err();
    assert!(matches!(err, DagError::CorruptedNode { .. }));
}

// ---------------------------------------------------------------------
// Create-once storage
// ---------------------------------------------------------------------

#[test]
fn create_once_memory() {
    let store = MemoryStore::new();
    let key = Namespace::of(["nodes"]).unwrap().key("k").unwrap();
    store.add(&key, b"v1").unwrap();
    let err = store.add(&key, b"v2").unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
    assert_eq!(store.load(&key).unwrap(), Some(b"v1".to_vec()));
}

#[test]
fn create_once_filesystem() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = FsStore::open(dir.path()).unwrap();
    let key = Namespace::of(["nodes"]).unwrap().key("k").unwrap();
    store.add(&key, b"v1").unwrap();
    let err = store.add(&key, b"v2").unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
    assert_eq!(store.load(&key).unwrap(), Some(b"v1".to_vec()));
}

// ---------------------------------------------------------------------
// Append-only and snapshots
// ---------------------------------------------------------------------

#[test]
fn head_history_only_grows() {
    let db = open_memory();
    let before = reachable(db.nodes(), &db.head()).unwrap();

    let (db, _) = db
        .save(&Obj::new("User").scalar("login", Value::text("a")))
        .unwrap();
    let after = reachable(db.nodes(), &db.head()).unwrap();

    assert!(after.is_superset(&before));
    assert_eq!(after.len(), before.len() + 1);
}

#[test]
fn old_snapshots_keep_answering() {
    let db0 = open_memory();
    let (db1, e) = db0
        .save(&Obj::new("User").scalar("login", Value::text("a")))
        .unwrap();
    let db2 = db1
        .transact(vec![Fact::retraction(e, "User.login", Value::text("a"))])
        .unwrap();

    // Each snapshot sees its own state.
    assert_eq!(db0.entity("User.login", &Value::text("a")).unwrap(), None);
    assert_eq!(db1.entity("User.login", &Value::text("a")).unwrap(), Some(e));
    assert_eq!(db2.entity("User.login", &Value::text("a")).unwrap(), None);
}

// ---------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------

#[test]
fn merge_joins_divergent_histories() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

    // Two writers with distinct instance ids open the same storage before
    // either commits, then diverge from the shared genesis.
    let left = Database::open(Arc::clone(&store), registry(), Source::new(1, 0)).unwrap();
    let right = Database::open(Arc::clone(&store), registry(), Source::new(2, 0)).unwrap();

    let (left, le) = left
        .save(&Obj::new("User").scalar("login", Value::text("left")))
        .unwrap();
    let (right, re) = right
        .save(&Obj::new("User").scalar("login", Value::text("right")))
        .unwrap();
    assert_ne!(le, re);

    let merged = left.merge(right.head(), Vec::new()).unwrap();
    assert_eq!(
        merged.entity("User.login", &Value::text("left")).unwrap(),
        Some(le)
    );
    assert_eq!(
        merged.entity("User.login", &Value::text("right")).unwrap(),
        Some(re)
    );

    // Both heads are ancestors of the merge.
    let ancestors = reachable(merged.nodes(), &merged.head()).unwrap();
    assert!(ancestors.contains(&left.head()));
    assert!(ancestors.contains(&right.head()));
}

#[test]
fn merge_of_unknown_head_fails() {
    let db = open_memory();
    let err = db
        .merge(NodeHash::digest(b"nowhere"), Vec::new())
        .unwrap_err();
    assert!(matches!(err, DbError::Dag(DagError::MissingNode(_))));
}

// ---------------------------------------------------------------------
// Filesystem backend end-to-end
// ---------------------------------------------------------------------

#[test]
fn filesystem_roundtrip_across_processes() {
    let dir = tempfile::TempDir::new().unwrap();
    let root_eid;
    {
        let store: Arc<dyn KvStore> = Arc::new(FsStore::open(dir.path()).unwrap());
        let db = Database::open(store, registry(), Source::new(1, 0)).unwrap();
        let (_, eid) = db.save(&sample_user()).unwrap();
        root_eid = eid;
    }

    // A fresh store over the same directory sees the same state.
    let store: Arc<dyn KvStore> = Arc::new(FsStore::open(dir.path()).unwrap());
    let db = Database::open(store, registry(), Source::new(1, 0)).unwrap();
    assert_eq!(
        db.entity("User.login", &Value::text("a")).unwrap(),
        Some(root_eid)
    );

    let user = db
        .pull("User", root_eid, &Query::full(db.registry(), "User"))
        .unwrap();
    match user.get("addr") {
        Some(FieldValue::Object(addr)) => {
            assert_eq!(addr.get_scalar("addr"), Some(&Value::text("h")));
        }
        other => panic!("expected traversed object, got {other:?}"),
    }

    // On-disk layout matches the documented shape.
    assert!(dir.path().join("refs").join("head").is_file());
    assert!(dir.path().join("nodes").is_dir());
    assert!(dir.path().join("schema").join("User.login").is_file());
}
