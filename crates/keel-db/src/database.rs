use std::sync::Arc;

use tracing::debug;

use keel_dag::{replay, Node, NodeStore};
use keel_entity::{
    destructure, reconstruct, DefaultRegistry, EntityRegistry, Obj, Query,
};
use keel_index::Index;
use keel_schema::Schema;
use keel_store::{KvStore, Namespace};
use keel_types::{now_millis, Eid, EidAllocator, Fact, NodeHash, Source, Value};

use crate::error::{DbError, DbResult};

/// An immutable view of the fact database at one head.
///
/// Mutating operations commit a new node and return a new `Database`; the
/// receiver keeps answering queries against its own snapshot. The write
/// path is validate-fold-first: a transaction that violates the schema or a
/// uniqueness constraint fails before anything touches storage, so the head
/// only ever advances to a fully valid state.
#[derive(Clone)]
pub struct Database {
    nodes: NodeStore<Arc<dyn KvStore>>,
    registry: Arc<EntityRegistry>,
    schema: Arc<Schema>,
    defaults: Arc<DefaultRegistry>,
    source: Source,
    head: NodeHash,
    index: Index,
    alloc: EidAllocator,
}

impl Database {
    /// Open a database over `store`, with zero-value scalar defaults.
    ///
    /// On empty storage this commits a genesis root carrying the declared
    /// schema's facts. On existing storage it replays the head's history,
    /// merges the stored schema with the declared one (conflicting
    /// definitions fail), and resumes the entity id sequence for this
    /// writer.
    pub fn open(
        store: Arc<dyn KvStore>,
        registry: EntityRegistry,
        source: Source,
    ) -> DbResult<Self> {
        Self::open_with(store, registry, source, DefaultRegistry::new())
    }

    /// Open with an explicit default registry for reconstruction.
    pub fn open_with(
        store: Arc<dyn KvStore>,
        registry: EntityRegistry,
        source: Source,
        defaults: DefaultRegistry,
    ) -> DbResult<Self> {
        let nodes = NodeStore::new(store);
        let declared = registry.to_schema()?;

        let (schema, head, index, alloc) = match nodes.head()? {
            Some(head) => {
                let facts = replay(&nodes, &head)?;
                let stored = Schema::from_facts(&facts)?;
                let schema = Arc::new(declared.merge(&stored)?);
                let index = Index::new(Arc::clone(&schema)).add_facts(&facts)?;
                let mut alloc = EidAllocator::new(source.iid);
                resume_allocator(&mut alloc, &facts);
                debug!(head = %head.abbrev(), facts = facts.len(), "opened database");
                (schema, head, index, alloc)
            }
            None => {
                let schema = Arc::new(declared);
                let genesis_facts = schema.to_facts()?;
                let index = Index::new(Arc::clone(&schema)).add_facts(&genesis_facts)?;
                let genesis = Node::root(source, now_millis(), genesis_facts);
                let head = nodes.put(&genesis)?;
                nodes.set_head(&head)?;
                debug!(head = %head.abbrev(), "initialized database");
                (schema, head, index, EidAllocator::new(source.iid))
            }
        };

        let db = Self {
            nodes,
            registry: Arc::new(registry),
            schema,
            defaults: Arc::new(defaults),
            source,
            head,
            index,
            alloc,
        };
        db.write_schema_mirror()?;
        Ok(db)
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    /// Commit a batch of facts atomically.
    ///
    /// The facts fold into a new index first; schema violations and
    /// uniqueness conflicts abort before any byte is written. On success a
    /// leaf node on the current head is stored and the head advances.
    pub fn transact(&self, facts: Vec<Fact>) -> DbResult<Database> {
        let index = self.index.add_facts(&facts)?;

        let node = Node::leaf(self.head, self.source, now_millis(), facts);
        let head = self.nodes.put(&node)?;
        self.nodes.set_head(&head)?;
        debug!(head = %head.abbrev(), facts = node.facts().len(), "committed transaction");

        let mut alloc = self.alloc.clone();
        resume_allocator(&mut alloc, node.facts());

        Ok(Self {
            nodes: self.nodes.clone(),
            registry: Arc::clone(&self.registry),
            schema: Arc::clone(&self.schema),
            defaults: Arc::clone(&self.defaults),
            source: self.source,
            head,
            index,
            alloc,
        })
    }

    /// Destructure a value object and commit its facts in one transaction.
    ///
    /// Returns the new database and the root object's entity id.
    pub fn save(&self, obj: &Obj) -> DbResult<(Database, Eid)> {
        let mut alloc = self.alloc.clone();
        let destructured = destructure(&self.registry, obj, &mut alloc)?;
        let mut db = self.transact(destructured.facts)?;
        db.alloc = alloc;
        Ok((db, destructured.root))
    }

    /// Join a divergent history into this one.
    ///
    /// `other_head` must already be stored (e.g. shipped over by a
    /// replication layer); `facts` is the reconciling batch, committed with
    /// the merge node. The index is rebuilt by replay from the merge, and
    /// the head advances only if the combined history folds cleanly.
    pub fn merge(&self, other_head: NodeHash, facts: Vec<Fact>) -> DbResult<Database> {
        if !self.nodes.contains(&other_head)? {
            return Err(keel_dag::DagError::MissingNode(other_head).into());
        }

        let node = Node::merge(self.head, other_head, self.source, now_millis(), facts);
        let head = self.nodes.put(&node)?;

        let replayed = replay(&self.nodes, &head)?;
        let stored = Schema::from_facts(&replayed)?;
        let schema = Arc::new(self.schema.merge(&stored)?);
        let index = Index::new(Arc::clone(&schema)).add_facts(&replayed)?;

        // Only now is the merge externally visible.
        self.nodes.set_head(&head)?;
        debug!(head = %head.abbrev(), nodes = 2, "merged histories");

        let mut alloc = self.alloc.clone();
        resume_allocator(&mut alloc, &replayed);

        Ok(Self {
            nodes: self.nodes.clone(),
            registry: Arc::clone(&self.registry),
            schema,
            defaults: Arc::clone(&self.defaults),
            source: self.source,
            head,
            index,
            alloc,
        })
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Reconstruct an entity, steering reference traversal with `query`.
    pub fn pull(&self, entity: &str, eid: Eid, query: &Query) -> DbResult<Obj> {
        Ok(reconstruct(
            &self.registry,
            entity,
            eid,
            &self.index,
            query,
            &self.defaults,
        )?)
    }

    /// Look up the entity holding `value` under a unique attribute.
    ///
    /// Fails if the attribute is not declared unique.
    pub fn entity(&self, attr: &str, value: &Value) -> DbResult<Option<Eid>> {
        self.schema.require_unique(attr)?;
        Ok(self.index.entity_by_unique(attr, value))
    }

    /// The current head hash.
    pub fn head(&self) -> NodeHash {
        self.head
    }

    /// The materialized index at this head.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// The merged schema in force.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The entity registry this database was opened with.
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// The writer identity of this instance.
    pub fn source(&self) -> Source {
        self.source
    }

    /// Node persistence, for replication layers and tooling.
    pub fn nodes(&self) -> &NodeStore<Arc<dyn KvStore>> {
        &self.nodes
    }

    // ---------------------------------------------------------------
    // Schema mirror
    // ---------------------------------------------------------------

    /// Write the denormalized `schema/<attr-name>` JSON mirror.
    fn write_schema_mirror(&self) -> DbResult<()> {
        let store = self.nodes.inner();
        let ns = Namespace::root().child("schema")?;
        for attr in self.schema.user_attributes() {
            let key = ns.key(attr.name())?;
            let payload = serde_json::to_vec_pretty(attr)
                .map_err(|e| DbError::SchemaMirror(e.to_string()))?;
            if store.has_key(&key)? {
                store.overwrite(&key, &payload)?;
            } else {
                store.add(&key, &payload)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("head", &self.head)
            .field("source", &self.source)
            .field("entities", &self.index.len())
            .finish()
    }
}

fn resume_allocator(alloc: &mut EidAllocator, facts: &[Fact]) {
    for fact in facts {
        alloc.resume_after(&fact.eid);
        if let Some(target) = fact.value.as_ref_eid() {
            alloc.resume_after(&target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_entity::{EntityType, FieldValue, Prop};
    use keel_store::MemoryStore;
    use keel_types::ValueType;

    fn registry() -> EntityRegistry {
        EntityRegistry::new(vec![
            EntityType::new(
                "User",
                vec![
                    Prop::scalar("login", ValueType::Text).unique(),
                    Prop::scalar_list("strs", ValueType::Text),
                    Prop::optional_reference("optAddr", "Addr"),
                ],
            ),
            EntityType::new("Addr", vec![Prop::scalar("addr", ValueType::Text)]),
        ])
        .unwrap()
    }

    fn open_db() -> Database {
        Database::open(Arc::new(MemoryStore::new()), registry(), Source::new(1, 0)).unwrap()
    }

    #[test]
    fn open_commits_genesis() {
        let db = open_db();
        // The schema is queryable through the index right away.
        assert!(db
            .index()
            .entity_by_unique("schema.name", &Value::text("User.login"))
            .is_some());
    }

    #[test]
    fn save_and_pull() {
        let db = open_db();
        let user = Obj::new("User")
            .scalar("login", Value::text("a"))
            .field("strs", vec![Value::text("x")]);
        let (db, eid) = db.save(&user).unwrap();

        let pulled = db.pull("User", eid, &Query::empty()).unwrap();
        assert_eq!(pulled.get_scalar("login"), Some(&Value::text("a")));
        assert_eq!(
            pulled.get("strs"),
            Some(&FieldValue::Scalars(vec![Value::text("x")]))
        );
    }

    #[test]
    fn transact_returns_new_value() {
        let db = open_db();
        let before = db.head();
        let eid = Eid::new(1, 1000);
        let db2 = db
            .transact(vec![Fact::assertion(eid, "User.login", Value::text("a"))])
            .unwrap();

        assert_ne!(db2.head(), before);
        // The old value still answers from its snapshot.
        assert!(!db.index().exists(eid));
        assert!(db2.index().exists(eid));
    }

    #[test]
    fn entity_requires_unique_attr() {
        let db = open_db();
        assert!(matches!(
            db.entity("User.strs", &Value::text("x")),
            Err(DbError::Schema(_))
        ));
    }

    #[test]
    fn eids_continue_across_reopen() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let db = Database::open(Arc::clone(&store), registry(), Source::new(1, 0)).unwrap();
        let (_, first) = db
            .save(&Obj::new("User").scalar("login", Value::text("a")))
            .unwrap();

        let db = Database::open(Arc::clone(&store), registry(), Source::new(1, 0)).unwrap();
        let (_, second) = db
            .save(&Obj::new("User").scalar("login", Value::text("b")))
            .unwrap();

        assert!(second > first);
    }

    #[test]
    fn schema_mirror_written() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let _db = Database::open(Arc::clone(&store), registry(), Source::new(1, 0)).unwrap();

        let ns = Namespace::root().child("schema").unwrap();
        let names = store.keys(&ns).unwrap();
        assert!(names.contains(&"User.login".to_string()));
        assert!(names.contains(&"Addr.addr".to_string()));

        let payload = store.load(&ns.key("User.login").unwrap()).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(json["name"], "User.login");
    }

    #[test]
    fn conflicting_declared_schema_fails_reopen() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let _db = Database::open(Arc::clone(&store), registry(), Source::new(1, 0)).unwrap();

        // Same attribute name, different type.
        let conflicting = EntityRegistry::new(vec![
            EntityType::new("User", vec![Prop::scalar("login", ValueType::Int).unique()]),
            EntityType::new("Addr", vec![Prop::scalar("addr", ValueType::Text)]),
        ])
        .unwrap();
        let err = Database::open(store, conflicting, Source::new(1, 0)).unwrap_err();
        assert!(matches!(err, DbError::Schema(_)));
    }
}
