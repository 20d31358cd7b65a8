use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::EntityRegistry;

/// Steers which references a reconstruction traverses.
///
/// A query maps property names to either `None` (resolve that reference
/// one level, with default policy below it) or a nested sub-query that
/// steers the next level too. Properties not named in the query keep the
/// default policy: required references come back as identity stubs,
/// optional references as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    refs: BTreeMap<String, Option<Query>>,
}

impl Query {
    /// The empty query: traverse nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve `prop` one level with default policy below it (builder
    /// style). This is the `null` sub-query.
    pub fn resolve(mut self, prop: impl Into<String>) -> Self {
        self.refs.insert(prop.into(), None);
        self
    }

    /// Resolve `prop` and steer the next level with `sub` (builder style).
    pub fn resolve_with(mut self, prop: impl Into<String>, sub: Query) -> Self {
        self.refs.insert(prop.into(), Some(sub));
        self
    }

    /// Whether the query opts into traversing `prop`.
    pub fn traverses(&self, prop: &str) -> bool {
        self.refs.contains_key(prop)
    }

    /// The query to use below `prop`, if the query traverses it. A `null`
    /// sub-query resolves to the empty query (default policy).
    pub fn below(&self, prop: &str) -> Option<Query> {
        self.refs
            .get(prop)
            .map(|sub| sub.clone().unwrap_or_default())
    }

    /// Returns `true` if the query traverses nothing.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// The query that traverses every reference of `entity`, closed over
    /// the type graph.
    ///
    /// Recursive types are cut at the first repeat of an entity name along
    /// a path, so the query is finite; destructured data is acyclic anyway
    /// (ids are allocated on the way down), which makes the closure enough
    /// for full round trips.
    pub fn full(registry: &EntityRegistry, entity: &str) -> Query {
        let mut on_path = BTreeSet::new();
        Self::full_inner(registry, entity, &mut on_path)
    }

    fn full_inner(
        registry: &EntityRegistry,
        entity: &str,
        on_path: &mut BTreeSet<String>,
    ) -> Query {
        let mut query = Query::empty();
        let Some(ty) = registry.get(entity) else {
            return query;
        };
        if !on_path.insert(entity.to_string()) {
            return query;
        }
        for prop in ty.props() {
            if let Some(target) = prop.kind().target_entity() {
                let sub = Self::full_inner(registry, target, on_path);
                query = query.resolve_with(prop.name(), sub);
            }
        }
        on_path.remove(entity);
        query
    }
}
