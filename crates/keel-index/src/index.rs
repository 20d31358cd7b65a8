use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use keel_schema::{Attribute, Schema};
use keel_types::{Eid, Fact, Value};

use crate::error::{IndexError, IndexResult};

/// The materialized view of a fact multiset.
///
/// Facts fold in input order. An assertion on a single-valued attribute
/// displaces the previous value; a retraction removes one exact
/// `(entity, attribute, value)` occurrence. Uniqueness is checked before
/// insertion and fails the whole fold, so the receiver stays valid.
#[derive(Clone, Debug)]
pub struct Index {
    schema: Arc<Schema>,
    /// entity → attribute → live values, in assertion order.
    eav: BTreeMap<Eid, BTreeMap<String, Vec<Value>>>,
    /// attribute → value → entities holding it.
    ave: BTreeMap<String, BTreeMap<Value, BTreeSet<Eid>>>,
    /// referenced entity → attribute → referring entities.
    vae: BTreeMap<Eid, BTreeMap<String, BTreeSet<Eid>>>,
}

impl Index {
    /// Create an empty index over the given schema.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            eav: BTreeMap::new(),
            ave: BTreeMap::new(),
            vae: BTreeMap::new(),
        }
    }

    /// The schema this index validates against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of entities with at least one live fact.
    pub fn len(&self) -> usize {
        self.eav.len()
    }

    /// Returns `true` if no live fact exists.
    pub fn is_empty(&self) -> bool {
        self.eav.is_empty()
    }

    // ---------------------------------------------------------------
    // Folding
    // ---------------------------------------------------------------

    /// Fold facts into a new index, leaving this one untouched.
    pub fn add_facts(&self, facts: &[Fact]) -> IndexResult<Index> {
        let mut next = self.clone();
        for fact in facts {
            next.apply(fact)?;
        }
        Ok(next)
    }

    fn apply(&mut self, fact: &Fact) -> IndexResult<()> {
        self.schema.check_fact(fact)?;
        if fact.retracted {
            self.retract(fact);
            return Ok(());
        }
        let attr = self.schema.require(&fact.attr)?.clone();
        self.assert_fact(fact, &attr)
    }

    fn assert_fact(&mut self, fact: &Fact, attr: &Attribute) -> IndexResult<()> {
        if attr.is_unique() {
            if let Some(holders) = self.ave.get(&fact.attr).and_then(|m| m.get(&fact.value)) {
                if let Some(&existing) = holders.iter().find(|&&e| e != fact.eid) {
                    return Err(IndexError::UniquenessViolation {
                        attr: fact.attr.clone(),
                        value: fact.value.clone(),
                        existing,
                        new: fact.eid,
                    });
                }
            }
        }

        if !attr.is_many() {
            // Single-valued: displace the previous value, if any. An
            // identical re-assertion is a no-op.
            let previous = self
                .eav
                .get(&fact.eid)
                .and_then(|attrs| attrs.get(&fact.attr))
                .and_then(|values| values.first())
                .cloned();
            if let Some(previous) = previous {
                if previous == fact.value {
                    return Ok(());
                }
                self.remove_occurrence(fact.eid, &fact.attr, &previous);
            }
        }

        self.eav
            .entry(fact.eid)
            .or_default()
            .entry(fact.attr.clone())
            .or_default()
            .push(fact.value.clone());
        self.ave
            .entry(fact.attr.clone())
            .or_default()
            .entry(fact.value.clone())
            .or_default()
            .insert(fact.eid);
        if let Some(target) = fact.value.as_ref_eid() {
            self.vae
                .entry(target)
                .or_default()
                .entry(fact.attr.clone())
                .or_default()
                .insert(fact.eid);
        }
        Ok(())
    }

    fn retract(&mut self, fact: &Fact) {
        self.remove_occurrence(fact.eid, &fact.attr, &fact.value);
    }

    /// Remove one `(eid, attr, value)` occurrence from EAV; drop the AVE and
    /// VAE entries once the last occurrence is gone.
    fn remove_occurrence(&mut self, eid: Eid, attr: &str, value: &Value) {
        let Some(attrs) = self.eav.get_mut(&eid) else {
            return;
        };
        let Some(values) = attrs.get_mut(attr) else {
            return;
        };
        let Some(pos) = values.iter().position(|v| v == value) else {
            return;
        };
        values.remove(pos);

        let last_occurrence = !values.contains(value);
        if values.is_empty() {
            attrs.remove(attr);
        }
        if attrs.is_empty() {
            self.eav.remove(&eid);
        }

        if last_occurrence {
            if let Some(by_value) = self.ave.get_mut(attr) {
                if let Some(holders) = by_value.get_mut(value) {
                    holders.remove(&eid);
                    if holders.is_empty() {
                        by_value.remove(value);
                    }
                }
                if by_value.is_empty() {
                    self.ave.remove(attr);
                }
            }
            if let Some(target) = value.as_ref_eid() {
                if let Some(by_attr) = self.vae.get_mut(&target) {
                    if let Some(referrers) = by_attr.get_mut(attr) {
                        referrers.remove(&eid);
                        if referrers.is_empty() {
                            by_attr.remove(attr);
                        }
                    }
                    if by_attr.is_empty() {
                        self.vae.remove(&target);
                    }
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------

    /// Entities holding `value` under `attr`, in entity order.
    pub fn entities_by_attr_value(&self, attr: &str, value: &Value) -> Vec<Eid> {
        self.ave
            .get(attr)
            .and_then(|by_value| by_value.get(value))
            .map(|holders| holders.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The single entity holding `value` under a unique `attr`, if any.
    pub fn entity_by_unique(&self, attr: &str, value: &Value) -> Option<Eid> {
        self.ave
            .get(attr)
            .and_then(|by_value| by_value.get(value))
            .and_then(|holders| holders.iter().next())
            .copied()
    }

    /// Live values of `(eid, attr)` in assertion order; empty if absent.
    pub fn values_of(&self, eid: Eid, attr: &str) -> &[Value] {
        self.eav
            .get(&eid)
            .and_then(|attrs| attrs.get(attr))
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }

    /// The single live value of `(eid, attr)`, if any.
    pub fn value_of(&self, eid: Eid, attr: &str) -> Option<&Value> {
        self.values_of(eid, attr).first()
    }

    /// Returns `true` if the entity has at least one live fact.
    pub fn exists(&self, eid: Eid) -> bool {
        self.eav.contains_key(&eid)
    }

    /// Attributes with live values on `eid`, in name order.
    pub fn attrs_of(&self, eid: Eid) -> Vec<&str> {
        self.eav
            .get(&eid)
            .map(|attrs| attrs.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Entities referring to `target`, as `(attr, referrer)` pairs.
    pub fn incoming_refs(&self, target: Eid) -> Vec<(&str, Eid)> {
        let Some(by_attr) = self.vae.get(&target) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        for (attr, referrers) in by_attr {
            for &referrer in referrers {
                result.push((attr.as_str(), referrer));
            }
        }
        result
    }

    /// All entities with live facts, in order.
    pub fn entities(&self) -> impl Iterator<Item = Eid> + '_ {
        self.eav.keys().copied()
    }
}
