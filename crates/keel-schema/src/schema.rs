use std::collections::BTreeMap;

use keel_types::{Eid, Fact, Value, ValueType, FIRST_USER_LOCAL, SCHEMA_IID};

use crate::attribute::Attribute;
use crate::error::{SchemaError, SchemaResult};

/// Meta-attribute carrying an attribute's name.
pub const META_NAME: &str = "schema.name";
/// Meta-attribute carrying an attribute's value type name.
pub const META_TYPE: &str = "schema.type";
/// Meta-attribute carrying an attribute's uniqueness flag.
pub const META_UNIQUE: &str = "schema.unique";
/// Meta-attribute carrying an attribute's list-valued flag.
pub const META_MANY: &str = "schema.many";

/// A validated set of attribute definitions.
///
/// Every schema implicitly declares the four `schema.*` meta-attributes so
/// its own persisted form can be folded into an index like any other facts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    attrs: BTreeMap<String, Attribute>,
}

impl Schema {
    /// Build a schema from attribute definitions.
    ///
    /// Duplicate identical definitions collapse; duplicate names with
    /// differing definitions and unique list attributes are rejected.
    pub fn new(attrs: Vec<Attribute>) -> SchemaResult<Self> {
        let mut map = BTreeMap::new();
        for attr in Self::meta_attributes()?.into_iter().chain(attrs) {
            if attr.is_unique() && attr.is_many() {
                return Err(SchemaError::UniqueListAttribute {
                    name: attr.name().to_string(),
                });
            }
            match map.get(attr.name()) {
                None => {
                    map.insert(attr.name().to_string(), attr);
                }
                Some(existing) if *existing == attr => {}
                Some(_) => {
                    return Err(SchemaError::ConflictingDefinition {
                        name: attr.name().to_string(),
                    });
                }
            }
        }
        Ok(Self { attrs: map })
    }

    /// A schema declaring only the meta-attributes.
    pub fn empty() -> Self {
        Self::new(Vec::new()).expect("meta attributes are valid")
    }

    fn meta_attributes() -> SchemaResult<Vec<Attribute>> {
        Ok(vec![
            Attribute::new(META_NAME, ValueType::Text)?.unique(),
            Attribute::new(META_TYPE, ValueType::Text)?,
            Attribute::new(META_UNIQUE, ValueType::Bool)?,
            Attribute::new(META_MANY, ValueType::Bool)?,
        ])
    }

    /// Returns `true` if `name` is one of the `schema.*` meta-attributes.
    pub fn is_meta(name: &str) -> bool {
        matches!(name, META_NAME | META_TYPE | META_UNIQUE | META_MANY)
    }

    /// Look up an attribute definition.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attrs.get(name)
    }

    /// Look up an attribute definition, failing if undeclared.
    pub fn require(&self, name: &str) -> SchemaResult<&Attribute> {
        self.attrs
            .get(name)
            .ok_or_else(|| SchemaError::UndeclaredAttribute(name.to_string()))
    }

    /// Look up a unique attribute, failing if undeclared or not unique.
    pub fn require_unique(&self, name: &str) -> SchemaResult<&Attribute> {
        let attr = self.require(name)?;
        if !attr.is_unique() {
            return Err(SchemaError::NotUnique(name.to_string()));
        }
        Ok(attr)
    }

    /// Check that a value matches an attribute's declared type.
    pub fn check_value(&self, name: &str, value: &Value) -> SchemaResult<()> {
        let attr = self.require(name)?;
        let actual = value.value_type();
        if actual != attr.value_type() {
            return Err(SchemaError::TypeMismatch {
                attr: name.to_string(),
                expected: attr.value_type(),
                actual,
            });
        }
        Ok(())
    }

    /// Check a whole fact: the attribute must be declared and the value must
    /// match its type. Retractions are checked the same way.
    pub fn check_fact(&self, fact: &Fact) -> SchemaResult<()> {
        self.check_value(&fact.attr, &fact.value)
    }

    /// Iterate all declared attributes, meta included, in name order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.values()
    }

    /// Iterate application attributes (meta excluded), in name order.
    pub fn user_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.values().filter(|a| !Self::is_meta(a.name()))
    }

    /// Number of declared attributes, meta included.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Returns `true` if only the meta-attributes are declared.
    pub fn is_empty(&self) -> bool {
        self.user_attributes().next().is_none()
    }

    // ---------------------------------------------------------------
    // Persistence as facts
    // ---------------------------------------------------------------

    /// Lay the application attributes out as facts under reserved entity
    /// ids `(0, k)`, one entity per attribute, in name order.
    pub fn to_facts(&self) -> SchemaResult<Vec<Fact>> {
        let max = FIRST_USER_LOCAL as usize;
        let count = self.user_attributes().count();
        if count > max {
            return Err(SchemaError::ReservedEidsExhausted { count, max });
        }

        let mut facts = Vec::with_capacity(count * 4);
        for (k, attr) in self.user_attributes().enumerate() {
            let eid = Eid::new(SCHEMA_IID, k as u64);
            facts.push(Fact::assertion(eid, META_NAME, Value::text(attr.name())));
            facts.push(Fact::assertion(
                eid,
                META_TYPE,
                Value::text(attr.value_type().name()),
            ));
            facts.push(Fact::assertion(eid, META_UNIQUE, Value::Bool(attr.is_unique())));
            facts.push(Fact::assertion(eid, META_MANY, Value::Bool(attr.is_many())));
        }
        Ok(facts)
    }

    /// Reconstruct a schema from persisted facts.
    ///
    /// Only reserved-eid assertions on the meta-attributes are considered;
    /// anything else in the slice is ignored, so callers can pass a whole
    /// replayed history.
    pub fn from_facts(facts: &[Fact]) -> SchemaResult<Self> {
        #[derive(Default)]
        struct Partial {
            name: Option<String>,
            value_type: Option<ValueType>,
            unique: bool,
            many: bool,
        }

        let mut partials: BTreeMap<Eid, Partial> = BTreeMap::new();
        for fact in facts {
            if !fact.eid.is_reserved() || fact.retracted {
                continue;
            }
            let partial = partials.entry(fact.eid).or_default();
            match (fact.attr.as_str(), &fact.value) {
                (META_NAME, Value::Text(name)) => partial.name = Some(name.clone()),
                (META_TYPE, Value::Text(type_name)) => {
                    let vt = ValueType::from_name(type_name).ok_or_else(|| {
                        SchemaError::MalformedSchemaFacts(format!(
                            "unknown value type name: {type_name}"
                        ))
                    })?;
                    partial.value_type = Some(vt);
                }
                (META_UNIQUE, Value::Bool(flag)) => partial.unique = *flag,
                (META_MANY, Value::Bool(flag)) => partial.many = *flag,
                _ => {}
            }
        }

        let mut attrs = Vec::with_capacity(partials.len());
        for (eid, partial) in partials {
            let (Some(name), Some(value_type)) = (partial.name, partial.value_type) else {
                return Err(SchemaError::MalformedSchemaFacts(format!(
                    "incomplete attribute definition at {eid}"
                )));
            };
            let mut attr = Attribute::new(name, value_type)?;
            if partial.unique {
                attr = attr.unique();
            }
            if partial.many {
                attr = attr.many();
            }
            attrs.push(attr);
        }
        Self::new(attrs)
    }

    /// Union this schema with another, failing on conflicting definitions.
    ///
    /// Used on open: the stored schema must agree with the declared one, but
    /// either side may carry attributes the other does not know yet.
    pub fn merge(&self, other: &Schema) -> SchemaResult<Schema> {
        let mut attrs: Vec<Attribute> = self.user_attributes().cloned().collect();
        attrs.extend(other.user_attributes().cloned());
        Self::new(attrs)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::empty()
    }
}
