use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use keel_types::{Eid, Value};

/// A dynamic value object: the unit of destructuring and reconstruction.
///
/// An `Obj` names its entity type, optionally carries the entity id it was
/// stored under, and holds field values keyed by property name. Fields the
/// type declares but the object omits are simply absent: destructuring
/// emits nothing for them and reconstruction fills defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obj {
    entity: String,
    id: Option<Eid>,
    fields: BTreeMap<String, FieldValue>,
}

impl Obj {
    /// A new object of the given entity type with no id and no fields.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            id: None,
            fields: BTreeMap::new(),
        }
    }

    /// A new object carrying a known entity id.
    pub fn with_id(entity: impl Into<String>, id: Eid) -> Self {
        Self {
            entity: entity.into(),
            id: Some(id),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field (builder style).
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a scalar field (builder style).
    pub fn scalar(self, name: impl Into<String>, value: Value) -> Self {
        self.field(name, FieldValue::Scalar(value))
    }

    /// The entity type name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The entity id, if known.
    pub fn id(&self) -> Option<Eid> {
        self.id
    }

    /// Attach an entity id.
    pub fn set_id(&mut self, id: Eid) {
        self.id = Some(id);
    }

    /// Look up a field by property name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// The scalar value of a field, if it is a scalar.
    pub fn get_scalar(&self, name: &str) -> Option<&Value> {
        match self.fields.get(name) {
            Some(FieldValue::Scalar(v)) => Some(v),
            _ => None,
        }
    }

    /// Iterate fields in property-name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of set fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}#{}({} fields)", self.entity, id, self.fields.len()),
            None => write!(f, "{}(new, {} fields)", self.entity, self.fields.len()),
        }
    }
}

/// The value of one object field.
///
/// `Optional(None)` (an absent optional reference) is deliberately distinct
/// from `Objects(vec![])` (an empty reference list): the two reconstruct
/// differently and must not be conflated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// A scalar value.
    Scalar(Value),
    /// A required nested object.
    Object(Box<Obj>),
    /// An optional nested object: present or absent.
    Optional(Option<Box<Obj>>),
    /// An ordered list of scalar values.
    Scalars(Vec<Value>),
    /// An ordered list of nested objects.
    Objects(Vec<Obj>),
}

impl FieldValue {
    /// Short name of this shape, for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            FieldValue::Scalar(_) => "scalar",
            FieldValue::Object(_) => "object",
            FieldValue::Optional(_) => "optional object",
            FieldValue::Scalars(_) => "scalar list",
            FieldValue::Objects(_) => "object list",
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<Obj> for FieldValue {
    fn from(obj: Obj) -> Self {
        FieldValue::Object(Box::new(obj))
    }
}

impl From<Option<Obj>> for FieldValue {
    fn from(opt: Option<Obj>) -> Self {
        FieldValue::Optional(opt.map(Box::new))
    }
}

impl From<Vec<Value>> for FieldValue {
    fn from(values: Vec<Value>) -> Self {
        FieldValue::Scalars(values)
    }
}

impl From<Vec<Obj>> for FieldValue {
    fn from(objs: Vec<Obj>) -> Self {
        FieldValue::Objects(objs)
    }
}
