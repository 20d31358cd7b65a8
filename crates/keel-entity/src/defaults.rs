use std::collections::BTreeMap;

use keel_types::{Value, ValueType, ZonedTime};

use crate::error::{EntityError, EntityResult};
use crate::model::{EntityRegistry, PropKind};
use crate::obj::{FieldValue, Obj};

/// Injected table of default values for absent scalars.
///
/// Starts from the zero of each type (false, 0, empty string/bytes, epoch
/// zero) and can be overridden per type. There is deliberately no
/// process-wide default table: every reconstruction names the registry it
/// uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultRegistry {
    scalars: BTreeMap<ValueType, Value>,
}

impl DefaultRegistry {
    /// The zero-value table.
    pub fn new() -> Self {
        let mut scalars = BTreeMap::new();
        scalars.insert(ValueType::Bool, Value::Bool(false));
        scalars.insert(ValueType::Byte, Value::Byte(0));
        scalars.insert(ValueType::Int, Value::Int(0));
        scalars.insert(ValueType::Long, Value::Long(0));
        scalars.insert(ValueType::Text, Value::text(""));
        scalars.insert(ValueType::Bytes, Value::Bytes(Vec::new()));
        scalars.insert(ValueType::Instant, Value::Instant(0));
        scalars.insert(ValueType::Zoned, Value::Zoned(ZonedTime::epoch_utc()));
        Self { scalars }
    }

    /// Override the default for one scalar type (builder style). The value
    /// must be of that type.
    pub fn with_scalar(mut self, value: Value) -> Self {
        self.scalars.insert(value.value_type(), value);
        self
    }

    /// The default value for a scalar type. Reference types have none.
    pub fn scalar(&self, value_type: ValueType) -> EntityResult<Value> {
        self.scalars
            .get(&value_type)
            .cloned()
            .ok_or(EntityError::NoReferenceDefault)
    }

    /// The default instance of an entity type: scalar defaults, absent
    /// optionals, empty lists, and id-less stubs for required references.
    pub fn default_obj(&self, registry: &EntityRegistry, entity: &str) -> EntityResult<Obj> {
        let ty = registry.require(entity)?;
        let mut obj = Obj::new(entity);
        for prop in ty.props() {
            let field = match prop.kind() {
                PropKind::Scalar(vt) => FieldValue::Scalar(self.scalar(*vt)?),
                PropKind::ScalarList(_) => FieldValue::Scalars(Vec::new()),
                // A default instance has nothing to point at; the stub keeps
                // the declared type without fabricating an entity.
                PropKind::Reference { entity } => {
                    FieldValue::Object(Box::new(Obj::new(entity.clone())))
                }
                PropKind::OptionalReference { .. } => FieldValue::Optional(None),
                PropKind::ReferenceList { .. } => FieldValue::Objects(Vec::new()),
            };
            obj = obj.field(prop.name(), field);
        }
        Ok(obj)
    }
}

impl Default for DefaultRegistry {
    fn default() -> Self {
        Self::new()
    }
}
