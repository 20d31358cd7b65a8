use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use keel_schema::{Attribute, Schema, SchemaResult};
use keel_types::ValueType;

use crate::error::{EntityError, EntityResult};

/// The kind of a declared property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropKind {
    /// A required scalar value.
    Scalar(ValueType),
    /// An ordered list of scalar values.
    ScalarList(ValueType),
    /// A required reference to another entity.
    Reference { entity: String },
    /// An optional reference: present or absent.
    OptionalReference { entity: String },
    /// An ordered list of references.
    ReferenceList { entity: String },
}

impl PropKind {
    /// The value type facts of this property carry.
    pub fn value_type(&self) -> ValueType {
        match self {
            PropKind::Scalar(vt) | PropKind::ScalarList(vt) => *vt,
            PropKind::Reference { .. }
            | PropKind::OptionalReference { .. }
            | PropKind::ReferenceList { .. } => ValueType::Ref,
        }
    }

    /// Whether this property holds multiple values.
    pub fn is_many(&self) -> bool {
        matches!(self, PropKind::ScalarList(_) | PropKind::ReferenceList { .. })
    }

    /// The referenced entity type name, for reference kinds.
    pub fn target_entity(&self) -> Option<&str> {
        match self {
            PropKind::Reference { entity }
            | PropKind::OptionalReference { entity }
            | PropKind::ReferenceList { entity } => Some(entity),
            _ => None,
        }
    }
}

/// One declared property of an entity type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prop {
    name: String,
    kind: PropKind,
    unique: bool,
}

impl Prop {
    /// A required scalar property.
    pub fn scalar(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            kind: PropKind::Scalar(value_type),
            unique: false,
        }
    }

    /// An ordered list of scalars.
    pub fn scalar_list(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            kind: PropKind::ScalarList(value_type),
            unique: false,
        }
    }

    /// A required reference to `entity`.
    pub fn reference(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropKind::Reference {
                entity: entity.into(),
            },
            unique: false,
        }
    }

    /// An optional reference to `entity`.
    pub fn optional_reference(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropKind::OptionalReference {
                entity: entity.into(),
            },
            unique: false,
        }
    }

    /// An ordered list of references to `entity`.
    pub fn reference_list(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropKind::ReferenceList {
                entity: entity.into(),
            },
            unique: false,
        }
    }

    /// Constrain this property so a value identifies at most one entity.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The property kind.
    pub fn kind(&self) -> &PropKind {
        &self.kind
    }

    /// Whether this property is unique.
    pub fn is_unique(&self) -> bool {
        self.unique
    }
}

/// A named entity type: an ordered list of properties.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    name: String,
    props: Vec<Prop>,
}

impl EntityType {
    /// Declare an entity type.
    pub fn new(name: impl Into<String>, props: Vec<Prop>) -> Self {
        Self {
            name: name.into(),
            props,
        }
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared properties, in declaration order.
    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    /// Look up a property by name.
    pub fn prop(&self, name: &str) -> Option<&Prop> {
        self.props.iter().find(|p| p.name() == name)
    }

    /// The stable attribute name of a property: `Type.prop`.
    pub fn attr_name(&self, prop: &Prop) -> String {
        format!("{}.{}", self.name, prop.name())
    }
}

/// All entity types known to an application.
///
/// Validated on construction: type names are unique, reference targets
/// resolve, scalar properties are not `Ref`-typed, and unique constraints
/// sit on scalars only (the schema lowering re-checks that last one).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRegistry {
    types: BTreeMap<String, EntityType>,
}

impl EntityRegistry {
    /// Build a registry from entity type declarations.
    pub fn new(types: Vec<EntityType>) -> EntityResult<Self> {
        let mut map = BTreeMap::new();
        for ty in types {
            if map.contains_key(ty.name()) {
                return Err(EntityError::DuplicateEntityType(ty.name().to_string()));
            }
            map.insert(ty.name().to_string(), ty);
        }
        let registry = Self { types: map };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> EntityResult<()> {
        for ty in self.types.values() {
            for prop in ty.props() {
                if let PropKind::Scalar(ValueType::Ref) | PropKind::ScalarList(ValueType::Ref) =
                    prop.kind()
                {
                    return Err(EntityError::InvalidProp {
                        entity: ty.name().to_string(),
                        prop: prop.name().to_string(),
                        reason: "scalar properties cannot be ref-typed; use a reference kind"
                            .to_string(),
                    });
                }
                if let Some(target) = prop.kind().target_entity() {
                    if !self.types.contains_key(target) {
                        return Err(EntityError::InvalidProp {
                            entity: ty.name().to_string(),
                            prop: prop.name().to_string(),
                            reason: format!("references unknown entity type {target}"),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Look up an entity type.
    pub fn get(&self, name: &str) -> Option<&EntityType> {
        self.types.get(name)
    }

    /// Look up an entity type, failing if unknown.
    pub fn require(&self, name: &str) -> EntityResult<&EntityType> {
        self.types
            .get(name)
            .ok_or_else(|| EntityError::UnknownEntityType(name.to_string()))
    }

    /// All registered types, in name order.
    pub fn types(&self) -> impl Iterator<Item = &EntityType> {
        self.types.values()
    }

    /// Lower the registry to a schema: one attribute per property.
    pub fn to_schema(&self) -> SchemaResult<Schema> {
        let mut attrs = Vec::new();
        for ty in self.types.values() {
            for prop in ty.props() {
                let mut attr = Attribute::new(ty.attr_name(prop), prop.kind().value_type())?;
                if prop.is_unique() {
                    attr = attr.unique();
                }
                if prop.kind().is_many() {
                    attr = attr.many();
                }
                attrs.push(attr);
            }
        }
        Schema::new(attrs)
    }
}
