//! Value object → fact translation.

use keel_types::{Eid, EidAllocator, Fact, Value};

use crate::error::{EntityError, EntityResult};
use crate::model::{EntityRegistry, EntityType, Prop, PropKind};
use crate::obj::{FieldValue, Obj};

/// The result of destructuring one object tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destructured {
    /// The entity id assigned to the root object.
    pub root: Eid,
    /// All emitted facts, depth-first, parents before their children's
    /// reference facts.
    pub facts: Vec<Fact>,
}

/// Destructure a value object into facts.
///
/// The root (and every nested object) reuses its `id` when set, otherwise
/// the allocator assigns the next entity id. Scalars emit one assertion,
/// lists one per element in order, nested objects recurse and emit a `Ref`
/// fact. A *present* optional emits exactly like a required reference; an
/// absent optional emits nothing, so absence is encoded by omission.
///
/// Fields the type does not declare, shape mismatches, and scalar type
/// mismatches all fail; the allocator may have advanced by then, which is
/// harmless (ids never recycle anyway).
pub fn destructure(
    registry: &EntityRegistry,
    obj: &Obj,
    alloc: &mut EidAllocator,
) -> EntityResult<Destructured> {
    let mut facts = Vec::new();
    let root = destructure_into(registry, obj, alloc, &mut facts)?;
    Ok(Destructured { root, facts })
}

fn destructure_into(
    registry: &EntityRegistry,
    obj: &Obj,
    alloc: &mut EidAllocator,
    facts: &mut Vec<Fact>,
) -> EntityResult<Eid> {
    let ty = registry.require(obj.entity())?;

    // Reject fields the type does not declare before emitting anything.
    for (field, _) in obj.fields() {
        if ty.prop(field).is_none() {
            return Err(EntityError::UndeclaredField {
                entity: ty.name().to_string(),
                field: field.to_string(),
            });
        }
    }

    let eid = match obj.id() {
        Some(eid) => eid,
        None => alloc.allocate()?,
    };

    for prop in ty.props() {
        let Some(field) = obj.get(prop.name()) else {
            continue;
        };
        let attr = ty.attr_name(prop);
        match (prop.kind(), field) {
            (PropKind::Scalar(vt), FieldValue::Scalar(value)) => {
                check_scalar(ty, prop, *vt, value)?;
                facts.push(Fact::assertion(eid, attr, value.clone()));
            }
            (PropKind::ScalarList(vt), FieldValue::Scalars(values)) => {
                for value in values {
                    check_scalar(ty, prop, *vt, value)?;
                    facts.push(Fact::assertion(eid, attr.clone(), value.clone()));
                }
            }
            (PropKind::Reference { entity }, FieldValue::Object(child)) => {
                let child_eid = destructure_child(registry, ty, prop, entity, child, alloc, facts)?;
                facts.push(Fact::assertion(eid, attr, Value::Ref(child_eid)));
            }
            (PropKind::OptionalReference { entity }, FieldValue::Optional(Some(child))) => {
                let child_eid = destructure_child(registry, ty, prop, entity, child, alloc, facts)?;
                facts.push(Fact::assertion(eid, attr, Value::Ref(child_eid)));
            }
            (PropKind::OptionalReference { .. }, FieldValue::Optional(None)) => {}
            (PropKind::ReferenceList { entity }, FieldValue::Objects(children)) => {
                for child in children {
                    let child_eid =
                        destructure_child(registry, ty, prop, entity, child, alloc, facts)?;
                    facts.push(Fact::assertion(eid, attr.clone(), Value::Ref(child_eid)));
                }
            }
            (kind, _) => {
                return Err(EntityError::FieldShapeMismatch {
                    entity: ty.name().to_string(),
                    field: prop.name().to_string(),
                    expected: expected_shape(kind),
                });
            }
        }
    }

    Ok(eid)
}

fn destructure_child(
    registry: &EntityRegistry,
    ty: &EntityType,
    prop: &Prop,
    expected_entity: &str,
    child: &Obj,
    alloc: &mut EidAllocator,
    facts: &mut Vec<Fact>,
) -> EntityResult<Eid> {
    if child.entity() != expected_entity {
        return Err(EntityError::ReferenceTypeMismatch {
            entity: ty.name().to_string(),
            field: prop.name().to_string(),
            expected: expected_entity.to_string(),
            actual: child.entity().to_string(),
        });
    }
    destructure_into(registry, child, alloc, facts)
}

fn check_scalar(
    ty: &EntityType,
    prop: &Prop,
    expected: keel_types::ValueType,
    value: &Value,
) -> EntityResult<()> {
    let actual = value.value_type();
    if actual != expected {
        return Err(EntityError::FieldTypeMismatch {
            entity: ty.name().to_string(),
            field: prop.name().to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn expected_shape(kind: &PropKind) -> &'static str {
    match kind {
        PropKind::Scalar(_) => "scalar",
        PropKind::ScalarList(_) => "scalar list",
        PropKind::Reference { .. } => "object",
        PropKind::OptionalReference { .. } => "optional object",
        PropKind::ReferenceList { .. } => "object list",
    }
}
