//! Fact → value object translation.

use keel_index::Index;
use keel_types::{Eid, Value};

use crate::defaults::DefaultRegistry;
use crate::error::{EntityError, EntityResult};
use crate::model::{EntityRegistry, EntityType, Prop, PropKind};
use crate::obj::{FieldValue, Obj};
use crate::query::Query;

/// Reconstruct an entity from the index.
///
/// Per declared property:
/// - an absent scalar fills in from the default registry;
/// - lists come back in stored order, empty when absent;
/// - a required reference comes back as an identity stub (entity id, no
///   fields) unless the query traverses it; if no fact exists at all, the
///   target type's default instance is used;
/// - an optional reference comes back absent unless the query traverses
///   it, even when the fact exists. Destructuring writes facts for present
///   optionals, but reading them back is strictly opt-in.
pub fn reconstruct(
    registry: &EntityRegistry,
    entity: &str,
    eid: Eid,
    index: &Index,
    query: &Query,
    defaults: &DefaultRegistry,
) -> EntityResult<Obj> {
    let ty = registry.require(entity)?;
    let mut obj = Obj::with_id(entity, eid);

    for prop in ty.props() {
        let attr = ty.attr_name(prop);
        let field = match prop.kind() {
            PropKind::Scalar(vt) => match index.value_of(eid, &attr) {
                Some(value) => FieldValue::Scalar(value.clone()),
                None => FieldValue::Scalar(defaults.scalar(*vt)?),
            },
            PropKind::ScalarList(_) => {
                FieldValue::Scalars(index.values_of(eid, &attr).to_vec())
            }
            PropKind::Reference { entity: target } => match index.value_of(eid, &attr) {
                Some(value) => {
                    let child = ref_target(ty, prop, value)?;
                    match query.below(prop.name()) {
                        Some(sub) => FieldValue::Object(Box::new(reconstruct(
                            registry, target, child, index, &sub, defaults,
                        )?)),
                        None => FieldValue::Object(Box::new(Obj::with_id(target.clone(), child))),
                    }
                }
                None => FieldValue::Object(Box::new(defaults.default_obj(registry, target)?)),
            },
            PropKind::OptionalReference { entity: target } => {
                match (index.value_of(eid, &attr), query.below(prop.name())) {
                    (Some(value), Some(sub)) => {
                        let child = ref_target(ty, prop, value)?;
                        FieldValue::Optional(Some(Box::new(reconstruct(
                            registry, target, child, index, &sub, defaults,
                        )?)))
                    }
                    // Present but not opted into, or absent entirely.
                    _ => FieldValue::Optional(None),
                }
            }
            PropKind::ReferenceList { entity: target } => {
                let mut children = Vec::new();
                for value in index.values_of(eid, &attr) {
                    let child = ref_target(ty, prop, value)?;
                    let child_obj = match query.below(prop.name()) {
                        Some(sub) => {
                            reconstruct(registry, target, child, index, &sub, defaults)?
                        }
                        None => Obj::with_id(target.clone(), child),
                    };
                    children.push(child_obj);
                }
                FieldValue::Objects(children)
            }
        };
        obj = obj.field(prop.name(), field);
    }

    Ok(obj)
}

fn ref_target(ty: &EntityType, prop: &Prop, value: &Value) -> EntityResult<Eid> {
    value.as_ref_eid().ok_or_else(|| EntityError::NotAReference {
        entity: ty.name().to_string(),
        field: prop.name().to_string(),
    })
}
