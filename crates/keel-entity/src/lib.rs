//! The typed entity mapping layer.
//!
//! Applications describe their data as [`EntityType`]s (named properties
//! with scalar, list, or reference kinds) collected in an
//! [`EntityRegistry`]. Data itself travels as [`Obj`] value objects.
//!
//! [`destructure`] turns an `Obj` tree into facts, allocating entity ids as
//! it goes; [`reconstruct`] reads an entity back out of an index. By
//! default, reconstruction does not traverse references: required
//! references come back as identity stubs, optional references as `None`,
//! and callers opt into traversal per property with a [`Query`].
//! Absent scalars fill in from an injected [`DefaultRegistry`] rather than
//! a hidden global table.

pub mod defaults;
pub mod destructure;
pub mod error;
pub mod model;
pub mod obj;
pub mod query;
pub mod reconstruct;

pub use defaults::DefaultRegistry;
pub use destructure::{destructure, Destructured};
pub use error::{EntityError, EntityResult};
pub use model::{EntityRegistry, EntityType, Prop, PropKind};
pub use obj::{FieldValue, Obj};
pub use query::Query;
pub use reconstruct::reconstruct;
