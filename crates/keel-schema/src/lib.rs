//! Attribute definitions and the schema registry.
//!
//! A schema is a set of [`Attribute`]s. Each attribute has a stable name in
//! `Type.prop` form, a value type, and two flags: `unique` (at most one
//! entity may hold a given value) and `many` (multiple live values per
//! entity are allowed).
//!
//! Schemas are themselves persisted as facts under reserved entity ids
//! (`iid == 0`, `local < 1000`), so every database carries its own schema
//! versioned with the data. [`Schema::to_facts`] / [`Schema::from_facts`]
//! implement that round trip; [`Schema::merge`] reconciles a stored schema
//! with the one an application declares on open.

pub mod attribute;
pub mod error;
pub mod schema;

pub use attribute::Attribute;
pub use error::{SchemaError, SchemaResult};
pub use schema::{Schema, META_MANY, META_NAME, META_TYPE, META_UNIQUE};
