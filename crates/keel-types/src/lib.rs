//! Foundation types for the Keel fact database.
//!
//! This crate provides the identity, value, and hash types used throughout
//! the Keel workspace. Every other keel crate depends on `keel-types`.
//!
//! # Key Types
//!
//! - [`Eid`] — Entity identifier, an ordered `(iid, local)` pair
//! - [`EidAllocator`] — Monotonic per-instance EID allocator
//! - [`Source`] — Writer identity stamped into every node header
//! - [`Value`] — The closed set of scalar value kinds facts can carry
//! - [`Fact`] — An `(entity, attribute, value, retracted)` tuple
//! - [`NodeHash`] — Content-addressed node identifier (BLAKE3 hash)

pub mod eid;
pub mod error;
pub mod fact;
pub mod hash;
pub mod time;
pub mod value;

pub use eid::{Eid, EidAllocator, Source, FIRST_USER_LOCAL, SCHEMA_IID};
pub use error::TypeError;
pub use fact::Fact;
pub use hash::{NodeHash, HASH_WIDTH};
pub use time::now_millis;
pub use value::{Value, ValueType, ZonedTime};
