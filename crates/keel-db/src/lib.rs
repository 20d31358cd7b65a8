//! The Keel database façade.
//!
//! A [`Database`] is an immutable value over a storage backend: opening
//! replays the node DAG into an index, and every mutation ([`transact`],
//! [`save`], [`merge`]) commits a new node and returns a new `Database`
//! pointing at the new head. Readers holding an older value keep a
//! consistent snapshot.
//!
//! ```no_run
//! use std::sync::Arc;
//! use keel_db::Database;
//! use keel_entity::{EntityRegistry, EntityType, Obj, Prop, Query};
//! use keel_store::MemoryStore;
//! use keel_types::{Source, Value, ValueType};
//!
//! # fn main() -> Result<(), keel_db::DbError> {
//! let registry = EntityRegistry::new(vec![EntityType::new(
//!     "User",
//!     vec![Prop::scalar("login", ValueType::Text).unique()],
//! )])?;
//! let db = Database::open(Arc::new(MemoryStore::new()), registry, Source::new(1, 0))?;
//!
//! let user = Obj::new("User").scalar("login", Value::text("a"));
//! let (db, eid) = db.save(&user)?;
//!
//! assert_eq!(db.entity("User.login", &Value::text("a"))?, Some(eid));
//! let pulled = db.pull("User", eid, &Query::empty())?;
//! assert_eq!(pulled.get_scalar("login"), Some(&Value::text("a")));
//! # Ok(())
//! # }
//! ```
//!
//! [`transact`]: Database::transact
//! [`save`]: Database::save
//! [`merge`]: Database::merge

pub mod database;
pub mod error;

pub use database::Database;
pub use error::{DbError, DbResult};
