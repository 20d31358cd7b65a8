//! Namespaced key/value storage for the Keel fact database.
//!
//! Persistent state lives in a small hierarchical key/value space:
//! immutable node bytes under `nodes/`, the mutable head pointer under
//! `refs/`, and an optional denormalized schema mirror under `schema/`.
//! The interface is deliberately tiny so other backends plug in trivially.
//!
//! # Design Rules
//!
//! 1. `add` is create-only: the write path for immutable, content-addressed
//!    entries. It fails on an existing key instead of clobbering it.
//! 2. `overwrite` is for mutable pointers only and fails on a missing key,
//!    so the two write paths cannot be confused.
//! 3. `add` must be atomic against concurrent readers: an entry is either
//!    fully present or absent.
//! 4. `overwrite` must be atomic too; the filesystem backend writes a temp
//!    file and renames over the target.
//! 5. The store never interprets entry contents.
//! 6. All I/O errors are propagated, never silently ignored.
//!
//! # Backends
//!
//! - [`MemoryStore`] — a tree of maps, for tests and embedding
//! - [`FsStore`] — directories and files under a root path

pub mod error;
pub mod fs;
pub mod key;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsStore;
pub use key::{validate_segment, Key, Namespace};
pub use memory::MemoryStore;
pub use traits::KvStore;
