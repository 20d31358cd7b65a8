use std::sync::Arc;

use crate::error::StoreResult;
use crate::key::{Key, Namespace};

/// Namespaced key/value storage.
///
/// All implementations must satisfy these invariants:
/// - `add` creates a new entry and fails with `AlreadyExists` if the key is
///   taken. It is the write path for immutable, content-addressed entries.
/// - `overwrite` replaces an existing entry and fails with `NotFound` if the
///   key is absent. It is only used for mutable pointers.
/// - Both writes are atomic against concurrent readers: an entry is either
///   fully present or absent, never partial.
/// - Enumeration is non-recursive and sorted.
/// - All I/O errors are propagated, never silently ignored.
pub trait KvStore: Send + Sync {
    /// Create a new entry. Fails if the key already exists.
    fn add(&self, key: &Key, value: &[u8]) -> StoreResult<()>;

    /// Replace an existing entry. Fails if the key is absent.
    fn overwrite(&self, key: &Key, value: &[u8]) -> StoreResult<()>;

    /// Read an entry's bytes, or `None` if the key is absent.
    fn load(&self, key: &Key) -> StoreResult<Option<Vec<u8>>>;

    /// Check whether a key exists.
    fn has_key(&self, key: &Key) -> StoreResult<bool>;

    /// Entry names directly in `ns`, sorted. Non-recursive.
    fn keys(&self, ns: &Namespace) -> StoreResult<Vec<String>>;

    /// Child namespace names directly under `ns`, sorted. Non-recursive.
    fn sub_namespaces(&self, ns: &Namespace) -> StoreResult<Vec<String>>;
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn add(&self, key: &Key, value: &[u8]) -> StoreResult<()> {
        (**self).add(key, value)
    }

    fn overwrite(&self, key: &Key, value: &[u8]) -> StoreResult<()> {
        (**self).overwrite(key, value)
    }

    fn load(&self, key: &Key) -> StoreResult<Option<Vec<u8>>> {
        (**self).load(key)
    }

    fn has_key(&self, key: &Key) -> StoreResult<bool> {
        (**self).has_key(key)
    }

    fn keys(&self, ns: &Namespace) -> StoreResult<Vec<String>> {
        (**self).keys(ns)
    }

    fn sub_namespaces(&self, ns: &Namespace) -> StoreResult<Vec<String>> {
        (**self).sub_namespaces(ns)
    }
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn add(&self, key: &Key, value: &[u8]) -> StoreResult<()> {
        (**self).add(key, value)
    }

    fn overwrite(&self, key: &Key, value: &[u8]) -> StoreResult<()> {
        (**self).overwrite(key, value)
    }

    fn load(&self, key: &Key) -> StoreResult<Option<Vec<u8>>> {
        (**self).load(key)
    }

    fn has_key(&self, key: &Key) -> StoreResult<bool> {
        (**self).has_key(key)
    }

    fn keys(&self, ns: &Namespace) -> StoreResult<Vec<String>> {
        (**self).keys(ns)
    }

    fn sub_namespaces(&self, ns: &Namespace) -> StoreResult<Vec<String>> {
        (**self).sub_namespaces(ns)
    }
}
