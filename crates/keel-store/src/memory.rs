use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::key::{Key, Namespace};
use crate::traits::KvStore;

/// One level of the in-memory namespace tree.
#[derive(Debug, Default)]
struct Dir {
    entries: HashMap<String, Vec<u8>>,
    children: HashMap<String, Dir>,
}

impl Dir {
    fn descend(&self, segments: &[String]) -> Option<&Dir> {
        let mut dir = self;
        for segment in segments {
            dir = dir.children.get(segment)?;
        }
        Some(dir)
    }

    fn descend_mut(&mut self, segments: &[String]) -> Option<&mut Dir> {
        let mut dir = self;
        for segment in segments {
            dir = dir.children.get_mut(segment)?;
        }
        Some(dir)
    }

    fn descend_or_create(&mut self, segments: &[String]) -> &mut Dir {
        let mut dir = self;
        for segment in segments {
            dir = dir.children.entry(segment.clone()).or_default();
        }
        dir
    }
}

/// In-memory, map-tree backed store.
///
/// Intended for tests and embedding. The whole tree lives behind a single
/// `RwLock`; intermediate namespaces materialize on write and an absent
/// namespace reads as empty.
pub struct MemoryStore {
    root: RwLock<Dir>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Dir::default()),
        }
    }

    /// Total number of entries across all namespaces.
    pub fn len(&self) -> usize {
        fn count(dir: &Dir) -> usize {
            dir.entries.len() + dir.children.values().map(count).sum::<usize>()
        }
        count(&self.root.read().expect("lock poisoned"))
    }

    /// Returns `true` if no entry exists anywhere.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn add(&self, key: &Key, value: &[u8]) -> StoreResult<()> {
        let mut root = self.root.write().expect("lock poisoned");
        let dir = root.descend_or_create(key.namespace.segments());
        if dir.entries.contains_key(&key.name) {
            return Err(StoreError::AlreadyExists(key.clone()));
        }
        dir.entries.insert(key.name.clone(), value.to_vec());
        Ok(())
    }

    fn overwrite(&self, key: &Key, value: &[u8]) -> StoreResult<()> {
        let mut root = self.root.write().expect("lock poisoned");
        match root
            .descend_mut(key.namespace.segments())
            .and_then(|dir| dir.entries.get_mut(&key.name))
        {
            Some(slot) => {
                *slot = value.to_vec();
                Ok(())
            }
            None => Err(StoreError::NotFound(key.clone())),
        }
    }

    fn load(&self, key: &Key) -> StoreResult<Option<Vec<u8>>> {
        let root = self.root.read().expect("lock poisoned");
        Ok(root
            .descend(key.namespace.segments())
            .and_then(|dir| dir.entries.get(&key.name))
            .cloned())
    }

    fn has_key(&self, key: &Key) -> StoreResult<bool> {
        let root = self.root.read().expect("lock poisoned");
        Ok(root
            .descend(key.namespace.segments())
            .map(|dir| dir.entries.contains_key(&key.name))
            .unwrap_or(false))
    }

    fn keys(&self, ns: &Namespace) -> StoreResult<Vec<String>> {
        let root = self.root.read().expect("lock poisoned");
        let mut names: Vec<String> = root
            .descend(ns.segments())
            .map(|dir| dir.entries.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    fn sub_namespaces(&self, ns: &Namespace) -> StoreResult<Vec<String>> {
        let root = self.root.read().expect("lock poisoned");
        let mut names: Vec<String> = root
            .descend(ns.segments())
            .map(|dir| dir.children.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.len())
            .finish()
    }
}
