use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::key::{validate_segment, Key, Namespace};
use crate::traits::KvStore;

/// Filesystem-backed store: namespaces are directories, names are files.
///
/// `add` relies on `O_EXCL` (`create_new`) for atomic create-only writes.
/// `overwrite` writes a hidden temp file in the target directory and renames
/// it over the destination, so concurrent readers observe the old bytes or
/// the new bytes, never a partial write. Listings skip any name that fails
/// segment validation, which also hides in-flight temp files.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_path(&self, ns: &Namespace) -> PathBuf {
        let mut path = self.root.clone();
        for segment in ns.segments() {
            path.push(segment);
        }
        path
    }

    fn key_path(&self, key: &Key) -> PathBuf {
        self.namespace_path(&key.namespace).join(&key.name)
    }
}

impl KvStore for FsStore {
    fn add(&self, key: &Key, value: &[u8]) -> StoreResult<()> {
        let path = self.key_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(key.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(value)?;
        file.sync_all()?;
        debug!(key = %key, bytes = value.len(), "added entry");
        Ok(())
    }

    fn overwrite(&self, key: &Key, value: &[u8]) -> StoreResult<()> {
        let path = self.key_path(key);
        if !path.is_file() {
            return Err(StoreError::NotFound(key.clone()));
        }
        // Write-temp-then-rename keeps the swap atomic for readers.
        let tmp = path.with_file_name(format!(".{}.tmp", key.name));
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp)?;
            file.write_all(value)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        debug!(key = %key, bytes = value.len(), "overwrote entry");
        Ok(())
    }

    fn load(&self, key: &Key) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.key_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn has_key(&self, key: &Key) -> StoreResult<bool> {
        Ok(self.key_path(key).is_file())
    }

    fn keys(&self, ns: &Namespace) -> StoreResult<Vec<String>> {
        list_dir(&self.namespace_path(ns), |file_type| file_type.is_file())
    }

    fn sub_namespaces(&self, ns: &Namespace) -> StoreResult<Vec<String>> {
        list_dir(&self.namespace_path(ns), |file_type| file_type.is_dir())
    }
}

fn list_dir(
    path: &Path,
    keep: impl Fn(&fs::FileType) -> bool,
) -> StoreResult<Vec<String>> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        // An absent namespace reads as empty, matching the in-memory store.
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !keep(&entry.file_type()?) {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if validate_segment(&name).is_ok() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

impl std::fmt::Debug for FsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsStore").field("root", &self.root).finish()
    }
}
