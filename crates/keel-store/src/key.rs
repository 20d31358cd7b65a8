//! Namespaces and keys, with segment validation.
//!
//! A [`Namespace`] is a finite ordered path of segments under a root; a
//! [`Key`] is a namespace plus a name. Segments and names share one
//! validation rule set so a filesystem realization cannot be steered
//! outside its root:
//!
//! - Must be non-empty
//! - Must not contain separators, whitespace, or `~ ^ : ? * [ \`
//! - Must not contain `..`
//! - Must not start with `.` (hidden-file prefix; also hides temp files)
//! - Must not end with `.lock` or `.tmp`

use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Characters that are forbidden anywhere in a segment or key name.
const FORBIDDEN_CHARS: &[char] = &[
    '/', ' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\',
];

/// Validate a namespace segment or key name, returning `Ok(())` if valid.
pub fn validate_segment(name: &str) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(&format!("contains forbidden character: {ch:?}")));
        }
    }
    if name.contains("..") {
        return Err(invalid("must not contain '..'"));
    }
    if name.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }
    if name.ends_with(".lock") || name.ends_with(".tmp") {
        return Err(invalid("must not end with '.lock' or '.tmp'"));
    }
    Ok(())
}

/// A finite ordered path of validated segments under a root.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    /// The root namespace (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a namespace from segments, validating each.
    pub fn of<I, S>(segments: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ns = Self::root();
        for segment in segments {
            ns = ns.child(&segment.into())?;
        }
        Ok(ns)
    }

    /// Extend this namespace by one validated segment.
    pub fn child(&self, segment: &str) -> StoreResult<Self> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// The parent namespace, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The path segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` for the root namespace.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Build a key in this namespace with a validated name.
    pub fn key(&self, name: &str) -> StoreResult<Key> {
        validate_segment(name)?;
        Ok(Key {
            namespace: self.clone(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// A storage key: a namespace plus a name within it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    /// The namespace holding the entry.
    pub namespace: Namespace,
    /// The entry's name within the namespace.
    pub name: String,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_root() {
            write!(f, "/{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}
