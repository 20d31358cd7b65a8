use std::fmt;

use serde::{Deserialize, Serialize};

use crate::eid::Eid;

/// A scalar value carried by a fact.
///
/// This is the closed set of kinds the binary codec understands. The
/// variants order (and derive-based `Ord`) is stable: values are used as
/// index keys, so the ordering is part of observable behavior.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Int(i32),
    Long(i64),
    Text(String),
    Bytes(Vec<u8>),
    /// Milliseconds since the Unix epoch, UTC.
    Instant(i64),
    Zoned(ZonedTime),
    /// Reference to another entity.
    Ref(Eid),
}

impl Value {
    /// The type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Byte(_) => ValueType::Byte,
            Value::Int(_) => ValueType::Int,
            Value::Long(_) => ValueType::Long,
            Value::Text(_) => ValueType::Text,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Instant(_) => ValueType::Instant,
            Value::Zoned(_) => ValueType::Zoned,
            Value::Ref(_) => ValueType::Ref,
        }
    }

    /// Convenience constructor for text values.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// The referenced entity, if this is a [`Value::Ref`].
    pub fn as_ref_eid(&self) -> Option<Eid> {
        match self {
            Value::Ref(eid) => Some(*eid),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Byte(b) => write!(f, "{b}u8"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(l) => write!(f, "{l}l"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            Value::Instant(ms) => write!(f, "@{ms}ms"),
            Value::Zoned(z) => write!(f, "{z}"),
            Value::Ref(eid) => write!(f, "#{eid}"),
        }
    }
}

/// A wall-clock instant paired with its original time zone.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZonedTime {
    /// Seconds since the Unix epoch.
    pub epoch_seconds: i64,
    /// Sub-second nanoseconds, `0..1_000_000_000`.
    pub nanos: u32,
    /// IANA zone id (e.g. `"Europe/Berlin"`).
    pub zone: String,
}

impl ZonedTime {
    /// Create a zoned timestamp.
    pub fn new(epoch_seconds: i64, nanos: u32, zone: impl Into<String>) -> Self {
        Self {
            epoch_seconds,
            nanos,
            zone: zone.into(),
        }
    }

    /// The epoch-zero instant in UTC.
    pub fn epoch_utc() -> Self {
        Self::new(0, 0, "UTC")
    }
}

impl fmt::Display for ZonedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s.{}ns[{}]", self.epoch_seconds, self.nanos, self.zone)
    }
}

/// Type tag for a [`Value`], used by schemas to constrain attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    Byte,
    Int,
    Long,
    Text,
    Bytes,
    Instant,
    Zoned,
    Ref,
}

impl ValueType {
    /// Stable textual name, used when persisting schemas as facts.
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Byte => "byte",
            ValueType::Int => "int",
            ValueType::Long => "long",
            ValueType::Text => "text",
            ValueType::Bytes => "bytes",
            ValueType::Instant => "instant",
            ValueType::Zoned => "zoned",
            ValueType::Ref => "ref",
        }
    }

    /// Parse a persisted type name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(ValueType::Bool),
            "byte" => Some(ValueType::Byte),
            "int" => Some(ValueType::Int),
            "long" => Some(ValueType::Long),
            "text" => Some(ValueType::Text),
            "bytes" => Some(ValueType::Bytes),
            "instant" => Some(ValueType::Instant),
            "zoned" => Some(ValueType::Zoned),
            "ref" => Some(ValueType::Ref),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
