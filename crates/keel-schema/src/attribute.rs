use std::fmt;

use serde::{Deserialize, Serialize};

use keel_types::ValueType;

use crate::error::{SchemaError, SchemaResult};

/// One attribute definition: a stable `Type.prop` name, a value type, and
/// cardinality/uniqueness flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    value_type: ValueType,
    unique: bool,
    many: bool,
}

impl Attribute {
    /// Define an attribute. The name must be `Type.prop` with both parts
    /// non-empty.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> SchemaResult<Self> {
        let name = name.into();
        validate_attr_name(&name)?;
        Ok(Self {
            name,
            value_type,
            unique: false,
            many: false,
        })
    }

    /// Mark the attribute unique: at most one entity may hold a given value.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark the attribute list-valued: multiple live values per entity.
    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    /// The full `Type.prop` name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared value type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Whether values of this attribute identify at most one entity.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether an entity may hold multiple live values.
    pub fn is_many(&self) -> bool {
        self.many
    }

    /// The `Type` part of the name.
    pub fn entity(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    /// The `prop` part of the name.
    pub fn prop(&self) -> &str {
        self.name.split_once('.').map(|(_, p)| p).unwrap_or("")
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value_type)?;
        if self.unique {
            f.write_str(" unique")?;
        }
        if self.many {
            f.write_str(" many")?;
        }
        Ok(())
    }
}

fn validate_attr_name(name: &str) -> SchemaResult<()> {
    let invalid = |reason: &str| SchemaError::InvalidAttributeName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let Some((entity, prop)) = name.split_once('.') else {
        return Err(invalid("must be in Type.prop form"));
    };
    if entity.is_empty() || prop.is_empty() {
        return Err(invalid("both Type and prop must be non-empty"));
    }
    if prop.contains('.') {
        return Err(invalid("must contain exactly one '.'"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }
    Ok(())
}
