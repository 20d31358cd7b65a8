use std::fmt;

use serde::{Deserialize, Serialize};

use crate::eid::Eid;
use crate::value::Value;

/// A fact (datom): one `(entity, attribute, value)` statement plus a
/// tombstone flag.
///
/// Facts are immutable once committed. A retraction (`retracted == true`)
/// hides an earlier assertion of the same `(entity, attribute, value)`; it
/// never deletes bytes from storage.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    /// The entity this fact is about.
    pub eid: Eid,
    /// Attribute name in `Type.prop` form.
    pub attr: String,
    /// The asserted (or retracted) value.
    pub value: Value,
    /// `true` marks a retraction.
    pub retracted: bool,
}

impl Fact {
    /// An assertion.
    pub fn assertion(eid: Eid, attr: impl Into<String>, value: Value) -> Self {
        Self {
            eid,
            attr: attr.into(),
            value,
            retracted: false,
        }
    }

    /// A retraction of a previously asserted value.
    pub fn retraction(eid: Eid, attr: impl Into<String>, value: Value) -> Self {
        Self {
            eid,
            attr: attr.into(),
            value,
            retracted: true,
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.retracted { "-" } else { "+" };
        write!(f, "{mark}[{} {} {}]", self.eid, self.attr, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_tombstone() {
        let e = Eid::new(1, 1000);
        let a = Fact::assertion(e, "User.login", Value::text("a"));
        assert!(!a.retracted);
        let r = Fact::retraction(e, "User.login", Value::text("a"));
        assert!(r.retracted);
        assert_eq!(a.eid, r.eid);
        assert_eq!(a.attr, r.attr);
        assert_eq!(a.value, r.value);
    }

    #[test]
    fn display_marks_polarity() {
        let e = Eid::new(1, 1000);
        let a = format!("{}", Fact::assertion(e, "User.age", Value::Int(3)));
        assert!(a.starts_with('+'));
        let r = format!("{}", Fact::retraction(e, "User.age", Value::Int(3)));
        assert!(r.starts_with('-'));
    }
}
