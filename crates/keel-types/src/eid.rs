use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Instance id under which schema and system facts live.
pub const SCHEMA_IID: u32 = 0;

/// First local id available to application entities. Locals below this are
/// reserved for schema and system facts under [`SCHEMA_IID`].
pub const FIRST_USER_LOCAL: u64 = 1000;

/// Entity identifier: an ordered `(iid, local)` pair.
///
/// The `iid` names the allocating instance; `local` is that instance's
/// monotonic counter. The pair gives entities a total order and keeps ids
/// from distinct writers disjoint. The packed wire form is
/// `(iid << 32) | local`, which bounds `local` to the u32 range. The bound
/// is enforced by [`EidAllocator`], not by construction, so foreign data can
/// still be represented.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Eid {
    iid: u32,
    local: u64,
}

impl Eid {
    /// Create an entity id from its components.
    pub const fn new(iid: u32, local: u64) -> Self {
        Self { iid, local }
    }

    /// The allocating instance's id.
    pub fn iid(&self) -> u32 {
        self.iid
    }

    /// The per-instance counter component.
    pub fn local(&self) -> u64 {
        self.local
    }

    /// Returns `true` if this id lies in the reserved schema/system range.
    pub fn is_reserved(&self) -> bool {
        self.iid == SCHEMA_IID && self.local < FIRST_USER_LOCAL
    }

    /// Pack into the 64-bit wire form, if `local` fits.
    pub fn packed(&self) -> Option<u64> {
        if self.local > u32::MAX as u64 {
            return None;
        }
        Some(((self.iid as u64) << 32) | self.local)
    }

    /// Unpack from the 64-bit wire form.
    pub fn from_packed(packed: u64) -> Self {
        Self {
            iid: (packed >> 32) as u32,
            local: packed & 0xFFFF_FFFF,
        }
    }
}

impl fmt::Debug for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Eid({}.{})", self.iid, self.local)
    }
}

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.iid, self.local)
    }
}

/// Identity of the writer producing a node: instance id plus a byte of
/// instance metadata carried verbatim in the node header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    /// Instance id; must be unique across concurrent writers.
    pub iid: u32,
    /// Free instance metadata bits.
    pub instance_bits: u8,
}

impl Source {
    /// Create a writer identity.
    pub const fn new(iid: u32, instance_bits: u8) -> Self {
        Self { iid, instance_bits }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.iid, self.instance_bits)
    }
}

/// Monotonic entity id allocator for one instance.
///
/// Starts past the reserved range and never recycles. Allocation fails with
/// [`TypeError::EidSpaceExhausted`] once `local` would leave the packable
/// u32 range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EidAllocator {
    iid: u32,
    next_local: u64,
}

impl EidAllocator {
    /// Create an allocator for the given instance id.
    pub fn new(iid: u32) -> Self {
        Self {
            iid,
            next_local: FIRST_USER_LOCAL,
        }
    }

    /// The instance id this allocator serves.
    pub fn iid(&self) -> u32 {
        self.iid
    }

    /// The next local id that will be handed out.
    pub fn next_local(&self) -> u64 {
        self.next_local
    }

    /// Allocate the next entity id.
    pub fn allocate(&mut self) -> Result<Eid, TypeError> {
        if self.next_local > u32::MAX as u64 {
            return Err(TypeError::EidSpaceExhausted { iid: self.iid });
        }
        let eid = Eid::new(self.iid, self.next_local);
        self.next_local += 1;
        Ok(eid)
    }

    /// Advance the counter past an observed entity id.
    ///
    /// Ids from other instances are ignored. Used when reopening a database
    /// so the sequence continues instead of recycling.
    pub fn resume_after(&mut self, eid: &Eid) {
        if eid.iid() == self.iid && eid.local() >= self.next_local {
            self.next_local = eid.local() + 1;
        }
    }
}
