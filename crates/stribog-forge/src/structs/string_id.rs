//! Offsets into the two text tables.
//!
//! Table 1 holds file paths and inline string values; table 2 (format
//! version >= 6) holds struct, property, enum and record names. Below
//! version 6 a single table serves both roles.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Offset into text table 1.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, PartialEq, Eq, Hash)]
#[repr(C, packed)]
pub struct StringId {
    id: i32,
}

impl StringId {
    #[inline]
    pub fn new(offset: i32) -> Self {
        Self { id: offset }
    }

    /// Negative offsets mean "no string".
    pub fn is_null(&self) -> bool {
        self.id() < 0
    }

    pub fn id(&self) -> i32 {
        self.id
    }
}

impl Default for StringId {
    fn default() -> Self {
        Self { id: -1 }
    }
}

/// Offset into text table 2 (the name table).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, PartialEq, Eq, Hash)]
#[repr(C, packed)]
pub struct NameId {
    id: i32,
}

impl NameId {
    #[inline]
    pub fn new(offset: i32) -> Self {
        Self { id: offset }
    }

    pub fn is_null(&self) -> bool {
        self.id() < 0
    }

    pub fn id(&self) -> i32 {
        self.id
    }
}

impl Default for NameId {
    fn default() -> Self {
        Self { id: -1 }
    }
}
