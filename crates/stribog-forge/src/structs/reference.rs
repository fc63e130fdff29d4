//! Pointer and reference cells.

use stribog_common::Guid;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// An 8-byte instance pointer, the wire shape of strong and weak pointers.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct InstancePointer {
    /// Target struct type, -1 for null.
    pub struct_index: i32,
    /// Target instance, -1 for null.
    pub instance_index: i32,
}

impl InstancePointer {
    pub fn is_null(&self) -> bool {
        self.struct_index < 0 || self.instance_index < 0
    }
}

/// A 20-byte cross-file record reference. Only the GUID is meaningful to
/// local deserialization; references are never resolved in-file.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct RecordReference {
    /// Instance index within the target file, unused locally.
    pub instance_index: i32,
    /// GUID of the referenced record.
    pub record_id: Guid,
}

impl RecordReference {
    pub fn is_null(&self) -> bool {
        self.record_id.is_empty()
    }
}
