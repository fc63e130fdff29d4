//! Record definitions and data mappings.

use stribog_common::Guid;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::{NameId, StringId};

/// A named, GUID-addressed instance; a fixed 32-byte record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct RecordDefinition {
    /// Record name offset into the name table.
    pub name_offset: NameId,
    /// Source file path offset into text table 1.
    pub file_name_offset: StringId,
    /// Struct type of this record.
    pub struct_index: i32,
    /// Unique identifier.
    pub id: Guid,
    /// Which instance of the struct type this record addresses.
    pub instance_index: u16,
    /// Struct byte width, redundant with the definition; consistency
    /// check only.
    pub struct_size: u16,
}

/// Instance-count declaration for one struct type.
///
/// Mappings accumulate in declaration order to give each struct type its
/// base byte offset inside the DATA section: the first mapping naming a
/// struct index claims the running total.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DataMapping {
    /// Number of instances stored for this struct type.
    pub struct_count: u32,
    /// The struct type index.
    pub struct_index: u32,
}
