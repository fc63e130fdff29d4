//! Struct and enum definition records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::NameId;

/// One struct type, a fixed 16-byte record.
///
/// Types form a tree through `parent_type_index`; a struct's full property
/// set is its ancestors' properties root-first, then its own.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct StructDefinition {
    /// Name offset into the name table.
    pub name_offset: NameId,
    /// Parent type index, -1 for a root type.
    pub parent_type_index: i32,
    /// Properties defined by this struct itself (inherited ones excluded).
    pub attribute_count: u16,
    /// Index of the first own property in the property table.
    pub first_attribute_index: u16,
    /// Byte width of one instance of this struct.
    pub struct_size: u32,
}

impl StructDefinition {
    /// True for types without a parent.
    pub fn is_root(&self) -> bool {
        self.parent_type_index < 0
    }
}

/// One enum type, a fixed 8-byte record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct EnumDefinition {
    /// Name offset into the name table.
    pub name_offset: NameId,
    /// Number of options.
    pub value_count: u16,
    /// Index of the first option in the enum-option value array.
    pub first_value_index: u16,
}
