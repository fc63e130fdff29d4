//! Property definition records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::NameId;
use crate::DataType;

/// One property slot, a fixed 12-byte record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct PropertyDefinition {
    /// Name offset into the name table.
    pub name_offset: NameId,
    /// Target struct index, meaningful for Class and pointer types only.
    pub struct_index: u16,
    /// Raw data-type code.
    pub data_type: u16,
    /// Conversion: low byte 0 = inline scalar, nonzero = array.
    pub conversion_type: u16,
    /// Unused.
    pub padding: u16,
}

impl PropertyDefinition {
    /// Decode the data-type code.
    pub fn kind(&self) -> Option<DataType> {
        DataType::from_code(self.data_type)
    }

    /// Only the low byte of the conversion field is significant.
    pub fn is_array(&self) -> bool {
        (self.conversion_type & 0x00FF) != 0
    }
}
