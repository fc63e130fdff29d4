//! Central directory file header.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// One central directory entry (without signature).
///
/// Size and offset fields equal to 0xFFFFFFFF are sentinels; the true 64-bit
/// values live in the ZIP64 extended-information extra field.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct CentralDirectoryHeader {
    /// Version made by
    pub version_made_by: u16,
    /// Version needed to extract
    pub version_needed: u16,
    /// General purpose bit flag (bit 0 = encrypted)
    pub flags: u16,
    /// Compression method code
    pub compression_method: u16,
    /// DOS modification time and date
    pub last_modified: u32,
    /// CRC-32 of the uncompressed data
    pub crc32: u32,
    /// Compressed size
    pub compressed_size: u32,
    /// Uncompressed size
    pub uncompressed_size: u32,
    /// File name length
    pub file_name_length: u16,
    /// Extra field length
    pub extra_field_length: u16,
    /// File comment length
    pub file_comment_length: u16,
    /// Disk number where the file starts
    pub disk_number_start: u16,
    /// Internal file attributes
    pub internal_attrs: u16,
    /// External file attributes
    pub external_attrs: u32,
    /// Relative offset of the local file header
    pub local_header_offset: u32,
}

impl CentralDirectoryHeader {
    /// Central directory signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];

    /// Central directory signature as u32.
    pub const SIGNATURE: u32 = 0x02014b50;

    /// Fixed record size following the signature.
    pub const FIXED_SIZE: usize = std::mem::size_of::<Self>();

    /// Length of the variable data following this header.
    pub fn variable_data_size(&self) -> usize {
        self.file_name_length as usize
            + self.extra_field_length as usize
            + self.file_comment_length as usize
    }
}
