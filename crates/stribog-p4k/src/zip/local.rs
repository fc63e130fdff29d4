//! Local file header.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Local file header (without signature), preceding the entry data.
///
/// The name and extra-field lengths recorded here can differ from the
/// central-directory copy; the local lengths determine where the entry data
/// actually starts.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct LocalFileHeader {
    /// Version needed to extract
    pub version_needed: u16,
    /// General purpose bit flag
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
}

impl LocalFileHeader {
    /// Local file header signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

    /// Local file header signature as u32.
    pub const SIGNATURE: u32 = 0x04034b50;

    /// Variant signature emitted by the game container.
    pub const SIGNATURE_EXTENDED: u32 = 0x14034b50;

    /// Fixed record size following the signature.
    pub const FIXED_SIZE: usize = std::mem::size_of::<Self>();

    /// Length of the variable data following this header.
    pub fn variable_data_size(&self) -> usize {
        self.file_name_length as usize + self.extra_field_length as usize
    }
}
