//! End-of-central-directory records, 32-bit and ZIP64 variants.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// End of Central Directory record (without signature).
///
/// Found by scanning the archive tail backwards. Fields holding 0xFFFF /
/// 0xFFFFFFFF are sentinels meaning the true value lives in the ZIP64 end
/// record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct EocdRecord {
    /// Number of this disk
    pub disk_number: u16,
    /// Disk where the central directory starts
    pub central_dir_disk: u16,
    /// Central directory records on this disk
    pub central_dir_count_disk: u16,
    /// Total central directory records
    pub central_dir_count_total: u16,
    /// Central directory size in bytes
    pub central_dir_size: u32,
    /// Offset of the central directory start
    pub central_dir_offset: u32,
    /// Archive comment length
    pub comment_length: u16,
}

impl EocdRecord {
    /// EOCD signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];

    /// EOCD signature as u32.
    pub const SIGNATURE: u32 = 0x06054b50;

    /// Maximum distance of the signature from end-of-file:
    /// record + signature + maximum comment.
    pub const MAX_TAIL_SCAN: u64 = 65_558;

    /// True when any field carries a ZIP64 sentinel.
    pub fn is_zip64(&self) -> bool {
        self.central_dir_count_total == u16::MAX
            || self.central_dir_size == u32::MAX
            || self.central_dir_offset == u32::MAX
    }
}

/// ZIP64 End of Central Directory Locator (without signature).
///
/// Sits immediately before the EOCD record and points at the ZIP64 end
/// record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Eocd64Locator {
    /// Disk containing the ZIP64 EOCD record
    pub zip64_eocd_disk: u32,
    /// Absolute offset of the ZIP64 EOCD record
    pub zip64_eocd_offset: u64,
    /// Total number of disks
    pub total_disks: u32,
}

impl Eocd64Locator {
    /// Locator signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x06, 0x07];

    /// Locator signature as u32.
    pub const SIGNATURE: u32 = 0x07064b50;

    /// Signature plus record size.
    pub const TOTAL_SIZE: u64 = 4 + std::mem::size_of::<Self>() as u64;
}

/// ZIP64 End of Central Directory record (without signature).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Eocd64Record {
    /// Size of the remainder of this record
    pub record_size: u64,
    /// Version made by
    pub version_made_by: u16,
    /// Version needed to extract
    pub version_needed: u16,
    /// This disk number
    pub disk_number: u32,
    /// Disk where the central directory starts
    pub central_dir_disk: u32,
    /// Central directory records on this disk
    pub central_dir_count_disk: u64,
    /// Total central directory records
    pub central_dir_count_total: u64,
    /// Central directory size in bytes
    pub central_dir_size: u64,
    /// Offset of the central directory start
    pub central_dir_offset: u64,
}

impl Eocd64Record {
    /// ZIP64 EOCD signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x06, 0x06];

    /// ZIP64 EOCD signature as u32.
    pub const SIGNATURE: u32 = 0x06064b50;
}
