//! Archive entry metadata.

/// Compression method of an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Method 0 - stored without compression.
    Store,
    /// Method 8 - raw (headerless) DEFLATE.
    Deflate,
    /// Methods 93 and 100 - Zstandard.
    Zstd,
    /// Any other method code.
    Other(u16),
}

impl CompressionMethod {
    /// Map a raw method code onto the known methods.
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => Self::Store,
            8 => Self::Deflate,
            93 | 100 => Self::Zstd,
            other => Self::Other(other),
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store => write!(f, "store"),
            Self::Deflate => write!(f, "deflate"),
            Self::Zstd => write!(f, "zstd"),
            Self::Other(code) => write!(f, "method({})", code),
        }
    }
}

/// Metadata for a single archive entry, immutable once indexed.
///
/// Names are normalized to the container's native `\` separator when the
/// central directory is indexed.
#[derive(Debug, Clone)]
pub struct P4kEntry {
    /// Entry path within the archive.
    pub name: String,
    /// Compressed size in bytes.
    pub compressed_size: u64,
    /// Uncompressed size in bytes.
    pub uncompressed_size: u64,
    /// Raw compression method code from the central directory.
    pub method_code: u16,
    /// Whether the general-purpose flags mark this entry encrypted.
    pub is_encrypted: bool,
    /// Whether the entry denotes a directory.
    pub is_directory: bool,
    /// Absolute offset of the local file header.
    pub local_header_offset: u64,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
}

impl P4kEntry {
    /// The entry's compression method.
    #[inline]
    pub fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::from_code(self.method_code)
    }

    /// The file name without any directory component.
    pub fn file_name(&self) -> &str {
        self.name.rsplit('\\').next().unwrap_or(&self.name)
    }

    /// The lower-cased extension, if any.
    pub fn extension(&self) -> Option<String> {
        let file_name = self.file_name();
        let dot = file_name.rfind('.')?;
        if dot == 0 || dot + 1 == file_name.len() {
            return None;
        }
        Some(file_name[dot + 1..].to_ascii_lowercase())
    }

    /// The first path segment, when the entry lives inside a directory.
    pub fn top_level_dir(&self) -> Option<&str> {
        let sep = self.name.find('\\')?;
        Some(&self.name[..sep])
    }
}
