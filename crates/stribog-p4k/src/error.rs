//! Error types for the archive reader.

use thiserror::Error;

/// Errors that can occur while reading a P4K archive.
///
/// Entry-level failures (`Decompression`, `UnsupportedCompression`,
/// `EncryptedEntry`) poison only the affected entry; the rest of the archive
/// stays readable.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Low-level reader error.
    #[error("{0}")]
    Common(#[from] stribog_common::Error),

    /// A ZIP record signature did not match.
    #[error("invalid signature: expected {expected:#010x}, got {actual:#010x}")]
    InvalidSignature { expected: u32, actual: u32 },

    /// The end-of-central-directory record was not found in the tail window.
    #[error("could not find end of central directory record")]
    EocdNotFound,

    /// A ZIP64 locator or end record was missing or malformed.
    #[error("ZIP64 end of central directory not found")]
    Zip64EocdNotFound,

    /// The entry uses a compression method with no registered backend.
    #[error("unsupported compression method {method} for entry '{name}'")]
    UnsupportedCompression { name: String, method: u16 },

    /// Decompression of one entry failed.
    #[error(
        "decompression failed for entry '{name}' (method {method}, \
         {compressed_size} -> {uncompressed_size} bytes): {reason}"
    )]
    Decompression {
        name: String,
        method: u16,
        compressed_size: u64,
        uncompressed_size: u64,
        reason: String,
    },

    /// The entry is flagged encrypted; decryption is not supported.
    #[error("entry '{0}' is encrypted")]
    EncryptedEntry(String),

    /// The archive handle was closed.
    #[error("archive is closed")]
    Closed,

    /// The operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
