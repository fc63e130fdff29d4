//! Error types for forge parsing.

use thiserror::Error;

/// Errors that can occur when parsing or reading a forge database.
///
/// Degenerate per-value conditions (unknown type codes, out-of-range pool
/// indexes) are deliberately NOT errors: they are logged and surface as null
/// values so one bad property cannot poison a whole record.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Low-level reader error.
    #[error("{0}")]
    Common(#[from] stribog_common::Error),

    /// The format version is newer than this reader understands.
    #[error("unsupported forge version: {0} (expected <= 6)")]
    UnsupportedVersion(u32),

    /// A struct's parent chain loops.
    #[error("cyclic parent chain at struct index {struct_index}")]
    CyclicHierarchy { struct_index: usize },

    /// Strict parsing: the DATA section length does not match the
    /// accumulated data mappings.
    #[error("data section length mismatch: computed {expected} bytes, actual {actual}")]
    DataSectionMismatch { expected: u64, actual: u64 },

    /// A record index past the record table.
    #[error("record index {index} out of range (total: {count})")]
    RecordOutOfRange { index: usize, count: usize },
}

/// Result type for forge operations.
pub type Result<T> = std::result::Result<T, Error>;
