//! Error types shared across the Stribog crates.

use thiserror::Error;

/// Common error type for low-level binary reading.
#[derive(Debug, Error)]
pub enum Error {
    /// Ran out of bytes while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Magic bytes did not match.
    #[error("invalid magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// A GUID string could not be parsed.
    #[error("invalid GUID format: {0}")]
    InvalidGuid(String),

    /// String data ran to the end of the buffer without a terminator.
    #[error("string missing null terminator")]
    MissingNullTerminator,

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation was cancelled through a [`crate::CancelToken`].
    #[error("operation cancelled")]
    Cancelled,
}

/// Result type alias using the common error.
pub type Result<T> = std::result::Result<T, Error>;
