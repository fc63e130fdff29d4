//! Error types for binary markup decoding.

use thiserror::Error;

/// Errors that can occur when decoding a binary markup blob.
#[derive(Debug, Error)]
pub enum Error {
    /// Low-level reader error.
    #[error("{0}")]
    Common(#[from] stribog_common::Error),

    /// The blob is neither plain markup nor any known binary variant.
    #[error("not a markup blob: first byte {first_byte:?} is neither '<' nor 'C'")]
    UnknownFormat { first_byte: Option<u8> },

    /// A 'C' lead-in with an unrecognized magic.
    #[error("unrecognized binary markup magic: {actual:?}")]
    InvalidMagic { actual: Vec<u8> },

    /// A declared table runs past the end of the buffer.
    #[error("{table} table ({count} entries at offset {offset}) exceeds buffer of {len} bytes")]
    TableOutOfBounds {
        table: &'static str,
        offset: usize,
        count: usize,
        len: usize,
    },

    /// A string offset past the end of the string table.
    #[error("string offset {offset} out of bounds (table size: {size})")]
    StringOffsetOutOfBounds { offset: u32, size: usize },

    /// The node table is empty; there is no root.
    #[error("markup document has no nodes")]
    Empty,

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// XML re-emission error.
    #[error("XML error: {0}")]
    Xml(String),
}

/// Result type for markup operations.
pub type Result<T> = std::result::Result<T, Error>;
