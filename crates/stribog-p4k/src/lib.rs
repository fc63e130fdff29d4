//! P4K archive reader.
//!
//! The P4K container is a ZIP-family archive with 64-bit extensions used to
//! package game assets:
//!
//! - ZIP64 end records and per-entry extra fields for archives > 4 GiB
//! - stored (0), DEFLATE (8) and Zstandard (93/100) entries
//! - an encryption flag on protected entries (reading them is refused;
//!   decryption is out of scope)
//! - `\`-separated entry paths, looked up case-sensitively first and
//!   case-insensitively second
//!
//! The reader streams the central directory through a sliding buffer, so
//! indexing memory stays bounded regardless of archive size, and reads
//! entries on demand through one seekable file handle.
//!
//! # Example
//!
//! ```no_run
//! use regex::Regex;
//! use stribog_p4k::P4kArchive;
//!
//! let mut archive = P4kArchive::open("Data.p4k")?;
//! archive.load_all_entries()?;
//!
//! for entry in archive.find_files(&Regex::new(r"\.dcb$")?, 10) {
//!     println!("{}: {} bytes", entry.name, entry.uncompressed_size);
//! }
//!
//! if let Some(entry) = archive.entry("Data\\Game2.dcb") {
//!     let bytes = archive.read_entry(entry)?;
//!     println!("read {} bytes", bytes.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod archive;
mod decompress;
mod entry;
mod error;
mod stats;
pub mod zip;

pub use archive::P4kArchive;
pub use decompress::{DecodeError, Decompressor, Decompressors, DeflateDecompressor, ZstdDecompressor};
pub use entry::{CompressionMethod, P4kEntry};
pub use error::{Error, Result};
pub use stats::ArchiveStats;
