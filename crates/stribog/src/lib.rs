//! Stribog - game asset extraction library.
//!
//! A unified entry point to the extraction crates:
//!
//! - [`stribog_common`] - binary cursor, GUIDs, cancellation
//! - [`stribog_p4k`] - P4K (ZIP64) archive reading with streaming indexing
//! - [`stribog_forge`] - forge database (`.dcb`) deserialization
//! - [`stribog_cryxml`] - binary markup (CryXmlB) decoding
//!
//! # Example
//!
//! ```no_run
//! use stribog::prelude::*;
//!
//! let mut archive = P4kArchive::open("Data.p4k")?;
//! archive.load_all_entries()?;
//!
//! if let Some(entry) = archive.entry("Data\\Game2.dcb") {
//!     let entry = entry.clone();
//!     let bytes = archive.read_entry(&entry)?;
//!     let forge = DataForge::parse(bytes)?;
//!     println!("{} records", forge.records().len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use stribog_common as common;
pub use stribog_cryxml as cryxml;
pub use stribog_forge as forge;
pub use stribog_p4k as p4k;

/// Convenient imports for the typical extraction flow.
pub mod prelude {
    pub use stribog_common::{BinaryReader, CancelToken, Guid};
    pub use stribog_cryxml::{Markup, XmlNode};
    pub use stribog_forge::{DataForge, RecordSummary, Value};
    pub use stribog_p4k::{CompressionMethod, P4kArchive, P4kEntry};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
