//! Forge database deserializer.
//!
//! The forge blob is the game's central binary database: a versioned header
//! of struct/property/enum/record definitions, per-kind value arrays, one or
//! two text tables, and a DATA section of raw instance bytes. This crate
//! parses the schema once and deserializes arbitrary records into owned
//! [`Value`] graphs on demand.
//!
//! # Quick start
//!
//! ```no_run
//! use stribog_forge::DataForge;
//!
//! let bytes = std::fs::read("Game2.dcb")?;
//! let forge = DataForge::parse(bytes)?;
//!
//! for hit in forge.search_records("hornet", 10) {
//!     println!("{} ({}) {}", hit.name, hit.struct_type, hit.guid);
//! }
//!
//! let value = forge.read_record(0, 8)?;
//! if let Some(instance) = value.as_struct() {
//!     for (name, field) in &instance.fields {
//!         println!("{} = {}", name, field);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Pointer semantics
//!
//! - Strong pointers own their target and are resolved recursively until
//!   the caller's depth budget runs out, then left as unresolved markers.
//! - Weak pointers are back-links and always come back as descriptors.
//! - References carry only the target record's GUID; cross-file resolution
//!   belongs to the caller.

mod database;
mod error;
mod instance;
mod query;
mod types;
mod value;

pub mod structs;

#[cfg(test)]
pub(crate) mod testutil;

pub use database::{DataForge, SectionCheck};
pub use error::{Error, Result};
pub use instance::MAX_ARRAY_ELEMENTS;
pub use query::RecordSummary;
pub use types::{DataType, ValueKind};
pub use value::{InstanceId, Pointer, StructValue, Value};
