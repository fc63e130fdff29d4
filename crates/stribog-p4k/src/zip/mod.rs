//! On-disk ZIP record layouts.
//!
//! Signatures are read separately before each fixed-layout struct so the
//! structs themselves stay plain `repr(C, packed)` with zerocopy derives.

mod central_dir;
mod eocd;
mod local;

pub use central_dir::CentralDirectoryHeader;
pub use eocd::{Eocd64Locator, Eocd64Record, EocdRecord};
pub use local::LocalFileHeader;

/// Extra-field header id for the ZIP64 extended information block.
pub const ZIP64_EXTRA_ID: u16 = 0x0001;
