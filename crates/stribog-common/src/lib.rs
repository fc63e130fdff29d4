//! Shared primitives for the Stribog extraction crates.
//!
//! - [`BinaryReader`] - bounds-checked cursor over a byte slice
//! - [`Guid`] - 16-byte identifier with the container's canonical text form
//! - [`CancelToken`] - cooperative cancellation for long-running scans
//! - [`Error`] / [`Result`] - the common low-level error type

mod cancel;
mod error;
mod guid;
mod reader;

pub use cancel::CancelToken;
pub use error::{Error, Result};
pub use guid::Guid;
pub use reader::BinaryReader;

// Re-exported so dependent crates share one memchr version for
// null-terminator scans.
pub use memchr;
