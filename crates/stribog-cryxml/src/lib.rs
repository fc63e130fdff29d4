//! Binary markup (CryXmlB) decoder.
//!
//! Many of the game's configuration files ship as a binary-encoded markup
//! tree: a nine-field header, flat node/attribute tables and a string table.
//! The same logical format exists in big- and little-endian flavors; the
//! declared file length is the only byte-order signal. Files that are
//! already plain markup text (leading `<`) are recognized and passed
//! through.
//!
//! # Example
//!
//! ```no_run
//! use stribog_cryxml::{parse, Markup};
//!
//! let data = std::fs::read("ship.mtl")?;
//! match parse(&data)? {
//!     Markup::Binary(root) => println!("{}", root.to_xml_string()?),
//!     Markup::Plain => println!("{}", String::from_utf8_lossy(&data)),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod node;
mod parser;

#[cfg(feature = "xml-output")]
mod writer;

pub use error::{Error, Result};
pub use node::XmlNode;
pub use parser::{detect, parse, Detected, MagicVariant, Markup};
