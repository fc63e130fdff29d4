//! 16-byte record identifier.
//!
//! Identifiers are stored as 16 raw bytes and rendered in a fixed mixed-order
//! text form: the first three groups are little-endian, the trailing eight
//! bytes are emitted as raw hex. The rendering must be bit-for-bit stable
//! because downstream consumers key records by the string form.

use std::fmt;
use std::str::FromStr;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::Error;

/// A 16-byte GUID rendered as `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
///
/// # Byte layout
///
/// - first group: bytes 3,2,1,0 (little-endian u32)
/// - second group: bytes 5,4 (little-endian u16)
/// - third group: bytes 7,6 (little-endian u16)
/// - fourth group: bytes 8,9 as-is
/// - fifth group: bytes 10..16 as-is
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Guid {
    bytes: [u8; 16],
}

impl Guid {
    /// The all-zero GUID.
    pub const EMPTY: Self = Self { bytes: [0; 16] };

    /// Wrap raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    /// The raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.bytes
    }

    /// True when every byte is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes == [0; 16]
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bytes;
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[3], b[2], b[1], b[0],
            b[5], b[4],
            b[7], b[6],
            b[8], b[9],
            b[10], b[11], b[12], b[13], b[14], b[15],
        )
    }
}

impl FromStr for Guid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 36 {
            return Err(Error::InvalidGuid(format!(
                "expected 36 characters, got {}",
                s.len()
            )));
        }

        let raw = s.as_bytes();
        for &pos in &[8usize, 13, 18, 23] {
            if raw[pos] != b'-' {
                return Err(Error::InvalidGuid("invalid hyphen positions".into()));
            }
        }

        let parse_hex = |start: usize| -> Result<u8, Error> {
            let pair = std::str::from_utf8(&raw[start..start + 2])
                .map_err(|_| Error::InvalidGuid("non-ASCII input".into()))?;
            u8::from_str_radix(pair, 16)
                .map_err(|_| Error::InvalidGuid(format!("invalid hex at position {}", start)))
        };

        // String positions of each byte, inverse of Display.
        const POSITIONS: [usize; 16] = [
            6, 4, 2, 0, // first group, reversed
            11, 9, // second group, reversed
            16, 14, // third group, reversed
            19, 21, // fourth group, in order
            24, 26, 28, 30, 32, 34, // fifth group, in order
        ];

        let mut bytes = [0u8; 16];
        for (byte, &pos) in bytes.iter_mut().zip(POSITIONS.iter()) {
            *byte = parse_hex(pos)?;
        }

        Ok(Self { bytes })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Guid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Guid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_guid_renders_zeroes() {
        assert_eq!(
            Guid::EMPTY.to_string(),
            "00000000-0000-0000-0000-000000000000"
        );
        assert!(Guid::EMPTY.is_empty());
    }

    #[test]
    fn rendering_is_deterministic() {
        let guid = Guid::from_bytes([
            0x78, 0x56, 0x34, 0x12, 0xcd, 0xab, 0x01, 0xef, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd,
            0xef, 0x01,
        ]);
        let rendered = guid.to_string();
        assert_eq!(rendered, "12345678-abcd-ef01-2345-6789abcdef01");
        assert_eq!(guid.to_string(), rendered);
    }

    #[test]
    fn display_from_str_round_trip() {
        let original = "deadbeef-1234-5678-9abc-def012345678";
        let guid: Guid = original.parse().unwrap();
        assert_eq!(guid.to_string(), original);
    }

    #[test]
    fn rejects_bad_input() {
        assert!("short".parse::<Guid>().is_err());
        assert!("deadbeef_1234-5678-9abc-def012345678".parse::<Guid>().is_err());
        assert!("deadbeef-1234-5678-9abc-def01234567g".parse::<Guid>().is_err());
    }
}
