//! Binary markup decoding.
//!
//! Layout after the magic: a nine-field u32 header (declared file length,
//! node/attribute/child table offsets and counts, string table offset and
//! count), then the fixed-width tables. The declared file length doubles as
//! the byte-order probe: it is trial-read big-endian, and a mismatch with
//! the actual buffer length means the whole file is little-endian.
//!
//! Attributes are NOT addressed through the per-node `first_attribute_index`
//! field, even though it exists: the table is consumed through one global
//! cursor advanced across the node table in order. Node *i* owns exactly the
//! next `attribute_count` entries after node *i*-1 stopped. Random access by
//! index desynchronizes names from values whenever a count is inaccurate.

use std::collections::HashMap;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use stribog_common::BinaryReader;

use crate::{Error, Result, XmlNode};

/// Node table entry width.
const NODE_SIZE: usize = 28;
/// Attribute table entry width.
const ATTR_SIZE: usize = 8;
/// Header size: nine u32 fields.
const HEADER_SIZE: usize = 36;

/// The recognized binary magic variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicVariant {
    /// `CryXmlB\0`, header at offset 8.
    CryXmlB,
    /// `CryXml\0`, header at offset 7.
    CryXml,
    /// `CRY3SDK` plus two bytes, header at offset 9.
    Cry3Sdk,
}

impl MagicVariant {
    /// Offset of the nine-field header for this variant.
    pub fn header_offset(&self) -> usize {
        match self {
            Self::CryXmlB => 8,
            Self::CryXml => 7,
            Self::Cry3Sdk => 9,
        }
    }
}

/// Outcome of sniffing a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detected {
    /// Leading `<`: the blob is already plain markup text.
    PlainXml,
    /// One of the binary variants.
    Binary(MagicVariant),
}

/// Result of [`parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Markup {
    /// The blob was already plain markup; the caller holds the text.
    Plain,
    /// Decoded binary markup.
    Binary(XmlNode),
}

impl Markup {
    /// The decoded tree, when the blob was binary.
    pub fn into_node(self) -> Option<XmlNode> {
        match self {
            Markup::Binary(node) => Some(node),
            Markup::Plain => None,
        }
    }
}

/// Sniff the first bytes of a blob.
///
/// A leading `<` is the pass-through signal for plain markup. A leading `C`
/// must be followed by a known magic; anything else is a hard format error.
pub fn detect(data: &[u8]) -> Result<Detected> {
    let Some(&first) = data.first() else {
        return Err(Error::UnknownFormat { first_byte: None });
    };

    if first == b'<' {
        return Ok(Detected::PlainXml);
    }
    if first != b'C' {
        return Err(Error::UnknownFormat {
            first_byte: Some(first),
        });
    }

    if data.starts_with(b"CryXmlB\0") {
        Ok(Detected::Binary(MagicVariant::CryXmlB))
    } else if data.starts_with(b"CryXml\0") {
        Ok(Detected::Binary(MagicVariant::CryXml))
    } else if data.starts_with(b"CRY3SDK") {
        Ok(Detected::Binary(MagicVariant::Cry3Sdk))
    } else {
        Err(Error::InvalidMagic {
            actual: data[..data.len().min(8)].to_vec(),
        })
    }
}

/// Decode a markup blob, passing plain markup through.
pub fn parse(data: &[u8]) -> Result<Markup> {
    let variant = match detect(data)? {
        Detected::PlainXml => return Ok(Markup::Plain),
        Detected::Binary(variant) => variant,
    };

    let header_start = variant.header_offset();
    let mut probe = BinaryReader::new_at(data, header_start);
    let declared_be = probe.read_u32_order::<BigEndian>()?;

    // The declared length is the only byte-order signal in the format.
    let node = if declared_be as usize == data.len() {
        decode::<BigEndian>(data, header_start)?
    } else {
        decode::<LittleEndian>(data, header_start)?
    };
    Ok(Markup::Binary(node))
}

struct RawNode {
    name_offset: u32,
    content_offset: u32,
    attribute_count: u16,
    parent_id: i32,
}

struct PendingNode {
    tag: String,
    attributes: HashMap<String, String>,
    content: Option<String>,
}

fn decode<B: ByteOrder>(data: &[u8], header_start: usize) -> Result<XmlNode> {
    let mut reader = BinaryReader::new_at(data, header_start);

    let declared_len = reader.read_u32_order::<B>()?;
    let node_table_offset = reader.read_u32_order::<B>()? as usize;
    let node_count = reader.read_u32_order::<B>()? as usize;
    let attr_table_offset = reader.read_u32_order::<B>()? as usize;
    let attr_count = reader.read_u32_order::<B>()? as usize;
    let _child_table_offset = reader.read_u32_order::<B>()? as usize;
    let _child_count = reader.read_u32_order::<B>()?;
    let string_table_offset = reader.read_u32_order::<B>()? as usize;
    let _string_table_count = reader.read_u32_order::<B>()?;

    if declared_len as usize != data.len() {
        log::debug!(
            "declared length {} differs from buffer length {}",
            declared_len,
            data.len()
        );
    }

    if node_count == 0 {
        return Err(Error::Empty);
    }
    check_table(data, "node", node_table_offset, node_count, NODE_SIZE)?;
    check_table(data, "attribute", attr_table_offset, attr_count, ATTR_SIZE)?;

    // The declared string count can under-report; the table is read as
    // running to the end of the buffer.
    if string_table_offset > data.len() {
        return Err(Error::TableOutOfBounds {
            table: "string",
            offset: string_table_offset,
            count: 0,
            len: data.len(),
        });
    }
    let strings = &data[string_table_offset..];

    let mut raw_nodes = Vec::with_capacity(node_count);
    let mut node_reader = BinaryReader::new_at(data, node_table_offset);
    for _ in 0..node_count {
        let name_offset = node_reader.read_u32_order::<B>()?;
        let content_offset = node_reader.read_u32_order::<B>()?;
        let attribute_count = node_reader.read_u16_order::<B>()?;
        let _child_count = node_reader.read_u16_order::<B>()?;
        let parent_id = node_reader.read_i32_order::<B>()?;
        // Present in the table but deliberately unused: attributes are
        // consumed sequentially, and parent links rebuild the tree.
        let _first_attribute_index = node_reader.read_i32_order::<B>()?;
        let _first_child_index = node_reader.read_i32_order::<B>()?;
        let _reserved = node_reader.read_u32_order::<B>()?;

        raw_nodes.push(RawNode {
            name_offset,
            content_offset,
            attribute_count,
            parent_id,
        });
    }

    let mut attr_table = Vec::with_capacity(attr_count);
    let mut attr_reader = BinaryReader::new_at(data, attr_table_offset);
    for _ in 0..attr_count {
        let name_offset = attr_reader.read_u32_order::<B>()?;
        let value_offset = attr_reader.read_u32_order::<B>()?;
        attr_table.push((name_offset, value_offset));
    }

    // One global cursor across the whole node table.
    let mut attr_cursor = 0usize;
    let mut pending: Vec<Option<PendingNode>> = Vec::with_capacity(node_count);
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); node_count];

    for (index, raw) in raw_nodes.iter().enumerate() {
        let tag = table_string(strings, raw.name_offset)?.to_string();

        let wanted = raw.attribute_count as usize;
        let available = attr_table.len().saturating_sub(attr_cursor);
        let take = wanted.min(available);
        if take < wanted {
            log::warn!(
                "node {} claims {} attributes but only {} remain in the table",
                index,
                wanted,
                available
            );
        }

        let mut attributes = HashMap::with_capacity(take);
        for &(name_offset, value_offset) in &attr_table[attr_cursor..attr_cursor + take] {
            let name = table_string(strings, name_offset)?.to_string();
            let value = table_string(strings, value_offset)?.to_string();
            attributes.insert(name, value);
        }
        attr_cursor += take;

        let content = {
            let text = table_string(strings, raw.content_offset)?.trim();
            (!text.is_empty()).then(|| text.to_string())
        };

        pending.push(Some(PendingNode {
            tag,
            attributes,
            content,
        }));
    }

    // Attach each node to its parent in table order; that order defines the
    // final sibling order.
    for (index, raw) in raw_nodes.iter().enumerate() {
        let parent = raw.parent_id;
        if parent < 0 {
            continue;
        }
        let parent = parent as usize;
        if parent >= node_count || parent == index {
            log::warn!("node {} has invalid parent {}", index, parent);
            continue;
        }
        children_of[parent].push(index);
    }

    Ok(assemble(&mut pending, &children_of, 0))
}

fn assemble(
    pending: &mut [Option<PendingNode>],
    children_of: &[Vec<usize>],
    index: usize,
) -> XmlNode {
    let Some(node) = pending[index].take() else {
        return XmlNode::default();
    };
    let mut out = XmlNode {
        tag: node.tag,
        attributes: node.attributes,
        children: Vec::with_capacity(children_of[index].len()),
        content: node.content,
    };

    for &child in &children_of[index] {
        if pending[child].is_some() {
            out.children.push(assemble(pending, children_of, child));
        }
    }
    out
}

fn check_table(
    data: &[u8],
    table: &'static str,
    offset: usize,
    count: usize,
    entry_size: usize,
) -> Result<()> {
    let end = offset
        .checked_add(count * entry_size)
        .filter(|&end| end <= data.len());
    if end.is_none() {
        return Err(Error::TableOutOfBounds {
            table,
            offset,
            count,
            len: data.len(),
        });
    }
    Ok(())
}

/// Null-terminated string at `offset` from the string-table start; runs to
/// the end of the buffer when no terminator exists.
fn table_string(strings: &[u8], offset: u32) -> Result<&str> {
    let offset = offset as usize;
    if offset > strings.len() {
        return Err(Error::StringOffsetOutOfBounds {
            offset: offset as u32,
            size: strings.len(),
        });
    }

    let tail = &strings[offset..];
    let end = stribog_common::memchr::memchr(0, tail).unwrap_or(tail.len());
    std::str::from_utf8(&tail[..end]).map_err(Error::Utf8)
}
