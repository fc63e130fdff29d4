//! Forge database parsing.
//!
//! One forge blob is fully resident in memory (owned bytes or a mapped
//! file). Parsing reads the versioned header, the four definition tables and
//! the record table, computes the value-array region offsets from the fixed
//! declaration order, caches the text tables, and accumulates the DATA
//! section base offset of every mapped struct type. Instance bytes are left
//! in place and read on demand.

use std::path::Path;

use hashbrown::HashMap;
use memmap2::Mmap;
use rustc_hash::FxHasher;
use stribog_common::{BinaryReader, Guid};

use crate::structs::{
    DataMapping, EnumDefinition, NameId, PropertyDefinition, RecordDefinition, StringId,
    StructDefinition,
};
use crate::types::ValueKind;
use crate::{Error, Result};

type FxHashMap<K, V> = HashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Outcome of the DATA-section length check.
///
/// The accumulated mapping total and the actual remaining bytes should
/// agree. When they do not, lenient parsing records the mismatch and
/// proceeds best-effort; every subsequent instance read stays
/// bounds-checked, so the worst case is null-degraded values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionCheck {
    /// Computed and actual lengths agree.
    Consistent,
    /// Lengths disagree; instance reads are best-effort.
    Mismatch { expected: u64, actual: u64 },
}

impl SectionCheck {
    /// True when the lengths agreed.
    pub fn is_consistent(&self) -> bool {
        matches!(self, SectionCheck::Consistent)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ArrayRegion {
    pub offset: usize,
    pub count: usize,
}

/// Absolute offsets of the per-kind value arrays.
///
/// Computed once from the header counts, walking
/// [`ValueKind::LAYOUT_ORDER`]. That order is the physical file layout;
/// there is no self-describing alternative, and any deviation desyncs every
/// subsequent read.
#[derive(Debug, Clone)]
pub(crate) struct ValueArrayLayout {
    regions: [ArrayRegion; ValueKind::COUNT],
}

impl ValueArrayLayout {
    fn compute(start: usize, counts: &[usize; ValueKind::COUNT]) -> (Self, usize) {
        let mut regions = [ArrayRegion::default(); ValueKind::COUNT];
        let mut offset = start;
        for (slot, kind) in regions.iter_mut().zip(ValueKind::LAYOUT_ORDER) {
            let count = counts[kind.index()];
            *slot = ArrayRegion { offset, count };
            offset += count * kind.width();
        }
        (Self { regions }, offset)
    }

    pub fn region(&self, kind: ValueKind) -> ArrayRegion {
        self.regions[kind.index()]
    }
}

/// Offset-keyed cache of one text table.
#[derive(Debug, Clone, Default)]
pub(crate) struct StringTable {
    strings: FxHashMap<i32, String>,
}

impl StringTable {
    pub(crate) fn parse(data: &[u8]) -> Self {
        let mut strings = FxHashMap::default();
        let mut offset = 0;

        while offset < data.len() {
            let end = memchr::memchr(0, &data[offset..])
                .map(|p| offset + p)
                .unwrap_or(data.len());
            if let Ok(s) = std::str::from_utf8(&data[offset..end]) {
                strings.insert(offset as i32, s.to_string());
            }
            offset = end + 1;
        }

        Self { strings }
    }

    pub(crate) fn get(&self, id: i32) -> Option<&str> {
        if id < 0 {
            return None;
        }
        self.strings.get(&id).map(String::as_str)
    }
}

enum Source {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Source {
    fn as_slice(&self) -> &[u8] {
        match self {
            Source::Owned(data) => data,
            Source::Mapped(mmap) => mmap,
        }
    }
}

/// A parsed forge database.
pub struct DataForge {
    source: Source,
    version: u32,
    struct_defs: Vec<StructDefinition>,
    property_defs: Vec<PropertyDefinition>,
    enum_defs: Vec<EnumDefinition>,
    data_mappings: Vec<DataMapping>,
    records: Vec<RecordDefinition>,
    value_arrays: ValueArrayLayout,
    table1: StringTable,
    /// Name table; present from version 6, otherwise table 1 serves both
    /// roles.
    table2: Option<StringTable>,
    data_section_offset: usize,
    struct_base_offsets: Vec<Option<usize>>,
    record_map: FxHashMap<Guid, usize>,
    section_check: SectionCheck,
}

struct Parsed {
    version: u32,
    struct_defs: Vec<StructDefinition>,
    property_defs: Vec<PropertyDefinition>,
    enum_defs: Vec<EnumDefinition>,
    data_mappings: Vec<DataMapping>,
    records: Vec<RecordDefinition>,
    value_arrays: ValueArrayLayout,
    table1: StringTable,
    table2: Option<StringTable>,
    data_section_offset: usize,
    struct_base_offsets: Vec<Option<usize>>,
    record_map: FxHashMap<Guid, usize>,
    section_check: SectionCheck,
}

impl DataForge {
    /// Parse a database from an owned buffer, lenient about the
    /// DATA-section length (the check result is kept on the handle).
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        Self::from_source(Source::Owned(data))
    }

    /// Parse, failing on a DATA-section length mismatch.
    pub fn parse_strict(data: Vec<u8>) -> Result<Self> {
        let db = Self::parse(data)?;
        match db.section_check {
            SectionCheck::Consistent => Ok(db),
            SectionCheck::Mismatch { expected, actual } => {
                Err(Error::DataSectionMismatch { expected, actual })
            }
        }
    }

    /// Memory-map a database file and parse it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_source(Source::Mapped(mmap))
    }

    fn from_source(source: Source) -> Result<Self> {
        let parsed = Self::parse_layout(source.as_slice())?;
        Ok(Self {
            source,
            version: parsed.version,
            struct_defs: parsed.struct_defs,
            property_defs: parsed.property_defs,
            enum_defs: parsed.enum_defs,
            data_mappings: parsed.data_mappings,
            records: parsed.records,
            value_arrays: parsed.value_arrays,
            table1: parsed.table1,
            table2: parsed.table2,
            data_section_offset: parsed.data_section_offset,
            struct_base_offsets: parsed.struct_base_offsets,
            record_map: parsed.record_map,
            section_check: parsed.section_check,
        })
    }

    fn parse_layout(data: &[u8]) -> Result<Parsed> {
        let mut reader = BinaryReader::new(data);

        let _reserved = reader.read_u32()?;
        let version = reader.read_u32()?;
        if version > 6 {
            return Err(Error::UnsupportedVersion(version));
        }
        let _reserved = reader.read_u32()?;
        let _reserved = reader.read_u32()?;

        let struct_def_count = reader.read_u32()? as usize;
        let property_def_count = reader.read_u32()? as usize;
        let enum_def_count = reader.read_u32()? as usize;
        let data_mapping_count = reader.read_u32()? as usize;
        let record_count = reader.read_u32()? as usize;

        let mut kind_counts = [0usize; ValueKind::COUNT];
        for slot in kind_counts.iter_mut() {
            *slot = reader.read_u32()? as usize;
        }

        let text_length_1 = reader.read_u32()? as usize;
        let text_length_2 = if version >= 6 {
            reader.read_u32()? as usize
        } else {
            0
        };

        let struct_defs: Vec<StructDefinition> = read_table(&mut reader, struct_def_count)?;
        let property_defs: Vec<PropertyDefinition> = read_table(&mut reader, property_def_count)?;
        let enum_defs: Vec<EnumDefinition> = read_table(&mut reader, enum_def_count)?;

        let data_mappings = if version >= 5 {
            read_table(&mut reader, data_mapping_count)?
        } else {
            // Older files store 16-bit (count, index) pairs.
            let mut mappings = Vec::with_capacity(data_mapping_count.min(1 << 16));
            for _ in 0..data_mapping_count {
                let struct_count = reader.read_u16()? as u32;
                let struct_index = reader.read_u16()? as u32;
                mappings.push(DataMapping {
                    struct_count,
                    struct_index,
                });
            }
            mappings
        };

        let records: Vec<RecordDefinition> = read_table(&mut reader, record_count)?;

        let (value_arrays, arrays_end) =
            ValueArrayLayout::compute(reader.position(), &kind_counts);

        let table1_bytes = slice_at(data, arrays_end, text_length_1)?;
        let table1 = StringTable::parse(table1_bytes);
        let mut offset = arrays_end + text_length_1;

        let table2 = if version >= 6 {
            let bytes = slice_at(data, offset, text_length_2)?;
            offset += text_length_2;
            Some(StringTable::parse(bytes))
        } else {
            None
        };

        let data_section_offset = offset;

        let mut struct_base_offsets: Vec<Option<usize>> = vec![None; struct_defs.len()];
        let mut running = 0usize;
        for mapping in &data_mappings {
            let index = mapping.struct_index as usize;
            let Some(def) = struct_defs.get(index) else {
                log::warn!("data mapping names unknown struct index {}", index);
                continue;
            };
            if struct_base_offsets[index].is_none() {
                struct_base_offsets[index] = Some(running);
            }
            running += def.struct_size as usize * mapping.struct_count as usize;
        }

        let actual = data.len().saturating_sub(data_section_offset);
        let section_check = if running == actual {
            SectionCheck::Consistent
        } else {
            log::warn!(
                "data section length mismatch: computed {} bytes, actual {}; \
                 reading instances best-effort",
                running,
                actual
            );
            SectionCheck::Mismatch {
                expected: running as u64,
                actual: actual as u64,
            }
        };

        let mut record_map = FxHashMap::default();
        for (index, record) in records.iter().enumerate() {
            record_map.entry(record.id).or_insert(index);
        }

        Ok(Parsed {
            version,
            struct_defs,
            property_defs,
            enum_defs,
            data_mappings,
            records,
            value_arrays,
            table1,
            table2,
            data_section_offset,
            struct_base_offsets,
            record_map,
            section_check,
        })
    }

    // Accessors

    /// Format version from the header.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[inline]
    pub fn struct_definitions(&self) -> &[StructDefinition] {
        &self.struct_defs
    }

    #[inline]
    pub fn property_definitions(&self) -> &[PropertyDefinition] {
        &self.property_defs
    }

    #[inline]
    pub fn enum_definitions(&self) -> &[EnumDefinition] {
        &self.enum_defs
    }

    #[inline]
    pub fn data_mappings(&self) -> &[DataMapping] {
        &self.data_mappings
    }

    #[inline]
    pub fn records(&self) -> &[RecordDefinition] {
        &self.records
    }

    /// Result of the DATA-section length check performed at parse time.
    #[inline]
    pub fn section_check(&self) -> SectionCheck {
        self.section_check
    }

    /// Resolve a text-table-1 offset (file paths, inline string values).
    #[inline]
    pub fn string(&self, id: StringId) -> Option<&str> {
        self.table1.get(id.id())
    }

    /// Resolve a name-table offset (struct, property, enum, record names).
    /// Below version 6 this is table 1 as well.
    #[inline]
    pub fn name(&self, id: NameId) -> Option<&str> {
        self.table2.as_ref().unwrap_or(&self.table1).get(id.id())
    }

    pub fn struct_name(&self, struct_index: usize) -> Option<&str> {
        self.struct_defs
            .get(struct_index)
            .and_then(|def| self.name(def.name_offset))
    }

    pub fn enum_name(&self, enum_index: usize) -> Option<&str> {
        self.enum_defs
            .get(enum_index)
            .and_then(|def| self.name(def.name_offset))
    }

    pub fn property_name(&self, prop: &PropertyDefinition) -> Option<&str> {
        self.name(prop.name_offset)
    }

    pub fn record_name(&self, record: &RecordDefinition) -> Option<&str> {
        self.name(record.name_offset)
    }

    pub fn record_file_name(&self, record: &RecordDefinition) -> Option<&str> {
        self.string(record.file_name_offset)
    }

    /// The option names of an enum definition, in declaration order.
    pub fn enum_options(&self, def: &EnumDefinition) -> Vec<&str> {
        let start = def.first_value_index as usize;
        let count = def.value_count as usize;

        (start..start + count)
            .filter_map(|index| {
                let bytes = self.array_slice(ValueKind::EnumOption, index)?;
                let id = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                self.name(NameId::new(id))
            })
            .collect()
    }

    /// The full property set of a struct: ancestors root-first, then its
    /// own. Fails on a cyclic parent chain instead of looping.
    pub fn struct_properties(&self, struct_index: usize) -> Result<Vec<&PropertyDefinition>> {
        let mut chain = Vec::new();
        let mut current = struct_index as i64;

        while current >= 0 {
            let Some(def) = self.struct_defs.get(current as usize) else {
                log::warn!("parent chain leaves struct table at index {}", current);
                break;
            };
            chain.push(def);
            if chain.len() > self.struct_defs.len() {
                return Err(Error::CyclicHierarchy { struct_index });
            }
            current = def.parent_type_index as i64;
        }

        let mut properties = Vec::new();
        for def in chain.iter().rev() {
            let start = def.first_attribute_index as usize;
            let end = start + def.attribute_count as usize;
            match self.property_defs.get(start..end) {
                Some(slice) => properties.extend(slice.iter()),
                None => log::warn!(
                    "property range {}..{} out of bounds (total {})",
                    start,
                    end,
                    self.property_defs.len()
                ),
            }
        }

        Ok(properties)
    }

    // Internal plumbing shared with the instance reader.

    #[inline]
    pub(crate) fn bytes(&self) -> &[u8] {
        self.source.as_slice()
    }

    #[inline]
    pub(crate) fn data_section_offset(&self) -> usize {
        self.data_section_offset
    }

    #[inline]
    pub(crate) fn struct_base_offset(&self, struct_index: usize) -> Option<usize> {
        self.struct_base_offsets.get(struct_index).copied().flatten()
    }

    #[inline]
    pub(crate) fn record_index_by_guid(&self, guid: &Guid) -> Option<usize> {
        self.record_map.get(guid).copied()
    }

    /// Bounds-checked view of one value-array element.
    pub(crate) fn array_slice(&self, kind: ValueKind, index: usize) -> Option<&[u8]> {
        let region = self.value_arrays.region(kind);
        if index >= region.count {
            return None;
        }
        let start = region.offset + index * kind.width();
        self.bytes().get(start..start + kind.width())
    }
}

impl std::fmt::Debug for DataForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataForge")
            .field("version", &self.version)
            .field("structs", &self.struct_defs.len())
            .field("properties", &self.property_defs.len())
            .field("enums", &self.enum_defs.len())
            .field("records", &self.records.len())
            .field("section_check", &self.section_check)
            .finish()
    }
}

fn read_table<T: zerocopy::FromBytes>(reader: &mut BinaryReader<'_>, count: usize) -> Result<Vec<T>> {
    // Counts come from vendor-controlled input; cap the pre-allocation.
    let mut table = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        table.push(reader.read_struct::<T>()?);
    }
    Ok(table)
}

fn slice_at(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    data.get(offset..offset + len)
        .ok_or(Error::Common(stribog_common::Error::UnexpectedEof {
            needed: len,
            available: data.len().saturating_sub(offset),
        }))
}
