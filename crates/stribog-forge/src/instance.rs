//! Depth-bounded instance deserialization.
//!
//! A record's instance bytes sit at
//! `data section start + struct base offset + instance_index * struct_size`.
//! Properties are read in hierarchy order; scalars advance the cursor by
//! their wire width, arrays read a `(count, first_index)` pair and pull
//! elements from the per-kind value arrays. Recursion through strong
//! pointers and inline classes is bounded solely by the caller-supplied
//! `max_depth`; degenerate input degrades to null values instead of
//! failing the whole record.

use stribog_common::{BinaryReader, Guid};

use crate::structs::{InstancePointer, PropertyDefinition, RecordReference, StringId};
use crate::types::DataType;
use crate::value::{InstanceId, Pointer, StructValue, Value};
use crate::{DataForge, Error, Result};

/// Safety cap on elements read per array property. Overflow is logged and
/// the excess dropped.
pub const MAX_ARRAY_ELEMENTS: u32 = 65_536;

impl DataForge {
    /// Deserialize one record into a value graph.
    ///
    /// `max_depth` bounds strong-pointer and inline-class recursion; at the
    /// bound strong pointers come back as [`Pointer::Unresolved`] and
    /// nested structs as [`Value::Null`].
    pub fn read_record(&self, record_index: usize, max_depth: u32) -> Result<Value> {
        let record = self
            .records()
            .get(record_index)
            .ok_or(Error::RecordOutOfRange {
                index: record_index,
                count: self.records().len(),
            })?;

        let struct_index = record.struct_index;
        let instance_index = record.instance_index;
        let recorded_size = record.struct_size;

        if struct_index < 0 {
            log::warn!("record {} has no struct type", record_index);
            return Ok(Value::Null);
        }

        if let Some(def) = self.struct_definitions().get(struct_index as usize) {
            let declared = def.struct_size;
            if recorded_size as u32 != declared {
                log::warn!(
                    "record {} declares struct size {} but definition says {}",
                    record_index,
                    recorded_size,
                    declared
                );
            }
        }

        self.read_instance_at(struct_index as usize, instance_index as usize, 0, max_depth)
    }

    /// Deserialize the record identified by `guid`, if present.
    pub fn read_record_by_guid(&self, guid: &Guid, max_depth: u32) -> Result<Option<Value>> {
        match self.record_index_by_guid(guid) {
            Some(index) => self.read_record(index, max_depth).map(Some),
            None => Ok(None),
        }
    }

    /// Deserialize an arbitrary struct instance.
    pub fn read_instance(
        &self,
        struct_index: usize,
        instance_index: usize,
        max_depth: u32,
    ) -> Result<Value> {
        self.read_instance_at(struct_index, instance_index, 0, max_depth)
    }

    fn read_instance_at(
        &self,
        struct_index: usize,
        instance_index: usize,
        depth: u32,
        max_depth: u32,
    ) -> Result<Value> {
        if depth > max_depth {
            return Ok(Value::Null);
        }

        let Some(def) = self.struct_definitions().get(struct_index) else {
            log::warn!("instance read names unknown struct index {}", struct_index);
            return Ok(Value::Null);
        };
        let struct_size = def.struct_size as usize;

        let Some(base) = self.struct_base_offset(struct_index) else {
            log::warn!("struct index {} has no data mapping", struct_index);
            return Ok(Value::Null);
        };

        let position = self.data_section_offset() + base + instance_index * struct_size;
        if position + struct_size > self.bytes().len() {
            log::warn!(
                "instance {}:{} lies past the end of the buffer",
                struct_index,
                instance_index
            );
            return Ok(Value::Null);
        }

        let mut reader = BinaryReader::new_at(self.bytes(), position);
        self.read_struct_value(struct_index, &mut reader, depth, max_depth)
    }

    fn read_struct_value(
        &self,
        struct_index: usize,
        reader: &mut BinaryReader<'_>,
        depth: u32,
        max_depth: u32,
    ) -> Result<Value> {
        let type_name = self
            .struct_name(struct_index)
            .unwrap_or("<unnamed>")
            .to_string();
        let properties = self.struct_properties(struct_index)?;

        let mut fields = Vec::with_capacity(properties.len());
        for prop in properties {
            let name = self.property_name(prop).unwrap_or("<unnamed>").to_string();
            let value = if prop.is_array() {
                self.read_array_property(prop, reader, depth, max_depth)?
            } else {
                self.read_value_inline(prop, reader, depth, max_depth)?
            };
            fields.push((name, value));
        }

        Ok(Value::Struct(StructValue { type_name, fields }))
    }

    fn read_value_inline(
        &self,
        prop: &PropertyDefinition,
        reader: &mut BinaryReader<'_>,
        depth: u32,
        max_depth: u32,
    ) -> Result<Value> {
        let Some(data_type) = prop.kind() else {
            let code = prop.data_type;
            log::warn!("unknown data type code {:#06x}; yielding null", code);
            return Ok(Value::Null);
        };

        Ok(match data_type {
            DataType::Boolean => Value::Bool(reader.read_bool()?),
            DataType::SByte => Value::Int8(reader.read_i8()?),
            DataType::Int16 => Value::Int16(reader.read_i16()?),
            DataType::Int32 => Value::Int32(reader.read_i32()?),
            DataType::Int64 => Value::Int64(reader.read_i64()?),
            DataType::Byte => Value::UInt8(reader.read_u8()?),
            DataType::UInt16 => Value::UInt16(reader.read_u16()?),
            DataType::UInt32 => Value::UInt32(reader.read_u32()?),
            DataType::UInt64 => Value::UInt64(reader.read_u64()?),
            DataType::Single => Value::Float(round_f32(reader.read_f32()?)),
            DataType::Double => Value::Double(round_f64(reader.read_f64()?)),
            DataType::Guid => Value::Guid(reader.read_struct()?),
            DataType::String => Value::String(self.inline_string(reader.read_i32()?)),
            DataType::Locale => Value::Locale(self.inline_string(reader.read_i32()?)),
            DataType::EnumChoice => Value::Enum(self.inline_string(reader.read_i32()?)),
            DataType::Class => {
                let nested = prop.struct_index as usize;
                let start = reader.position();
                let value = self.read_inline_class(nested, reader, depth + 1, max_depth)?;
                let width = self
                    .struct_definitions()
                    .get(nested)
                    .map(|d| d.struct_size as usize)
                    .unwrap_or(0);
                // An inline class consumes exactly its declared width,
                // independent of how many bytes its fields spanned.
                reader.seek(start + width);
                value
            }
            DataType::StrongPointer => {
                let pointer: InstancePointer = reader.read_struct()?;
                self.resolve_strong(pointer, depth, max_depth)?
            }
            DataType::WeakPointer => {
                let pointer: InstancePointer = reader.read_struct()?;
                weak_descriptor(pointer)
            }
            DataType::Reference => {
                let reference: RecordReference = reader.read_struct()?;
                if reference.is_null() {
                    Value::Reference(None)
                } else {
                    Value::Reference(Some(reference.record_id))
                }
            }
        })
    }

    fn read_inline_class(
        &self,
        struct_index: usize,
        reader: &mut BinaryReader<'_>,
        depth: u32,
        max_depth: u32,
    ) -> Result<Value> {
        if depth > max_depth {
            return Ok(Value::Null);
        }
        if self.struct_definitions().get(struct_index).is_none() {
            log::warn!("inline class names unknown struct index {}", struct_index);
            return Ok(Value::Null);
        }
        self.read_struct_value(struct_index, reader, depth, max_depth)
    }

    fn resolve_strong(
        &self,
        pointer: InstancePointer,
        depth: u32,
        max_depth: u32,
    ) -> Result<Value> {
        if pointer.is_null() {
            return Ok(Value::StrongPointer(Pointer::Null));
        }

        let id = InstanceId {
            struct_index: pointer.struct_index as u32,
            instance_index: pointer.instance_index as u32,
        };

        if depth < max_depth {
            let inner = self.read_instance_at(
                id.struct_index as usize,
                id.instance_index as usize,
                depth + 1,
                max_depth,
            )?;
            Ok(Value::StrongPointer(Pointer::Resolved(Box::new(inner))))
        } else {
            Ok(Value::StrongPointer(Pointer::Unresolved(id)))
        }
    }

    fn read_array_property(
        &self,
        prop: &PropertyDefinition,
        reader: &mut BinaryReader<'_>,
        depth: u32,
        max_depth: u32,
    ) -> Result<Value> {
        let count = reader.read_u32()?;
        let first_index = reader.read_u32()?;

        let Some(data_type) = prop.kind() else {
            let code = prop.data_type;
            log::warn!("unknown array data type code {:#06x}; yielding null", code);
            return Ok(Value::Null);
        };

        let capped = count.min(MAX_ARRAY_ELEMENTS);
        if capped < count {
            log::warn!(
                "array of {} elements capped at {}; excess dropped",
                count,
                MAX_ARRAY_ELEMENTS
            );
        }

        let mut items = Vec::with_capacity(capped as usize);
        for i in 0..capped {
            let index = first_index as usize + i as usize;
            items.push(self.read_array_element(data_type, prop, index, depth, max_depth)?);
        }
        Ok(Value::Array(items))
    }

    fn read_array_element(
        &self,
        data_type: DataType,
        prop: &PropertyDefinition,
        index: usize,
        depth: u32,
        max_depth: u32,
    ) -> Result<Value> {
        // Class arrays index the target struct's instance block directly.
        if data_type == DataType::Class {
            return self.read_instance_at(prop.struct_index as usize, index, depth + 1, max_depth);
        }

        let Some(kind) = data_type.value_kind() else {
            return Ok(Value::Null);
        };
        let Some(bytes) = self.array_slice(kind, index) else {
            log::warn!("{} array index {} out of range", data_type, index);
            return Ok(Value::Null);
        };

        let mut reader = BinaryReader::new(bytes);
        Ok(match data_type {
            DataType::Boolean => Value::Bool(reader.read_bool()?),
            DataType::SByte => Value::Int8(reader.read_i8()?),
            DataType::Int16 => Value::Int16(reader.read_i16()?),
            DataType::Int32 => Value::Int32(reader.read_i32()?),
            DataType::Int64 => Value::Int64(reader.read_i64()?),
            DataType::Byte => Value::UInt8(reader.read_u8()?),
            DataType::UInt16 => Value::UInt16(reader.read_u16()?),
            DataType::UInt32 => Value::UInt32(reader.read_u32()?),
            DataType::UInt64 => Value::UInt64(reader.read_u64()?),
            DataType::Single => Value::Float(round_f32(reader.read_f32()?)),
            DataType::Double => Value::Double(round_f64(reader.read_f64()?)),
            DataType::Guid => Value::Guid(reader.read_struct()?),
            DataType::String => Value::String(self.inline_string(reader.read_i32()?)),
            DataType::Locale => Value::Locale(self.inline_string(reader.read_i32()?)),
            DataType::EnumChoice => Value::Enum(self.inline_string(reader.read_i32()?)),
            DataType::StrongPointer => {
                let pointer: InstancePointer = reader.read_struct()?;
                return self.resolve_strong(pointer, depth, max_depth);
            }
            DataType::WeakPointer => {
                let pointer: InstancePointer = reader.read_struct()?;
                weak_descriptor(pointer)
            }
            DataType::Reference => {
                let reference: RecordReference = reader.read_struct()?;
                if reference.is_null() {
                    Value::Reference(None)
                } else {
                    Value::Reference(Some(reference.record_id))
                }
            }
            DataType::Class => unreachable!("handled above"),
        })
    }

    fn inline_string(&self, id: i32) -> String {
        self.string(StringId::new(id)).unwrap_or("").to_string()
    }
}

/// Weak pointers model non-owning back-links; they always come back as
/// descriptors and are never resolved.
fn weak_descriptor(pointer: InstancePointer) -> Value {
    if pointer.is_null() {
        Value::WeakPointer(None)
    } else {
        Value::WeakPointer(Some(InstanceId {
            struct_index: pointer.struct_index as u32,
            instance_index: pointer.instance_index as u32,
        }))
    }
}

/// Suppress low-bit binary noise in floats.
fn round_f32(v: f32) -> f32 {
    ((v as f64 * 1e6).round() / 1e6) as f32
}

fn round_f64(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SectionCheck;
    use crate::testutil::FixtureBuilder;
    use crate::types::ValueKind;

    const INT32: u16 = DataType::Int32 as u16;
    const SINGLE: u16 = DataType::Single as u16;
    const STRING: u16 = DataType::String as u16;
    const GUID: u16 = DataType::Guid as u16;
    const CLASS: u16 = DataType::Class as u16;
    const STRONG: u16 = DataType::StrongPointer as u16;
    const WEAK: u16 = DataType::WeakPointer as u16;
    const REFERENCE: u16 = DataType::Reference as u16;

    fn guid_fixture() -> Guid {
        Guid::from_bytes([
            0x78, 0x56, 0x34, 0x12, 0xcd, 0xab, 0x01, 0xef, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd,
            0xef, 0x01,
        ])
    }

    fn fields<'a>(value: &'a Value) -> &'a [(String, Value)] {
        &value.as_struct().expect("struct value").fields
    }

    #[test]
    fn hierarchy_exposes_ancestor_properties_root_first() {
        let mut fx = FixtureBuilder::new(6);
        let (na, nb, nc) = (fx.name("A"), fx.name("B"), fx.name("C"));
        let (pa, pb, pc) = (fx.name("a_val"), fx.name("b_val"), fx.name("c_val"));

        fx.add_property(pa, 0, INT32, 0);
        fx.add_property(pb, 0, INT32, 0);
        fx.add_property(pc, 0, INT32, 0);

        fx.add_struct(na, -1, 1, 0, 4);
        fx.add_struct(nb, 0, 1, 1, 8);
        let c = fx.add_struct(nc, 1, 1, 2, 12);

        fx.add_mapping(1, c);
        let (rn, rf) = (fx.name("TheRecord"), fx.path("lib/record.xml"));
        fx.add_record(rn, rf, c as i32, guid_fixture(), 0, 12);

        fx.data.extend_from_slice(&1i32.to_le_bytes());
        fx.data.extend_from_slice(&2i32.to_le_bytes());
        fx.data.extend_from_slice(&3i32.to_le_bytes());

        let forge = DataForge::parse(fx.build()).unwrap();
        assert!(forge.section_check().is_consistent());

        let value = forge.read_record(0, 4).unwrap();
        let instance = value.as_struct().unwrap();
        assert_eq!(instance.type_name, "C");

        let names: Vec<&str> = instance.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a_val", "b_val", "c_val"]);
        assert_eq!(instance.field("a_val"), Some(&Value::Int32(1)));
        assert_eq!(instance.field("b_val"), Some(&Value::Int32(2)));
        assert_eq!(instance.field("c_val"), Some(&Value::Int32(3)));
    }

    #[test]
    fn arrays_read_from_value_pools_and_empty_is_empty() {
        let mut fx = FixtureBuilder::new(6);
        let ns = fx.name("Holder");
        let (pn, pt) = (fx.name("nums"), fx.name("tags"));

        fx.add_property(pn, 0, INT32, 1);
        fx.add_property(pt, 0, STRING, 1);
        let s = fx.add_struct(ns, -1, 2, 0, 16);

        fx.add_mapping(1, s);
        let (rn, rf) = (fx.name("Rec"), fx.path("x"));
        fx.add_record(rn, rf, s as i32, guid_fixture(), 0, 16);

        for v in [9, 10, 11, 12] {
            fx.push_pool_i32(v);
        }

        // nums: count 3 starting at pool index 1
        fx.data.extend_from_slice(&3u32.to_le_bytes());
        fx.data.extend_from_slice(&1u32.to_le_bytes());
        // tags: empty
        fx.data.extend_from_slice(&0u32.to_le_bytes());
        fx.data.extend_from_slice(&0u32.to_le_bytes());

        let forge = DataForge::parse(fx.build()).unwrap();
        let value = forge.read_record(0, 4).unwrap();
        let instance = value.as_struct().unwrap();

        assert_eq!(
            instance.field("nums").unwrap().as_array().unwrap(),
            &[Value::Int32(10), Value::Int32(11), Value::Int32(12)]
        );
        assert_eq!(instance.field("tags").unwrap().as_array().unwrap(), &[]);
    }

    #[test]
    fn out_of_range_array_elements_become_null() {
        let mut fx = FixtureBuilder::new(6);
        let ns = fx.name("Holder");
        let pn = fx.name("nums");

        fx.add_property(pn, 0, INT32, 1);
        let s = fx.add_struct(ns, -1, 1, 0, 8);
        fx.add_mapping(1, s);
        let (rn, rf) = (fx.name("Rec"), fx.path("x"));
        fx.add_record(rn, rf, s as i32, guid_fixture(), 0, 8);

        fx.push_pool_i32(5);

        fx.data.extend_from_slice(&2u32.to_le_bytes());
        fx.data.extend_from_slice(&10u32.to_le_bytes());

        let forge = DataForge::parse(fx.build()).unwrap();
        let value = forge.read_record(0, 4).unwrap();
        assert_eq!(
            value.as_struct().unwrap().field("nums").unwrap().as_array().unwrap(),
            &[Value::Null, Value::Null]
        );
    }

    #[test]
    fn self_referential_strong_pointer_stops_at_depth_bound() {
        let mut fx = FixtureBuilder::new(6);
        let ns = fx.name("Node");
        let pn = fx.name("next");

        fx.add_property(pn, 0, STRONG, 0);
        let s = fx.add_struct(ns, -1, 1, 0, 8);
        fx.add_mapping(1, s);
        let (rn, rf) = (fx.name("Loop"), fx.path("x"));
        fx.add_record(rn, rf, s as i32, guid_fixture(), 0, 8);

        // points back at itself
        fx.data.extend_from_slice(&0i32.to_le_bytes());
        fx.data.extend_from_slice(&0i32.to_le_bytes());

        let forge = DataForge::parse(fx.build()).unwrap();
        let value = forge.read_record(0, 2).unwrap();

        // depth 0 resolves, depth 1 resolves, the bound leaves a marker
        let level1 = fields(&value)[0].1.clone();
        let Value::StrongPointer(Pointer::Resolved(inner1)) = level1 else {
            panic!("expected resolved pointer at depth 0");
        };
        let level2 = fields(&inner1)[0].1.clone();
        let Value::StrongPointer(Pointer::Resolved(inner2)) = level2 else {
            panic!("expected resolved pointer at depth 1");
        };
        let level3 = fields(&inner2)[0].1.clone();
        assert_eq!(
            level3,
            Value::StrongPointer(Pointer::Unresolved(InstanceId {
                struct_index: 0,
                instance_index: 0,
            }))
        );
    }

    #[test]
    fn scalar_value_dispatch() {
        let mut fx = FixtureBuilder::new(6);
        let ns = fx.name("Misc");
        let (p1, p2, p3, p4, p5) = (
            fx.name("id"),
            fx.name("label"),
            fx.name("back"),
            fx.name("target"),
            fx.name("ratio"),
        );
        let label = fx.path("ship");

        fx.add_property(p1, 0, GUID, 0);
        fx.add_property(p2, 0, STRING, 0);
        fx.add_property(p3, 0, WEAK, 0);
        fx.add_property(p4, 0, REFERENCE, 0);
        fx.add_property(p5, 0, SINGLE, 0);
        // 16 + 4 + 8 + 20 + 4
        let s = fx.add_struct(ns, -1, 5, 0, 52);
        fx.add_mapping(1, s);
        let (rn, rf) = (fx.name("Rec"), fx.path("misc.xml"));
        fx.add_record(rn, rf, s as i32, guid_fixture(), 0, 52);

        let target = guid_fixture();
        fx.data.extend_from_slice(guid_fixture().as_bytes());
        fx.data.extend_from_slice(&label.to_le_bytes());
        fx.data.extend_from_slice(&2i32.to_le_bytes()); // weak struct
        fx.data.extend_from_slice(&7i32.to_le_bytes()); // weak instance
        fx.data.extend_from_slice(&0i32.to_le_bytes()); // reference instance
        fx.data.extend_from_slice(target.as_bytes());
        fx.data.extend_from_slice(&1.23f32.to_le_bytes());

        let forge = DataForge::parse(fx.build()).unwrap();
        let value = forge.read_record(0, 4).unwrap();
        let instance = value.as_struct().unwrap();

        let guid = instance.field("id").unwrap().as_guid().unwrap();
        assert_eq!(guid.to_string(), "12345678-abcd-ef01-2345-6789abcdef01");
        assert_eq!(instance.field("label").unwrap().as_str(), Some("ship"));
        // weak pointers stay descriptors even when the target type is bogus
        assert_eq!(
            instance.field("back"),
            Some(&Value::WeakPointer(Some(InstanceId {
                struct_index: 2,
                instance_index: 7,
            })))
        );
        assert_eq!(instance.field("target"), Some(&Value::Reference(Some(target))));
        assert_eq!(instance.field("ratio"), Some(&Value::Float(1.23)));
    }

    #[test]
    fn null_pointers_and_null_reference() {
        let mut fx = FixtureBuilder::new(6);
        let ns = fx.name("Nulls");
        let (p1, p2, p3) = (fx.name("strong"), fx.name("weak"), fx.name("reference"));

        fx.add_property(p1, 0, STRONG, 0);
        fx.add_property(p2, 0, WEAK, 0);
        fx.add_property(p3, 0, REFERENCE, 0);
        let s = fx.add_struct(ns, -1, 3, 0, 36);
        fx.add_mapping(1, s);
        let (rn, rf) = (fx.name("Rec"), fx.path("x"));
        fx.add_record(rn, rf, s as i32, guid_fixture(), 0, 36);

        fx.data.extend_from_slice(&(-1i32).to_le_bytes());
        fx.data.extend_from_slice(&(-1i32).to_le_bytes());
        fx.data.extend_from_slice(&(-1i32).to_le_bytes());
        fx.data.extend_from_slice(&(-1i32).to_le_bytes());
        fx.data.extend_from_slice(&0i32.to_le_bytes());
        fx.data.extend_from_slice(Guid::EMPTY.as_bytes());

        let forge = DataForge::parse(fx.build()).unwrap();
        let value = forge.read_record(0, 4).unwrap();
        let instance = value.as_struct().unwrap();

        assert_eq!(instance.field("strong"), Some(&Value::StrongPointer(Pointer::Null)));
        assert_eq!(instance.field("weak"), Some(&Value::WeakPointer(None)));
        assert_eq!(instance.field("reference"), Some(&Value::Reference(None)));
    }

    #[test]
    fn inline_class_consumes_declared_width() {
        let mut fx = FixtureBuilder::new(6);
        let (n_inner, n_outer) = (fx.name("Inner"), fx.name("Outer"));
        let (px, pi, pa) = (fx.name("x"), fx.name("inner"), fx.name("after"));

        fx.add_property(px, 0, INT32, 0); // index 0: Inner.x
        let inner = fx.add_struct(n_inner, -1, 1, 0, 8); // 4 used + 4 padding

        fx.add_property(pi, inner as u16, CLASS, 0); // index 1
        fx.add_property(pa, 0, INT32, 0); // index 2
        let outer = fx.add_struct(n_outer, -1, 2, 1, 12);

        fx.add_mapping(1, outer);
        let (rn, rf) = (fx.name("Rec"), fx.path("x"));
        fx.add_record(rn, rf, outer as i32, guid_fixture(), 0, 12);

        fx.data.extend_from_slice(&5i32.to_le_bytes()); // Inner.x
        fx.data.extend_from_slice(&0xDEADBEEFu32.to_le_bytes()); // padding
        fx.data.extend_from_slice(&7i32.to_le_bytes()); // after

        let forge = DataForge::parse(fx.build()).unwrap();
        let value = forge.read_record(0, 4).unwrap();
        let instance = value.as_struct().unwrap();

        let nested = instance.field("inner").unwrap().as_struct().unwrap();
        assert_eq!(nested.type_name, "Inner");
        assert_eq!(nested.field("x"), Some(&Value::Int32(5)));
        assert_eq!(instance.field("after"), Some(&Value::Int32(7)));
    }

    #[test]
    fn unknown_data_type_degrades_to_null() {
        let mut fx = FixtureBuilder::new(6);
        let ns = fx.name("Odd");
        let (p1, p2) = (fx.name("known"), fx.name("weird"));

        fx.add_property(p1, 0, INT32, 0);
        fx.add_property(p2, 0, 0x00FF, 0); // no such type code
        let s = fx.add_struct(ns, -1, 2, 0, 8);
        fx.add_mapping(1, s);
        let (rn, rf) = (fx.name("Rec"), fx.path("x"));
        fx.add_record(rn, rf, s as i32, guid_fixture(), 0, 8);

        fx.data.extend_from_slice(&42i32.to_le_bytes());
        fx.data.extend_from_slice(&[0u8; 4]);

        let forge = DataForge::parse(fx.build()).unwrap();
        let value = forge.read_record(0, 4).unwrap();
        let instance = value.as_struct().unwrap();
        assert_eq!(instance.field("known"), Some(&Value::Int32(42)));
        assert_eq!(instance.field("weird"), Some(&Value::Null));
    }

    #[test]
    fn records_address_instances_by_index() {
        let mut fx = FixtureBuilder::new(6);
        let ns = fx.name("Pair");
        let pv = fx.name("v");

        fx.add_property(pv, 0, INT32, 0);
        let s = fx.add_struct(ns, -1, 1, 0, 4);
        fx.add_mapping(2, s);

        let (r0, r1) = (fx.name("first"), fx.name("second"));
        let rf = fx.path("x");
        fx.add_record(r0, rf, s as i32, Guid::from_bytes([1; 16]), 0, 4);
        fx.add_record(r1, rf, s as i32, Guid::from_bytes([2; 16]), 1, 4);

        fx.data.extend_from_slice(&10i32.to_le_bytes());
        fx.data.extend_from_slice(&20i32.to_le_bytes());

        let forge = DataForge::parse(fx.build()).unwrap();
        let first = forge.read_record(0, 1).unwrap();
        let second = forge.read_record(1, 1).unwrap();
        assert_eq!(first.as_struct().unwrap().field("v"), Some(&Value::Int32(10)));
        assert_eq!(second.as_struct().unwrap().field("v"), Some(&Value::Int32(20)));

        let by_guid = forge
            .read_record_by_guid(&Guid::from_bytes([2; 16]), 1)
            .unwrap()
            .unwrap();
        assert_eq!(by_guid, second);
        assert!(forge
            .read_record_by_guid(&Guid::from_bytes([9; 16]), 1)
            .unwrap()
            .is_none());
    }

    #[test]
    fn data_section_mismatch_is_lenient_by_default_and_strict_on_request() {
        let mut fx = FixtureBuilder::new(6);
        let ns = fx.name("S");
        let pv = fx.name("v");
        fx.add_property(pv, 0, INT32, 0);
        let s = fx.add_struct(ns, -1, 1, 0, 12);
        fx.add_mapping(1, s);
        let (rn, rf) = (fx.name("Rec"), fx.path("x"));
        fx.add_record(rn, rf, s as i32, guid_fixture(), 0, 12);

        // 12 bytes promised, 4 delivered
        fx.data.extend_from_slice(&1i32.to_le_bytes());
        let bytes = fx.build();

        let forge = DataForge::parse(bytes.clone()).unwrap();
        assert_eq!(
            forge.section_check(),
            SectionCheck::Mismatch { expected: 12, actual: 4 }
        );
        // the truncated instance degrades instead of failing
        assert_eq!(forge.read_record(0, 1).unwrap(), Value::Null);

        assert!(matches!(
            DataForge::parse_strict(bytes),
            Err(Error::DataSectionMismatch { expected: 12, actual: 4 })
        ));
    }

    #[test]
    fn cyclic_parent_chain_fails() {
        let mut fx = FixtureBuilder::new(6);
        let (na, nb) = (fx.name("A"), fx.name("B"));
        fx.add_struct(na, 1, 0, 0, 4);
        let b = fx.add_struct(nb, 0, 0, 0, 4);
        fx.add_mapping(1, b);
        let (rn, rf) = (fx.name("Rec"), fx.path("x"));
        fx.add_record(rn, rf, b as i32, guid_fixture(), 0, 4);
        fx.data.extend_from_slice(&[0u8; 4]);

        let forge = DataForge::parse(fx.build()).unwrap();
        assert!(matches!(
            forge.struct_properties(0),
            Err(Error::CyclicHierarchy { struct_index: 0 })
        ));
        assert!(matches!(
            forge.read_record(0, 1),
            Err(Error::CyclicHierarchy { .. })
        ));
    }

    #[test]
    fn version_five_uses_one_table_for_names_and_values() {
        let mut fx = FixtureBuilder::new(5);
        let ns = fx.name("Solo");
        let pv = fx.name("label");
        let hello = fx.path("hello");

        fx.add_property(pv, 0, STRING, 0);
        let s = fx.add_struct(ns, -1, 1, 0, 4);
        fx.add_mapping(1, s);
        let (rn, rf) = (fx.name("OnlyRecord"), fx.path("a/b.xml"));
        fx.add_record(rn, rf, s as i32, guid_fixture(), 0, 4);

        fx.data.extend_from_slice(&hello.to_le_bytes());

        let forge = DataForge::parse(fx.build()).unwrap();
        assert_eq!(forge.version(), 5);
        assert_eq!(forge.struct_name(0), Some("Solo"));

        let value = forge.read_record(0, 1).unwrap();
        let instance = value.as_struct().unwrap();
        assert_eq!(instance.type_name, "Solo");
        assert_eq!(instance.field("label").unwrap().as_str(), Some("hello"));
    }

    #[test]
    fn version_four_reads_sixteen_bit_mappings() {
        let mut fx = FixtureBuilder::new(4);
        let ns = fx.name("Old");
        let pv = fx.name("v");
        fx.add_property(pv, 0, INT32, 0);
        let s = fx.add_struct(ns, -1, 1, 0, 4);
        fx.add_mapping(1, s);
        let (rn, rf) = (fx.name("Rec"), fx.path("x"));
        fx.add_record(rn, rf, s as i32, guid_fixture(), 0, 4);
        fx.data.extend_from_slice(&11i32.to_le_bytes());

        let forge = DataForge::parse(fx.build()).unwrap();
        let mapping = forge.data_mappings()[0];
        let (count, index) = (mapping.struct_count, mapping.struct_index);
        assert_eq!((count, index), (1, 0));
        assert_eq!(
            forge.read_record(0, 1).unwrap().as_struct().unwrap().field("v"),
            Some(&Value::Int32(11))
        );
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let fx = FixtureBuilder::new(7);
        assert!(matches!(
            DataForge::parse(fx.build()),
            Err(Error::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn float_noise_is_rounded_away() {
        assert_eq!(round_f32(0.1f32), 0.1f32);
        // widened noise collapses back to the decimal value
        assert_eq!(round_f64(0.300000000000004), 0.3);
        assert_eq!(round_f32(-2.5f32), -2.5f32);
    }

    #[test]
    fn search_records_is_case_insensitive_and_limited() {
        let mut fx = FixtureBuilder::new(6);
        let ns = fx.name("Vehicle");
        let s = fx.add_struct(ns, -1, 0, 0, 0);
        fx.add_mapping(3, s);

        let names = ["ANVL_Hornet", "AEGS_Avenger", "anvl_Arrow"];
        for (i, name) in names.iter().enumerate() {
            let rn = fx.name(name);
            let rf = fx.path(&format!("ships/{}.xml", name));
            fx.add_record(rn, rf, s as i32, Guid::from_bytes([i as u8 + 1; 16]), i as u16, 0);
        }

        let forge = DataForge::parse(fx.build()).unwrap();

        let all = forge.search_records("anvl", 10);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "ANVL_Hornet");
        assert_eq!(all[0].struct_type, "Vehicle");
        assert_eq!(all[0].file_path, "ships/ANVL_Hornet.xml");
        assert_eq!(all[1].name, "anvl_Arrow");

        assert_eq!(forge.search_records("anvl", 1).len(), 1);
        assert!(forge.search_records("misc", 10).is_empty());
    }

    #[test]
    fn enum_options_resolve_in_order() {
        let mut fx = FixtureBuilder::new(6);
        let ne = fx.name("Size");
        let (o1, o2) = (fx.name("Small"), fx.name("Large"));
        fx.push_pool_enum_option(o1);
        fx.push_pool_enum_option(o2);
        fx.add_enum(ne, 2, 0);

        let forge = DataForge::parse(fx.build()).unwrap();
        assert_eq!(forge.enum_name(0), Some("Size"));
        let def = forge.enum_definitions()[0];
        assert_eq!(forge.enum_options(&def), ["Small", "Large"]);
    }

    #[test]
    fn string_arrays_resolve_through_table_one() {
        let mut fx = FixtureBuilder::new(6);
        let ns = fx.name("Tagged");
        let pt = fx.name("tags");
        let (t1, t2) = (fx.path("alpha"), fx.path("beta"));

        fx.add_property(pt, 0, STRING, 1);
        let s = fx.add_struct(ns, -1, 1, 0, 8);
        fx.add_mapping(1, s);
        let (rn, rf) = (fx.name("Rec"), fx.path("x"));
        fx.add_record(rn, rf, s as i32, guid_fixture(), 0, 8);

        fx.push_pool_string(t1);
        fx.push_pool_string(t2);

        fx.data.extend_from_slice(&2u32.to_le_bytes());
        fx.data.extend_from_slice(&0u32.to_le_bytes());

        let forge = DataForge::parse(fx.build()).unwrap();
        let value = forge.read_record(0, 1).unwrap();
        assert_eq!(
            value.as_struct().unwrap().field("tags").unwrap().as_array().unwrap(),
            &[Value::String("alpha".into()), Value::String("beta".into())]
        );
    }

    #[test]
    fn class_array_elements_are_instances() {
        let mut fx = FixtureBuilder::new(6);
        let (n_item, n_bag) = (fx.name("Item"), fx.name("Bag"));
        let (pv, pi) = (fx.name("v"), fx.name("items"));

        fx.add_property(pv, 0, INT32, 0); // Item.v
        let item = fx.add_struct(n_item, -1, 1, 0, 4);

        fx.add_property(pi, item as u16, CLASS, 1); // Bag.items
        let bag = fx.add_struct(n_bag, -1, 1, 1, 8);

        // item instances first, then the bag
        fx.add_mapping(2, item);
        fx.add_mapping(1, bag);
        let (rn, rf) = (fx.name("Rec"), fx.path("x"));
        fx.add_record(rn, rf, bag as i32, guid_fixture(), 0, 8);

        fx.data.extend_from_slice(&100i32.to_le_bytes()); // item 0
        fx.data.extend_from_slice(&200i32.to_le_bytes()); // item 1
        fx.data.extend_from_slice(&2u32.to_le_bytes()); // bag.items count
        fx.data.extend_from_slice(&0u32.to_le_bytes()); // first index

        let forge = DataForge::parse(fx.build()).unwrap();
        let value = forge.read_record(0, 4).unwrap();
        let items = value.as_struct().unwrap().field("items").unwrap().as_array().unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_struct().unwrap().field("v"), Some(&Value::Int32(100)));
        assert_eq!(items[1].as_struct().unwrap().field("v"), Some(&Value::Int32(200)));
    }

    #[test]
    fn record_index_out_of_range_is_an_error() {
        let fx = FixtureBuilder::new(6);
        let forge = DataForge::parse(fx.build()).unwrap();
        assert!(matches!(
            forge.read_record(3, 1),
            Err(Error::RecordOutOfRange { index: 3, count: 0 })
        ));
    }

    #[test]
    fn pool_regions_do_not_bleed_into_each_other() {
        // A bool pool entry must not shift the int32 region it precedes.
        let mut fx = FixtureBuilder::new(6);
        let ns = fx.name("Mixed");
        let (pb, pn) = (fx.name("flags"), fx.name("nums"));

        fx.add_property(pb, 0, DataType::Boolean as u16, 1);
        fx.add_property(pn, 0, INT32, 1);
        let s = fx.add_struct(ns, -1, 2, 0, 16);
        fx.add_mapping(1, s);
        let (rn, rf) = (fx.name("Rec"), fx.path("x"));
        fx.add_record(rn, rf, s as i32, guid_fixture(), 0, 16);

        fx.pool(ValueKind::Bool).push(1);
        fx.push_pool_i32(77);

        fx.data.extend_from_slice(&1u32.to_le_bytes());
        fx.data.extend_from_slice(&0u32.to_le_bytes());
        fx.data.extend_from_slice(&1u32.to_le_bytes());
        fx.data.extend_from_slice(&0u32.to_le_bytes());

        let forge = DataForge::parse(fx.build()).unwrap();
        let value = forge.read_record(0, 1).unwrap();
        let instance = value.as_struct().unwrap();
        assert_eq!(
            instance.field("flags").unwrap().as_array().unwrap(),
            &[Value::Bool(true)]
        );
        assert_eq!(
            instance.field("nums").unwrap().as_array().unwrap(),
            &[Value::Int32(77)]
        );
    }
}
