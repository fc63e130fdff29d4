//! Deserialized value graphs.
//!
//! [`Value`] is an owned, recursive tagged union with one variant per wire
//! data type, so consumers match exhaustively instead of probing stringly
//! typed maps. Values are produced per read and never mutated in place.

use stribog_common::Guid;

/// Identifies an instance without resolving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct InstanceId {
    /// Struct type index.
    pub struct_index: u32,
    /// Instance index within the type's data block.
    pub instance_index: u32,
}

/// A strong pointer after deserialization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub enum Pointer {
    /// The wire cell was (-1, -1).
    Null,
    /// Resolved into the pointed-to instance.
    Resolved(Box<Value>),
    /// Left opaque because the depth budget ran out.
    Unresolved(InstanceId),
}

/// A deserialized struct instance: type name plus fields in hierarchy order
/// (ancestors root-first, then the struct's own properties).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct StructValue {
    /// Name of the struct type.
    pub type_name: String,
    /// Ordered (property name, value) pairs.
    pub fields: Vec<(String, Value)>,
}

impl StructValue {
    /// Look up a field by property name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }
}

/// Any deserialized forge value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub enum Value {
    /// Missing, degenerate, or depth-bounded value.
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    /// 32-bit float, rounded to 1e-6 on read.
    Float(f32),
    /// 64-bit float, rounded to 1e-6 on read.
    Double(f64),
    String(String),
    Locale(String),
    Enum(String),
    Guid(Guid),
    /// Nested inline struct.
    Struct(StructValue),
    /// Owning pointer, resolved while depth budget remains.
    StrongPointer(Pointer),
    /// Non-owning back-link; always a descriptor, by design never resolved.
    WeakPointer(Option<InstanceId>),
    /// Cross-file reference; only the target GUID is known locally.
    Reference(Option<Guid>),
    /// Array property.
    Array(Vec<Value>),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(*v as i64),
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt8(v) => Some(*v as u64),
            Value::UInt16(v) => Some(*v as u64),
            Value::UInt32(v) => Some(*v as u64),
            Value::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Locale(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_guid(&self) -> Option<Guid> {
        match self {
            Value::Guid(g) => Some(*g),
            _ => None,
        }
    }

    #[inline]
    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            Value::StrongPointer(Pointer::Resolved(inner)) => inner.as_struct(),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt8(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(s) | Value::Locale(s) | Value::Enum(s) => write!(f, "{}", s),
            Value::Guid(g) => write!(f, "{}", g),
            Value::Struct(s) => write!(f, "{}{{{} fields}}", s.type_name, s.fields.len()),
            Value::StrongPointer(Pointer::Null) => write!(f, "strong(null)"),
            Value::StrongPointer(Pointer::Resolved(inner)) => write!(f, "strong({})", inner),
            Value::StrongPointer(Pointer::Unresolved(id)) => {
                write!(f, "strong(unresolved {}:{})", id.struct_index, id.instance_index)
            }
            Value::WeakPointer(Some(id)) => {
                write!(f, "weak({}:{})", id.struct_index, id.instance_index)
            }
            Value::WeakPointer(None) => write!(f, "weak(null)"),
            Value::Reference(Some(guid)) => write!(f, "ref({})", guid),
            Value::Reference(None) => write!(f, "ref(null)"),
            Value::Array(items) => write!(f, "array[{}]", items.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        assert_eq!(Value::Int16(-3).as_i64(), Some(-3));
        assert_eq!(Value::UInt8(7).as_u64(), Some(7));
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::String("x".into()).as_str(), Some("x"));
        assert_eq!(Value::Null.as_i64(), None);
        assert!(Value::Null.is_null());
    }

    #[test]
    fn struct_field_lookup() {
        let s = StructValue {
            type_name: "Thing".into(),
            fields: vec![
                ("first".into(), Value::Bool(true)),
                ("second".into(), Value::Int32(9)),
            ],
        };
        assert_eq!(s.field("second"), Some(&Value::Int32(9)));
        assert_eq!(s.field("missing"), None);
    }

    #[test]
    fn resolved_pointer_exposes_struct() {
        let inner = Value::Struct(StructValue {
            type_name: "Inner".into(),
            fields: vec![],
        });
        let ptr = Value::StrongPointer(Pointer::Resolved(Box::new(inner)));
        assert_eq!(ptr.as_struct().unwrap().type_name, "Inner");
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Array(vec![Value::Null]).to_string(), "array[1]");
        assert_eq!(
            Value::WeakPointer(Some(InstanceId { struct_index: 2, instance_index: 5 })).to_string(),
            "weak(2:5)"
        );
    }
}
