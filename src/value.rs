//! Runtime values for encoding/decoding (codec representation).

use crate::reader::RawValue;
use crate::record::Record;
use crate::schema::ValueKind;
use crate::varint::{zigzag_decode, zigzag_decode32, zigzag_encode, zigzag_encode32};
use crate::writer::FieldWriter;

/// A single field value (one element of a repeated field, or a singular field).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    Bool(bool),
    Enum(i32),
    F32(f32),
    F64(f64),
    /// Raw string bytes. Not validated as UTF-8 on the wire path.
    String(Vec<u8>),
    Bytes(Vec<u8>),
    Message(Record),
}

impl Value {
    /// The zero value of `kind`: 0, `false`, empty string/bytes, enum 0, empty message.
    pub fn zero_for(kind: &ValueKind) -> Value {
        match kind {
            ValueKind::Int32 | ValueKind::SFixed32 => Value::I32(0),
            ValueKind::Int64 | ValueKind::SFixed64 => Value::I64(0),
            ValueKind::UInt32 | ValueKind::Fixed32 => Value::U32(0),
            ValueKind::UInt64 | ValueKind::Fixed64 => Value::U64(0),
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Enum => Value::Enum(0),
            ValueKind::Float => Value::F32(0.0),
            ValueKind::Double => Value::F64(0.0),
            ValueKind::String => Value::String(Vec::new()),
            ValueKind::Bytes => Value::Bytes(Vec::new()),
            ValueKind::Message(_) => Value::Message(Record::new()),
        }
    }

    /// True for the type's zero value. Floats compare by bits, so `-0.0` is not zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::I32(x) | Value::Enum(x) => *x == 0,
            Value::I64(x) => *x == 0,
            Value::U32(x) => *x == 0,
            Value::U64(x) => *x == 0,
            Value::Bool(x) => !*x,
            Value::F32(x) => x.to_bits() == 0,
            Value::F64(x) => x.to_bits() == 0,
            Value::String(b) | Value::Bytes(b) => b.is_empty(),
            Value::Message(r) => r.is_empty(),
        }
    }

    /// Whether this value can be stored in a field of `kind`.
    pub fn fits(&self, kind: &ValueKind) -> bool {
        matches!(
            (self, kind),
            (Value::I32(_), ValueKind::Int32 | ValueKind::SFixed32)
                | (Value::I64(_), ValueKind::Int64 | ValueKind::SFixed64)
                | (Value::U32(_), ValueKind::UInt32 | ValueKind::Fixed32)
                | (Value::U64(_), ValueKind::UInt64 | ValueKind::Fixed64)
                | (Value::Bool(_), ValueKind::Bool)
                | (Value::Enum(_), ValueKind::Enum)
                | (Value::F32(_), ValueKind::Float)
                | (Value::F64(_), ValueKind::Double)
                | (Value::String(_), ValueKind::String)
                | (Value::Bytes(_), ValueKind::Bytes)
                | (Value::Message(_), ValueKind::Message(_))
        )
    }

    /// Interpret a raw wire value as a scalar of `kind`.
    ///
    /// `None` when the wire type does not carry `kind`, and always for message kinds,
    /// which need the codec to recurse. 32-bit kinds truncate the 64-bit varint.
    pub fn from_raw(kind: &ValueKind, raw: RawValue<'_>) -> Option<Value> {
        let v = match (kind, raw) {
            (ValueKind::Int32, RawValue::Varint(v)) => Value::I32(zigzag_decode32(v as u32)),
            (ValueKind::Int64, RawValue::Varint(v)) => Value::I64(zigzag_decode(v)),
            (ValueKind::UInt32, RawValue::Varint(v)) => Value::U32(v as u32),
            (ValueKind::UInt64, RawValue::Varint(v)) => Value::U64(v),
            (ValueKind::Bool, RawValue::Varint(v)) => Value::Bool(v != 0),
            (ValueKind::Enum, RawValue::Varint(v)) => Value::Enum(v as i32),
            (ValueKind::Fixed32, RawValue::Fixed32(v)) => Value::U32(v),
            (ValueKind::SFixed32, RawValue::Fixed32(v)) => Value::I32(v as i32),
            (ValueKind::Float, RawValue::Fixed32(v)) => Value::F32(f32::from_bits(v)),
            (ValueKind::Fixed64, RawValue::Fixed64(v)) => Value::U64(v),
            (ValueKind::SFixed64, RawValue::Fixed64(v)) => Value::I64(v as i64),
            (ValueKind::Double, RawValue::Fixed64(v)) => Value::F64(f64::from_bits(v)),
            (ValueKind::String, RawValue::LengthDelimited(b)) => Value::String(b.to_vec()),
            (ValueKind::Bytes, RawValue::LengthDelimited(b)) => Value::Bytes(b.to_vec()),
            _ => return None,
        };
        Some(v)
    }

    /// Write the untagged encoding of this value as `kind`. Returns `false`, writing
    /// nothing, when the value does not fit the kind or the kind is a message.
    pub fn write_plain(&self, kind: &ValueKind, w: &mut FieldWriter) -> bool {
        match (kind, self) {
            (ValueKind::Int32, Value::I32(x)) => w.write_varint(u64::from(zigzag_encode32(*x))),
            (ValueKind::Int64, Value::I64(x)) => w.write_varint(zigzag_encode(*x)),
            (ValueKind::UInt32, Value::U32(x)) => w.write_varint(u64::from(*x)),
            (ValueKind::UInt64, Value::U64(x)) => w.write_varint(*x),
            (ValueKind::Bool, Value::Bool(b)) => w.write_varint(u64::from(*b)),
            // Negative enums are sign-extended to ten bytes.
            (ValueKind::Enum, Value::Enum(x)) => w.write_varint(*x as i64 as u64),
            (ValueKind::Fixed32, Value::U32(x)) => w.write_fixed32(*x),
            (ValueKind::SFixed32, Value::I32(x)) => w.write_fixed32(*x as u32),
            (ValueKind::Float, Value::F32(x)) => w.write_fixed32(x.to_bits()),
            (ValueKind::Fixed64, Value::U64(x)) => w.write_fixed64(*x),
            (ValueKind::SFixed64, Value::I64(x)) => w.write_fixed64(*x as u64),
            (ValueKind::Double, Value::F64(x)) => w.write_fixed64(x.to_bits()),
            (ValueKind::String, Value::String(b)) | (ValueKind::Bytes, Value::Bytes(b)) => {
                w.write_length_delimited(b)
            }
            _ => return false,
        }
        true
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U32(x) => Some(*x as u64),
            Value::U64(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(x) | Value::Enum(x) => Some(*x as i64),
            Value::I64(x) => Some(*x),
            Value::U32(x) => Some(*x as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(x) => Some(*x as f64),
            Value::F64(x) => Some(*x),
            _ => None,
        }
    }

    /// String contents, if this is a string holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Raw payload of a string or bytes value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(b) | Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Record> {
        match self {
            Value::Message(r) => Some(r),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into_bytes())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Message(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_match_kind() {
        for kind in [
            ValueKind::Int32,
            ValueKind::UInt64,
            ValueKind::Bool,
            ValueKind::Enum,
            ValueKind::Double,
            ValueKind::String,
            ValueKind::Bytes,
            ValueKind::Message("M".into()),
        ] {
            let zero = Value::zero_for(&kind);
            assert!(zero.is_zero(), "{} zero", kind);
            assert!(zero.fits(&kind), "{} fits", kind);
        }
        assert!(!Value::F64(-0.0).is_zero());
        assert!(!Value::from("x").is_zero());
    }

    #[test]
    fn strings_keep_raw_bytes() {
        let v = Value::String(vec![0xff, 0xfe]);
        assert_eq!(v.as_str(), None);
        assert_eq!(v.as_bytes(), Some(&[0xff, 0xfe][..]));
        assert_eq!(Value::from("hé").as_str(), Some("hé"));
    }

    #[test]
    fn plain_encoding_round_trips_through_raw() {
        let cases = [
            (ValueKind::Int32, Value::I32(-3)),
            (ValueKind::Int64, Value::I64(i64::MIN)),
            (ValueKind::UInt32, Value::U32(u32::MAX)),
            (ValueKind::Enum, Value::Enum(-1)),
            (ValueKind::SFixed32, Value::I32(-7)),
            (ValueKind::Double, Value::F64(1.5)),
            (ValueKind::Bytes, Value::Bytes(vec![0, 1, 2])),
        ];
        for (kind, value) in cases {
            let mut w = FieldWriter::new();
            assert!(value.write_plain(&kind, &mut w));
            let bytes = w.into_inner();
            let mut r = crate::reader::FieldReader::new(&bytes);
            let raw = r.read_value(kind.wire_type()).expect("read");
            assert_eq!(Value::from_raw(&kind, raw), Some(value), "{}", kind);
            assert!(!r.has_remaining());
        }
    }

    #[test]
    fn signed_int32_is_zigzag() {
        let mut w = FieldWriter::new();
        assert!(Value::I32(-1).write_plain(&ValueKind::Int32, &mut w));
        assert_eq!(w.as_slice(), &[0x01]);
        let mut w = FieldWriter::new();
        assert!(Value::Enum(-1).write_plain(&ValueKind::Enum, &mut w));
        assert_eq!(w.len(), 10);
    }

    #[test]
    fn from_raw_rejects_wrong_wire_type() {
        assert_eq!(Value::from_raw(&ValueKind::Int32, RawValue::Fixed32(1)), None);
        assert_eq!(Value::from_raw(&ValueKind::Message("M".into()), RawValue::LengthDelimited(&[])), None);
        let mut w = FieldWriter::new();
        assert!(!Value::Bool(true).write_plain(&ValueKind::Int32, &mut w));
        assert!(w.is_empty());
    }

    #[test]
    fn fits_rejects_wrong_kind() {
        assert!(!Value::Bool(true).fits(&ValueKind::Int32));
        assert!(!Value::I32(1).fits(&ValueKind::Int64));
        assert!(Value::I32(1).fits(&ValueKind::SFixed32));
    }
}
