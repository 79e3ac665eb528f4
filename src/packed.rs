//! Packed and unpacked repeated scalars.
//!
//! A packed field is one length-delimited run of concatenated untagged values; an
//! unpacked field repeats tag + value per element. Which form is written is fixed by
//! the field's [`Cardinality`](crate::schema::Cardinality). Readers accept either form
//! for any numeric, bool or enum field.

use crate::codec::CodecError;
use crate::reader::FieldReader;
use crate::schema::ValueKind;
use crate::value::Value;
use crate::writer::FieldWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatedEncoding {
    Packed,
    Unpacked,
}

/// Whether a length-delimited occurrence of a repeated `kind` field is a packed run.
pub fn accepts_packed(kind: &ValueKind) -> bool {
    kind.is_packable()
}

/// Write the payload of a packed run (without tag or length prefix).
///
/// Returns `false` when an element does not fit `kind`; the writer then holds a
/// partial run and must be discarded.
pub fn write_packed(w: &mut FieldWriter, kind: &ValueKind, values: &[Value]) -> bool {
    values.iter().all(|v| v.write_plain(kind, w))
}

/// Decode a packed run payload, appending each element to `out`.
///
/// A run that ends inside an element fails with `TruncatedInput`.
pub fn read_packed(payload: &[u8], kind: &ValueKind, out: &mut Vec<Value>) -> Result<(), CodecError> {
    let wire_type = kind.wire_type();
    let mut r = FieldReader::new(payload);
    while r.has_remaining() {
        let raw = r.read_value(wire_type)?;
        if let Some(v) = Value::from_raw(kind, raw) {
            out.push(v);
        }
    }
    Ok(())
}
