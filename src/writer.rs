//! Append-only output buffer mirroring [`FieldReader`](crate::reader::FieldReader).

use crate::tag::{encode_tag, WireType};
use crate::varint::encode_varint;
use byteorder::{ByteOrder, LittleEndian};

#[derive(Debug, Default, Clone)]
pub struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    pub fn new() -> Self {
        FieldWriter { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        FieldWriter { buf: Vec::with_capacity(capacity) }
    }

    pub fn write_varint(&mut self, value: u64) {
        encode_varint(value, &mut self.buf);
    }

    pub fn write_fixed32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_fixed64(&mut self, value: u64) {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u64(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    /// Write `bytes` prefixed with its varint length.
    pub fn write_length_delimited(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    /// Write a tag. Panics on an out-of-range field number (see [`encode_tag`]).
    pub fn write_tag(&mut self, field_number: u32, wire_type: WireType) {
        self.write_varint(encode_tag(field_number, wire_type));
    }

    /// Append already-encoded bytes verbatim.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
