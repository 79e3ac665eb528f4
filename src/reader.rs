//! Sequential, zero-copy read cursor over an encoded message.
//!
//! [`FieldReader`] holds a slice and a position and never seeks backward. Every read
//! that would run past the end of the slice fails with [`CodecError::TruncatedInput`];
//! length-delimited payloads are returned as sub-slices of the input.

use crate::codec::CodecError;
use crate::tag::{decode_tag, WireType};
use crate::varint::decode_varint;
use byteorder::{ByteOrder, LittleEndian};

/// One field value as framed on the wire, borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawValue<'a> {
    Varint(u64),
    Fixed64(u64),
    LengthDelimited(&'a [u8]),
    Fixed32(u32),
}

impl RawValue<'_> {
    pub fn wire_type(&self) -> WireType {
        match self {
            RawValue::Varint(_) => WireType::Varint,
            RawValue::Fixed64(_) => WireType::Fixed64,
            RawValue::LengthDelimited(_) => WireType::LengthDelimited,
            RawValue::Fixed32(_) => WireType::Fixed32,
        }
    }
}

/// A tag and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawField<'a> {
    pub number: u32,
    pub value: RawValue<'a>,
}

pub struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        FieldReader { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Unread tail of the input.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn has_remaining(&self) -> bool {
        self.pos < self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.data.len() - self.pos;
        if n > remaining {
            return Err(CodecError::TruncatedInput { needed: n, remaining });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        let (value, consumed) = decode_varint(self.remaining())?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn read_fixed32(&mut self) -> Result<u32, CodecError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_fixed64(&mut self) -> Result<u64, CodecError> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    /// Read a varint length, then that many bytes.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_varint()?;
        let remaining = self.data.len() - self.pos;
        let len = usize::try_from(len).map_err(|_| CodecError::TruncatedInput {
            needed: usize::MAX,
            remaining,
        })?;
        self.take(len)
    }

    pub fn read_tag(&mut self) -> Result<(u32, WireType), CodecError> {
        decode_tag(self.read_varint()?)
    }

    /// Read the value for a tag that has already been consumed.
    pub fn read_value(&mut self, wire_type: WireType) -> Result<RawValue<'a>, CodecError> {
        Ok(match wire_type {
            WireType::Varint => RawValue::Varint(self.read_varint()?),
            WireType::Fixed64 => RawValue::Fixed64(self.read_fixed64()?),
            WireType::LengthDelimited => RawValue::LengthDelimited(self.read_length_delimited()?),
            WireType::Fixed32 => RawValue::Fixed32(self.read_fixed32()?),
        })
    }

    /// Read one complete field occurrence: tag, then the value its wire type implies.
    pub fn read_field(&mut self) -> Result<RawField<'a>, CodecError> {
        let (number, wire_type) = self.read_tag()?;
        let value = self.read_value(wire_type)?;
        Ok(RawField { number, value })
    }

    /// Advance past one value of the given wire type without interpreting it.
    pub fn skip_value(&mut self, wire_type: WireType) -> Result<(), CodecError> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::LengthDelimited => {
                self.read_length_delimited()?;
            }
            WireType::Fixed32 => {
                self.take(4)?;
            }
        }
        Ok(())
    }
}
