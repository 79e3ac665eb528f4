//! Field tags: `(field_number << 3) | wire_type`, written as a varint before every value.

use crate::codec::CodecError;
use std::fmt;

/// Largest legal field number (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// How a field's value is framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl WireType {
    /// Map the low three tag bits to a wire type. Group markers (3, 4) are not supported.
    pub fn from_bits(bits: u8) -> Result<Self, CodecError> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(CodecError::InvalidWireType(other)),
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length-delimited",
            WireType::Fixed32 => "fixed32",
        };
        f.write_str(s)
    }
}

/// True when `n` may be assigned to a field in a schema.
pub fn is_valid_field_number(n: u32) -> bool {
    (1..=MAX_FIELD_NUMBER).contains(&n)
}

/// Build the tag value for a field occurrence.
///
/// # Panics
///
/// If `field_number` is outside `1..=MAX_FIELD_NUMBER`. Schemas are checked at
/// [`SchemaRegistry::resolve`](crate::schema::SchemaRegistry::resolve), so reaching
/// this is a programming error.
pub fn encode_tag(field_number: u32, wire_type: WireType) -> u64 {
    assert!(
        is_valid_field_number(field_number),
        "field number {} outside 1..={}",
        field_number,
        MAX_FIELD_NUMBER
    );
    (u64::from(field_number) << 3) | u64::from(wire_type.bits())
}

/// Split a tag value into `(field_number, wire_type)`.
///
/// The field number is returned as-is even when out of the legal range (0, or above
/// 2^29 - 1) so the caller can skip the field as unknown; numbers that do not fit in
/// a `u32` come back as 0.
pub fn decode_tag(value: u64) -> Result<(u32, WireType), CodecError> {
    let wire_type = WireType::from_bits((value & 0x7) as u8)?;
    let field_number = u32::try_from(value >> 3).unwrap_or(0);
    Ok((field_number, wire_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_layout() {
        assert_eq!(encode_tag(1, WireType::LengthDelimited), 0x0a);
        assert_eq!(encode_tag(2, WireType::Varint), 0x10);
        assert_eq!(decode_tag(0x0a), Ok((1, WireType::LengthDelimited)));
        assert_eq!(decode_tag(0x1d), Ok((3, WireType::Fixed32)));
    }

    #[test]
    fn decode_rejects_group_and_reserved_bits() {
        for bits in [3u64, 4, 6, 7] {
            assert_eq!(decode_tag(8 | bits), Err(CodecError::InvalidWireType(bits as u8)));
        }
    }

    #[test]
    fn out_of_range_numbers_decode_opaquely() {
        assert_eq!(decode_tag(0), Ok((0, WireType::Varint)));
        let big = (u64::from(MAX_FIELD_NUMBER) + 1) << 3;
        assert_eq!(decode_tag(big), Ok((MAX_FIELD_NUMBER + 1, WireType::Varint)));
        assert_eq!(decode_tag(u64::MAX & !0x7), Ok((0, WireType::Varint)));
    }

    #[test]
    #[should_panic]
    fn encode_rejects_field_zero() {
        encode_tag(0, WireType::Varint);
    }

    #[test]
    fn max_field_number_encodes() {
        let tag = encode_tag(MAX_FIELD_NUMBER, WireType::Fixed64);
        assert_eq!(decode_tag(tag), Ok((MAX_FIELD_NUMBER, WireType::Fixed64)));
    }
}
