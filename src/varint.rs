//! Base-128 varints and the zig-zag transform for signed integers.
//!
//! A varint carries 7 data bits per byte, low-order group first; the high bit of
//! every byte except the last is the continuation flag. A `u64` never needs more
//! than [`MAX_VARINT_LEN`] bytes.

use crate::codec::CodecError;

/// Longest legal varint (64 bits / 7 bits per byte, rounded up).
pub const MAX_VARINT_LEN: usize = 10;

/// Append the varint encoding of `value` to `out`.
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Varint encoding of `value` in a fresh buffer.
pub fn encode_varint_to_vec(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(value));
    encode_varint(value, &mut out);
    out
}

/// Number of bytes `encode_varint` emits for `value` (1..=10).
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Decode one varint from the front of `buf`, returning `(value, bytes_consumed)`.
///
/// A stream that ends before the terminating byte is [`CodecError::TruncatedInput`].
/// More than ten bytes, or a tenth byte carrying bits above bit 63, is
/// [`CodecError::MalformedVarint`].
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), CodecError> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().enumerate() {
        // The tenth byte may only contribute bit 63 and must terminate.
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(CodecError::MalformedVarint);
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(CodecError::TruncatedInput {
        needed: buf.len() + 1,
        remaining: buf.len(),
    })
}

/// Zig-zag map a signed 64-bit value so small magnitudes stay small: 0, -1, 1, -2 → 0, 1, 2, 3.
pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
pub fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

pub fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

pub fn zigzag_decode32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_known_values() {
        assert_eq!(encode_varint_to_vec(0), vec![0x00]);
        assert_eq!(encode_varint_to_vec(1), vec![0x01]);
        assert_eq!(encode_varint_to_vec(127), vec![0x7f]);
        assert_eq!(encode_varint_to_vec(128), vec![0x80, 0x01]);
        assert_eq!(encode_varint_to_vec(300), vec![0xac, 0x02]);
        assert_eq!(encode_varint_to_vec(u64::MAX).len(), MAX_VARINT_LEN);
    }

    #[test]
    fn encoded_len_matches_encoding() {
        for v in [0u64, 1, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            assert_eq!(encoded_len(v), encode_varint_to_vec(v).len(), "value {}", v);
        }
    }

    #[test]
    fn decode_stops_at_terminator() {
        assert_eq!(decode_varint(&[0xac, 0x02, 0xff]), Ok((300, 2)));
        let max = encode_varint_to_vec(u64::MAX);
        assert_eq!(decode_varint(&max), Ok((u64::MAX, 10)));
    }

    #[test]
    fn decode_truncated_is_truncated_input() {
        assert_eq!(
            decode_varint(&[0x80, 0x80]),
            Err(CodecError::TruncatedInput { needed: 3, remaining: 2 })
        );
        assert!(matches!(decode_varint(&[]), Err(CodecError::TruncatedInput { .. })));
    }

    #[test]
    fn decode_rejects_overlong_and_overflowing() {
        let overlong = [0x80u8; 11];
        assert_eq!(decode_varint(&overlong), Err(CodecError::MalformedVarint));
        let mut overflow = vec![0xffu8; 9];
        overflow.push(0x02);
        assert_eq!(decode_varint(&overflow), Err(CodecError::MalformedVarint));
    }

    #[test]
    fn zigzag_small_magnitudes() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(i64::MIN), u64::MAX);
        assert_eq!(zigzag_decode(u64::MAX), i64::MIN);
        assert_eq!(zigzag_encode32(i32::MIN), u32::MAX);
        assert_eq!(zigzag_decode32(3), -2);
    }
}
