//! Elias-Delta integers, unsigned and zig-zag signed.
//!
//! Unsigned codes cover v >= 1. Signed values carry a leading flag bit:
//! `0` is the value zero, `1` is followed by the Elias-Delta code of the
//! zig-zag mapped value.

use crate::bits::BitReader;
use crate::error::{DecodeError, Result};

/// Longest length prefix whose announced bit count can still fit a u64.
const MAX_PREFIX_ZEROS: u32 = 6;

pub fn decode_unsigned(reader: &mut BitReader<'_>) -> Result<u64> {
    let mut zeros = 0u32;
    while reader.read_bit()? == 0 {
        zeros += 1;
        if zeros > MAX_PREFIX_ZEROS {
            return Err(DecodeError::IntegerOverflow(1u64 << zeros));
        }
    }

    let mut len: u64 = 1;
    for _ in 0..zeros {
        len = (len << 1) | reader.read_bit()? as u64;
    }
    if len > 64 {
        return Err(DecodeError::IntegerOverflow(len));
    }

    let mut value: u64 = 1;
    for _ in 1..len {
        value = (value << 1) | reader.read_bit()? as u64;
    }
    Ok(value)
}

pub fn decode_signed(reader: &mut BitReader<'_>) -> Result<i64> {
    if reader.read_bit()? == 0 {
        return Ok(0);
    }
    let zigzag = decode_unsigned(reader)?;
    Ok(unzigzag(zigzag))
}

pub fn zigzag(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

pub fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{elias_delta_encode, elias_delta_encode_signed, BitWriter};

    fn unsigned_roundtrip(v: u64) -> u64 {
        let mut w = BitWriter::new();
        elias_delta_encode(&mut w, v);
        let bytes = w.into_bytes();
        decode_unsigned(&mut BitReader::new(&bytes)).unwrap()
    }

    fn signed_roundtrip(v: i64) -> i64 {
        let mut w = BitWriter::new();
        elias_delta_encode_signed(&mut w, v);
        let bytes = w.into_bytes();
        decode_signed(&mut BitReader::new(&bytes)).unwrap()
    }

    #[test]
    fn known_codes() {
        // 1 -> "1", 2 -> "0100", 17 -> "001010001"
        let mut r = BitReader::new(&[0b1000_0000]);
        assert_eq!(decode_unsigned(&mut r).unwrap(), 1);
        assert_eq!(r.position(), 1);

        let mut r = BitReader::new(&[0b0100_0000]);
        assert_eq!(decode_unsigned(&mut r).unwrap(), 2);
        assert_eq!(r.position(), 4);

        let mut r = BitReader::new(&[0b0010_1000, 0b1000_0000]);
        assert_eq!(decode_unsigned(&mut r).unwrap(), 17);
        assert_eq!(r.position(), 9);
    }

    #[test]
    fn unsigned_roundtrip_dense_low_range() {
        for v in 1..5_000u64 {
            assert_eq!(unsigned_roundtrip(v), v);
        }
    }

    #[test]
    fn unsigned_roundtrip_strided_to_2_pow_20() {
        let mut v = 1u64;
        while v < (1 << 20) {
            assert_eq!(unsigned_roundtrip(v), v);
            v += 997;
        }
        assert_eq!(unsigned_roundtrip((1 << 20) - 1), (1 << 20) - 1);
    }

    #[test]
    fn unsigned_extremes() {
        assert_eq!(unsigned_roundtrip(u64::MAX), u64::MAX);
        assert_eq!(unsigned_roundtrip(1 << 63), 1 << 63);
    }

    #[test]
    fn signed_roundtrip_range() {
        let mut v: i64 = -(1 << 19);
        while v < (1 << 19) {
            assert_eq!(signed_roundtrip(v), v);
            v += 331;
        }
        for v in -300..300 {
            assert_eq!(signed_roundtrip(v), v);
        }
    }

    #[test]
    fn zero_uses_flag_path() {
        let mut w = BitWriter::new();
        elias_delta_encode_signed(&mut w, 0);
        assert_eq!(w.bit_len(), 1);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(decode_signed(&mut r).unwrap(), 0);
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn zigzag_interleaves() {
        assert_eq!(zigzag(0), 0);
        assert_eq!(zigzag(-1), 1);
        assert_eq!(zigzag(1), 2);
        assert_eq!(zigzag(-2), 3);
        assert_eq!(unzigzag(3), -2);
        assert_eq!(unzigzag(4), 2);
    }

    #[test]
    fn all_zero_stream_overflows_instead_of_looping() {
        let mut r = BitReader::new(&[0u8; 4]);
        assert!(matches!(
            decode_unsigned(&mut r),
            Err(DecodeError::IntegerOverflow(_))
        ));
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        // six zeros, then 1 + 111111 => length 127
        let mut r = BitReader::new(&[0b0000_0011, 0b1111_1100]);
        assert_eq!(decode_unsigned(&mut r), Err(DecodeError::IntegerOverflow(127)));
    }

    #[test]
    fn truncated_code_is_end_of_data() {
        let mut r = BitReader::new(&[0b0010_1000]);
        assert!(decode_unsigned(&mut r).unwrap_err().is_end_of_data());
    }
}
