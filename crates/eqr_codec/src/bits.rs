//! MSB-first bit cursor over a borrowed byte buffer.

use crate::error::{DecodeError, Result};

/// Sequential bit reader. Reads never move the cursor past `len * 8`.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_offset(bytes, 0)
    }

    /// Starts `offset_bits` into the buffer, clamped to the buffer length.
    pub fn with_offset(bytes: &'a [u8], offset_bits: usize) -> Self {
        let offset = offset_bits.min(bytes.len() * 8);
        Self {
            bytes,
            byte_pos: offset / 8,
            bit_pos: (offset % 8) as u8,
        }
    }

    /// Absolute bit position of the cursor.
    pub fn position(&self) -> usize {
        self.byte_pos * 8 + self.bit_pos as usize
    }

    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Byte-granular check: true while the cursor's byte is inside the buffer.
    pub fn has_remaining(&self) -> bool {
        self.byte_pos < self.bytes.len()
    }

    pub fn read_bit(&mut self) -> Result<u32> {
        let byte = *self
            .bytes
            .get(self.byte_pos)
            .ok_or(DecodeError::EndOfData(self.position()))?;
        let bit = (byte >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
        Ok(bit as u32)
    }

    /// Reads `n` bits (1..=32) MSB-first. A failed read leaves the cursor
    /// wherever the failing bit was.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        if !(1..=32).contains(&n) {
            return Err(DecodeError::InvalidWidth(n));
        }
        let mut value: u32 = 0;
        for _ in 0..n {
            value = (value << 1) | self.read_bit()?;
        }
        Ok(value)
    }

    /// Reads `n` bits and restores the cursor, whether or not the read succeeded.
    pub fn peek_bits(&mut self, n: u32) -> Result<u32> {
        let saved = (self.byte_pos, self.bit_pos);
        let value = self.read_bits(n);
        self.byte_pos = saved.0;
        self.bit_pos = saved.1;
        value
    }

    pub fn skip_bits(&mut self, n: u32) -> Result<()> {
        for _ in 0..n {
            self.read_bit()?;
        }
        Ok(())
    }

    /// `peek_bits(n) == expected`, treating a short read as a mismatch.
    pub fn next_is(&mut self, n: u32, expected: u32) -> bool {
        self.peek_bits(n).map(|v| v == expected).unwrap_or(false)
    }
}
