//! Authoring side of the payload format.
//!
//! `PayloadBuilder` emits exactly what `Decoder` consumes. Fixtures and
//! tooling use it to describe payloads structurally instead of as hex dumps.

use crate::elias::zigzag;
use crate::ir::Tag;

/// 7-bit / 8-bit string terminator.
pub const STRING_END: u32 = 0b0000011;

/// MSB-first bit sink.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    /// Writes the low `n` bits of `value`, most significant first.
    pub fn push_bits(&mut self, value: u64, n: u32) {
        for i in (0..n).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
    }

    /// Bytes with the final partial byte zero-padded.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Elias-Delta code of `v`. Panics on 0, which has no unsigned code.
pub fn elias_delta_encode(w: &mut BitWriter, v: u64) {
    assert!(v >= 1, "elias-delta has no code for 0");
    let len = 64 - v.leading_zeros();
    let len_bits = 32 - len.leading_zeros();
    for _ in 1..len_bits {
        w.push_bit(false);
    }
    w.push_bits(len as u64, len_bits);
    w.push_bits(v, len - 1);
}

pub fn elias_delta_encode_signed(w: &mut BitWriter, v: i64) {
    if v == 0 {
        w.push_bit(false);
        return;
    }
    w.push_bit(true);
    elias_delta_encode(w, zigzag(v));
}

/// One token of an encoded expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprToken {
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    Equals,
    LParen,
    RParen,
    /// Extended operator code other than the parentheses.
    Extended(u32),
    Name(String),
    /// Sign bit plus unsigned magnitude; the magnitude must be non-zero.
    Int(i64),
    /// Boolean constant. Decoders currently drop it.
    Bool,
}

impl ExprToken {
    pub fn name(s: &str) -> Self {
        ExprToken::Name(s.to_string())
    }
}

/// Builds a complete payload, phase by phase.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    w: BitWriter,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadBuilder {
    /// Starts with the 22-bit opaque format header, all zero.
    pub fn new() -> Self {
        Self::with_header(0, 22)
    }

    pub fn with_header(value: u64, bits: u32) -> Self {
        let mut w = BitWriter::new();
        w.push_bits(value, bits);
        Self { w }
    }

    pub fn bit_len(&self) -> usize {
        self.w.bit_len()
    }

    /// Raw access for fixtures that need malformed streams.
    pub fn raw(mut self, value: u64, bits: u32) -> Self {
        self.w.push_bits(value, bits);
        self
    }

    // ── header ──────────────────────────────────────────────────────

    pub fn label(mut self, kind: Tag, text: &str) -> Self {
        self.w.push_bits(0b01, 2);
        self.w.push_bits(kind.label_bits() as u64, 2);
        self.string(text);
        self
    }

    pub fn rand_int(mut self, name: &str, min: i64, max: i64) -> Self {
        self.w.push_bits(0b10, 2);
        self.w.push_bits(0b0000, 4);
        self.string(name);
        elias_delta_encode_signed(&mut self.w, min);
        elias_delta_encode_signed(&mut self.w, max);
        self
    }

    pub fn end_header(mut self) -> Self {
        self.w.push_bits(0b00, 2);
        self
    }

    // ── solutions ───────────────────────────────────────────────────

    /// Question and steps are always 7-bit ASCII inside a solution.
    pub fn solution(mut self, question: &str, steps: &str, tags: &[Tag]) -> Self {
        self.w.push_bits(0b01, 2);
        self.w.push_bits(0b00, 2);
        self.w.push_bits(0b00, 2);
        self.ascii(question);
        self.w.push_bits(0b00, 2);
        self.w.push_bits(0b00, 2);
        self.ascii(steps);
        self.tags(tags);
        self
    }

    pub fn end_solutions(mut self) -> Self {
        self.w.push_bits(0b00, 2);
        self
    }

    // ── exercises ───────────────────────────────────────────────────

    pub fn exercise(mut self, prefix: Option<&str>, expr: &[ExprToken], tags: &[Tag]) -> Self {
        self.w.push_bits(0b01, 2);
        match prefix {
            Some(p) => {
                self.w.push_bit(true);
                self.string(p);
            }
            None => self.w.push_bit(false),
        }
        for tok in expr {
            self.expr_token(tok);
        }
        self.w.push_bits(0b1110, 4);
        self.tags(tags);
        self
    }

    pub fn end_exercises(mut self) -> Self {
        self.w.push_bits(0b00, 2);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.w.into_bytes()
    }

    // ── pieces ──────────────────────────────────────────────────────

    fn expr_token(&mut self, tok: &ExprToken) {
        let w = &mut self.w;
        match tok {
            ExprToken::Plus => w.push_bits(0b1000, 4),
            ExprToken::Minus => w.push_bits(0b1001, 4),
            ExprToken::Times => w.push_bits(0b1010, 4),
            ExprToken::Divide => w.push_bits(0b1011, 4),
            ExprToken::Power => w.push_bits(0b1100, 4),
            ExprToken::Equals => w.push_bits(0b1101, 4),
            ExprToken::LParen => w.push_bits(0b1111_1010, 8),
            ExprToken::RParen => w.push_bits(0b1111_1011, 8),
            ExprToken::Extended(code) => {
                w.push_bits(0b1111, 4);
                w.push_bits(*code as u64, 4);
            }
            ExprToken::Name(s) => {
                w.push_bits(0b000, 3);
                self.string(s);
            }
            ExprToken::Int(v) => {
                w.push_bits(0b001, 3);
                w.push_bits(0b00, 2);
                w.push_bit(*v < 0);
                elias_delta_encode(w, v.unsigned_abs());
            }
            ExprToken::Bool => {
                w.push_bits(0b001, 3);
                w.push_bits(0b01, 2);
            }
        }
    }

    fn tags(&mut self, tags: &[Tag]) {
        for t in tags {
            self.w.push_bits(t.tag_bits() as u64, 3);
        }
        self.w.push_bits(0b000, 3);
    }

    /// Selector plus body: ASCII when every char fits 7 bits and is not the
    /// terminator, UTF-8 otherwise.
    fn string(&mut self, s: &str) {
        let ascii = s.chars().all(|c| (c as u32) < 0x80 && c as u32 != STRING_END);
        if ascii {
            self.w.push_bits(0b00, 2);
            self.ascii(s);
        } else {
            self.w.push_bits(0b01, 2);
            for b in s.bytes() {
                self.w.push_bits(b as u64, 8);
            }
            self.w.push_bits(STRING_END as u64, 8);
        }
    }

    fn ascii(&mut self, s: &str) {
        for c in s.chars() {
            self.w.push_bits(c as u64 & 0x7F, 7);
        }
        self.w.push_bits(STRING_END as u64, 7);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_packs_msb_first() {
        let mut w = BitWriter::new();
        w.push_bits(0b101, 3);
        w.push_bits(0b10100, 5);
        w.push_bit(true);
        assert_eq!(w.bit_len(), 9);
        assert_eq!(w.into_bytes(), vec![0b1011_0100, 0b1000_0000]);
    }

    #[test]
    fn known_elias_codes() {
        let mut w = BitWriter::new();
        elias_delta_encode(&mut w, 17);
        assert_eq!(w.bit_len(), 9);
        assert_eq!(w.into_bytes(), vec![0b0010_1000, 0b1000_0000]);
    }

    #[test]
    #[should_panic(expected = "no code for 0")]
    fn zero_has_no_unsigned_code() {
        elias_delta_encode(&mut BitWriter::new(), 0);
    }

    #[test]
    fn empty_payload_is_header_plus_markers() {
        let b = PayloadBuilder::new().end_header().end_solutions().end_exercises();
        assert_eq!(b.bit_len(), 28);
        assert_eq!(b.finish(), vec![0, 0, 0, 0]);
    }
}
