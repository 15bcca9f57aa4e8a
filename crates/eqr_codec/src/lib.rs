//! eQR codec - bit-level decoding of educational exercise payloads
//!
//! A payload is a 22-bit opaque header followed by three marker-delimited
//! phases (header entries, solutions, exercises). Integers are Elias-Delta
//! coded, strings are 7-bit ASCII or UTF-8 with a `0x03` terminator.

pub mod bits;
pub mod decoder;
pub mod elias;
pub mod encode;
pub mod error;
pub mod ir;

pub use bits::BitReader;
pub use decoder::{decode, Decoder, DecoderConfig};
pub use error::{DecodeError, Result};
pub use ir::{Exercise, IntermediateRepresentation, LabelKind, RandRange, Solution, Tag};
