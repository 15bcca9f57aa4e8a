use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The bit cursor ran past the end of the buffer.
    #[error("unexpected end of data at bit {0}")]
    EndOfData(usize),
    #[error("bit width {0} outside 1..=32")]
    InvalidWidth(u32),
    #[error("malformed header marker {0:#04b}")]
    MalformedHeader(u32),
    #[error("malformed string encoding selector {0:#04b}")]
    MalformedEncoding(u32),
    /// Elias-Delta length prefix announces more bits than fit in a u64.
    #[error("integer code too long ({0} bits)")]
    IntegerOverflow(u64),
}

impl DecodeError {
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, DecodeError::EndOfData(_))
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
