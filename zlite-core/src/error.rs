//! Error types for zlite codec operations.
//!
//! This module provides a single error type covering the failure conditions
//! of the block container, the Polar coder, and the ROLZ codec.

use std::io;
use thiserror::Error;

/// The error type for zlite operations.
#[derive(Debug, Error)]
pub enum ZliteError {
    /// I/O error from the underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The underlying reader ran dry before the requested number of bits
    /// could be buffered.
    #[error("unexpected end of stream: needed {needed} more bits")]
    UnexpectedEof {
        /// Number of bits that were needed but unavailable.
        needed: u8,
    },

    /// A block header (`rlen`/`olen`) was only partially present.
    ///
    /// A fully-absent header pair is a clean end of stream; this variant is
    /// for the case where only one of the two 4-byte fields could be read.
    #[error("corrupt stream: partial block header")]
    CorruptHeader,

    /// A length-table entry exceeded the maximum code length of 15 bits.
    #[error("corrupt stream: code length {length} exceeds maximum of 15 bits")]
    CorruptLengthTable {
        /// The offending length value.
        length: u8,
    },

    /// A ROLZ symbol fell outside the 512-symbol alphabet.
    #[error("corrupt stream: symbol {symbol} is outside the 0..512 alphabet")]
    InvalidSymbol {
        /// The offending symbol value.
        symbol: u16,
    },

    /// A back-reference pointed at a ROLZ bucket slot that was never
    /// written (the empty-slot sentinel).
    #[error("corrupt stream: back-reference into an empty context slot")]
    EmptyBackReference,

    /// A back-reference resolved to a non-positive offset.
    #[error("corrupt stream: back-reference offset {offset} is not positive")]
    InvalidOffset {
        /// The offending offset.
        offset: i64,
    },

    /// The bitstream ran out of input before `rlen` symbols were decoded.
    #[error("corrupt stream: bitstream exhausted after {decoded} of {expected} symbols")]
    BitstreamExhausted {
        /// Number of symbols successfully decoded.
        decoded: u32,
        /// Number of symbols the block header declared.
        expected: u32,
    },

    /// The declared `olen` did not match the number of payload bytes
    /// actually available.
    #[error("corrupt stream: olen={declared} but only {available} payload bytes were read")]
    TruncatedPayload {
        /// Declared payload length.
        declared: u32,
        /// Payload bytes actually read.
        available: u32,
    },

    /// A block declared more ROLZ symbols than the 16 MiB block cap allows.
    #[error("corrupt stream: rlen={rlen} exceeds the maximum block size")]
    BlockTooLarge {
        /// The declared symbol count.
        rlen: u32,
    },
}

/// Result type alias for zlite operations.
pub type Result<T> = std::result::Result<T, ZliteError>;

impl ZliteError {
    /// Create a corrupt length-table error.
    pub fn corrupt_length_table(length: u8) -> Self {
        Self::CorruptLengthTable { length }
    }

    /// Create an invalid-symbol error.
    pub fn invalid_symbol(symbol: u16) -> Self {
        Self::InvalidSymbol { symbol }
    }

    /// Create an invalid-offset error.
    pub fn invalid_offset(offset: i64) -> Self {
        Self::InvalidOffset { offset }
    }

    /// Create a bitstream-exhausted error.
    pub fn bitstream_exhausted(decoded: u32, expected: u32) -> Self {
        Self::BitstreamExhausted { decoded, expected }
    }

    /// Create a truncated-payload error.
    pub fn truncated_payload(declared: u32, available: u32) -> Self {
        Self::TruncatedPayload {
            declared,
            available,
        }
    }

    /// Create a block-too-large error.
    pub fn block_too_large(rlen: u32) -> Self {
        Self::BlockTooLarge { rlen }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ZliteError::corrupt_length_table(16);
        assert!(err.to_string().contains("exceeds maximum"));

        let err = ZliteError::invalid_symbol(600);
        assert!(err.to_string().contains("600"));

        let err = ZliteError::bitstream_exhausted(3, 10);
        assert!(err.to_string().contains("3 of 10"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        let err: ZliteError = io_err.into();
        assert!(matches!(err, ZliteError::Io(_)));
    }
}
