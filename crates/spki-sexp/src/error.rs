//! Error types for S-expression parsing.

use thiserror::Error;

/// Errors that can occur while reading an S-expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SexpError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected byte {byte:#04x} at offset {offset}")]
    UnexpectedByte { byte: u8, offset: usize },

    #[error("invalid length prefix at offset {0}")]
    InvalidLength(usize),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid base64 string: {0}")]
    InvalidBase64(String),

    #[error("nesting too deep at offset {offset}")]
    TooDeep { offset: usize },

    #[error("trailing bytes at offset {0}")]
    TrailingBytes(usize),
}
