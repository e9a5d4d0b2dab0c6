//! Error types for the value model, the wire codec and the socket client.

use thiserror::Error;

/// Errors raised while constructing a [`Value`](crate::Value).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A row of an array has a different length than the first row.
    #[error("ragged array: row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// An array element is itself an array.
    #[error("nested array at row {row}, column {col}")]
    NestedArray { row: usize, col: usize },

    /// The number of cells does not match `rows * cols`.
    #[error("array of {rows}x{cols} does not hold {cells} cells")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        cells: usize,
    },

    /// A dimension does not fit the 32-bit wire counts.
    #[error("array dimension {0} exceeds the wire limit")]
    TooLarge(usize),

    /// An argument list longer than the 16-bit wire count allows.
    #[error("{0} arguments exceed the wire limit of {max}", max = u16::MAX)]
    TooManyArguments(usize),
}

/// Errors raised while decoding bytes from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The input ended before the item was complete.
    #[error("truncated input reading {context}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        context: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("unknown value tag 0x{0:02x}")]
    UnknownTag(u8),

    #[error("unknown error code 0x{0:02x}")]
    UnknownErrorCode(u8),

    #[error("invalid boolean byte 0x{0:02x}")]
    InvalidBoolean(u8),

    #[error("unknown response status {0}")]
    UnknownStatus(u8),

    #[error("invalid UTF-8 in text: {0}")]
    InvalidUtf8(String),

    /// An array element on the wire carried the array tag.
    #[error("nested array in encoded array")]
    NestedArray,

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    #[error("frame of {0} bytes exceeds the buffering limit")]
    FrameTooLarge(usize),

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl CodecError {
    /// Whether more input could turn this failure into a success.
    pub fn is_truncated(&self) -> bool {
        matches!(self, CodecError::Truncated { .. })
    }
}

/// Connectivity-class failures on an established or attempted connection.
///
/// Every variant means the remote function did not (observably) evaluate.
/// A server that evaluated and returned an error value is not a `ConnectionError`.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("not connected")]
    NotConnected,

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("malformed frame: {0}")]
    Codec(#[from] CodecError),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("failed to start client runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
