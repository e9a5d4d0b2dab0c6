//! Request and reply frames.
//!
//! ```text
//! request:  [u32 name length][name bytes][u16 arg count][arg count x value]
//! reply:    [u8 status: 0=ok, 1=error][value]
//! ```
//!
//! Frames carry no outer length prefix; a frame ends where its last value
//! ends. The [`Frame`] trait lets the transport decode either direction from a
//! growing buffer.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec;
use crate::error::CodecError;
use crate::value::{ArgumentList, Value};

const STATUS_OK: u8 = 0;
const STATUS_ERROR: u8 = 1;

/// A message that can be written to and read from the wire.
pub trait Frame: Sized {
    /// Append the encoded frame to `buf`.
    fn encode_into(&self, buf: &mut BytesMut);

    /// Decode one frame, advancing `buf` past it.
    fn decode_from(buf: &mut &[u8]) -> Result<Self, CodecError>;

    fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Decode a buffer holding exactly one frame.
    fn from_bytes(mut data: &[u8]) -> Result<Self, CodecError> {
        let frame = Self::decode_from(&mut data)?;
        if !data.is_empty() {
            return Err(CodecError::TrailingBytes(data.len()));
        }
        Ok(frame)
    }
}

/// A named-function invocation sent to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub name: String,
    pub args: ArgumentList,
}

impl CallRequest {
    pub fn new(name: impl Into<String>, args: ArgumentList) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl Frame for CallRequest {
    fn encode_into(&self, buf: &mut BytesMut) {
        codec::write_string(buf, &self.name);
        codec::write_arguments(buf, &self.args);
    }

    fn decode_from(buf: &mut &[u8]) -> Result<Self, CodecError> {
        let name = codec::read_string(buf, "function name")?;
        let args = codec::read_arguments(buf)?;
        Ok(Self { name, args })
    }
}

/// Outcome reported by the server for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The function evaluated normally.
    Ok,
    /// The function evaluated and reported an error; the reply value says which.
    Error,
}

impl Status {
    pub fn as_byte(self) -> u8 {
        match self {
            Status::Ok => STATUS_OK,
            Status::Error => STATUS_ERROR,
        }
    }

    pub fn from_byte(b: u8) -> Result<Self, CodecError> {
        match b {
            STATUS_OK => Ok(Status::Ok),
            STATUS_ERROR => Ok(Status::Error),
            other => Err(CodecError::UnknownStatus(other)),
        }
    }
}

/// The server's answer to a [`CallRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: Status,
    pub value: Value,
}

impl Reply {
    pub fn ok(value: impl Into<Value>) -> Self {
        Self {
            status: Status::Ok,
            value: value.into(),
        }
    }

    pub fn error(value: impl Into<Value>) -> Self {
        Self {
            status: Status::Error,
            value: value.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}

impl Frame for Reply {
    fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u8(self.status.as_byte());
        codec::write_value(buf, &self.value);
    }

    fn decode_from(buf: &mut &[u8]) -> Result<Self, CodecError> {
        let status = Status::from_byte(codec::read_u8(buf, "reply status")?)?;
        let value = codec::read_value(buf)?;
        Ok(Self { status, value })
    }
}
