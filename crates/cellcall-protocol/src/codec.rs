//! Binary serialization of [`Value`]s for the wire.
//!
//! Every value is a one-byte tag followed by a tag-specific payload. All
//! multi-byte integers are little-endian.
//!
//! ```text
//! 0x01 Number   f64 (8 bytes)
//! 0x02 Text     u32 length + UTF-8 bytes
//! 0x03 Boolean  u8 (0 or 1)
//! 0x04 Error    u8 error code
//! 0x05 Empty    (no payload)
//! 0x06 Array    u32 rows + u32 cols + rows*cols scalar values, row-major
//! ```
//!
//! Readers take a `&mut &[u8]` cursor and advance it past what they consume.
//! Running out of input yields [`CodecError::Truncated`], which the transport
//! uses to wait for more bytes.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::CodecError;
use crate::value::{ArgumentList, Array, CellError, Value};

pub const TAG_NUMBER: u8 = 0x01;
pub const TAG_TEXT: u8 = 0x02;
pub const TAG_BOOLEAN: u8 = 0x03;
pub const TAG_ERROR: u8 = 0x04;
pub const TAG_EMPTY: u8 = 0x05;
pub const TAG_ARRAY: u8 = 0x06;

type Result<T> = std::result::Result<T, CodecError>;

// ============================================================================
// Primitives
// ============================================================================

fn ensure(buf: &[u8], needed: usize, context: &'static str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(CodecError::Truncated {
            context,
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

pub(crate) fn read_u8(buf: &mut &[u8], context: &'static str) -> Result<u8> {
    ensure(buf, 1, context)?;
    Ok(buf.get_u8())
}

pub(crate) fn read_u16(buf: &mut &[u8], context: &'static str) -> Result<u16> {
    ensure(buf, 2, context)?;
    Ok(buf.get_u16_le())
}

pub(crate) fn read_u32(buf: &mut &[u8], context: &'static str) -> Result<u32> {
    ensure(buf, 4, context)?;
    Ok(buf.get_u32_le())
}

/// Write a UTF-8 string with a u32 length prefix.
///
/// Strings longer than `u32::MAX` bytes cannot be framed. Such a frame is
/// also far past [`MAX_FRAME_LEN`](crate::transport::MAX_FRAME_LEN), so
/// [`Transport::send`](crate::Transport::send) refuses it before any byte is
/// written.
pub fn write_string(buf: &mut BytesMut, s: &str) {
    debug_assert!(s.len() <= u32::MAX as usize, "string of {} bytes", s.len());
    buf.put_u32_le(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

/// Read a UTF-8 string with a u32 length prefix.
pub fn read_string(buf: &mut &[u8], context: &'static str) -> Result<String> {
    let len = read_u32(buf, context)? as usize;
    ensure(buf, len, context)?;
    let data: &[u8] = *buf;
    let (bytes, rest) = data.split_at(len);
    *buf = rest;
    String::from_utf8(bytes.to_vec()).map_err(|e| CodecError::InvalidUtf8(e.to_string()))
}

// ============================================================================
// Values
// ============================================================================

/// Write a value (tag + payload).
pub fn write_value(buf: &mut BytesMut, value: &Value) {
    match value {
        Value::Array(arr) => {
            buf.put_u8(TAG_ARRAY);
            buf.put_u32_le(arr.rows() as u32);
            buf.put_u32_le(arr.cols() as u32);
            for cell in arr.cells() {
                write_value(buf, cell);
            }
        }
        Value::Number(n) => {
            buf.put_u8(TAG_NUMBER);
            buf.put_f64_le(*n);
        }
        Value::Text(s) => {
            buf.put_u8(TAG_TEXT);
            write_string(buf, s);
        }
        Value::Boolean(b) => {
            buf.put_u8(TAG_BOOLEAN);
            buf.put_u8(u8::from(*b));
        }
        Value::Error(e) => {
            buf.put_u8(TAG_ERROR);
            buf.put_u8(e.code());
        }
        Value::Empty => buf.put_u8(TAG_EMPTY),
    }
}

/// Read a value (tag + payload).
pub fn read_value(buf: &mut &[u8]) -> Result<Value> {
    let tag = read_u8(buf, "value tag")?;
    if tag != TAG_ARRAY {
        return read_scalar(buf, tag);
    }

    let rows = read_u32(buf, "array rows")?;
    let cols = read_u32(buf, "array columns")?;

    // Every element takes at least its tag byte, which bounds the allocation
    // by the input that is actually present.
    let total = rows as u64 * cols as u64;
    if total > buf.remaining() as u64 {
        return Err(CodecError::Truncated {
            context: "array elements",
            needed: usize::try_from(total).unwrap_or(usize::MAX),
            remaining: buf.remaining(),
        });
    }

    let mut cells = Vec::with_capacity(total as usize);
    for _ in 0..total {
        let tag = read_u8(buf, "array element tag")?;
        if tag == TAG_ARRAY {
            return Err(CodecError::NestedArray);
        }
        cells.push(read_scalar(buf, tag)?);
    }

    Ok(Value::Array(Array::from_cells(
        rows as usize,
        cols as usize,
        cells,
    )?))
}

fn read_scalar(buf: &mut &[u8], tag: u8) -> Result<Value> {
    match tag {
        TAG_NUMBER => {
            ensure(buf, 8, "number")?;
            Ok(Value::Number(buf.get_f64_le()))
        }
        TAG_TEXT => Ok(Value::Text(read_string(buf, "text")?)),
        TAG_BOOLEAN => match read_u8(buf, "boolean")? {
            0 => Ok(Value::Boolean(false)),
            1 => Ok(Value::Boolean(true)),
            other => Err(CodecError::InvalidBoolean(other)),
        },
        TAG_ERROR => {
            let code = read_u8(buf, "error code")?;
            CellError::from_code(code)
                .map(Value::Error)
                .ok_or(CodecError::UnknownErrorCode(code))
        }
        TAG_EMPTY => Ok(Value::Empty),
        other => Err(CodecError::UnknownTag(other)),
    }
}

// ============================================================================
// Argument lists
// ============================================================================

/// Write an argument list as a u16 count followed by the values.
pub fn write_arguments(buf: &mut BytesMut, args: &ArgumentList) {
    buf.put_u16_le(args.len() as u16);
    for arg in args {
        write_value(buf, arg);
    }
}

pub fn read_arguments(buf: &mut &[u8]) -> Result<ArgumentList> {
    let count = read_u16(buf, "argument count")?;
    let mut values = Vec::with_capacity(count as usize);
    for _ in 0..count {
        values.push(read_value(buf)?);
    }
    Ok(ArgumentList::new(values)?)
}

// ============================================================================
// Whole-buffer helpers
// ============================================================================

/// Encode a single value into a fresh buffer.
pub fn encode(value: &Value) -> Bytes {
    let mut buf = BytesMut::new();
    write_value(&mut buf, value);
    buf.freeze()
}

/// Decode exactly one value from `data`; leftover bytes are an error.
pub fn decode(mut data: &[u8]) -> Result<Value> {
    let value = read_value(&mut data)?;
    if !data.is_empty() {
        return Err(CodecError::TrailingBytes(data.len()));
    }
    Ok(value)
}

pub fn encode_arguments(args: &ArgumentList) -> Bytes {
    let mut buf = BytesMut::new();
    write_arguments(&mut buf, args);
    buf.freeze()
}

pub fn decode_arguments(mut data: &[u8]) -> Result<ArgumentList> {
    let args = read_arguments(&mut data)?;
    if !data.is_empty() {
        return Err(CodecError::TrailingBytes(data.len()));
    }
    Ok(args)
}
