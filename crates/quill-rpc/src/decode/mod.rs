//! Stateless msgpack decoder producing [`Value`] trees.
//!
//! The decoder has no protocol knowledge: it turns exactly one encoded value
//! into a [`Value`] and reports how many bytes it consumed. A
//! [`DecodeError::Truncated`] result means the bytes so far are a valid
//! prefix, which the framer uses to decide when to read more from the pipe.
//!
//! Size fields are untrusted. Declared lengths above [`MAX_DECLARED_LEN`] are
//! rejected outright, and collection pre-allocation is capped by the number
//! of bytes actually remaining, since every element occupies at least one.

mod scan;

use rmp::Marker;

pub use self::scan::FrameScanner;

use crate::error::DecodeError;
use crate::value::Value;

/// Largest string, blob or collection length accepted from the wire.
pub const MAX_DECLARED_LEN: u64 = 64 * 1024 * 1024;

/// Deepest array/map nesting accepted from the wire.
pub const MAX_DEPTH: usize = 128;

/// Decodes one value from the start of `bytes`.
///
/// Returns the value and the number of bytes it occupied; trailing bytes are
/// left untouched.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when `bytes` ends mid-value, and the
/// other [`DecodeError`] variants when the bytes are malformed.
pub fn decode(bytes: &[u8]) -> Result<(Value, usize), DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let value = cursor.decode_value()?;
    Ok((value, cursor.position()))
}

/// A byte cursor positioned at the start of an encoded value.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `bytes`.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Offset of the next unread byte.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    /// Decodes one value and advances past it.
    ///
    /// # Errors
    ///
    /// See [`decode`].
    pub fn decode_value(&mut self) -> Result<Value, DecodeError> {
        self.read_value(0)
    }

    fn read_value(&mut self, depth: usize) -> Result<Value, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::TooDeep { limit: MAX_DEPTH });
        }

        let offset = self.position;
        let tag = self.read_u8()?;
        match Marker::from_u8(tag) {
            Marker::Null => Ok(Value::Nil),
            Marker::True => Ok(Value::Bool(true)),
            Marker::False => Ok(Value::Bool(false)),
            Marker::FixPos(value) => Ok(Value::Int(i64::from(value))),
            Marker::FixNeg(value) => Ok(Value::Int(i64::from(value))),
            Marker::U8 => Ok(Value::Int(i64::from(self.read_u8()?))),
            Marker::U16 => Ok(Value::Int(i64::from(self.read_u16()?))),
            Marker::U32 => Ok(Value::Int(i64::from(self.read_u32()?))),
            Marker::U64 => Ok(Value::from(self.read_u64()?)),
            Marker::I8 => Ok(Value::Int(i64::from(i8::from_be_bytes(self.read_array()?)))),
            Marker::I16 => Ok(Value::Int(i64::from(i16::from_be_bytes(self.read_array()?)))),
            Marker::I32 => Ok(Value::Int(i64::from(i32::from_be_bytes(self.read_array()?)))),
            Marker::I64 => Ok(Value::Int(i64::from_be_bytes(self.read_array()?))),
            Marker::F32 => Ok(Value::Float(f64::from(f32::from_be_bytes(self.read_array()?)))),
            Marker::F64 => Ok(Value::Float(f64::from_be_bytes(self.read_array()?))),
            Marker::FixStr(len) => self.read_bytes(u64::from(len)).map(Value::String),
            Marker::Str8 => {
                let len = u64::from(self.read_u8()?);
                self.read_bytes(len).map(Value::String)
            }
            Marker::Str16 => {
                let len = u64::from(self.read_u16()?);
                self.read_bytes(len).map(Value::String)
            }
            Marker::Str32 => {
                let len = u64::from(self.read_u32()?);
                self.read_bytes(len).map(Value::String)
            }
            Marker::Bin8 => {
                let len = u64::from(self.read_u8()?);
                self.read_bytes(len).map(Value::Binary)
            }
            Marker::Bin16 => {
                let len = u64::from(self.read_u16()?);
                self.read_bytes(len).map(Value::Binary)
            }
            Marker::Bin32 => {
                let len = u64::from(self.read_u32()?);
                self.read_bytes(len).map(Value::Binary)
            }
            Marker::FixArray(count) => self.read_array_items(u64::from(count), depth),
            Marker::Array16 => {
                let count = u64::from(self.read_u16()?);
                self.read_array_items(count, depth)
            }
            Marker::Array32 => {
                let count = u64::from(self.read_u32()?);
                self.read_array_items(count, depth)
            }
            Marker::FixMap(count) => self.read_map_pairs(u64::from(count), depth),
            Marker::Map16 => {
                let count = u64::from(self.read_u16()?);
                self.read_map_pairs(count, depth)
            }
            Marker::Map32 => {
                let count = u64::from(self.read_u32()?);
                self.read_map_pairs(count, depth)
            }
            Marker::FixExt1 => self.read_ext(1),
            Marker::FixExt2 => self.read_ext(2),
            Marker::FixExt4 => self.read_ext(4),
            Marker::FixExt8 => self.read_ext(8),
            Marker::FixExt16 => self.read_ext(16),
            Marker::Ext8 => {
                let len = u64::from(self.read_u8()?);
                self.read_ext(len)
            }
            Marker::Ext16 => {
                let len = u64::from(self.read_u16()?);
                self.read_ext(len)
            }
            Marker::Ext32 => {
                let len = u64::from(self.read_u32()?);
                self.read_ext(len)
            }
            Marker::Reserved => Err(DecodeError::InvalidTag { tag, offset }),
        }
    }

    fn read_array_items(&mut self, count: u64, depth: usize) -> Result<Value, DecodeError> {
        let count = checked_len(count)?;
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(self.read_value(depth + 1)?);
        }
        Ok(Value::Array(items))
    }

    fn read_map_pairs(&mut self, count: u64, depth: usize) -> Result<Value, DecodeError> {
        let count = checked_len(count)?;
        let mut pairs = Vec::with_capacity(count.min(self.remaining() / 2));
        for _ in 0..count {
            let key = self.read_value(depth + 1)?;
            let value = self.read_value(depth + 1)?;
            pairs.push((key, value));
        }
        Ok(Value::Map(pairs))
    }

    fn read_ext(&mut self, len: u64) -> Result<Value, DecodeError> {
        let [tag] = self.read_array::<1>()?;
        let tag = i8::from_be_bytes([tag]);
        self.read_bytes(len).map(|data| Value::Ext(tag, data))
    }

    fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>, DecodeError> {
        let len = checked_len(len)?;
        self.take(len).map(<[u8]>::to_vec)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .position
            .checked_add(len)
            .ok_or(DecodeError::Truncated)?;
        let slice = self
            .bytes
            .get(self.position..end)
            .ok_or(DecodeError::Truncated)?;
        self.position = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let slice = self.take(N)?;
        <[u8; N]>::try_from(slice).map_err(|_| DecodeError::Truncated)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.read_array::<1>().map(u8::from_be_bytes)
    }

    fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.read_array().map(u16::from_be_bytes)
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_array().map(u32::from_be_bytes)
    }

    fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.read_array().map(u64::from_be_bytes)
    }
}

fn checked_len(declared: u64) -> Result<usize, DecodeError> {
    let overflow = DecodeError::LengthOverflow {
        declared,
        limit: MAX_DECLARED_LEN,
    };
    if declared > MAX_DECLARED_LEN {
        return Err(overflow);
    }
    usize::try_from(declared).map_err(|_| overflow)
}

#[cfg(test)]
mod tests;
