//! Msgpack encoder for [`Value`] trees.
//!
//! Marker selection is delegated to `rmp`, which always picks the most
//! compact representation for integers and lengths.

use std::fmt;

use rmp::encode;

use crate::error::EncodeError;
use crate::value::Value;

/// Encodes `value` into a freshly allocated buffer.
///
/// # Errors
///
/// Returns [`EncodeError::LengthOverflow`] when a string, blob or collection
/// is longer than a 32-bit size field allows.
pub fn to_vec(value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Vec::new();
    encode_into(value, &mut buffer)?;
    Ok(buffer)
}

/// Appends the encoding of `value` to `buffer`.
///
/// # Errors
///
/// See [`to_vec`].
pub fn encode_into(value: &Value, buffer: &mut Vec<u8>) -> Result<(), EncodeError> {
    match value {
        Value::Nil => encode::write_nil(buffer).map_err(write_failed),
        Value::Bool(flag) => encode::write_bool(buffer, *flag).map_err(write_failed),
        Value::Int(number) => encode::write_sint(buffer, *number)
            .map(drop)
            .map_err(write_failed),
        Value::UInt(number) => encode::write_uint(buffer, *number)
            .map(drop)
            .map_err(write_failed),
        Value::Float(number) => encode::write_f64(buffer, *number).map_err(write_failed),
        Value::String(bytes) => {
            encode::write_str_len(buffer, length(bytes.len())?).map_err(write_failed)?;
            buffer.extend_from_slice(bytes);
            Ok(())
        }
        Value::Binary(bytes) => {
            encode::write_bin_len(buffer, length(bytes.len())?).map_err(write_failed)?;
            buffer.extend_from_slice(bytes);
            Ok(())
        }
        Value::Ext(tag, bytes) => {
            encode::write_ext_meta(buffer, length(bytes.len())?, *tag).map_err(write_failed)?;
            buffer.extend_from_slice(bytes);
            Ok(())
        }
        Value::Array(items) => {
            encode::write_array_len(buffer, length(items.len())?).map_err(write_failed)?;
            items.iter().try_for_each(|item| encode_into(item, buffer))
        }
        Value::Map(pairs) => {
            encode::write_map_len(buffer, length(pairs.len())?).map_err(write_failed)?;
            pairs.iter().try_for_each(|(key, item)| {
                encode_into(key, buffer)?;
                encode_into(item, buffer)
            })
        }
    }
}

fn length(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::LengthOverflow { len })
}

fn write_failed(error: impl fmt::Display) -> EncodeError {
    EncodeError::Write {
        message: error.to_string(),
    }
}
