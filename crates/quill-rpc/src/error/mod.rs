//! Error types raised by the RPC engine.
//!
//! Decode failures are fatal for a connection because byte framing cannot be
//! recovered once a value has been misread. Protocol failures describe
//! well-formed values with the wrong shape; callers log and drop the message
//! except for [`ProtocolError::UnknownResponseId`], which signals a desync.
//! I/O errors are wrapped in `Arc` so they can cross the reader handoff.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::message::MessageId;

/// Errors raised while decoding msgpack bytes into a [`crate::Value`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input ended before the value was complete.
    #[error("input ended before the value was complete")]
    Truncated,

    /// The byte at `offset` is not a valid msgpack marker.
    #[error("invalid msgpack marker 0x{tag:02x} at offset {offset}")]
    InvalidTag {
        /// The offending marker byte.
        tag: u8,
        /// Offset of the marker within the input.
        offset: usize,
    },

    /// A length or element count exceeds what the decoder accepts.
    #[error("declared length {declared} exceeds the limit of {limit}")]
    LengthOverflow {
        /// Length announced by the size field.
        declared: u64,
        /// Largest length the decoder accepts.
        limit: u64,
    },

    /// Arrays and maps are nested deeper than the decoder accepts.
    #[error("values nested deeper than {limit} levels")]
    TooDeep {
        /// Maximum nesting depth.
        limit: usize,
    },
}

/// Errors describing well-formed values that violate the RPC protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The top-level value is not a valid request, response or notification.
    #[error("malformed message envelope: {reason}")]
    MalformedEnvelope {
        /// What was wrong with the envelope.
        reason: String,
    },

    /// A response arrived for an id with no pending request.
    #[error("response for unknown message id {id}")]
    UnknownResponseId {
        /// The unmatched message id.
        id: MessageId,
    },

    /// A request id was registered while an earlier request with the same id
    /// was still pending.
    #[error("message id {id} is already pending")]
    DuplicateId {
        /// The reused message id.
        id: MessageId,
    },
}

impl ProtocolError {
    /// Builds a `MalformedEnvelope` error.
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            reason: reason.into(),
        }
    }
}

/// Errors raised while encoding outbound messages.
///
/// These indicate programming errors rather than runtime conditions: every
/// value the front-end builds should be representable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A string, blob or collection is too large for a 32-bit length field.
    #[error("length {len} does not fit a msgpack size field")]
    LengthOverflow {
        /// The unrepresentable length.
        len: usize,
    },

    /// The 32-bit message id space has been used up.
    #[error("message ids exhausted")]
    IdsExhausted,

    /// Correlation bookkeeping rejected the request.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The underlying buffer rejected a write.
    #[error("failed to write encoded bytes: {message}")]
    Write {
        /// Description of the writer failure.
        message: String,
    },
}

/// Errors surfaced by [`crate::MessageReader::next_message`].
#[derive(Debug, Clone, Error)]
pub enum ReadError {
    /// The pipe reached end of file.
    #[error("connection closed")]
    Closed,

    /// The buffered bytes could not be decoded.
    #[error("failed to decode message: {0}")]
    Decode(#[from] DecodeError),

    /// Reading from the pipe failed.
    #[error("failed to read from the pipe: {0}")]
    Io(#[source] Arc<io::Error>),
}

impl From<io::Error> for ReadError {
    fn from(error: io::Error) -> Self {
        Self::Io(Arc::new(error))
    }
}
