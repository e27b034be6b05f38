//! Msgpack-RPC engine for talking to an embedded Neovim.
//!
//! The crate covers everything between the raw pipe and the UI model:
//!
//! - [`Value`] is the dynamic value tree produced by the decoder.
//! - [`decode()`] and [`to_vec`] convert between bytes and values.
//! - [`MessageReader`] frames the byte stream into top-level values and
//!   [`spawn_reader`] runs it on a dedicated thread that posts
//!   [`ReaderEvent`]s into a `crossbeam-channel` queue.
//! - [`Message`] classifies values into requests, responses and
//!   notifications.
//! - [`PendingRequests`] correlates responses with the requests that caused
//!   them, and [`Outbound`] builds requests while keeping that table current.
//!
//! Nothing here owns a connection. The host crate wires the reader thread, a
//! single consumer and the pipe writer together.
//!
//! # Example
//!
//! ```ignore
//! use quill_rpc::{Message, Outbound, decode};
//!
//! let mut outbound = Outbound::new();
//! let request = outbound.attach_ui(80, 24)?;
//! writer.write_all(&request.bytes)?;
//!
//! let (value, _) = decode(&incoming)?;
//! if let Message::Response(response) = Message::from_value(value)? {
//!     let kind = outbound.pending_mut().resolve(response.id)?;
//! }
//! ```

pub mod correlation;
pub mod decode;
pub mod encode;
pub mod error;
pub mod framer;
pub mod message;
pub mod outbound;
pub mod value;

#[cfg(test)]
mod tests;

pub use self::correlation::{DEFAULT_WARN_THRESHOLD, PendingRequestKind, PendingRequests};
pub use self::decode::{MAX_DECLARED_LEN, decode};
pub use self::encode::{encode_into, to_vec};
pub use self::error::{DecodeError, EncodeError, ProtocolError, ReadError};
pub use self::framer::{MessageReader, ReaderEvent, spawn_reader};
pub use self::message::{Message, MessageId, Notification, Request, Response};
pub use self::outbound::{
    MouseAction, MouseButton, MousePosition, Outbound, OutboundRequest, VIMENTER_AUTOCMD,
};
pub use self::value::Value;
