//! Msgpack-RPC message envelopes.
//!
//! Every message on the wire is an array whose first element discriminates
//! its shape:
//!
//! ```text
//! [0, msgid, method, params]   request
//! [1, msgid, error, result]    response
//! [2, method, params]          notification
//! ```
//!
//! [`Message::from_value`] classifies a decoded top-level value so the
//! consumer can route it; [`Message::into_value`] builds the inverse.

use std::fmt;

use crate::error::ProtocolError;
use crate::value::Value;

const REQUEST: i64 = 0;
const RESPONSE: i64 = 1;
const NOTIFICATION: i64 = 2;

/// Identifier correlating a request with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u32);

impl MessageId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<MessageId> for Value {
    fn from(id: MessageId) -> Self {
        Self::from(id.0)
    }
}

/// A call issued by either peer that expects a response.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Correlation id chosen by the sender.
    pub id: MessageId,
    /// Method name.
    pub method: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

/// The answer to an earlier [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Id of the request being answered.
    pub id: MessageId,
    /// Error payload; `None` when the call succeeded.
    pub error: Option<Value>,
    /// Result payload (nil on error).
    pub result: Value,
}

impl Response {
    /// Renders the error payload for diagnostics.
    ///
    /// Neovim reports errors as `[type, message]`; anything else is shown
    /// verbatim.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        let message = error
            .as_array()
            .and_then(|parts| parts.get(1))
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), str::to_owned);
        Some(message)
    }
}

/// A one-way message that expects no response.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Method name.
    pub method: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

/// A classified msgpack-RPC message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// See [`Request`].
    Request(Request),
    /// See [`Response`].
    Response(Response),
    /// See [`Notification`].
    Notification(Notification),
}

impl Message {
    /// Classifies a decoded top-level value.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedEnvelope`] when the value is not an
    /// array of the expected length, the discriminator is unknown, or a field
    /// has the wrong type.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let kind = value.kind();
        let mut fields = value
            .into_array()
            .ok_or_else(|| ProtocolError::malformed(format!("expected an array, got {kind}")))?
            .into_iter();
        let discriminator = fields
            .next()
            .and_then(|field| field.as_i64())
            .ok_or_else(|| ProtocolError::malformed("missing message type"))?;

        let remaining: Vec<Value> = fields.collect();
        match (discriminator, <[Value; 3]>::try_from(remaining)) {
            (REQUEST, Ok([id, method, params])) => Ok(Self::Request(Request {
                id: message_id(&id)?,
                method: method_name(method)?,
                params: params_array(params)?,
            })),
            (RESPONSE, Ok([id, error, result])) => Ok(Self::Response(Response {
                id: message_id(&id)?,
                error: (!error.is_nil()).then_some(error),
                result,
            })),
            (NOTIFICATION, Err(remaining)) => {
                let [method, params] = <[Value; 2]>::try_from(remaining).map_err(|fields| {
                    ProtocolError::malformed(format!(
                        "notification has {} fields, expected 3",
                        fields.len() + 1
                    ))
                })?;
                Ok(Self::Notification(Notification {
                    method: method_name(method)?,
                    params: params_array(params)?,
                }))
            }
            (REQUEST | RESPONSE | NOTIFICATION, _) => Err(ProtocolError::malformed(
                format!("wrong field count for message type {discriminator}"),
            )),
            (other, _) => Err(ProtocolError::malformed(format!(
                "unknown message type {other}"
            ))),
        }
    }

    /// Builds the wire envelope for this message.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Request(request) => Value::Array(vec![
                Value::Int(REQUEST),
                Value::from(request.id),
                Value::from(request.method),
                Value::Array(request.params),
            ]),
            Self::Response(response) => Value::Array(vec![
                Value::Int(RESPONSE),
                Value::from(response.id),
                response.error.unwrap_or(Value::Nil),
                response.result,
            ]),
            Self::Notification(notification) => Value::Array(vec![
                Value::Int(NOTIFICATION),
                Value::from(notification.method),
                Value::Array(notification.params),
            ]),
        }
    }
}

fn message_id(value: &Value) -> Result<MessageId, ProtocolError> {
    value
        .as_u64()
        .and_then(|raw| u32::try_from(raw).ok())
        .map(MessageId)
        .ok_or_else(|| ProtocolError::malformed(format!("invalid message id {value}")))
}

fn method_name(value: Value) -> Result<String, ProtocolError> {
    match value {
        Value::String(bytes) => String::from_utf8(bytes)
            .map_err(|_| ProtocolError::malformed("method name is not UTF-8")),
        other => Err(ProtocolError::malformed(format!(
            "method name must be a string, got {}",
            other.kind()
        ))),
    }
}

fn params_array(value: Value) -> Result<Vec<Value>, ProtocolError> {
    let kind = value.kind();
    value
        .into_array()
        .ok_or_else(|| ProtocolError::malformed(format!("params must be an array, got {kind}")))
}

#[cfg(test)]
mod tests;
