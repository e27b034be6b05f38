//! Outbound command encoder.
//!
//! [`Outbound`] owns the message id counter and the correlation table. Every
//! request it builds is assigned a fresh id, encoded into one contiguous
//! buffer and registered as pending before the bytes are handed back, so a
//! response can never arrive for an id the table does not know about.
//!
//! The encoder never writes to the pipe itself; callers pass the returned
//! bytes to a single `write_all` on the writer they own.

use std::fmt;

use crate::correlation::{PendingRequestKind, PendingRequests};
use crate::encode::to_vec;
use crate::error::EncodeError;
use crate::message::{Message, MessageId, Request, Response};
use crate::value::Value;

/// Command that asks the editor to call back once its startup files are read.
pub const VIMENTER_AUTOCMD: &str = "autocmd VimEnter * call rpcrequest(1, 'vimenter')";

/// Mouse buttons understood by `nvim_input_mouse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel click.
    Middle,
    /// Scroll wheel; pair with [`MouseAction::WheelUp`] or
    /// [`MouseAction::WheelDown`].
    Wheel,
}

impl MouseButton {
    /// Name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
            Self::Wheel => "wheel",
        }
    }
}

/// Mouse actions understood by `nvim_input_mouse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    /// Button went down.
    Press,
    /// Pointer moved with the button held.
    Drag,
    /// Button came up.
    Release,
    /// One wheel notch away from the user.
    WheelUp,
    /// One wheel notch towards the user.
    WheelDown,
}

impl MouseAction {
    /// Name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Press => "press",
            Self::Drag => "drag",
            Self::Release => "release",
            Self::WheelUp => "up",
            Self::WheelDown => "down",
        }
    }
}

/// Grid coordinates of a mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MousePosition {
    /// Grid the event targets; `0` for the default grid.
    pub grid: u32,
    /// Zero-based row.
    pub row: u32,
    /// Zero-based column.
    pub col: u32,
}

/// An encoded request ready for the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Id the response will carry.
    pub id: MessageId,
    /// Complete msgpack encoding of the envelope.
    pub bytes: Vec<u8>,
}

/// Builds requests and responses for the editor.
#[derive(Debug, Clone)]
pub struct Outbound {
    next_id: Option<u32>,
    pending: PendingRequests,
}

impl Default for Outbound {
    fn default() -> Self {
        Self::with_pending(PendingRequests::new())
    }
}

impl Outbound {
    /// Creates an encoder whose first request uses id 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an encoder that records requests in `pending`.
    #[must_use]
    pub const fn with_pending(pending: PendingRequests) -> Self {
        Self {
            next_id: Some(1),
            pending,
        }
    }

    /// Requests awaiting a response.
    #[must_use]
    pub const fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    /// Mutable access to the correlation table, used to resolve responses.
    pub const fn pending_mut(&mut self) -> &mut PendingRequests {
        &mut self.pending
    }

    /// Encodes a request for `method` and records it as `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::IdsExhausted`] once every 32-bit id has been
    /// used, [`EncodeError::Protocol`] if the id is somehow still pending,
    /// or any error raised while encoding `params`.
    pub fn request(
        &mut self,
        kind: PendingRequestKind,
        method: &str,
        params: Vec<Value>,
    ) -> Result<OutboundRequest, EncodeError> {
        let id = self.allocate_id()?;
        let bytes = to_vec(
            &Message::Request(Request {
                id,
                method: method.to_owned(),
                params,
            })
            .into_value(),
        )?;
        self.pending.register(id, kind)?;
        Ok(OutboundRequest { id, bytes })
    }

    /// Encodes the response to a request the editor sent us.
    ///
    /// Responses carry the id chosen by the editor, so nothing is allocated or
    /// registered.
    ///
    /// # Errors
    ///
    /// Propagates encoding failures for `error` or `result`.
    pub fn response(
        id: MessageId,
        error: Option<Value>,
        result: Value,
    ) -> Result<Vec<u8>, EncodeError> {
        to_vec(&Message::Response(Response { id, error, result }).into_value())
    }

    /// `nvim_get_api_info()`.
    ///
    /// # Errors
    ///
    /// See [`Outbound::request`].
    pub fn get_api_info(&mut self) -> Result<OutboundRequest, EncodeError> {
        self.request(PendingRequestKind::GetApiInfo, "nvim_get_api_info", Vec::new())
    }

    /// Attaches as an RGB line-grid UI of `cols` × `rows` cells.
    ///
    /// # Errors
    ///
    /// See [`Outbound::request`].
    pub fn attach_ui(&mut self, cols: u32, rows: u32) -> Result<OutboundRequest, EncodeError> {
        let options = Value::Map(vec![
            (Value::from("rgb"), Value::Bool(true)),
            (Value::from("ext_linegrid"), Value::Bool(true)),
        ]);
        self.request(
            PendingRequestKind::AttachUi,
            "nvim_ui_attach",
            vec![Value::from(cols), Value::from(rows), options],
        )
    }

    /// Asks the editor to resize the default grid.
    ///
    /// # Errors
    ///
    /// See [`Outbound::request`].
    pub fn try_resize(&mut self, cols: u32, rows: u32) -> Result<OutboundRequest, EncodeError> {
        self.request(
            PendingRequestKind::TryResize,
            "nvim_ui_try_resize",
            vec![Value::from(cols), Value::from(rows)],
        )
    }

    /// Queues keys in Vim key notation.
    ///
    /// # Errors
    ///
    /// See [`Outbound::request`].
    pub fn input(&mut self, keys: &str) -> Result<OutboundRequest, EncodeError> {
        self.request(PendingRequestKind::Input, "nvim_input", vec![Value::from(keys)])
    }

    /// Sends a mouse event. `modifiers` uses Vim's modifier letters, e.g.
    /// `"C"` or `"SA"`.
    ///
    /// # Errors
    ///
    /// See [`Outbound::request`].
    pub fn input_mouse(
        &mut self,
        button: MouseButton,
        action: MouseAction,
        modifiers: &str,
        position: MousePosition,
    ) -> Result<OutboundRequest, EncodeError> {
        self.request(
            PendingRequestKind::InputMouse,
            "nvim_input_mouse",
            vec![
                Value::from(button.as_str()),
                Value::from(action.as_str()),
                Value::from(modifiers),
                Value::from(position.grid),
                Value::from(position.row),
                Value::from(position.col),
            ],
        )
    }

    /// Tells the editor whether the UI window has keyboard focus.
    ///
    /// # Errors
    ///
    /// See [`Outbound::request`].
    pub fn set_focus(&mut self, gained: bool) -> Result<OutboundRequest, EncodeError> {
        self.request(
            PendingRequestKind::SetFocus,
            "nvim_ui_set_focus",
            vec![Value::Bool(gained)],
        )
    }

    /// Runs an Ex command.
    ///
    /// # Errors
    ///
    /// See [`Outbound::request`].
    pub fn command(&mut self, command: &str) -> Result<OutboundRequest, EncodeError> {
        self.request(
            PendingRequestKind::Command,
            "nvim_command",
            vec![Value::from(command)],
        )
    }

    /// Queries a global option.
    ///
    /// # Errors
    ///
    /// See [`Outbound::request`].
    pub fn get_option_value(&mut self, name: &str) -> Result<OutboundRequest, EncodeError> {
        self.request(
            PendingRequestKind::GetOptionValue {
                name: name.to_owned(),
            },
            "nvim_get_option_value",
            vec![Value::from(name), Value::Map(Vec::new())],
        )
    }

    /// Opens `path` in the current window, or in a new tab page.
    ///
    /// # Errors
    ///
    /// See [`Outbound::request`].
    pub fn open_file(&mut self, path: &str, new_tab: bool) -> Result<OutboundRequest, EncodeError> {
        let verb = if new_tab { "tabe" } else { "e" };
        self.command(&format!("{verb} {}", EscapedPath(path)))
    }

    /// Quits the editor, prompting for unsaved buffers.
    ///
    /// # Errors
    ///
    /// See [`Outbound::request`].
    pub fn quit(&mut self) -> Result<OutboundRequest, EncodeError> {
        self.command("confirm qa")
    }

    fn allocate_id(&mut self) -> Result<MessageId, EncodeError> {
        let raw = self.next_id.ok_or(EncodeError::IdsExhausted)?;
        self.next_id = raw.checked_add(1);
        Ok(MessageId::new(raw))
    }
}

/// Formats a path as an Ex command argument.
struct EscapedPath<'a>(&'a str);

impl fmt::Display for EscapedPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write as _;

        for ch in self.0.chars() {
            if matches!(
                ch,
                ' ' | '\t' | '\\' | '%' | '#' | '|' | '"' | '\'' | '*' | '?' | '[' | '{' | '$' | '`' | '!' | '<'
            ) {
                f.write_char('\\')?;
            }
            f.write_char(ch)?;
        }
        Ok(())
    }
}
