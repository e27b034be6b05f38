//! The single consumer context of a session.
//!
//! A [`Connection`] owns everything that changes while the editor runs: the
//! writer half of the pipe, the outbound id counter with its correlation
//! table, the grid and the surface. The reader thread and any input sources
//! only post [`Inbound`] events into a channel; [`Connection::run`] drains it
//! on one thread, so none of that state needs a lock.

use std::io::Write;

use crossbeam_channel::Receiver;
use quill_grid::{GridState, REDRAW_METHOD, apply_batch};
use quill_rpc::{
    EncodeError, Message, MessageId, MouseAction, MouseButton, MousePosition, Notification, Outbound,
    OutboundRequest, PendingRequestKind, PendingRequests, ReadError, ReaderEvent, Request,
    Response, VIMENTER_AUTOCMD, Value,
};
use tracing::{debug, info, trace, warn};

use crate::error::SessionError;
use crate::input::{InputEvent, WheelAccumulator, char_notation, text_notation};
use crate::surface::Surface;

const CONNECTION_TARGET: &str = "quill::connection";

/// Request the editor sends once its startup files have been read.
pub const VIMENTER_METHOD: &str = "vimenter";

/// Option holding the font specification.
const GUIFONT_OPTION: &str = "guifont";

/// Grid id used for mouse input; `0` targets whichever grid is under the
/// pointer.
const DEFAULT_MOUSE_GRID: u32 = 0;

/// Events drained by [`Connection::run`].
#[derive(Debug, Clone)]
pub enum Inbound {
    /// Output of the reader thread.
    Reader(ReaderEvent),
    /// Input from the user.
    Input(InputEvent),
}

impl From<ReaderEvent> for Inbound {
    fn from(event: ReaderEvent) -> Self {
        Self::Reader(event)
    }
}

impl From<InputEvent> for Inbound {
    fn from(event: InputEvent) -> Self {
        Self::Input(event)
    }
}

/// Whether the run loop keeps going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Wait for the next event.
    Continue,
    /// The pipe is closed; stop.
    Stop,
}

/// One session with the editor.
#[derive(Debug)]
pub struct Connection<W, S> {
    writer: W,
    outbound: Outbound,
    grid: GridState,
    surface: S,
    wheel: WheelAccumulator,
    channel_id: Option<i64>,
    font: Option<String>,
}

impl<W: Write, S: Surface> Connection<W, S> {
    /// Creates a session writing to `writer` and drawing on `surface`.
    #[must_use]
    pub fn new(writer: W, surface: S) -> Self {
        Self::with_pending(writer, surface, PendingRequests::new())
    }

    /// Creates a session whose correlation table is `pending`, typically one
    /// built with a configured warning threshold.
    #[must_use]
    pub fn with_pending(writer: W, surface: S, pending: PendingRequests) -> Self {
        Self {
            writer,
            outbound: Outbound::with_pending(pending),
            grid: GridState::new(),
            surface,
            wheel: WheelAccumulator::new(),
            channel_id: None,
            font: None,
        }
    }

    /// The grid as of the last processed event.
    #[must_use]
    pub const fn grid(&self) -> &GridState {
        &self.grid
    }

    /// The surface receiving frames.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Requests still waiting for a response.
    #[must_use]
    pub const fn pending(&self) -> &PendingRequests {
        self.outbound.pending()
    }

    /// Channel id reported by `nvim_get_api_info`, once known.
    #[must_use]
    pub const fn channel_id(&self) -> Option<i64> {
        self.channel_id
    }

    /// Takes the session apart.
    #[must_use]
    pub fn into_parts(self) -> (W, S, GridState) {
        (self.writer, self.surface, self.grid)
    }

    /// Opens the conversation: asks for the channel id, registers the
    /// `VimEnter` callback and attaches as a UI of `cols` × `rows` cells.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Write`] when the pipe rejects a request.
    pub fn start(&mut self, cols: u32, rows: u32) -> Result<(), SessionError> {
        info!(target: CONNECTION_TARGET, cols, rows, "attaching to editor");
        self.issue(Outbound::get_api_info)?;
        self.issue(|outbound| outbound.command(VIMENTER_AUTOCMD))?;
        self.issue(|outbound| outbound.attach_ui(cols, rows))
    }

    /// Drains `receiver` until the pipe closes or the session fails.
    ///
    /// Dropping the receiver on return discards anything posted afterwards.
    ///
    /// # Errors
    ///
    /// See [`Connection::handle`].
    pub fn run(&mut self, receiver: Receiver<Inbound>) -> Result<(), SessionError> {
        for inbound in receiver {
            if self.handle(inbound)? == Flow::Stop {
                return Ok(());
            }
        }
        debug!(target: CONNECTION_TARGET, "every sender is gone");
        self.report_unanswered();
        Ok(())
    }

    /// Processes one event.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Desync`] for a response nobody asked for,
    /// [`SessionError::Decode`] or [`SessionError::Read`] when the reader
    /// failed, and [`SessionError::Write`] when the pipe rejects a write.
    pub fn handle(&mut self, inbound: Inbound) -> Result<Flow, SessionError> {
        match inbound {
            Inbound::Reader(ReaderEvent::Message(value)) => {
                self.handle_value(value)?;
                Ok(Flow::Continue)
            }
            Inbound::Reader(ReaderEvent::Closed | ReaderEvent::Failed(ReadError::Closed)) => {
                info!(target: CONNECTION_TARGET, "editor closed the pipe");
                self.report_unanswered();
                Ok(Flow::Stop)
            }
            Inbound::Reader(ReaderEvent::Failed(ReadError::Decode(error))) => {
                Err(SessionError::Decode(error))
            }
            Inbound::Reader(ReaderEvent::Failed(ReadError::Io(error))) => {
                Err(SessionError::Read(error))
            }
            Inbound::Input(event) => {
                self.handle_input(event)?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Classifies and routes one decoded message.
    ///
    /// Malformed envelopes are logged and dropped.
    ///
    /// # Errors
    ///
    /// See [`Connection::handle`].
    pub fn handle_value(&mut self, value: Value) -> Result<(), SessionError> {
        match Message::from_value(value) {
            Ok(Message::Response(response)) => self.on_response(&response),
            Ok(Message::Notification(notification)) => {
                self.on_notification(&notification);
                Ok(())
            }
            Ok(Message::Request(request)) => self.on_request(&request),
            Err(error) => {
                warn!(target: CONNECTION_TARGET, %error, "dropping malformed message");
                Ok(())
            }
        }
    }

    /// Translates user input into editor requests.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Write`] when the pipe rejects a request.
    pub fn handle_input(&mut self, event: InputEvent) -> Result<(), SessionError> {
        trace!(target: CONNECTION_TARGET, ?event, "input");
        match event {
            InputEvent::Text(text) => self.issue(|outbound| outbound.input(&text_notation(&text))),
            InputEvent::Char { ch, modifiers } => {
                self.issue(|outbound| outbound.input(&char_notation(ch, modifiers)))
            }
            InputEvent::Keys(keys) => self.issue(|outbound| outbound.input(&keys)),
            InputEvent::Mouse {
                button,
                action,
                modifiers,
                row,
                col,
            } => {
                let position = MousePosition {
                    grid: DEFAULT_MOUSE_GRID,
                    row,
                    col,
                };
                self.issue(|outbound| {
                    outbound.input_mouse(button, action, &modifiers.prefix(), position)
                })
            }
            InputEvent::Wheel {
                delta,
                modifiers,
                row,
                col,
            } => {
                let Some((action, notches)) = self.wheel.feed(delta) else {
                    return Ok(());
                };
                let position = MousePosition {
                    grid: DEFAULT_MOUSE_GRID,
                    row,
                    col,
                };
                let prefix = modifiers.prefix();
                for _ in 0..notches {
                    self.issue(|outbound| {
                        outbound.input_mouse(MouseButton::Wheel, action, &prefix, position)
                    })?;
                }
                Ok(())
            }
            InputEvent::Resize { cols, rows } => self.resize(cols, rows),
            InputEvent::Focus(gained) => self.issue(|outbound| outbound.set_focus(gained)),
            InputEvent::OpenFile { path, new_tab, at } => {
                // A click first, so the file lands in the window under the pointer.
                if let Some((row, col)) = at {
                    let position = MousePosition {
                        grid: DEFAULT_MOUSE_GRID,
                        row,
                        col,
                    };
                    for action in [MouseAction::Press, MouseAction::Release] {
                        self.issue(|outbound| {
                            outbound.input_mouse(MouseButton::Left, action, "", position)
                        })?;
                    }
                }
                self.issue(|outbound| outbound.open_file(&path, new_tab))
            }
            InputEvent::Quit => self.issue(Outbound::quit),
        }
    }

    fn resize(&mut self, cols: u32, rows: u32) -> Result<(), SessionError> {
        let unchanged = usize::try_from(cols).ok() == Some(self.grid.cols())
            && usize::try_from(rows).ok() == Some(self.grid.rows());
        if !self.grid.is_initialized() || unchanged || cols == 0 || rows == 0 {
            trace!(target: CONNECTION_TARGET, cols, rows, "resize not needed");
            return Ok(());
        }
        self.issue(|outbound| outbound.try_resize(cols, rows))
    }

    fn on_response(&mut self, response: &Response) -> Result<(), SessionError> {
        let Ok(kind) = self.outbound.pending_mut().resolve(response.id) else {
            warn!(target: CONNECTION_TARGET, id = %response.id, "response for unknown id");
            return Err(SessionError::Desync { id: response.id });
        };

        if let Some(message) = response.error_message() {
            warn!(
                target: CONNECTION_TARGET,
                id = %response.id,
                request = %kind,
                error = %message,
                "editor rejected request"
            );
            return Ok(());
        }

        match kind {
            PendingRequestKind::GetApiInfo => {
                self.channel_id = response
                    .result
                    .as_array()
                    .and_then(<[Value]>::first)
                    .and_then(Value::as_i64);
                debug!(target: CONNECTION_TARGET, channel = ?self.channel_id, "api info received");
            }
            PendingRequestKind::GetOptionValue { name } if name == GUIFONT_OPTION => {
                if let Some(font) = response.result.as_str() {
                    self.update_font(font);
                }
            }
            other => {
                trace!(
                    target: CONNECTION_TARGET,
                    id = %response.id,
                    request = %other,
                    "request acknowledged"
                );
            }
        }
        Ok(())
    }

    fn on_notification(&mut self, notification: &Notification) {
        if notification.method != REDRAW_METHOD {
            debug!(
                target: CONNECTION_TARGET,
                method = %notification.method,
                "ignoring notification"
            );
            return;
        }

        let outcome = apply_batch(&mut self.grid, &notification.params);
        if let Some(font) = self.grid.guifont().map(str::to_owned) {
            self.update_font(&font);
        }
        if outcome.flushed && self.grid.is_consistent() && self.grid.take_dirty() {
            self.surface.present(&self.grid);
        }
    }

    fn on_request(&mut self, request: &Request) -> Result<(), SessionError> {
        if request.method == VIMENTER_METHOD {
            debug!(target: CONNECTION_TARGET, id = %request.id, "editor finished startup");
            self.respond(request.id, None)?;
            return self.issue(|outbound| outbound.get_option_value(GUIFONT_OPTION));
        }

        debug!(
            target: CONNECTION_TARGET,
            id = %request.id,
            method = %request.method,
            "rejecting unknown request"
        );
        let error = Value::from(format!("unknown method: {}", request.method));
        self.respond(request.id, Some(error))
    }

    fn update_font(&mut self, font: &str) {
        if font.is_empty() || self.font.as_deref() == Some(font) {
            return;
        }
        self.font = Some(font.to_owned());
        self.surface.set_font(font);
    }

    fn respond(&mut self, id: MessageId, failure: Option<Value>) -> Result<(), SessionError> {
        match Outbound::response(id, failure, Value::Nil) {
            Ok(bytes) => self.write_frame(&bytes),
            Err(error) => {
                encoding_failed(&error);
                Ok(())
            }
        }
    }

    /// Builds a request with the outbound encoder and writes it.
    fn issue<F>(&mut self, build: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut Outbound) -> Result<OutboundRequest, EncodeError>,
    {
        match build(&mut self.outbound) {
            Ok(encoded) => {
                trace!(
                    target: CONNECTION_TARGET,
                    id = %encoded.id,
                    bytes = encoded.bytes.len(),
                    "sending request"
                );
                self.write_frame(&encoded.bytes)
            }
            Err(error) => {
                encoding_failed(&error);
                Ok(())
            }
        }
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.writer
            .write_all(bytes)
            .and_then(|()| self.writer.flush())
            .map_err(SessionError::Write)
    }

    fn report_unanswered(&mut self) {
        for (id, kind) in self.outbound.pending_mut().drain_unanswered() {
            debug!(target: CONNECTION_TARGET, %id, request = %kind, "request never answered");
        }
    }
}

/// Encoding failures are programming errors: fatal in debug builds, logged
/// and skipped in release builds.
fn encoding_failed(error: &EncodeError) {
    warn!(target: CONNECTION_TARGET, %error, "failed to encode outbound message");
    debug_assert!(false, "failed to encode outbound message: {error}");
}
