//! Message framing over the editor's output pipe.
//!
//! Msgpack-RPC has no length prefix: a message ends where its top-level value
//! ends. [`MessageReader`] therefore walks the buffered bytes with a
//! [`FrameScanner`] and decodes only once a whole value has arrived, keeping
//! any surplus bytes buffered for the next call. The scan resumes where it
//! stopped, so a large message split over many reads is walked once. [`spawn_reader`] runs the framer on a dedicated thread, since
//! pipe reads block, and hands each message to the consumer through a
//! `crossbeam-channel` queue.

use std::io::{self, Read};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{debug, trace, warn};

use crate::decode::{FrameScanner, decode};
use crate::error::{DecodeError, ReadError};
use crate::value::Value;

/// Log target for framing operations.
const FRAMER_TARGET: &str = "quill_rpc::framer";

/// Size of a single pipe read.
const READ_CHUNK: usize = 16 * 1024;

/// Reads complete top-level values from a byte stream.
#[derive(Debug)]
pub struct MessageReader<R> {
    reader: R,
    buffer: Vec<u8>,
    scratch: Vec<u8>,
    scanner: FrameScanner,
    closed: bool,
}

impl<R: Read> MessageReader<R> {
    /// Wraps the read half of the pipe.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            scratch: vec![0; READ_CHUNK],
            scanner: FrameScanner::default(),
            closed: false,
        }
    }

    /// Number of bytes read from the pipe but not yet returned as a message.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Blocks until one complete message is available.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Closed`] once the pipe reaches end of file (and on
    /// every call after that), [`ReadError::Decode`] when the buffered bytes
    /// are malformed, and [`ReadError::Io`] when the read itself fails.
    pub fn next_message(&mut self) -> Result<Value, ReadError> {
        loop {
            if let Some(value) = self.take_buffered()? {
                return Ok(value);
            }
            if self.closed {
                return Err(ReadError::Closed);
            }
            self.fill()?;
        }
    }

    fn take_buffered(&mut self) -> Result<Option<Value>, DecodeError> {
        if self.buffer.is_empty() || !self.scanner.advance(&self.buffer) {
            return Ok(None);
        }
        match decode(&self.buffer) {
            Ok((value, consumed)) => {
                self.buffer.drain(..consumed);
                self.scanner.reset();
                trace!(
                    target: FRAMER_TARGET,
                    consumed,
                    remaining = self.buffer.len(),
                    "framed message"
                );
                Ok(Some(value))
            }
            Err(DecodeError::Truncated) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn fill(&mut self) -> Result<(), ReadError> {
        let read = loop {
            match self.reader.read(&mut self.scratch) {
                Ok(read) => break read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error.into()),
            }
        };

        if read == 0 {
            if !self.buffer.is_empty() {
                warn!(
                    target: FRAMER_TARGET,
                    dangling = self.buffer.len(),
                    "pipe closed in the middle of a message"
                );
                self.buffer.clear();
                self.scanner.reset();
            }
            self.closed = true;
            return Ok(());
        }

        if let Some(chunk) = self.scratch.get(..read) {
            self.buffer.extend_from_slice(chunk);
        }
        Ok(())
    }
}

/// Events posted by the reader thread.
///
/// Every reader posts any number of `Message` events followed by exactly one
/// terminal event: `Closed` when the pipe ends, or `Failed` when the byte
/// stream can no longer be framed.
#[derive(Debug, Clone)]
pub enum ReaderEvent {
    /// One complete top-level value.
    Message(Value),
    /// The stream is unreadable; no further messages will follow.
    Failed(ReadError),
    /// The pipe reached end of file.
    Closed,
}

/// Spawns the pipe-reading thread.
///
/// The thread never touches shared state: it only frames messages and posts
/// them to `sender`. It stops after the terminal event, or as soon as the
/// receiving side has gone away.
///
/// # Errors
///
/// Returns the I/O error reported by the OS when the thread cannot be spawned.
pub fn spawn_reader<R, T>(reader: R, sender: Sender<T>) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
    T: From<ReaderEvent> + Send + 'static,
{
    thread::Builder::new()
        .name("quill-reader".to_owned())
        .spawn(move || run_reader(MessageReader::new(reader), &sender))
}

fn run_reader<R: Read, T: From<ReaderEvent>>(mut reader: MessageReader<R>, sender: &Sender<T>) {
    loop {
        let (event, terminal) = match reader.next_message() {
            Ok(value) => (ReaderEvent::Message(value), false),
            Err(ReadError::Closed) => (ReaderEvent::Closed, true),
            Err(error) => {
                warn!(target: FRAMER_TARGET, %error, "reader stopping");
                (ReaderEvent::Failed(error), true)
            }
        };

        if sender.send(T::from(event)).is_err() {
            debug!(target: FRAMER_TARGET, "consumer gone, reader stopping");
            return;
        }
        if terminal {
            debug!(target: FRAMER_TARGET, "reader finished");
            return;
        }
    }
}
