//! Error types for the front-end host.

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;

use quill_config::ConfigError;
use quill_rpc::{DecodeError, MessageId};
use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A response arrived for a request that was never sent or was already
    /// answered; the two sides no longer agree on the conversation.
    #[error("response for unknown message id {id}; connection out of sync")]
    Desync {
        /// The unmatched id.
        id: MessageId,
    },

    /// The byte stream could not be decoded.
    #[error("failed to decode editor output: {0}")]
    Decode(#[from] DecodeError),

    /// Reading from the pipe failed.
    #[error("failed to read from the editor: {0}")]
    Read(#[source] Arc<io::Error>),

    /// Writing to the pipe failed.
    #[error("failed to write to the editor: {0}")]
    Write(#[source] io::Error),
}

/// Errors surfaced by the `quill` binary.
#[derive(Debug, Error)]
pub enum HostError {
    /// The configuration could not be resolved.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Telemetry could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The editor process could not be started.
    #[error("failed to start {command}: {source}")]
    Spawn {
        /// Executable that failed to start.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A helper thread could not be started.
    #[error("failed to start the {name} thread: {source}")]
    Thread {
        /// Thread role.
        name: &'static str,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Waiting for the editor to exit failed.
    #[error("failed to wait for the editor: {0}")]
    Wait(#[source] io::Error),

    /// The editor exited unsuccessfully.
    #[error("editor exited with {status}{}", diagnostics_suffix(.diagnostics))]
    EditorExited {
        /// Exit status reported by the OS.
        status: ExitStatus,
        /// Text the editor wrote to stderr.
        diagnostics: String,
    },

    /// The final grid could not be written to stdout.
    #[error("failed to write the grid dump: {0}")]
    Output(#[source] io::Error),

    /// The session ended with an error.
    #[error(transparent)]
    Session(#[from] SessionError),
}

fn diagnostics_suffix(diagnostics: &str) -> String {
    let trimmed = diagnostics.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}
