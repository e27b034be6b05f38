//! Host side of the Quill front-end.
//!
//! This crate wires the pieces of a session together:
//!
//! - [`EditorProcess`] starts `nvim --embed` and owns the child process.
//! - A reader thread from `quill-rpc` frames the editor's stdout and posts
//!   [`Inbound`] events into a `crossbeam-channel` queue.
//! - [`Connection`] drains that queue on one thread, routing responses,
//!   redraw notifications and editor requests, and translating
//!   [`InputEvent`]s into editor requests.
//! - [`Surface`] receives consistent grid snapshots.
//!
//! The `quill` binary runs a headless session: key notation read from stdin
//! is forwarded to the editor and the final grid can be dumped on exit.

pub mod connection;
pub mod error;
pub mod input;
pub mod process;
pub mod surface;
pub mod telemetry;

#[cfg(test)]
mod tests;

use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::thread;

use crossbeam_channel::{Sender, unbounded};
use quill_config::{Config, split_launch_arguments};
use quill_rpc::{PendingRequests, spawn_reader};
use tracing::{debug, info, warn};

pub use self::connection::{Connection, Flow, Inbound, VIMENTER_METHOD};
pub use self::error::{HostError, SessionError};
pub use self::input::{
    InputEvent, Modifiers, WHEEL_NOTCH, WheelAccumulator, char_notation, text_notation,
};
pub use self::process::{EditorPipes, EditorProcess};
pub use self::surface::{HeadlessSurface, Surface};
pub use self::telemetry::{TelemetryError, TelemetryHandle};

const HOST_TARGET: &str = "quill::host";

/// Runs the front-end with `args`, reporting failures on `stderr`.
///
/// Arguments are split by [`split_launch_arguments`]: configuration flags
/// first, everything else goes to the editor.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    match launch(args, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "quill: {error}");
            ExitCode::FAILURE
        }
    }
}

fn launch<I, W>(args: I, stdout: &mut W) -> Result<(), HostError>
where
    I: IntoIterator<Item = OsString>,
    W: Write,
{
    let arguments = split_launch_arguments(args);
    let config = Config::from_args(arguments.config)?;
    telemetry::initialise(&config)?;

    let (mut editor, pipes) = EditorProcess::spawn(config.nvim_bin(), &arguments.editor)?;
    info!(target: HOST_TARGET, pid = editor.id(), "session starting");

    let (sender, receiver) = unbounded::<Inbound>();
    let reader = spawn_reader(pipes.stdout, sender.clone()).map_err(|source| {
        HostError::Thread {
            name: "reader",
            source,
        }
    })?;
    spawn_stdin_forwarder(sender)?;

    let pending = PendingRequests::with_warn_threshold(config.pending_request_warn_threshold());
    let mut connection = Connection::with_pending(pipes.stdin, HeadlessSurface::new(), pending);
    let outcome = connection
        .start(config.start_cols(), config.start_rows())
        .and_then(|()| connection.run(receiver));
    let (editor_stdin, surface, grid) = connection.into_parts();
    drop(editor_stdin);
    debug!(target: HOST_TARGET, frames = surface.frames(), "session finished");

    let exit = match outcome {
        Ok(()) => editor.wait(),
        Err(error) => {
            warn!(target: HOST_TARGET, %error, "session failed");
            editor.terminate();
            Err(HostError::Session(error))
        }
    };
    if reader.join().is_err() {
        warn!(target: HOST_TARGET, "reader thread panicked");
    }

    if config.dump_grid_on_exit() {
        writeln!(stdout, "{}", grid.text())
            .and_then(|()| stdout.flush())
            .map_err(HostError::Output)?;
    }
    exit
}

/// Forwards stdin to the session, one line of key notation at a time.
/// End of input asks the editor to quit.
fn spawn_stdin_forwarder(sender: Sender<Inbound>) -> Result<(), HostError> {
    thread::Builder::new()
        .name("quill-stdin".to_owned())
        .spawn(move || forward_lines(io::stdin().lock(), &sender))
        .map(|_detached| ())
        .map_err(|source| HostError::Thread {
            name: "stdin",
            source,
        })
}

fn forward_lines(input: impl BufRead, sender: &Sender<Inbound>) {
    for line in input.lines() {
        let keys = match line {
            Ok(keys) => keys,
            Err(error) => {
                debug!(target: HOST_TARGET, %error, "stopped reading stdin");
                break;
            }
        };
        if keys.is_empty() {
            continue;
        }
        if sender.send(Inbound::from(InputEvent::Keys(keys))).is_err() {
            return;
        }
    }
    let _ = sender.send(Inbound::from(InputEvent::Quit));
}
