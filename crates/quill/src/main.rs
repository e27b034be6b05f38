//! Entrypoint for the headless Quill front-end.
//!
//! The binary delegates to [`quill::run`], which loads configuration, starts
//! the editor and drives the session until the editor exits.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: helper threads log to stderr while the session runs.
    quill::run(std::env::args_os(), &mut io::stdout(), &mut io::stderr())
}
