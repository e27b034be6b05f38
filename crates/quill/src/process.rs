//! Editor process management.
//!
//! The editor runs as `<nvim_bin> --embed [args...]` with its stdin and
//! stdout piped to the session. Its stderr is drained on a helper thread so
//! a chatty editor cannot block on a full pipe; the text is kept for the
//! error report when the editor exits unsuccessfully.

use std::ffi::OsString;
use std::io::{self, Read};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use camino::Utf8Path;
use tracing::{debug, warn};

use crate::error::HostError;

const PROCESS_TARGET: &str = "quill::process";

/// Time the editor gets to exit on its own before it is killed.
const TERMINATION_GRACE: Duration = Duration::from_millis(200);

/// Pipes connecting the session to the editor.
#[derive(Debug)]
pub struct EditorPipes {
    /// Requests and responses to the editor.
    pub stdin: ChildStdin,
    /// Messages from the editor.
    pub stdout: ChildStdout,
}

/// A running editor.
#[derive(Debug)]
pub struct EditorProcess {
    child: Child,
    stderr: Option<JoinHandle<String>>,
}

impl EditorProcess {
    /// Starts `program --embed` followed by `args`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Spawn`] when the process cannot be started or its
    /// pipes cannot be captured, and [`HostError::Thread`] when the stderr
    /// drain cannot be started.
    pub fn spawn(program: &Utf8Path, args: &[OsString]) -> Result<(Self, EditorPipes), HostError> {
        debug!(target: PROCESS_TARGET, command = %program, ?args, "starting editor");
        let spawn_failed = |source: io::Error| HostError::Spawn {
            command: program.to_string(),
            source,
        };

        let mut child = Command::new(program.as_std_path())
            .arg("--embed")
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_failed)?;

        let (Some(stdin), Some(stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(spawn_failed(io::Error::other("editor pipes were not captured")));
        };

        let drain = thread::Builder::new()
            .name("quill-stderr".to_owned())
            .spawn(move || drain_stderr(&mut stderr));
        let stderr_thread = match drain {
            Ok(handle) => handle,
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(HostError::Thread {
                    name: "stderr",
                    source,
                });
            }
        };

        debug!(target: PROCESS_TARGET, pid = child.id(), "editor started");
        Ok((
            Self {
                child,
                stderr: Some(stderr_thread),
            },
            EditorPipes { stdin, stdout },
        ))
    }

    /// OS process id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Waits for the editor to exit.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::EditorExited`] with the captured stderr text when
    /// the editor reports failure, and [`HostError::Wait`] when the exit
    /// status cannot be collected.
    pub fn wait(&mut self) -> Result<(), HostError> {
        let status = self.child.wait().map_err(HostError::Wait)?;
        let diagnostics = self.collect_diagnostics();
        if status.success() {
            debug!(target: PROCESS_TARGET, %status, "editor exited");
            return Ok(());
        }
        warn!(target: PROCESS_TARGET, %status, "editor exited unsuccessfully");
        Err(HostError::EditorExited {
            status,
            diagnostics,
        })
    }

    /// Stops the editor, giving it a short grace period before killing it.
    pub fn terminate(&mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(target: PROCESS_TARGET, %status, "editor already exited");
            }
            Ok(None) | Err(_) => {
                thread::sleep(TERMINATION_GRACE);
                if !matches!(self.child.try_wait(), Ok(Some(_))) {
                    warn!(target: PROCESS_TARGET, pid = self.child.id(), "killing editor");
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                }
            }
        }
        let diagnostics = self.collect_diagnostics();
        if !diagnostics.trim().is_empty() {
            debug!(target: PROCESS_TARGET, %diagnostics, "editor stderr");
        }
    }

    fn collect_diagnostics(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }
}

impl Drop for EditorProcess {
    fn drop(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            if let Err(error) = self.child.kill() {
                warn!(target: PROCESS_TARGET, %error, "failed to kill editor on drop");
            } else {
                let _ = self.child.wait();
            }
        }
    }
}

fn drain_stderr(stderr: &mut impl Read) -> String {
    let mut bytes = Vec::new();
    if let Err(error) = stderr.read_to_end(&mut bytes) {
        debug!(target: PROCESS_TARGET, %error, "stopped reading editor stderr");
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
