//! Splits the process arguments between the configuration loader and the
//! editor.
//!
//! Recognised configuration flags must come first. The first argument that
//! is not one of them, or everything after a literal `--`, is forwarded to
//! the editor unchanged, so `quill --start-rows 40 notes.txt` and
//! `quill -- -u NONE` both do what they say.

use std::ffi::{OsStr, OsString};

/// Configuration flags. Each takes a value, either inline (`--flag=value`)
/// or as the next argument.
const VALUE_FLAGS: &[&str] = &[
    "--config-path",
    "--nvim-bin",
    "--start-rows",
    "--start-cols",
    "--log-filter",
    "--log-format",
    "--pending-request-warn-threshold",
    "--dump-grid-on-exit",
];

/// Process arguments split by destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchArguments {
    /// Program name followed by configuration flags, ready for
    /// [`crate::Config::from_args`].
    pub config: Vec<OsString>,
    /// Arguments appended to `<nvim_bin> --embed`.
    pub editor: Vec<OsString>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgumentKind {
    Flag { needs_value: bool },
    Separator,
    Editor,
}

fn classify(argument: &OsStr) -> ArgumentKind {
    let Some(text) = argument.to_str() else {
        return ArgumentKind::Editor;
    };
    if text == "--" {
        return ArgumentKind::Separator;
    }

    let (flag, inline_value) = text
        .split_once('=')
        .map_or((text, false), |(flag, _)| (flag, true));
    if VALUE_FLAGS.contains(&flag) {
        ArgumentKind::Flag {
            needs_value: !inline_value,
        }
    } else {
        ArgumentKind::Editor
    }
}

/// Splits `args` (including the program name) into configuration and editor
/// arguments.
pub fn split_launch_arguments<I>(args: I) -> LaunchArguments
where
    I: IntoIterator<Item = OsString>,
{
    let mut remaining = args.into_iter();
    let mut split = LaunchArguments::default();
    split.config.extend(remaining.next());

    while let Some(argument) = remaining.next() {
        match classify(&argument) {
            ArgumentKind::Flag { needs_value } => {
                split.config.push(argument);
                if needs_value {
                    split.config.extend(remaining.next());
                }
            }
            ArgumentKind::Separator => {
                split.editor.extend(remaining.by_ref());
            }
            ArgumentKind::Editor => {
                split.editor.push(argument);
                split.editor.extend(remaining.by_ref());
            }
        }
    }
    split
}
