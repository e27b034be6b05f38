//! User input as the front-end sees it, and its translation into editor
//! key notation.
//!
//! Window systems deliver input in their own vocabulary. Whatever drives the
//! front-end converts it into [`InputEvent`]s and posts them into the session
//! queue; the consumer turns them into `nvim_input`, `nvim_input_mouse` and
//! friends.

use bitflags::bitflags;
use quill_rpc::{MouseAction, MouseButton};

/// Wheel delta reported for one notch, matching the common platform unit.
pub const WHEEL_NOTCH: i32 = 120;

bitflags! {
    /// Modifier keys held during a key press or mouse event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 1;
        /// Control.
        const CTRL = 1 << 1;
        /// Alt, sent to the editor as Meta.
        const ALT = 1 << 2;
        /// Super or Command.
        const SUPER = 1 << 3;
    }
}

impl Modifiers {
    /// Vim modifier prefix, e.g. `C-M-` for Ctrl+Alt.
    #[must_use]
    pub fn prefix(self) -> String {
        [
            (Self::CTRL, "C-"),
            (Self::ALT, "M-"),
            (Self::SHIFT, "S-"),
            (Self::SUPER, "D-"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, letter)| letter)
        .collect()
    }
}

/// Input posted into the session queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Literal text, typed or pasted.
    Text(String),
    /// A single character, possibly with modifiers.
    Char {
        /// The character after keyboard layout translation.
        ch: char,
        /// Modifiers held at the time.
        modifiers: Modifiers,
    },
    /// Keys already in Vim notation, such as `<Esc>` or `<C-w>v`.
    Keys(String),
    /// A mouse button event at a grid position.
    Mouse {
        /// The button.
        button: MouseButton,
        /// What the button did.
        action: MouseAction,
        /// Modifiers held at the time.
        modifiers: Modifiers,
        /// Zero-based row.
        row: u32,
        /// Zero-based column.
        col: u32,
    },
    /// Scroll wheel movement in units of 1/[`WHEEL_NOTCH`] of a notch.
    /// Positive deltas scroll away from the user.
    Wheel {
        /// Wheel delta.
        delta: i32,
        /// Modifiers held at the time.
        modifiers: Modifiers,
        /// Zero-based row under the pointer.
        row: u32,
        /// Zero-based column under the pointer.
        col: u32,
    },
    /// The drawable area now fits `cols` × `rows` cells.
    Resize {
        /// Columns.
        cols: u32,
        /// Rows.
        rows: u32,
    },
    /// The window gained (`true`) or lost keyboard focus.
    Focus(bool),
    /// A file was dropped onto the window or named on a command line.
    OpenFile {
        /// Path of the file.
        path: String,
        /// Open in a new tab page instead of the current window.
        new_tab: bool,
        /// Grid cell `(row, col)` the file was dropped on, if any.
        at: Option<(u32, u32)>,
    },
    /// The user asked to close the window.
    Quit,
}

/// Escapes literal text for `nvim_input`.
#[must_use]
pub fn text_notation(text: &str) -> String {
    let mut keys = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => keys.push_str("<LT>"),
            '\0' => keys.push_str("<Nul>"),
            other => keys.push(other),
        }
    }
    keys
}

/// Key notation for one character typed with `modifiers`.
///
/// Shift alone does not change the notation of a printable character since
/// the keyboard layout has already applied it.
#[must_use]
pub fn char_notation(ch: char, modifiers: Modifiers) -> String {
    let printable = !ch.is_control() && ch != ' ';
    let significant = if printable && modifiers == Modifiers::SHIFT {
        Modifiers::empty()
    } else {
        modifiers
    };
    if significant.is_empty() {
        return text_notation(ch.encode_utf8(&mut [0; 4]));
    }

    let name = match ch {
        '<' => "lt".to_owned(),
        '\0' => "Nul".to_owned(),
        ' ' => "Space".to_owned(),
        '\\' => "Bslash".to_owned(),
        '|' => "Bar".to_owned(),
        other => other.to_string(),
    };
    format!("<{}{name}>", significant.prefix())
}

/// Collects wheel deltas until they add up to whole notches.
///
/// High-resolution wheels and touchpads report fractions of a notch; the
/// editor only understands whole ones, so the remainder carries over to the
/// next event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WheelAccumulator {
    buffered: i32,
}

impl WheelAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self { buffered: 0 }
    }

    /// Delta carried over from earlier events.
    #[must_use]
    pub const fn buffered(&self) -> i32 {
        self.buffered
    }

    /// Adds `delta` and returns the direction and number of whole notches
    /// now available, if any.
    pub fn feed(&mut self, delta: i32) -> Option<(MouseAction, u32)> {
        self.buffered = self.buffered.saturating_add(delta);
        let (action, step) = if self.buffered > 0 {
            (MouseAction::WheelUp, WHEEL_NOTCH)
        } else {
            (MouseAction::WheelDown, -WHEEL_NOTCH)
        };

        let mut notches = 0_u32;
        while self.buffered.unsigned_abs() >= WHEEL_NOTCH.unsigned_abs() {
            self.buffered -= step;
            notches += 1;
        }
        (notches > 0).then_some((action, notches))
    }
}

#[cfg(test)]
mod tests;
