//! Boundary between the session and whatever draws the grid.

use quill_grid::GridState;
use tracing::debug;

const SURFACE_TARGET: &str = "quill::surface";

/// Receives grid snapshots and font changes from the session.
///
/// Calls happen on the consumer thread, and only at flush boundaries, so
/// implementations always see a consistent grid.
pub trait Surface {
    /// Draws `grid`.
    fn present(&mut self, grid: &GridState);

    /// Applies a `guifont` specification such as `Iosevka:h14`.
    fn set_font(&mut self, spec: &str);
}

/// A surface without a window. It counts frames and remembers the font.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessSurface {
    frames: u64,
    font: Option<String>,
    title: String,
}

impl HeadlessSurface {
    /// Creates a surface that has presented nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames presented so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Last font specification received.
    #[must_use]
    pub fn font(&self) -> Option<&str> {
        self.font.as_deref()
    }

    /// Title of the last presented grid.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Surface for HeadlessSurface {
    fn present(&mut self, grid: &GridState) {
        self.frames = self.frames.saturating_add(1);
        if self.title != grid.title() {
            grid.title().clone_into(&mut self.title);
        }
        debug!(
            target: SURFACE_TARGET,
            frame = self.frames,
            cols = grid.cols(),
            rows = grid.rows(),
            cursor_row = grid.cursor().row,
            cursor_col = grid.cursor().col,
            mode = grid.mode(),
            "frame presented"
        );
    }

    fn set_font(&mut self, spec: &str) {
        debug!(target: SURFACE_TARGET, font = spec, "font changed");
        self.font = Some(spec.to_owned());
    }
}
