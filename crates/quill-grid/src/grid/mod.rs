//! Authoritative grid model.
//!
//! [`GridState`] mirrors the editor's idea of the screen: a row-major array
//! of [`Cell`]s, the cursor, the highlight table and a handful of UI flags.
//! Only the redraw interpreter mutates it; renderers read it once
//! [`GridState::is_consistent`] reports a flush boundary.

use std::collections::HashMap;
use std::ops::Range;

use quill_rpc::Value;
use thiserror::Error;

use crate::cell::Cell;
use crate::highlight::{HighlightTable, Rgb};

/// Largest number of cells a resize may allocate.
pub const MAX_CELLS: usize = 1 << 22;

/// Errors raised by grid operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// The requested dimensions need more than [`MAX_CELLS`] cells.
    #[error("grid of {cols}x{rows} cells exceeds the limit of {limit}")]
    TooLarge {
        /// Requested columns.
        cols: usize,
        /// Requested rows.
        rows: usize,
        /// Cell limit.
        limit: usize,
    },
}

/// Zero-based cursor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    /// Row, counted from the top.
    pub row: usize,
    /// Column, counted from the left.
    pub col: usize,
}

/// A rectangle of the grid; `bottom` and `right` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRegion {
    /// First row of the region.
    pub top: usize,
    /// One past the last row.
    pub bottom: usize,
    /// First column of the region.
    pub left: usize,
    /// One past the last column.
    pub right: usize,
}

impl ScrollRegion {
    fn clipped(self, rows: usize, cols: usize) -> Self {
        let bottom = self.bottom.min(rows);
        let right = self.right.min(cols);
        Self {
            top: self.top.min(bottom),
            bottom,
            left: self.left.min(right),
            right,
        }
    }

    const fn height(&self) -> usize {
        self.bottom.saturating_sub(self.top)
    }

    const fn columns(&self) -> Range<usize> {
        self.left..self.right
    }
}

/// The grid, its highlight table and the UI state that accompanies it.
#[derive(Debug, Clone)]
pub struct GridState {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    cursor: CursorPosition,
    scroll_region: Option<ScrollRegion>,
    highlights: HighlightTable,
    initialized: bool,
    dirty: bool,
    consistent: bool,
    mode: String,
    title: String,
    busy: bool,
    options: HashMap<String, Value>,
}

impl Default for GridState {
    fn default() -> Self {
        Self {
            rows: 0,
            cols: 0,
            cells: Vec::new(),
            cursor: CursorPosition::default(),
            scroll_region: None,
            highlights: HighlightTable::new(),
            initialized: false,
            dirty: false,
            consistent: true,
            mode: String::new(),
            title: String::new(),
            busy: false,
            options: HashMap::new(),
        }
    }
}

impl GridState {
    /// Creates an empty, uninitialised grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `true` once the editor has sized the grid.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Reallocates the grid. Previous contents are discarded because the
    /// editor always repaints after a resize.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::TooLarge`] when the grid would exceed
    /// [`MAX_CELLS`]; the grid is left untouched.
    pub fn resize(&mut self, cols: usize, rows: usize) -> Result<(), GridError> {
        let len = cols
            .checked_mul(rows)
            .filter(|len| *len <= MAX_CELLS)
            .ok_or(GridError::TooLarge {
                cols,
                rows,
                limit: MAX_CELLS,
            })?;

        self.cells.clear();
        self.cells.resize(len, Cell::blank());
        self.rows = rows;
        self.cols = cols;
        self.scroll_region = None;
        self.initialized = true;
        self.set_cursor(self.cursor.row, self.cursor.col);
        self.dirty = true;
        Ok(())
    }

    /// Cell at `(row, col)`, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).and_then(|index| self.cells.get(index))
    }

    /// All cells of `row`.
    #[must_use]
    pub fn row_cells(&self, row: usize) -> Option<&[Cell]> {
        let start = self.index(row, 0)?;
        self.cells.get(start..start + self.cols)
    }

    /// Concatenated text of `row`.
    #[must_use]
    pub fn row_text(&self, row: usize) -> Option<String> {
        self.row_cells(row)
            .map(|cells| cells.iter().map(Cell::text).collect())
    }

    /// Whole grid as text, one line per row.
    #[must_use]
    pub fn text(&self) -> String {
        (0..self.rows)
            .filter_map(|row| self.row_text(row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Overwrites one cell. Writes outside the grid are dropped.
    ///
    /// Returns `true` when the cell was inside the grid.
    pub fn put(&mut self, row: usize, col: usize, text: &str, hl_id: u64) -> bool {
        let Some(cell) = self
            .index(row, col)
            .and_then(|index| self.cells.get_mut(index))
        else {
            return false;
        };
        cell.set(text, hl_id);
        self.dirty = true;
        true
    }

    /// Blanks every cell with the default highlight.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::blank());
        self.dirty = true;
    }

    /// Current cursor position.
    #[must_use]
    pub const fn cursor(&self) -> CursorPosition {
        self.cursor
    }

    /// Moves the cursor, clamping it into the grid.
    pub fn set_cursor(&mut self, row: usize, col: usize) {
        self.cursor = CursorPosition {
            row: row.min(self.rows.saturating_sub(1)),
            col: col.min(self.cols.saturating_sub(1)),
        };
        self.dirty = true;
    }

    /// Region touched by the most recent scroll.
    #[must_use]
    pub const fn scroll_region(&self) -> Option<ScrollRegion> {
        self.scroll_region
    }

    /// Shifts the contents of the `requested` region by `rows`.
    ///
    /// Positive values move contents up, negative values move them down.
    /// Rows vacated by the shift keep their previous contents; the editor
    /// repaints them with subsequent `grid_line` events.
    pub fn scroll(&mut self, requested: ScrollRegion, rows: i64) {
        let region = requested.clipped(self.rows, self.cols);
        self.scroll_region = Some(region);

        let shift = usize::try_from(rows.unsigned_abs()).unwrap_or(usize::MAX);
        if shift == 0 || shift >= region.height() || region.columns().is_empty() {
            return;
        }

        if rows > 0 {
            for dst in region.top..region.bottom - shift {
                self.copy_row_span(dst + shift, dst, region.columns());
            }
        } else {
            for dst in (region.top + shift..region.bottom).rev() {
                self.copy_row_span(dst - shift, dst, region.columns());
            }
        }
        self.dirty = true;
    }

    /// The highlight table.
    #[must_use]
    pub const fn highlights(&self) -> &HighlightTable {
        &self.highlights
    }

    /// Mutable access to the highlight table.
    pub const fn highlights_mut(&mut self) -> &mut HighlightTable {
        &mut self.highlights
    }

    /// Effective foreground colour of the cell at `(row, col)`.
    #[must_use]
    pub fn foreground_at(&self, row: usize, col: usize) -> Option<Rgb> {
        self.cell(row, col)
            .map(|cell| self.highlights.foreground(cell.hl_id()))
    }

    /// Effective background colour of the cell at `(row, col)`.
    #[must_use]
    pub fn background_at(&self, row: usize, col: usize) -> Option<Rgb> {
        self.cell(row, col)
            .map(|cell| self.highlights.background(cell.hl_id()))
    }

    /// Marks the start of a redraw batch; the grid is not renderable until
    /// the next flush.
    pub const fn begin_batch(&mut self) {
        self.consistent = false;
    }

    /// Marks a flush boundary.
    pub const fn mark_flushed(&mut self) {
        self.consistent = true;
    }

    /// Returns `true` at flush boundaries.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.consistent
    }

    /// Returns `true` when anything visible changed since the last call to
    /// [`GridState::take_dirty`].
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flags a visible change that does not touch any cell, such as new
    /// default colours.
    pub const fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Reports and clears the dirty flag.
    pub const fn take_dirty(&mut self) -> bool {
        let dirty = self.dirty;
        self.dirty = false;
        dirty
    }

    /// Name of the current editor mode, e.g. `normal` or `insert`.
    #[must_use]
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Records a mode change.
    pub fn set_mode(&mut self, mode: impl Into<String>) {
        self.mode = mode.into();
        self.dirty = true;
    }

    /// Window title requested by the editor.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Records a title change.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Returns `true` while the editor asks for the cursor to be hidden.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Records a busy state change.
    pub const fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        self.dirty = true;
    }

    /// Value of a UI option announced through `option_set`.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Records a UI option.
    pub fn set_option(&mut self, name: impl Into<String>, value: Value) {
        self.options.insert(name.into(), value);
    }

    /// The `guifont` option, when the editor has announced a non-empty one.
    #[must_use]
    pub fn guifont(&self) -> Option<&str> {
        self.option("guifont")
            .and_then(Value::as_str)
            .filter(|font| !font.is_empty())
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    fn copy_row_span(&mut self, src_row: usize, dst_row: usize, columns: Range<usize>) {
        let (Some(src), Some(dst)) = (
            self.index(src_row, columns.start),
            self.index(dst_row, columns.start),
        ) else {
            return;
        };
        let len = columns.len();

        if src < dst {
            if let Some((head, tail)) = self.cells.split_at_mut_checked(dst)
                && let (Some(from), Some(to)) = (head.get(src..src + len), tail.get_mut(..len))
            {
                to.clone_from_slice(from);
            }
        } else if let Some((head, tail)) = self.cells.split_at_mut_checked(src)
            && let (Some(to), Some(from)) = (head.get_mut(dst..dst + len), tail.get(..len))
        {
            to.clone_from_slice(from);
        }
    }
}
