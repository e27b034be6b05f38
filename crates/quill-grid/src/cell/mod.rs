//! Grid cell: one displayed glyph cluster and its highlight id.

/// A single cell of the grid.
///
/// `text` holds one glyph cluster, which may span several code points. The
/// right half of a double-width glyph is an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    text: String,
    hl_id: u64,
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}

impl Cell {
    /// Creates a cell.
    #[must_use]
    pub fn new(text: impl Into<String>, hl_id: u64) -> Self {
        Self {
            text: text.into(),
            hl_id,
        }
    }

    /// A space drawn with the default colours.
    #[must_use]
    pub fn blank() -> Self {
        Self::new(" ", 0)
    }

    /// The glyph cluster.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Highlight id, `0` meaning default colours.
    #[must_use]
    pub const fn hl_id(&self) -> u64 {
        self.hl_id
    }

    /// Overwrites this cell in place, reusing its text allocation.
    pub fn set(&mut self, text: &str, hl_id: u64) {
        text.clone_into(&mut self.text);
        self.hl_id = hl_id;
    }
}
