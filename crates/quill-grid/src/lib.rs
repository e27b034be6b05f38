//! Redraw-event-sourced grid model for the Quill front-end.
//!
//! The editor describes its screen as an ordered stream of `redraw`
//! notifications. [`apply_batch`] folds each notification into a
//! [`GridState`], which holds the cells, cursor, highlight table and UI
//! flags that a renderer needs. The grid is only guaranteed to be
//! self-consistent after a `flush` sub-event; see
//! [`GridState::is_consistent`].

pub mod cell;
pub mod grid;
pub mod highlight;
pub mod redraw;

#[cfg(test)]
mod tests;

pub use self::cell::Cell;
pub use self::grid::{CursorPosition, GridError, GridState, MAX_CELLS, ScrollRegion};
pub use self::highlight::{DefaultColors, HighlightAttribute, HighlightTable, Rgb, StyleFlags};
pub use self::redraw::{REDRAW_METHOD, RedrawError, RedrawOutcome, apply_batch};
