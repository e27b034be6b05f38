//! Redraw interpreter.
//!
//! A `redraw` notification carries an ordered list of sub-events, each shaped
//! `[name, args...]`. Every element of `args` is one argument tuple, so a
//! single sub-event may describe several updates:
//!
//! ```text
//! ["grid_line", [1, 0, 0, [["h", 1], ["i"]]], [1, 1, 0, [[" ", 0, 80]]]]
//! ```
//!
//! Older peers send the arguments of a single update inline, as in
//! `["resize", 80, 24]`. When the first argument is not an array the whole
//! argument list is treated as one tuple.
//!
//! Sub-events are applied strictly in order. Unknown names are skipped so
//! newer editors keep working; a malformed tuple is skipped on its own
//! without abandoning the rest of the batch.

use quill_rpc::Value;
use thiserror::Error;
use tracing::{debug, trace};

use crate::grid::{GridState, ScrollRegion};
use crate::highlight::{DefaultColors, HighlightAttribute, Rgb};

/// Method name of redraw notifications.
pub const REDRAW_METHOD: &str = "redraw";

const REDRAW_TARGET: &str = "quill_grid::redraw";

/// Summary of one applied batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RedrawOutcome {
    /// Argument tuples applied to the grid.
    pub applied: usize,
    /// Tuples skipped because their arguments were malformed.
    pub malformed: usize,
    /// Sub-events skipped because their name is not recognised.
    pub unknown: usize,
    /// Whether the batch contained a flush.
    pub flushed: bool,
}

/// Why a single argument tuple could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedrawError {
    /// The sub-event is not an array starting with a name.
    #[error("sub-event is not a named array")]
    Unnamed,
    /// An argument is missing or has the wrong type.
    #[error("argument {index} of {event} is missing or malformed")]
    Argument {
        /// Sub-event name.
        event: &'static str,
        /// Zero-based position within the tuple.
        index: usize,
    },
    /// The grid rejected the update.
    #[error(transparent)]
    Grid(#[from] crate::grid::GridError),
}

/// Applies the sub-events of one redraw notification to `grid`.
pub fn apply_batch(grid: &mut GridState, events: &[Value]) -> RedrawOutcome {
    let mut outcome = RedrawOutcome::default();
    if !events.is_empty() {
        grid.begin_batch();
    }

    for event in events {
        let Some((name, args)) = split_event(event) else {
            debug!(target: REDRAW_TARGET, error = %RedrawError::Unnamed, "skipping sub-event");
            outcome.malformed += 1;
            continue;
        };
        let Some(handler) = handler_for(name) else {
            trace!(target: REDRAW_TARGET, event = name, "ignoring unknown sub-event");
            outcome.unknown += 1;
            continue;
        };

        for tuple in argument_tuples(args) {
            match handler(grid, tuple) {
                Ok(Applied::Update) => {
                    // Anything after a flush reopens the batch.
                    grid.begin_batch();
                    outcome.applied += 1;
                }
                Ok(Applied::Flush) => {
                    outcome.applied += 1;
                    outcome.flushed = true;
                }
                Err(error) => {
                    debug!(target: REDRAW_TARGET, event = name, %error, "skipping malformed arguments");
                    outcome.malformed += 1;
                }
            }
        }
    }
    outcome
}

enum Applied {
    Update,
    Flush,
}

type Handler = fn(&mut GridState, &[Value]) -> Result<Applied, RedrawError>;

fn handler_for(name: &str) -> Option<Handler> {
    let handler: Handler = match name {
        "grid_resize" => grid_resize,
        "resize" => resize,
        "default_colors_set" => default_colors_set,
        "hl_attr_define" => hl_attr_define,
        "hl_group_set" => hl_group_set,
        "grid_line" => grid_line,
        "grid_cursor_goto" => grid_cursor_goto,
        "cursor_goto" => cursor_goto,
        "grid_scroll" => grid_scroll,
        "grid_clear" | "clear" => grid_clear,
        "mode_change" => mode_change,
        "set_title" => set_title,
        "busy_start" => busy_start,
        "busy_stop" => busy_stop,
        "option_set" => option_set,
        "flush" => flush,
        _ => return None,
    };
    Some(handler)
}

fn split_event(event: &Value) -> Option<(&str, &[Value])> {
    let (name, args) = event.as_array()?.split_first()?;
    Some((name.as_str()?, args))
}

fn argument_tuples(args: &[Value]) -> Vec<&[Value]> {
    match args.first() {
        None => vec![<&[Value]>::default()],
        Some(first) if first.as_array().is_some() => {
            args.iter().filter_map(Value::as_array).collect()
        }
        Some(_) => vec![args],
    }
}

/// Typed access to one argument tuple.
struct Args<'a> {
    event: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    const fn new(event: &'static str, values: &'a [Value]) -> Self {
        Self { event, values }
    }

    const fn malformed(&self, index: usize) -> RedrawError {
        RedrawError::Argument {
            event: self.event,
            index,
        }
    }

    fn value(&self, index: usize) -> Result<&'a Value, RedrawError> {
        self.values.get(index).ok_or_else(|| self.malformed(index))
    }

    fn usize(&self, index: usize) -> Result<usize, RedrawError> {
        self.value(index)?
            .as_usize()
            .ok_or_else(|| self.malformed(index))
    }

    fn u64(&self, index: usize) -> Result<u64, RedrawError> {
        self.value(index)?
            .as_u64()
            .ok_or_else(|| self.malformed(index))
    }

    fn i64(&self, index: usize) -> Result<i64, RedrawError> {
        self.value(index)?
            .as_i64()
            .ok_or_else(|| self.malformed(index))
    }

    fn str(&self, index: usize) -> Result<&'a str, RedrawError> {
        self.value(index)?
            .as_str()
            .ok_or_else(|| self.malformed(index))
    }

    fn array(&self, index: usize) -> Result<&'a [Value], RedrawError> {
        self.value(index)?
            .as_array()
            .ok_or_else(|| self.malformed(index))
    }
}

fn grid_resize(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("grid_resize", values);
    grid.resize(args.usize(1)?, args.usize(2)?)?;
    Ok(Applied::Update)
}

fn resize(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("resize", values);
    grid.resize(args.usize(0)?, args.usize(1)?)?;
    Ok(Applied::Update)
}

fn default_colors_set(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("default_colors_set", values);
    let builtin = DefaultColors::default();
    let colour = |index: usize, fallback: Rgb| -> Result<Rgb, RedrawError> {
        Ok(Rgb::from_value(args.value(index)?).unwrap_or(fallback))
    };
    let defaults = DefaultColors {
        foreground: colour(0, builtin.foreground)?,
        background: colour(1, builtin.background)?,
        special: colour(2, builtin.special)?,
    };
    grid.highlights_mut().set_defaults(defaults);
    grid.mark_dirty();
    Ok(Applied::Update)
}

fn hl_attr_define(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("hl_attr_define", values);
    let id = args.u64(0)?;
    let rgb_attrs = args.value(1)?;
    if rgb_attrs.as_map().is_none() {
        return Err(args.malformed(1));
    }
    let attribute = HighlightAttribute::from_definition(id, rgb_attrs, values.get(3));
    grid.highlights_mut().define(attribute);
    grid.mark_dirty();
    Ok(Applied::Update)
}

fn hl_group_set(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("hl_group_set", values);
    let name = args.str(0)?;
    let id = args.u64(1)?;
    grid.highlights_mut().set_group(name, id);
    Ok(Applied::Update)
}

/// `[grid, row, col_start, cells, wrap?]` where each cell is
/// `[text, hl_id?, repeat?]`. A missing `hl_id` reuses the previous cell's.
fn grid_line(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("grid_line", values);
    let row = args.usize(1)?;
    let mut col = args.usize(2)?;
    let cells = args.array(3)?;

    let mut hl_id = 0;
    for cell in cells {
        let parts = cell.as_array().ok_or_else(|| args.malformed(3))?;
        let text = parts
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| args.malformed(3))?;
        if let Some(id) = parts.get(1).and_then(Value::as_u64) {
            hl_id = id;
        }
        let repeat = parts.get(2).and_then(Value::as_usize).unwrap_or(1);

        let end = col.saturating_add(repeat).min(grid.cols());
        while col < end {
            grid.put(row, col, text, hl_id);
            col += 1;
        }
        if col >= grid.cols() {
            break;
        }
    }
    Ok(Applied::Update)
}

fn grid_cursor_goto(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("grid_cursor_goto", values);
    grid.set_cursor(args.usize(1)?, args.usize(2)?);
    Ok(Applied::Update)
}

fn cursor_goto(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("cursor_goto", values);
    grid.set_cursor(args.usize(0)?, args.usize(1)?);
    Ok(Applied::Update)
}

/// `[grid, top, bot, left, right, rows, cols]`; `cols` is always zero.
fn grid_scroll(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("grid_scroll", values);
    let region = ScrollRegion {
        top: args.usize(1)?,
        bottom: args.usize(2)?,
        left: args.usize(3)?,
        right: args.usize(4)?,
    };
    grid.scroll(region, args.i64(5)?);
    Ok(Applied::Update)
}

fn grid_clear(grid: &mut GridState, _values: &[Value]) -> Result<Applied, RedrawError> {
    grid.clear();
    Ok(Applied::Update)
}

fn mode_change(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("mode_change", values);
    grid.set_mode(args.str(0)?);
    Ok(Applied::Update)
}

fn set_title(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("set_title", values);
    grid.set_title(args.str(0)?);
    Ok(Applied::Update)
}

fn busy_start(grid: &mut GridState, _values: &[Value]) -> Result<Applied, RedrawError> {
    grid.set_busy(true);
    Ok(Applied::Update)
}

fn busy_stop(grid: &mut GridState, _values: &[Value]) -> Result<Applied, RedrawError> {
    grid.set_busy(false);
    Ok(Applied::Update)
}

fn option_set(grid: &mut GridState, values: &[Value]) -> Result<Applied, RedrawError> {
    let args = Args::new("option_set", values);
    let name = args.str(0)?;
    grid.set_option(name, args.value(1)?.clone());
    Ok(Applied::Update)
}

fn flush(grid: &mut GridState, _values: &[Value]) -> Result<Applied, RedrawError> {
    grid.mark_flushed();
    Ok(Applied::Flush)
}
