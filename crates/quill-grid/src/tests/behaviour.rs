//! Behaviour-driven tests for redraw batches.

use quill_rpc::Value;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::grid::GridState;
use crate::highlight::Rgb;
use crate::redraw::apply_batch;

#[derive(Default)]
struct TestWorld {
    grid: GridState,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

fn send(world: &mut TestWorld, event: Vec<Value>) {
    apply_batch(&mut world.grid, &[Value::Array(event)]);
}

#[given("a fresh grid")]
fn given_fresh_grid(world: &mut TestWorld) {
    world.grid = GridState::new();
}

#[when("the editor resizes to {cols} columns and {rows} rows")]
fn when_resize(world: &mut TestWorld, cols: u32, rows: u32) {
    send(
        world,
        vec![Value::from("resize"), Value::from(cols), Value::from(rows)],
    );
}

#[when("the editor moves the cursor to row {row} column {col}")]
fn when_cursor_goto(world: &mut TestWorld, row: u32, col: u32) {
    send(
        world,
        vec![Value::from("cursor_goto"), Value::from(row), Value::from(col)],
    );
}

#[when("the editor defines highlight {id} with foreground {colour}")]
fn when_define_highlight(world: &mut TestWorld, id: u32, colour: u32) {
    let rgb_attrs = Value::Map(vec![(Value::from("foreground"), Value::from(colour))]);
    send(
        world,
        vec![
            Value::from("hl_attr_define"),
            Value::Array(vec![
                Value::from(id),
                rgb_attrs,
                Value::Map(Vec::new()),
                Value::Array(Vec::new()),
            ]),
        ],
    );
}

#[when("the editor writes {text} with highlight {id} across {count} columns of row {row}")]
fn when_grid_line(world: &mut TestWorld, text: String, id: u32, count: u32, row: u32) {
    let cell = Value::Array(vec![
        Value::from(text.trim_matches('"')),
        Value::from(id),
        Value::from(count),
    ]);
    send(
        world,
        vec![
            Value::from("grid_line"),
            Value::Array(vec![
                Value::Int(1),
                Value::from(row),
                Value::Int(0),
                Value::Array(vec![cell]),
            ]),
        ],
    );
}

#[when("the editor flushes")]
fn when_flush(world: &mut TestWorld) {
    send(world, vec![Value::from("flush")]);
}

#[then("the grid is {cols} columns by {rows} rows")]
fn then_dimensions(world: &mut TestWorld, cols: usize, rows: usize) {
    assert_eq!((world.grid.cols(), world.grid.rows()), (cols, rows));
}

#[then("the cursor is at row {row} column {col}")]
fn then_cursor(world: &mut TestWorld, row: usize, col: usize) {
    let cursor = world.grid.cursor();
    assert_eq!((cursor.row, cursor.col), (row, col));
}

#[then("the grid is ready to render")]
fn then_consistent(world: &mut TestWorld) {
    assert!(world.grid.is_consistent());
}

#[then("the grid is not ready to render")]
fn then_inconsistent(world: &mut TestWorld) {
    assert!(!world.grid.is_consistent());
}

#[then("columns {first} to {last} of row {row} use highlight {id} with foreground {colour}")]
fn then_run_highlight(
    world: &mut TestWorld,
    first: usize,
    last: usize,
    row: usize,
    id: u64,
    colour: u32,
) {
    for col in first..=last {
        let cell = world.grid.cell(row, col).expect("cell in bounds");
        assert_eq!(cell.hl_id(), id, "highlight of column {col}");
        assert_eq!(world.grid.foreground_at(row, col), Some(Rgb::new(colour)));
    }
}

#[scenario(path = "tests/features/redraw.feature", name = "A legacy resize and cursor move")]
fn legacy_resize_and_cursor(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/redraw.feature",
    name = "A highlighted run takes the highlight's foreground"
)]
fn highlighted_run(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/redraw.feature",
    name = "A batch is not renderable before its flush"
)]
fn unflushed_batch(world: TestWorld) {
    let _ = world;
}
