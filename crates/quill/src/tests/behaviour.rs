//! Behaviour-driven tests for a session fed by the real reader thread.

use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use crossbeam_channel::{Sender, unbounded};
use quill_rpc::{
    Message, MessageId, Notification, ReaderEvent, Response, Value, spawn_reader, to_vec,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::connection::{Connection, Inbound};
use crate::error::SessionError;
use crate::input::InputEvent;
use crate::surface::HeadlessSurface;

/// Writer whose bytes stay observable after the connection takes it.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct TestWorld {
    written: SharedBuffer,
    connection: Connection<SharedBuffer, HeadlessSurface>,
    pipe: Vec<u8>,
    events: Vec<Inbound>,
    sender: Option<Sender<Inbound>>,
    outcome: Option<Result<(), SessionError>>,
}

impl Default for TestWorld {
    fn default() -> Self {
        let written = SharedBuffer::default();
        Self {
            connection: Connection::new(written.clone(), HeadlessSurface::new()),
            written,
            pipe: Vec::new(),
            events: Vec::new(),
            sender: None,
            outcome: None,
        }
    }
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

fn push_message(world: &mut TestWorld, message: Message) {
    let bytes = to_vec(&message.into_value()).expect("encode editor message");
    world.pipe.extend_from_slice(&bytes);
}

fn process(world: &mut TestWorld, extra: Option<Inbound>) {
    let (sender, receiver) = unbounded();
    for event in world.events.drain(..).chain(extra) {
        sender.send(event).expect("queue open");
    }
    world.outcome = Some(world.connection.run(receiver));
    world.sender = Some(sender);
}

#[given("a session that has attached to the editor")]
fn given_attached_session(world: &mut TestWorld) {
    world.connection.start(80, 24).expect("start session");
    assert_eq!(world.connection.pending().len(), 3);
    drop(world.written.take());
}

#[given("the editor answers request {id} and then closes the pipe")]
fn given_answer_then_close(world: &mut TestWorld, id: u32) {
    push_message(
        world,
        Message::Response(Response {
            id: MessageId::new(id),
            error: None,
            result: Value::Array(vec![Value::Int(1), Value::Map(Vec::new())]),
        }),
    );
}

#[given("the editor draws a {cols} by {rows} grid and then closes the pipe")]
fn given_draw_then_close(world: &mut TestWorld, cols: u32, rows: u32) {
    let resize = Value::Array(vec![
        Value::from("grid_resize"),
        Value::Array(vec![Value::Int(1), Value::from(cols), Value::from(rows)]),
    ]);
    let flush = Value::Array(vec![Value::from("flush")]);
    push_message(
        world,
        Message::Notification(Notification {
            method: "redraw".to_owned(),
            params: vec![resize, flush],
        }),
    );
}

#[when("the reader drains the pipe")]
fn when_reader_drains(world: &mut TestWorld) {
    let (sender, receiver) = unbounded::<Inbound>();
    let pipe = Cursor::new(std::mem::take(&mut world.pipe));
    let reader = spawn_reader(pipe, sender).expect("spawn reader");
    reader.join().expect("reader finishes");
    world.events = receiver.try_iter().collect();
}

#[when("the session processes the reader's events")]
fn when_session_processes(world: &mut TestWorld) {
    process(world, None);
}

#[when("the session processes the reader's events followed by a keystroke")]
fn when_session_processes_then_keystroke(world: &mut TestWorld) {
    process(world, Some(Inbound::from(InputEvent::Keys("i".to_owned()))));
}

#[then("the reader reported the closure exactly once")]
fn then_single_closure(world: &mut TestWorld) {
    let closures = world
        .events
        .iter()
        .filter(|event| matches!(event, Inbound::Reader(ReaderEvent::Closed)))
        .count();
    assert_eq!(closures, 1);
    assert!(matches!(
        world.events.last(),
        Some(Inbound::Reader(ReaderEvent::Closed))
    ));
}

#[then("the session ended cleanly")]
fn then_clean_end(world: &mut TestWorld) {
    match world.outcome.as_ref() {
        Some(Ok(())) => {}
        Some(Err(error)) => panic!("session failed: {error}"),
        None => panic!("session never ran"),
    }
}

#[then("the session ended out of sync on id {id}")]
fn then_desync(world: &mut TestWorld, id: u32) {
    assert!(matches!(
        world.outcome,
        Some(Err(SessionError::Desync { id: unknown })) if unknown.get() == id
    ));
}

#[then("no requests are pending")]
fn then_nothing_pending(world: &mut TestWorld) {
    assert!(world.connection.pending().is_empty());
}

#[then("nothing was sent after the closure")]
fn then_nothing_sent(world: &mut TestWorld) {
    assert!(world.written.take().is_empty());
}

#[then("further handoffs are refused")]
fn then_handoffs_refused(world: &mut TestWorld) {
    let sender = world.sender.as_ref().expect("session ran");
    assert!(sender.send(Inbound::from(ReaderEvent::Closed)).is_err());
}

#[then("the surface presented {count} frame")]
fn then_frames(world: &mut TestWorld, count: u64) {
    assert_eq!(world.connection.surface().frames(), count);
}

#[then("the grid is {cols} columns by {rows} rows")]
fn then_grid_size(world: &mut TestWorld, cols: usize, rows: usize) {
    let grid = world.connection.grid();
    assert_eq!((grid.cols(), grid.rows()), (cols, rows));
}

#[scenario(
    path = "tests/features/session.feature",
    name = "The pipe closes while a request is pending"
)]
fn pipe_closes_with_pending_request(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session.feature",
    name = "A response for an unknown id ends the session"
)]
fn unknown_response_ends_session(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session.feature",
    name = "A flushed redraw batch reaches the surface"
)]
fn flushed_batch_reaches_surface(world: TestWorld) {
    let _ = world;
}
