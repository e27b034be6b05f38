//! Unit tests for the correlation table.

use rstest::{fixture, rstest};

use super::*;

fn id(raw: u32) -> MessageId {
    MessageId::new(raw)
}

#[fixture]
fn three_pending() -> PendingRequests {
    let mut table = PendingRequests::new();
    table
        .register(id(1), PendingRequestKind::AttachUi)
        .expect("register 1");
    table
        .register(
            id(2),
            PendingRequestKind::GetOptionValue {
                name: "guifont".to_owned(),
            },
        )
        .expect("register 2");
    table
        .register(id(3), PendingRequestKind::Command)
        .expect("register 3");
    table
}

#[rstest]
fn responses_resolve_in_any_order(mut three_pending: PendingRequests) {
    assert_eq!(three_pending.resolve(id(3)), Ok(PendingRequestKind::Command));
    assert_eq!(
        three_pending.resolve(id(2)),
        Ok(PendingRequestKind::GetOptionValue {
            name: "guifont".to_owned()
        })
    );
    assert_eq!(three_pending.resolve(id(1)), Ok(PendingRequestKind::AttachUi));
    assert!(three_pending.is_empty());
}

#[rstest]
fn unknown_ids_fail_to_resolve() {
    let mut table = PendingRequests::new();

    assert_eq!(
        table.resolve(id(42)),
        Err(ProtocolError::UnknownResponseId { id: id(42) })
    );
}

#[rstest]
fn resolved_ids_cannot_be_resolved_twice(mut three_pending: PendingRequests) {
    three_pending.resolve(id(1)).expect("first resolve");

    assert!(matches!(
        three_pending.resolve(id(1)),
        Err(ProtocolError::UnknownResponseId { .. })
    ));
}

#[rstest]
fn pending_ids_cannot_be_registered_again(mut three_pending: PendingRequests) {
    assert_eq!(
        three_pending.register(id(2), PendingRequestKind::Input),
        Err(ProtocolError::DuplicateId { id: id(2) })
    );
    assert_eq!(three_pending.len(), 3);
}

#[rstest]
fn drain_reports_leaks_in_id_order(mut three_pending: PendingRequests) {
    three_pending.resolve(id(2)).expect("resolve");

    let leaked = three_pending.drain_unanswered();

    assert_eq!(
        leaked,
        vec![
            (id(1), PendingRequestKind::AttachUi),
            (id(3), PendingRequestKind::Command),
        ]
    );
    assert!(three_pending.is_empty());
}

#[rstest]
fn threshold_crossing_is_tracked_and_rearmed() {
    let mut table = PendingRequests::with_warn_threshold(1);
    table.register(id(1), PendingRequestKind::Input).expect("register");
    assert!(!table.over_threshold);

    table.register(id(2), PendingRequestKind::Input).expect("register");
    assert!(table.over_threshold);

    table.resolve(id(2)).expect("resolve");
    assert!(!table.over_threshold);
}

#[rstest]
#[case(PendingRequestKind::AttachUi, "attach-ui")]
#[case(PendingRequestKind::Input, "send-input")]
#[case(PendingRequestKind::Command, "send-command")]
#[case(PendingRequestKind::GetOptionValue { name: "guifont".to_owned() }, "get-option(guifont)")]
fn kinds_have_readable_labels(#[case] kind: PendingRequestKind, #[case] label: &str) {
    assert_eq!(kind.to_string(), label);
}
