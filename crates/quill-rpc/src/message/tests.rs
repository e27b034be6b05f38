//! Unit tests for envelope classification.

use rstest::rstest;

use super::*;

fn array(items: Vec<Value>) -> Value {
    Value::Array(items)
}

#[rstest]
fn classifies_requests() {
    let value = array(vec![
        Value::Int(0),
        Value::Int(3),
        Value::from("vimenter"),
        array(vec![]),
    ]);

    let message = Message::from_value(value).expect("classify");

    assert_eq!(
        message,
        Message::Request(Request {
            id: MessageId::new(3),
            method: "vimenter".to_owned(),
            params: Vec::new(),
        })
    );
}

#[rstest]
fn classifies_successful_responses() {
    let value = array(vec![Value::Int(1), Value::Int(7), Value::Nil, Value::from("Consolas:h12")]);

    let Message::Response(response) = Message::from_value(value).expect("classify") else {
        panic!("expected a response");
    };

    assert_eq!(response.id, MessageId::new(7));
    assert!(response.error.is_none());
    assert_eq!(response.result.as_str(), Some("Consolas:h12"));
}

#[rstest]
fn error_responses_expose_the_message() {
    let value = array(vec![
        Value::Int(1),
        Value::Int(2),
        array(vec![Value::Int(0), Value::from("E492: Not an editor command")]),
        Value::Nil,
    ]);

    let Message::Response(response) = Message::from_value(value).expect("classify") else {
        panic!("expected a response");
    };

    assert_eq!(
        response.error_message().as_deref(),
        Some("E492: Not an editor command")
    );
}

#[rstest]
fn classifies_notifications() {
    let value = array(vec![
        Value::Int(2),
        Value::from("redraw"),
        array(vec![array(vec![Value::from("flush")])]),
    ]);

    let Message::Notification(notification) = Message::from_value(value).expect("classify") else {
        panic!("expected a notification");
    };

    assert_eq!(notification.method, "redraw");
    assert_eq!(notification.params.len(), 1);
}

#[rstest]
#[case::not_an_array(Value::Int(2))]
#[case::empty(array(vec![]))]
#[case::unknown_type(array(vec![Value::Int(5), Value::from("x"), array(vec![])]))]
#[case::short_request(array(vec![Value::Int(0), Value::Int(1), Value::from("x")]))]
#[case::long_notification(array(vec![Value::Int(2), Value::from("x"), array(vec![]), Value::Nil]))]
#[case::negative_id(array(vec![Value::Int(1), Value::Int(-4), Value::Nil, Value::Nil]))]
#[case::numeric_method(array(vec![Value::Int(2), Value::Int(9), array(vec![])]))]
#[case::map_params(array(vec![Value::Int(2), Value::from("x"), Value::Map(vec![])]))]
fn rejects_malformed_envelopes(#[case] value: Value) {
    assert!(matches!(
        Message::from_value(value),
        Err(ProtocolError::MalformedEnvelope { .. })
    ));
}

#[rstest]
fn envelopes_rebuild_their_wire_shape() {
    let message = Message::Response(Response {
        id: MessageId::new(11),
        error: None,
        result: Value::Nil,
    });

    assert_eq!(
        message.clone().into_value(),
        array(vec![Value::Int(1), Value::Int(11), Value::Nil, Value::Nil])
    );
    assert_eq!(Message::from_value(message.clone().into_value()), Ok(message));
}
