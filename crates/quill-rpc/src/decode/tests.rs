//! Unit tests for the msgpack decoder.

use rstest::rstest;

use super::*;

fn decoded(bytes: &[u8]) -> Value {
    let (value, consumed) = decode(bytes).expect("decode failed");
    assert_eq!(consumed, bytes.len(), "decoder left bytes unread");
    value
}

#[rstest]
#[case(&[0xc0], Value::Nil)]
#[case(&[0xc3], Value::Bool(true))]
#[case(&[0xc2], Value::Bool(false))]
#[case(&[0x07], Value::Int(7))]
#[case(&[0xff], Value::Int(-1))]
#[case(&[0xcc, 0xc8], Value::Int(200))]
#[case(&[0xcd, 0x01, 0x00], Value::Int(256))]
#[case(&[0xce, 0x00, 0x01, 0x00, 0x00], Value::Int(65_536))]
#[case(&[0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff], Value::UInt(u64::MAX))]
#[case(&[0xd0, 0x80], Value::Int(-128))]
#[case(&[0xd1, 0xff, 0x00], Value::Int(-256))]
#[case(&[0xcb, 0x3f, 0xf8, 0, 0, 0, 0, 0, 0], Value::Float(1.5))]
#[case(&[0xca, 0x3f, 0xc0, 0x00, 0x00], Value::Float(1.5))]
fn decodes_scalars(#[case] bytes: &[u8], #[case] expected: Value) {
    assert_eq!(decoded(bytes), expected);
}

#[rstest]
fn decodes_strings_and_blobs() {
    assert_eq!(decoded(&[0xa3, b'a', b'b', b'c']), Value::from("abc"));
    assert_eq!(decoded(&[0xd9, 0x01, b'x']), Value::from("x"));
    assert_eq!(decoded(&[0xc4, 0x02, 0x00, 0x01]), Value::Binary(vec![0, 1]));
}

#[rstest]
fn decodes_extension_blobs_with_their_tag() {
    // Neovim encodes buffer handles as ext type 0.
    assert_eq!(decoded(&[0xd4, 0x00, 0x05]), Value::Ext(0, vec![5]));
    assert_eq!(
        decoded(&[0xc7, 0x02, 0xfe, 0xaa, 0xbb]),
        Value::Ext(-2, vec![0xaa, 0xbb])
    );
}

#[rstest]
fn map_pairs_keep_encounter_order() {
    let bytes = [0x82, 0xa1, b'z', 0x01, 0xa1, b'a', 0x02];

    let value = decoded(&bytes);

    assert_eq!(
        value,
        Value::Map(vec![
            (Value::from("z"), Value::Int(1)),
            (Value::from("a"), Value::Int(2)),
        ])
    );
}

#[rstest]
fn nested_arrays_decode_recursively() {
    let bytes = [0x93, 0x02, 0xa6, b'r', b'e', b'd', b'r', b'a', b'w', 0x91, 0x91, 0xa5, b'f', b'l', b'u', b's', b'h'];

    let value = decoded(&bytes);

    assert_eq!(
        value,
        Value::Array(vec![
            Value::Int(2),
            Value::from("redraw"),
            Value::Array(vec![Value::Array(vec![Value::from("flush")])]),
        ])
    );
}

#[rstest]
fn leaves_trailing_bytes_for_the_next_value() {
    let (value, consumed) = decode(&[0x01, 0x02]).expect("decode failed");

    assert_eq!(value, Value::Int(1));
    assert_eq!(consumed, 1);
}

#[rstest]
fn every_strict_prefix_is_truncated() {
    let bytes = [0x92, 0xa2, b'h', b'i', 0xcd, 0x01, 0x00];

    for end in 0..bytes.len() {
        let prefix = bytes.get(..end).expect("prefix in range");
        assert_eq!(decode(prefix), Err(DecodeError::Truncated), "prefix {end}");
    }
}

#[rstest]
fn rejects_the_reserved_marker() {
    assert_eq!(
        decode(&[0x91, 0xc1]),
        Err(DecodeError::InvalidTag {
            tag: 0xc1,
            offset: 1
        })
    );
}

#[rstest]
fn rejects_oversized_string_lengths() {
    let result = decode(&[0xdb, 0xff, 0xff, 0xff, 0xff]);

    assert!(matches!(
        result,
        Err(DecodeError::LengthOverflow {
            declared: 0xffff_ffff,
            ..
        })
    ));
}

#[rstest]
fn rejects_oversized_collection_counts() {
    let result = decode(&[0xdd, 0xff, 0xff, 0xff, 0xff]);

    assert!(matches!(result, Err(DecodeError::LengthOverflow { .. })));
}

#[rstest]
fn large_declared_count_with_few_bytes_is_truncated() {
    // 65535 elements announced, two present: more bytes may still arrive.
    assert_eq!(decode(&[0xdc, 0xff, 0xff, 0x01, 0x02]), Err(DecodeError::Truncated));
}

#[rstest]
fn rejects_excessive_nesting() {
    let mut bytes = vec![0x91; MAX_DEPTH + 2];
    bytes.push(0xc0);

    assert_eq!(
        decode(&bytes),
        Err(DecodeError::TooDeep { limit: MAX_DEPTH })
    );
}

#[rstest]
#[case(&[0x92, 0xa2, b'h', b'i', 0xcd, 0x01, 0x00])]
#[case(&[0x93, 0x90, 0x80, 0x81, 0x01, 0xc0])]
#[case(&[0xd4, 0x01, 0x02])]
#[case(&[0xc7, 0x02, 0x05, 0xaa, 0xbb])]
#[case(&[0xdc, 0x00, 0x02, 0xc4, 0x01, 0xff, 0xcb, 0, 0, 0, 0, 0, 0, 0, 0])]
fn scanner_finds_the_value_boundary_one_byte_at_a_time(#[case] bytes: &[u8]) {
    let mut stream = bytes.to_vec();
    stream.push(0x07);
    let mut scanner = FrameScanner::default();

    for end in 0..bytes.len() {
        let prefix = stream.get(..end).expect("prefix in range");
        assert!(!scanner.advance(prefix), "prefix {end} reported complete");
    }
    assert!(scanner.advance(&stream));
    assert_eq!(scanner.scanned(), bytes.len());
    assert_eq!(decode(&stream).map(|(_, consumed)| consumed), Ok(bytes.len()));
}

#[rstest]
#[case(&[0x91, 0xc1])]
#[case(&[0xdb, 0xff, 0xff, 0xff, 0xff])]
fn scanner_hands_malformed_prefixes_to_the_decoder(#[case] bytes: &[u8]) {
    let mut scanner = FrameScanner::default();

    assert!(scanner.advance(bytes));
    assert!(!matches!(decode(bytes), Err(DecodeError::Truncated) | Ok(_)));
}

#[rstest]
fn scanner_stops_at_excessive_nesting() {
    let bytes = vec![0x91; MAX_DEPTH + 2];
    let mut scanner = FrameScanner::default();

    assert!(scanner.advance(&bytes));
    assert_eq!(
        decode(&bytes),
        Err(DecodeError::TooDeep { limit: MAX_DEPTH })
    );
}

#[rstest]
fn scanner_reset_starts_over() {
    let mut scanner = FrameScanner::default();
    assert!(scanner.advance(&[0x01]));

    scanner.reset();

    assert_eq!(scanner.scanned(), 0);
    assert!(!scanner.advance(&[0x92, 0x01]));
}
