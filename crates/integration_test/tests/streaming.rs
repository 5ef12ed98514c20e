//! Tests for writing several values through one buffer.

#![allow(missing_docs)]

use tagless::{Codec, CursorBuffer, Decoder, Encoder, ErrorKind};
use tagless_integration_test::{Node, Point, Role};
use tracing_test::traced_test;

#[test]
#[traced_test]
fn values_are_read_back_in_write_order() {
    let codec = Codec::new();
    let mut buffer = CursorBuffer::new(vec![0u8; 256]);

    let points = (0..5).map(|i| Point::new(i, -i)).collect::<Vec<_>>();
    for point in &points {
        assert_eq!(codec.encode_into(point, &mut buffer).unwrap(), 10);
    }
    codec.encode_into(&Role::Member, &mut buffer).unwrap();
    codec.encode_into(&Node::chain(3), &mut buffer).unwrap();

    for point in &points {
        assert_eq!(&codec.decode_from::<Point, _>(&mut buffer).unwrap(), point);
    }
    assert_eq!(
        codec.decode_from::<Role, _>(&mut buffer).unwrap(),
        Role::Member
    );
    assert_eq!(
        codec.decode_from::<Node, _>(&mut buffer).unwrap(),
        Node::chain(3)
    );
    assert_eq!(buffer.remaining(), 0);

    let err = codec.decode_from::<Point, _>(&mut buffer).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    assert!(logs_contain("encoded value"));
    assert!(logs_contain("decoded value"));
    assert!(logs_contain("decoding failed"));
}

#[test]
fn raw_primitives_mix_with_encoded_values() {
    let codec = Codec::new();
    let mut buffer = CursorBuffer::new(vec![0u8; 64]);

    buffer.emit_u16(2).unwrap();
    codec.encode_into(&Point::new(1, 1), &mut buffer).unwrap();
    codec.encode_into(&Point::new(2, 2), &mut buffer).unwrap();

    let count = buffer.read_u16().unwrap();
    let decoded = (0..count)
        .map(|_| codec.decode_from::<Point, _>(&mut buffer).unwrap())
        .collect::<Vec<_>>();

    assert_eq!(decoded, [Point::new(1, 1), Point::new(2, 2)]);
}

#[test]
fn finished_bytes_can_be_handed_to_a_sink() {
    let codec = Codec::new();
    let mut buffer = CursorBuffer::new(vec![0u8; 64]);
    codec.encode_into(&Point::new(10, 20), &mut buffer).unwrap();

    let mut sink = Vec::new();
    buffer.write_to(&mut sink).unwrap();

    assert_eq!(sink, [1, 10, 0, 0, 0, 1, 20, 0, 0, 0]);

    let mut incoming = CursorBuffer::with_contents(sink.as_slice());
    assert_eq!(
        codec.decode_from::<Point, _>(&mut incoming).unwrap(),
        Point::new(10, 20)
    );
}

#[test]
fn cleared_buffer_is_reusable() {
    let codec = Codec::new();
    let mut buffer = CursorBuffer::new([0u8; 16]);

    codec.encode_into(&Point::new(3, 4), &mut buffer).unwrap();
    assert_eq!(buffer.free_space(), 6);
    assert!(codec.encode_into(&Point::new(5, 6), &mut buffer).is_err());

    buffer.clear();
    codec.encode_into(&Point::new(5, 6), &mut buffer).unwrap();

    assert_eq!(
        codec.decode_from::<Point, _>(&mut buffer).unwrap(),
        Point::new(5, 6)
    );
}
