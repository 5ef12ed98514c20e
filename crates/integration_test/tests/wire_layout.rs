//! Tests for the exact bytes produced for known values.

#![allow(missing_docs)]

use tagless::{Codec, Describe, FieldKind, Primitive, Registry};
use tagless_integration_test::{Node, Point, Segment, Session, Status};

#[test]
fn point_layout() {
    let mut region = [0u8; 32];

    let written = tagless::serialize(&Point::new(10, 20), &mut region).unwrap();

    assert_eq!(&region[..written], &[
        0x01, 0x0A, 0x00, 0x00, 0x00, // x
        0x01, 0x14, 0x00, 0x00, 0x00, // y
    ]);
}

#[test]
fn single_node_layout() {
    let mut region = [0u8; 32];
    let node = Node { name: "A".to_owned(), next: None };

    let written = tagless::serialize(&node, &mut region).unwrap();

    assert_eq!(written, 7);
    assert_eq!(&region[..written], &[
        0x01, 0x01, 0x00, 0x00, 0x00, b'A', // name
        0x00, // next
    ]);
}

#[test]
fn two_node_layout() {
    let mut region = [0u8; 32];

    let written = tagless::serialize(&Node::chain(2), &mut region).unwrap();

    assert_eq!(&region[..written], &[
        0x01, 0x02, 0x00, 0x00, 0x00, b'n', b'0', // name
        0x01, // next, present
        0x01, 0x02, 0x00, 0x00, 0x00, b'n', b'1', //   name
        0x00, //   next, absent
    ]);
}

#[test]
fn inline_objects_are_flagged_then_expanded() {
    let mut region = [0u8; 32];
    let segment = Segment { start: Point::new(1, 2), end: Point::new(3, 4) };

    let written = tagless::serialize(&segment, &mut region).unwrap();

    assert_eq!(&region[..written], &[
        0x01, // end
        0x01, 3, 0, 0, 0, 0x01, 4, 0, 0, 0, //
        0x01, // start
        0x01, 1, 0, 0, 0, 0x01, 2, 0, 0, 0,
    ]);
}

#[test]
fn enum_without_repr_is_four_bytes() {
    let mut region = [0u8; 8];

    let written = tagless::serialize(&Status::Suspended, &mut region).unwrap();

    assert_eq!(&region[..written], &[0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn private_fields_are_not_written() {
    let mut region = [0u8; 32];

    let written =
        tagless::serialize(&Session::new("bob"), &mut region).unwrap();

    assert_eq!(&region[..written], &[0x01, 3, 0, 0, 0, b'b', b'o', b'b']);
}

#[derive(Debug, Default, PartialEq, Describe)]
pub struct Declared {
    pub zebra: u8,
    pub apple: u8,
    pub mango: Vec<u16>,
}

#[test]
fn declaration_order_does_not_matter() {
    let mut region = [0u8; 32];
    let value = Declared { zebra: 0xEE, apple: 0xAA, mango: vec![0x0102] };

    let written = tagless::serialize(&value, &mut region).unwrap();

    assert_eq!(&region[..written], &[
        0x01, 0xAA, // apple
        0x01, 1, 0, 0, 0, 0x02, 0x01, // mango
        0x01, 0xEE, // zebra
    ]);

    let plan = Registry::global().plan::<Declared>().unwrap();
    let kinds = plan
        .fields()
        .iter()
        .map(|field| (field.name(), field.kind().clone()))
        .collect::<Vec<_>>();
    assert_eq!(kinds, [
        ("apple", FieldKind::Primitive(Primitive::U8)),
        (
            "mango",
            FieldKind::Array(Box::new(FieldKind::Primitive(Primitive::U16)))
        ),
        ("zebra", FieldKind::Primitive(Primitive::U8)),
    ]);
}

#[test]
fn layout_is_deterministic_across_calls_and_codecs() {
    let node = Node::chain(5);
    let mut first = [0u8; 128];
    let mut second = [0u8; 128];

    let a = tagless::serialize(&node, &mut first).unwrap();
    let b = Codec::new().serialize(&node, &mut second).unwrap();

    assert_eq!(a, b);
    assert_eq!(first, second);
}
