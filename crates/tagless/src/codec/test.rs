use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    Codec, Config, CursorBuffer, Describe, Encoder, ErrorKind, Malformed,
    deserialize, serialize,
};

#[derive(Debug, Default, Clone, PartialEq, Describe)]
pub struct Pair {
    pub left: i16,
    pub right: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Describe)]
#[repr(u16)]
pub enum Mode {
    Idle = 7,
    Busy = 300,
}

#[derive(Debug, Default, PartialEq, Describe)]
pub struct Link {
    pub next: Option<Box<Link>>,
}

fn chain(len: usize) -> Link {
    let mut link = Link::default();
    for _ in 1..len {
        link = Link { next: Some(Box::new(link)) };
    }
    link
}

#[test]
fn scalar_roots_have_no_framing() {
    let mut region = [0u8; 32];

    assert_eq!(serialize(&0x1234_5678u32, &mut region).unwrap(), 4);
    assert_eq!(&region[..4], &[0x78, 0x56, 0x34, 0x12]);
    assert_eq!(deserialize::<u32>(&region[..4]).unwrap(), 0x1234_5678);

    assert_eq!(serialize(&true, &mut region).unwrap(), 1);
    assert!(deserialize::<bool>(&region[..1]).unwrap());

    let written = serialize(&String::from("ok"), &mut region).unwrap();
    assert_eq!(&region[..written], &[2, 0, 0, 0, b'o', b'k']);
    assert_eq!(deserialize::<String>(&region[..written]).unwrap(), "ok");
}

#[test]
fn well_known_roots_round_trip() {
    let mut region = [0u8; 32];
    let at: DateTime<Utc> = DateTime::from_timestamp(86_400, 5).unwrap();
    let id = Uuid::from_u128(42);

    let written = serialize(&at, &mut region).unwrap();
    assert_eq!(written, 8);
    assert_eq!(deserialize::<DateTime<Utc>>(&region[..written]).unwrap(), at);

    let written = serialize(&id, &mut region).unwrap();
    assert_eq!(written, 16);
    assert_eq!(deserialize::<Uuid>(&region[..written]).unwrap(), id);
}

#[test]
fn enum_root_uses_repr_width() {
    let mut region = [0u8; 4];

    let written = serialize(&Mode::Busy, &mut region).unwrap();

    assert_eq!(&region[..written], &300u16.to_le_bytes());
    assert_eq!(deserialize::<Mode>(&region[..written]).unwrap(), Mode::Busy);
}

#[test]
fn unknown_discriminant_is_malformed() {
    let bytes = 8u16.to_le_bytes();

    let err = deserialize::<Mode>(&bytes).unwrap_err();

    assert!(matches!(err, crate::Error::MalformedInput {
        offset: 0,
        reason: Malformed::InvalidDiscriminant { value: 8, .. },
    }));
}

#[test]
fn array_root_is_count_then_elements() {
    let mut region = [0u8; 16];

    let written = serialize(&vec![1u8, 2, 3], &mut region).unwrap();

    assert_eq!(&region[..written], &[3, 0, 0, 0, 1, 2, 3]);
    assert_eq!(deserialize::<Vec<u8>>(&region[..written]).unwrap(), [1, 2, 3]);
}

#[test]
fn option_root_is_unsupported() {
    let mut region = [0u8; 8];

    let err = serialize(&Some(1i32), &mut region).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    assert_eq!(region, [0; 8]);
}

#[test]
fn absent_field_costs_one_byte() {
    let mut region = [0u8; 32];
    let pair = Pair { left: -1, right: None };

    let written = serialize(&pair, &mut region).unwrap();

    assert_eq!(&region[..written], &[1, 0xFF, 0xFF, 0]);
    assert_eq!(deserialize::<Pair>(&region[..written]).unwrap(), pair);
}

#[test]
fn overflow_zeroes_the_destination() {
    let mut region = [0u8; 8];
    let pair = Pair { left: 3, right: Some("overflowing".to_owned()) };

    let err = serialize(&pair, &mut region).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BufferOverflow);
    assert_eq!(err.field_path(), "right");
    assert_eq!(region, [0; 8]);
}

#[test]
fn truncated_input_is_malformed() {
    let mut region = [0u8; 32];
    let pair = Pair { left: 3, right: Some("text".to_owned()) };
    let written = serialize(&pair, &mut region).unwrap();

    let err = deserialize::<Pair>(&region[..written - 1]).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(err.field_path(), "right");
}

#[test]
fn depth_bound_applies_to_both_directions() {
    let mut region = vec![0u8; 256];
    let codec = Codec::with_config(Config::builder().max_depth(4).build());

    let written = codec.serialize(&chain(4), &mut region).unwrap();
    assert_eq!(
        codec.deserialize::<Link>(&region[..written]).unwrap(),
        chain(4)
    );

    let err = codec.serialize(&chain(5), &mut region).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);

    // Five nested links written by a more permissive codec.
    let written = Codec::new().serialize(&chain(5), &mut region).unwrap();
    let err = codec.deserialize::<Link>(&region[..written]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);
}

#[test]
fn streams_several_values_through_one_buffer() {
    let codec = Codec::new();
    let mut buffer = CursorBuffer::new(vec![0u8; 64]);

    codec.encode_into(&7u8, &mut buffer).unwrap();
    codec
        .encode_into(&Pair { left: 1, right: Some("x".into()) }, &mut buffer)
        .unwrap();
    codec.encode_into(&Mode::Idle, &mut buffer).unwrap();

    assert_eq!(codec.decode_from::<u8, _>(&mut buffer).unwrap(), 7);
    assert_eq!(
        codec.decode_from::<Pair, _>(&mut buffer).unwrap(),
        Pair { left: 1, right: Some("x".into()) }
    );
    assert_eq!(codec.decode_from::<Mode, _>(&mut buffer).unwrap(), Mode::Idle);
    assert_eq!(buffer.remaining(), 0);
}

#[test]
fn failed_encode_keeps_earlier_values() {
    let codec = Codec::new();
    let mut buffer = CursorBuffer::new(vec![0u8; 8]);

    codec.encode_into(&0xABu8, &mut buffer).unwrap();
    let err = codec
        .encode_into(&Pair { left: 1, right: Some("long".into()) }, &mut buffer)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BufferOverflow);
    assert_eq!(buffer.finished(), &[0xAB]);
    assert_eq!(buffer.into_inner(), vec![0xAB, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn failed_decode_restores_read_position() {
    let codec = Codec::new();
    let mut buffer = CursorBuffer::new(vec![0u8; 8]);
    buffer.emit_u8(1).unwrap();
    buffer.emit_u8(5).unwrap();

    let err = codec.decode_from::<Pair, _>(&mut buffer).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(buffer.read_position(), 0);
    assert_eq!(codec.decode_from::<u16, _>(&mut buffer).unwrap(), 0x0501);
}
