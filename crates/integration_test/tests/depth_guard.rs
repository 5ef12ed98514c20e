//! Tests for the nesting bound on object graphs.

#![allow(missing_docs)]

use tagless::{Codec, Config, DEFAULT_MAX_DEPTH, Error, ErrorKind};
use tagless_integration_test::{Employee, Node, Team};

#[test]
fn default_bound_accepts_sixteen_nodes() {
    assert_eq!(DEFAULT_MAX_DEPTH, 16);

    let mut region = vec![0u8; 1024];
    let written = tagless::serialize(&Node::chain(16), &mut region).unwrap();
    let decoded: Node = tagless::deserialize(&region[..written]).unwrap();

    assert_eq!(decoded.node_count(), 16);
}

#[test]
fn seventeen_nodes_exceed_the_default_bound() {
    let mut region = vec![0u8; 1024];

    let err = tagless::serialize(&Node::chain(17), &mut region).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DepthExceeded);
    assert!(matches!(err.root_cause(), Error::DepthExceeded {
        max_depth: 16,
        ..
    }));
    assert_eq!(err.field_path(), vec!["next"; 16].join("."));
    assert!(region.iter().all(|&byte| byte == 0));
}

#[test]
fn raised_bound_accepts_longer_chains() {
    let codec = Codec::with_config(Config::builder().max_depth(64).build());
    let mut region = vec![0u8; 4096];

    let written = codec.serialize(&Node::chain(64), &mut region).unwrap();
    let decoded: Node = codec.deserialize(&region[..written]).unwrap();
    assert_eq!(decoded.node_count(), 64);

    let err = codec.serialize(&Node::chain(65), &mut region).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);
}

#[test]
fn decoding_is_bounded_too() {
    let permissive =
        Codec::with_config(Config::builder().max_depth(32).build());
    let mut region = vec![0u8; 1024];

    let written = permissive.serialize(&Node::chain(20), &mut region).unwrap();

    let err = tagless::deserialize::<Node>(&region[..written]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);
}

#[test]
fn bound_counts_objects_across_types() {
    // team -> employee -> team -> employee: four objects deep.
    let team = Team {
        name: "outer".to_owned(),
        members: vec![Employee {
            name: "lead".to_owned(),
            mentor_of: Some(Box::new(Team {
                name: "inner".to_owned(),
                members: vec![Employee::default()],
            })),
        }],
    };
    let mut region = vec![0u8; 256];

    let strict = Codec::with_config(Config::builder().max_depth(3).build());
    let err = strict.serialize(&team, &mut region).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);
    assert_eq!(err.field_path(), "members.mentor_of.members");

    let exact = Codec::with_config(Config::builder().max_depth(4).build());
    assert!(exact.serialize(&team, &mut region).is_ok());
}

#[test]
fn zero_bound_rejects_objects_but_not_scalars() {
    let codec = Codec::with_config(Config::builder().max_depth(0).build());
    let mut region = [0u8; 16];

    assert_eq!(codec.serialize(&42u64, &mut region).unwrap(), 8);

    let err = codec.serialize(&Node::chain(1), &mut region).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);
    assert_eq!(err.field_path(), "");
}
