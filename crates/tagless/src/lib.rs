//! Tagless: a schema-coupled binary codec.
//!
//! This crate turns structured values into a compact byte encoding and back
//! without an interface-definition language, field tags or type tags. The
//! encoder and the decoder derive the layout from the Rust type itself, so
//! the bytes carry nothing but payload.
//!
//! # Overview
//!
//! - [`CursorBuffer`]: a fixed-capacity byte region with a write and a read
//!   cursor, implementing [`Encoder`] and [`Decoder`]
//! - [`FieldType`] / [`Schema`]: the public shape of encodable types,
//!   usually written by `#[derive(Describe)]`
//! - [`compiler`]: turns a type's shape into a [`CompiledPlan`], once per
//!   type, cached in the [`Registry`]
//! - [`Codec`]: binds values to byte regions
//!
//! # Wire Format
//!
//! - scalars are written little-endian at their fixed width (see
//!   [`primitive`])
//! - strings are an `i32` byte length followed by UTF-8 bytes
//! - enums are their discriminant, at the width of their `#[repr]`
//! - every object field is preceded by a one-byte presence flag: `1` when
//!   the payload follows, `0` when the field is `None`
//! - object fields are ordered by their upper-cased names
//! - arrays are an `i32` element count followed by the elements
//! - a root value has no presence flag
//!
//! # Derive Macro
//!
//! ```ignore
//! use tagless::Describe;
//!
//! #[derive(Debug, Default, Describe)]
//! pub struct Node {
//!     pub name: String,
//!     pub next: Option<Box<Node>>,
//! }
//!
//! #[derive(Debug, Clone, Copy, Describe)]
//! #[repr(u8)]
//! pub enum Color {
//!     Red,
//!     Green,
//!     Blue,
//! }
//! ```
//!
//! Only `pub` fields are part of an object's layout. Other fields keep their
//! [`Default`] value when a value is decoded.
//!
//! # Example
//!
//! ```ignore
//! let mut region = [0u8; 64];
//! let node = Node { name: "A".to_owned(), next: None };
//!
//! let written = tagless::serialize(&node, &mut region)?;
//! assert_eq!(&region[..written], &[1, 1, 0, 0, 0, b'A', 0]);
//!
//! let decoded: Node = tagless::deserialize(&region[..written])?;
//! ```
//!
//! # Limitations
//!
//! The encoding is only meaningful together with the exact type that wrote
//! it. Adding, removing, renaming or retyping a public field changes the
//! layout, and bytes written before the change will not decode (or will
//! decode into the wrong fields). There is no versioning of any kind.

// Allow the derive macro to reference this crate as `tagless` internally
extern crate self as tagless;

pub mod buffer;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod decode;
pub mod descriptor;
pub mod encode;
pub mod error;
pub mod guard;
pub mod primitive;
pub mod registry;

// Re-export main traits and types at the crate root for convenience
pub use buffer::CursorBuffer;
pub use codec::{Codec, deserialize, serialize};
pub use compiler::{CompiledPlan, FieldKind, FieldPlan};
pub use config::{Config, DEFAULT_MAX_DEPTH};
pub use decode::Decoder;
pub use descriptor::{FieldType, Schema, WireEnum};
pub use encode::Encoder;
pub use error::{Accessor, Error, ErrorKind, Malformed, Result};
pub use primitive::{Presence, Primitive};
pub use registry::Registry;
// Re-export derive macros
pub use tagless_derive::Describe;
