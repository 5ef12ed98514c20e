//! The entry points that bind a value to a byte region.

use std::any::Any;

use crate::{
    Config, CursorBuffer, Decoder, Encoder, Error, Result,
    descriptor::{FieldType, Shape},
    guard::Depth,
    primitive,
    registry::Registry,
};

#[cfg(test)]
mod test;

/// Serializes and deserializes values of any [`FieldType`].
///
/// Scalars, strings, date/times, UUIDs and enums at the root are written
/// directly with no framing. Objects go through their compiled plan, which
/// is built on first use and cached process-wide. A root `Vec<T>` is written
/// as an element count followed by the elements; its codec is cached the
/// same way.
///
/// Decoding an array checks the element count against the unread bytes
/// before anything is allocated. Elements of an object type with no
/// described fields take no bytes at all, so an array of them is bounded
/// only by its `i32` count.
///
/// # Example
///
/// ```ignore
/// use tagless::{Codec, Describe};
///
/// #[derive(Debug, Default, PartialEq, Describe)]
/// pub struct Point {
///     pub x: i32,
///     pub y: i32,
/// }
///
/// let codec = Codec::new();
/// let mut region = [0u8; 64];
///
/// let written = codec.serialize(&Point { x: 10, y: 20 }, &mut region)?;
/// assert_eq!(&region[..written], &[1, 10, 0, 0, 0, 1, 20, 0, 0, 0]);
///
/// let point: Point = codec.deserialize(&region[..written])?;
/// assert_eq!(point, Point { x: 10, y: 20 });
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codec {
    config: Config,
}

impl Codec {
    /// Creates a codec with the default configuration.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Creates a codec with the given configuration.
    #[must_use]
    pub const fn with_config(config: Config) -> Self { Self { config } }

    /// Returns the configuration in use.
    #[must_use]
    pub const fn config(&self) -> &Config { &self.config }

    /// Encodes `value` at the start of `destination` and returns the number
    /// of bytes written.
    ///
    /// On failure every byte written so far is zeroed again.
    pub fn serialize<T: FieldType>(
        &self,
        value: &T,
        destination: &mut [u8],
    ) -> Result<usize> {
        let mut buffer = CursorBuffer::new(destination);
        self.encode_into(value, &mut buffer)
    }

    /// Decodes a `T` from the start of `source`.
    ///
    /// Bytes after the encoded value are ignored.
    pub fn deserialize<T: FieldType>(&self, source: &[u8]) -> Result<T> {
        let mut buffer = CursorBuffer::with_contents(source);
        self.decode_from(&mut buffer)
    }

    /// Appends `value` at the write position of `buffer` and returns the
    /// number of bytes written.
    ///
    /// On failure the write position is restored and the partial encoding
    /// is zeroed, so earlier values in the buffer stay intact.
    pub fn encode_into<T, B>(
        &self,
        value: &T,
        buffer: &mut CursorBuffer<B>,
    ) -> Result<usize>
    where
        T: FieldType,
        B: AsRef<[u8]> + AsMut<[u8]>,
    {
        let mark = buffer.write_position();

        match self.encode_root(value, buffer) {
            Ok(()) => {
                let written = buffer.write_position() - mark;
                tracing::trace!(
                    type_name = std::any::type_name::<T>(),
                    written,
                    "encoded value"
                );
                Ok(written)
            }

            Err(err) => {
                buffer.rollback_to(mark);
                tracing::trace!(
                    type_name = std::any::type_name::<T>(),
                    error = %err,
                    "encoding failed"
                );
                Err(err)
            }
        }
    }

    /// Decodes a `T` at the read position of `buffer`.
    ///
    /// On failure the read position is restored.
    pub fn decode_from<T, B>(&self, buffer: &mut CursorBuffer<B>) -> Result<T>
    where
        T: FieldType,
        B: AsRef<[u8]>,
    {
        let mark = buffer.read_position();
        let mut value = T::default_value();

        match self.decode_root(&mut value, buffer) {
            Ok(()) => {
                tracing::trace!(
                    type_name = std::any::type_name::<T>(),
                    read = buffer.read_position() - mark,
                    "decoded value"
                );
                Ok(value)
            }

            Err(err) => {
                buffer.rewind_to(mark);
                tracing::trace!(
                    type_name = std::any::type_name::<T>(),
                    error = %err,
                    "decoding failed"
                );
                Err(err)
            }
        }
    }

    fn encode_root<T: FieldType>(
        &self,
        value: &T,
        encoder: &mut dyn Encoder,
    ) -> Result<()> {
        let value: &dyn Any = value;
        let depth = Depth::root(self.config.max_depth);

        match T::shape() {
            Shape::Primitive(kind) => kind.encode(value, encoder),
            Shape::String => primitive::encode_string(value, encoder),
            Shape::DateTime => primitive::encode_date_time(value, encoder),
            Shape::Guid => primitive::encode_guid(value, encoder),
            Shape::Enum(shape) => (shape.encode)(value, encoder),

            Shape::Object(object) => {
                let plan = Registry::global().plan_for(&object)?;
                plan.encode((object.deref)(value), encoder, depth)
            }

            Shape::Array(_) => Registry::global()
                .value_codec_for::<T>()?
                .encode(value, encoder, depth),

            shape => Err(unsupported_root::<T>(&shape)),
        }
    }

    fn decode_root<T: FieldType>(
        &self,
        slot: &mut T,
        decoder: &mut dyn Decoder,
    ) -> Result<()> {
        let slot: &mut dyn Any = slot;
        let depth = Depth::root(self.config.max_depth);

        match T::shape() {
            Shape::Primitive(kind) => kind.decode_into(slot, decoder),
            Shape::String => primitive::decode_string(slot, decoder),
            Shape::DateTime => primitive::decode_date_time(slot, decoder),
            Shape::Guid => primitive::decode_guid(slot, decoder),
            Shape::Enum(shape) => (shape.decode)(slot, decoder),

            Shape::Object(object) => {
                let plan = Registry::global().plan_for(&object)?;
                plan.decode((object.deref_mut)(slot), decoder, depth)
            }

            Shape::Array(_) => Registry::global()
                .value_codec_for::<T>()?
                .decode(slot, decoder, depth),

            shape => Err(unsupported_root::<T>(&shape)),
        }
    }
}

fn unsupported_root<T>(shape: &Shape) -> Error {
    match shape {
        &Shape::Unsupported { type_name, reason } => {
            Error::UnsupportedType { type_name, reason }
        }
        _ => Error::UnsupportedType {
            type_name: std::any::type_name::<T>(),
            reason: "optional values are only supported as object fields",
        },
    }
}

/// Encodes `value` into `destination` with the default configuration.
///
/// See [`Codec::serialize`].
pub fn serialize<T: FieldType>(
    value: &T,
    destination: &mut [u8],
) -> Result<usize> {
    Codec::new().serialize(value, destination)
}

/// Decodes a `T` from `source` with the default configuration.
///
/// See [`Codec::deserialize`].
pub fn deserialize<T: FieldType>(source: &[u8]) -> Result<T> {
    Codec::new().deserialize(source)
}
