//! The closed set of fixed-width wire encodings.
//!
//! Every scalar kind has one canonical little-endian width. There are no type
//! tags: the schema alone decides how many bytes a value occupies.
//!
//! | kind                  | width | notes                                  |
//! |-----------------------|-------|----------------------------------------|
//! | `bool`                | 1     | `0` or `1`, anything else is malformed |
//! | `i8` / `u8`           | 1     |                                        |
//! | `i16` / `u16`         | 2     |                                        |
//! | `i32` / `u32`         | 4     |                                        |
//! | `i64` / `u64`         | 8     |                                        |
//! | `f32`                 | 4     | IEEE 754 bits                          |
//! | `f64`                 | 8     | IEEE 754 bits                          |
//! | `char`                | 2     | one UTF-16 code unit (BMP only)        |
//! | `DateTime<Utc>`       | 8     | signed nanoseconds since Unix epoch    |
//! | `Uuid`                | 16    | RFC 4122 byte order                    |
//! | `String`              | 4 + n | `i32` byte length, then UTF-8 bytes    |

use std::any::Any;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    Decoder, Encoder, Result,
    descriptor::{downcast_mut, downcast_ref},
};

/// Width in bytes of the length prefix used by strings and arrays.
pub const LENGTH_PREFIX_WIDTH: usize = 4;

/// Width in bytes of an encoded date/time.
pub const DATE_TIME_WIDTH: usize = 8;

/// Width in bytes of an encoded UUID.
pub const GUID_WIDTH: usize = 16;

/// A fixed-width scalar kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Primitive {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `u8`
    U8,
    /// `i16`
    I16,
    /// `u16`
    U16,
    /// `i32`
    I32,
    /// `u32`
    U32,
    /// `i64`
    I64,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `char`, stored as one UTF-16 code unit.
    Char,
}

impl Primitive {
    /// Returns the encoded width in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 | Self::Char => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// Returns `true` for the integer kinds that may back an enum.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Bool | Self::F32 | Self::F64 | Self::Char)
    }

    /// Encodes `value`, which must be the Rust type of this kind.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not of the Rust type this kind stands for.
    pub fn encode(
        self,
        value: &dyn Any,
        encoder: &mut dyn Encoder,
    ) -> Result<()> {
        match self {
            Self::Bool => encoder.emit_bool(*downcast_ref::<bool>(value)),
            Self::I8 => encoder.emit_i8(*downcast_ref::<i8>(value)),
            Self::U8 => encoder.emit_u8(*downcast_ref::<u8>(value)),
            Self::I16 => encoder.emit_i16(*downcast_ref::<i16>(value)),
            Self::U16 => encoder.emit_u16(*downcast_ref::<u16>(value)),
            Self::I32 => encoder.emit_i32(*downcast_ref::<i32>(value)),
            Self::U32 => encoder.emit_u32(*downcast_ref::<u32>(value)),
            Self::I64 => encoder.emit_i64(*downcast_ref::<i64>(value)),
            Self::U64 => encoder.emit_u64(*downcast_ref::<u64>(value)),
            Self::F32 => encoder.emit_f32(*downcast_ref::<f32>(value)),
            Self::F64 => encoder.emit_f64(*downcast_ref::<f64>(value)),
            Self::Char => encoder.emit_char(*downcast_ref::<char>(value)),
        }
    }

    /// Decodes into `slot`, which must be the Rust type of this kind.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not of the Rust type this kind stands for.
    pub fn decode_into(
        self,
        slot: &mut dyn Any,
        decoder: &mut dyn Decoder,
    ) -> Result<()> {
        match self {
            Self::Bool => *downcast_mut::<bool>(slot) = decoder.read_bool()?,
            Self::I8 => *downcast_mut::<i8>(slot) = decoder.read_i8()?,
            Self::U8 => *downcast_mut::<u8>(slot) = decoder.read_u8()?,
            Self::I16 => *downcast_mut::<i16>(slot) = decoder.read_i16()?,
            Self::U16 => *downcast_mut::<u16>(slot) = decoder.read_u16()?,
            Self::I32 => *downcast_mut::<i32>(slot) = decoder.read_i32()?,
            Self::U32 => *downcast_mut::<u32>(slot) = decoder.read_u32()?,
            Self::I64 => *downcast_mut::<i64>(slot) = decoder.read_i64()?,
            Self::U64 => *downcast_mut::<u64>(slot) = decoder.read_u64()?,
            Self::F32 => *downcast_mut::<f32>(slot) = decoder.read_f32()?,
            Self::F64 => *downcast_mut::<f64>(slot) = decoder.read_f64()?,
            Self::Char => *downcast_mut::<char>(slot) = decoder.read_char()?,
        }
        Ok(())
    }

    /// Writes an integer discriminant with this kind's width, truncating
    /// it to the kind's range the same way an `as` cast does.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub(crate) fn emit_discriminant(
        self,
        value: i128,
        encoder: &mut dyn Encoder,
    ) -> Result<()> {
        match self {
            Self::I8 => encoder.emit_i8(value as i8),
            Self::U8 => encoder.emit_u8(value as u8),
            Self::I16 => encoder.emit_i16(value as i16),
            Self::U16 => encoder.emit_u16(value as u16),
            Self::I64 => encoder.emit_i64(value as i64),
            Self::U64 => encoder.emit_u64(value as u64),
            Self::U32 => encoder.emit_u32(value as u32),
            Self::I32 | Self::Bool | Self::F32 | Self::F64 | Self::Char => {
                encoder.emit_i32(value as i32)
            }
        }
    }

    /// Reads an integer discriminant of this kind's width.
    pub(crate) fn read_discriminant(
        self,
        decoder: &mut dyn Decoder,
    ) -> Result<i128> {
        Ok(match self {
            Self::I8 => i128::from(decoder.read_i8()?),
            Self::U8 => i128::from(decoder.read_u8()?),
            Self::I16 => i128::from(decoder.read_i16()?),
            Self::U16 => i128::from(decoder.read_u16()?),
            Self::I64 => i128::from(decoder.read_i64()?),
            Self::U64 => i128::from(decoder.read_u64()?),
            Self::U32 => i128::from(decoder.read_u32()?),
            Self::I32 | Self::Bool | Self::F32 | Self::F64 | Self::Char => {
                i128::from(decoder.read_i32()?)
            }
        })
    }
}

/// The one-byte marker written before every object field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Presence {
    /// No payload follows; decoding assigns the field's default.
    Absent = 0,

    /// The field's payload follows.
    Present = 1,
}

impl Presence {
    /// Parses a flag byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Absent),
            1 => Some(Self::Present),
            _ => None,
        }
    }
}

/// Encodes a `String` slot.
pub(crate) fn encode_string(
    value: &dyn Any,
    encoder: &mut dyn Encoder,
) -> Result<()> {
    encoder.emit_str(downcast_ref::<String>(value))
}

/// Decodes into a `String` slot.
pub(crate) fn decode_string(
    slot: &mut dyn Any,
    decoder: &mut dyn Decoder,
) -> Result<()> {
    *downcast_mut::<String>(slot) = decoder.read_string()?;
    Ok(())
}

/// Encodes a `DateTime<Utc>` slot.
pub(crate) fn encode_date_time(
    value: &dyn Any,
    encoder: &mut dyn Encoder,
) -> Result<()> {
    encoder.emit_date_time(downcast_ref::<DateTime<Utc>>(value))
}

/// Decodes into a `DateTime<Utc>` slot.
pub(crate) fn decode_date_time(
    slot: &mut dyn Any,
    decoder: &mut dyn Decoder,
) -> Result<()> {
    *downcast_mut::<DateTime<Utc>>(slot) = decoder.read_date_time()?;
    Ok(())
}

/// Encodes a `Uuid` slot.
pub(crate) fn encode_guid(
    value: &dyn Any,
    encoder: &mut dyn Encoder,
) -> Result<()> {
    encoder.emit_guid(downcast_ref::<Uuid>(value))
}

/// Decodes into a `Uuid` slot.
pub(crate) fn decode_guid(
    slot: &mut dyn Any,
    decoder: &mut dyn Decoder,
) -> Result<()> {
    *downcast_mut::<Uuid>(slot) = decoder.read_guid()?;
    Ok(())
}
