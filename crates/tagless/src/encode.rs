//! The writing half of the wire format.
//!
//! This module provides the [`Encoder`] trait. An implementor only supplies
//! the raw byte sink; every scalar kind of the wire format is written by the
//! provided methods so all encoders agree on widths and byte order.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result, primitive::Presence};

/// A sink that writes wire-format values into a bounded region.
///
/// The trait is object safe: compiled plans hold `&mut dyn Encoder` so one
/// plan serves every destination type.
///
/// Every write either commits all of its bytes or none of them. A write that
/// does not fit fails with [`Error::BufferOverflow`] and leaves the write
/// position unchanged.
///
/// # Example
///
/// ```ignore
/// use tagless::{CursorBuffer, Encoder};
///
/// let mut region = [0u8; 8];
/// let mut buffer = CursorBuffer::new(&mut region[..]);
///
/// buffer.emit_i32(10)?;
/// buffer.emit_bool(true)?;
///
/// assert_eq!(buffer.finished(), &[0x0A, 0, 0, 0, 1]);
/// ```
pub trait Encoder {
    // =========================================================================
    // Required methods - these must be implemented by all encoders
    // =========================================================================

    /// Copies `bytes` verbatim at the write position.
    fn write_raw(&mut self, bytes: &[u8]) -> Result<()>;

    /// Writes one fixed-width value.
    ///
    /// Implementors may stage the bytes before committing them; the default
    /// simply forwards to [`Encoder::write_raw`].
    fn write_fixed(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_raw(bytes)
    }

    /// Returns the number of bytes written so far.
    fn write_position(&self) -> usize;

    /// Returns how many more bytes fit.
    fn free_space(&self) -> usize;

    // =========================================================================
    // Provided methods - scalar kinds
    // =========================================================================

    /// Emits a single unsigned byte.
    fn emit_u8(&mut self, v: u8) -> Result<()> {
        self.write_fixed(&[v])
    }

    /// Emits a single signed byte.
    fn emit_i8(&mut self, v: i8) -> Result<()> {
        self.write_fixed(&v.to_le_bytes())
    }

    /// Emits a 16-bit unsigned integer in little-endian format.
    fn emit_u16(&mut self, v: u16) -> Result<()> {
        self.write_fixed(&v.to_le_bytes())
    }

    /// Emits a 16-bit signed integer in little-endian format.
    fn emit_i16(&mut self, v: i16) -> Result<()> {
        self.write_fixed(&v.to_le_bytes())
    }

    /// Emits a 32-bit unsigned integer in little-endian format.
    fn emit_u32(&mut self, v: u32) -> Result<()> {
        self.write_fixed(&v.to_le_bytes())
    }

    /// Emits a 32-bit signed integer in little-endian format.
    fn emit_i32(&mut self, v: i32) -> Result<()> {
        self.write_fixed(&v.to_le_bytes())
    }

    /// Emits a 64-bit unsigned integer in little-endian format.
    fn emit_u64(&mut self, v: u64) -> Result<()> {
        self.write_fixed(&v.to_le_bytes())
    }

    /// Emits a 64-bit signed integer in little-endian format.
    fn emit_i64(&mut self, v: i64) -> Result<()> {
        self.write_fixed(&v.to_le_bytes())
    }

    /// Emits a 32-bit float as its IEEE 754 bits.
    fn emit_f32(&mut self, v: f32) -> Result<()> {
        self.write_fixed(&v.to_le_bytes())
    }

    /// Emits a 64-bit float as its IEEE 754 bits.
    fn emit_f64(&mut self, v: f64) -> Result<()> {
        self.write_fixed(&v.to_le_bytes())
    }

    /// Emits a boolean as a single byte (`0` or `1`).
    fn emit_bool(&mut self, v: bool) -> Result<()> {
        self.emit_u8(u8::from(v))
    }

    /// Emits a character as one UTF-16 code unit.
    ///
    /// Characters outside the Basic Multilingual Plane need two code units
    /// and fail with [`Error::ValueOutOfRange`].
    fn emit_char(&mut self, v: char) -> Result<()> {
        let mut units = [0u16; 2];
        match v.encode_utf16(&mut units) {
            [unit] => self.emit_u16(*unit),
            _ => Err(Error::ValueOutOfRange {
                what: "character outside the basic multilingual plane",
            }),
        }
    }

    /// Emits a string as an `i32` byte length followed by its UTF-8 bytes.
    ///
    /// Nothing is written unless the prefix and the payload both fit.
    fn emit_str(&mut self, v: &str) -> Result<()> {
        let len = i32::try_from(v.len()).map_err(|_| Error::ValueOutOfRange {
            what: "string longer than i32::MAX bytes",
        })?;

        let requested = 4 + v.len();
        if requested > self.free_space() {
            return Err(Error::BufferOverflow {
                offset: self.write_position(),
                requested,
                capacity: self.write_position() + self.free_space(),
            });
        }

        self.emit_i32(len)?;
        self.write_raw(v.as_bytes())
    }

    /// Emits a UTC date/time as signed nanoseconds since the Unix epoch.
    ///
    /// Instants outside roughly the years 1677 to 2262 do not fit and fail
    /// with [`Error::ValueOutOfRange`].
    fn emit_date_time(&mut self, v: &DateTime<Utc>) -> Result<()> {
        let nanos = v.timestamp_nanos_opt().ok_or(Error::ValueOutOfRange {
            what: "date/time outside the nanosecond timestamp range",
        })?;
        self.emit_i64(nanos)
    }

    /// Emits a UUID as its 16 bytes in RFC 4122 order.
    fn emit_guid(&mut self, v: &Uuid) -> Result<()> {
        self.write_fixed(v.as_bytes())
    }

    // =========================================================================
    // Provided methods - framing
    // =========================================================================

    /// Emits an element count as an `i32`.
    fn emit_length(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len).map_err(|_| Error::ValueOutOfRange {
            what: "sequence longer than i32::MAX elements",
        })?;
        self.emit_i32(len)
    }

    /// Emits a field presence flag.
    fn emit_presence(&mut self, presence: Presence) -> Result<()> {
        self.emit_u8(presence as u8)
    }
}
