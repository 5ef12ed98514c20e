//! The reading half of the wire format.
//!
//! This module provides the [`Decoder`] trait, the mirror image of
//! [`Encoder`](crate::Encoder). Reads never go past the bytes that have been
//! written into the source region, and every malformed byte pattern is
//! reported as [`Error::MalformedInput`] together with the offset it was
//! found at.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Malformed, Result, primitive::Presence};

/// A source that reads wire-format values from a bounded region.
///
/// Like [`Encoder`](crate::Encoder) the trait is object safe, so compiled
/// plans decode through `&mut dyn Decoder`.
///
/// # Example
///
/// ```ignore
/// use tagless::{CursorBuffer, Decoder};
///
/// let bytes = [0x0A, 0, 0, 0, 1];
/// let mut buffer = CursorBuffer::with_contents(&bytes[..]);
///
/// assert_eq!(buffer.read_i32()?, 10);
/// assert!(buffer.read_bool()?);
/// assert_eq!(buffer.remaining(), 0);
/// ```
pub trait Decoder {
    // =========================================================================
    // Required methods - these must be implemented by all decoders
    // =========================================================================

    /// Returns the next `len` bytes and advances past them.
    ///
    /// Fails with [`Malformed::UnexpectedEnd`] without moving the read
    /// position when fewer than `len` bytes remain.
    fn read_raw(&mut self, len: usize) -> Result<&[u8]>;

    /// Fills `out` with the next `out.len()` bytes.
    fn read_fixed(&mut self, out: &mut [u8]) -> Result<()> {
        let bytes = self.read_raw(out.len())?;
        out.copy_from_slice(bytes);
        Ok(())
    }

    /// Returns the number of bytes consumed so far.
    fn read_position(&self) -> usize;

    /// Returns how many written bytes are still unread.
    fn remaining(&self) -> usize;

    // =========================================================================
    // Provided methods - scalar kinds
    // =========================================================================

    /// Reads a single unsigned byte.
    fn read_u8(&mut self) -> Result<u8> {
        let mut bytes = [0u8; 1];
        self.read_fixed(&mut bytes)?;
        Ok(bytes[0])
    }

    /// Reads a single signed byte.
    fn read_i8(&mut self) -> Result<i8> {
        let mut bytes = [0u8; 1];
        self.read_fixed(&mut bytes)?;
        Ok(i8::from_le_bytes(bytes))
    }

    /// Reads a 16-bit unsigned integer in little-endian format.
    fn read_u16(&mut self) -> Result<u16> {
        let mut bytes = [0u8; 2];
        self.read_fixed(&mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Reads a 16-bit signed integer in little-endian format.
    fn read_i16(&mut self) -> Result<i16> {
        let mut bytes = [0u8; 2];
        self.read_fixed(&mut bytes)?;
        Ok(i16::from_le_bytes(bytes))
    }

    /// Reads a 32-bit unsigned integer in little-endian format.
    fn read_u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.read_fixed(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads a 32-bit signed integer in little-endian format.
    fn read_i32(&mut self) -> Result<i32> {
        let mut bytes = [0u8; 4];
        self.read_fixed(&mut bytes)?;
        Ok(i32::from_le_bytes(bytes))
    }

    /// Reads a 64-bit unsigned integer in little-endian format.
    fn read_u64(&mut self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        self.read_fixed(&mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads a 64-bit signed integer in little-endian format.
    fn read_i64(&mut self) -> Result<i64> {
        let mut bytes = [0u8; 8];
        self.read_fixed(&mut bytes)?;
        Ok(i64::from_le_bytes(bytes))
    }

    /// Reads a 32-bit float from its IEEE 754 bits.
    fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads a 64-bit float from its IEEE 754 bits.
    fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads a boolean. Only `0` and `1` are accepted.
    fn read_bool(&mut self) -> Result<bool> {
        let offset = self.read_position();
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(malformed(offset, Malformed::InvalidBool(byte))),
        }
    }

    /// Reads a character stored as one UTF-16 code unit.
    ///
    /// Lone surrogates are rejected.
    fn read_char(&mut self) -> Result<char> {
        let offset = self.read_position();
        let unit = self.read_u16()?;
        char::from_u32(u32::from(unit))
            .ok_or_else(|| malformed(offset, Malformed::InvalidChar(unit)))
    }

    /// Reads an `i32` byte length followed by that many UTF-8 bytes.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_length()?;
        let payload = self.read_position();

        let bytes = self.read_raw(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| malformed(payload, Malformed::InvalidUtf8))
    }

    /// Reads a UTC date/time stored as nanoseconds since the Unix epoch.
    fn read_date_time(&mut self) -> Result<DateTime<Utc>> {
        Ok(DateTime::from_timestamp_nanos(self.read_i64()?))
    }

    /// Reads a UUID from 16 bytes in RFC 4122 order.
    fn read_guid(&mut self) -> Result<Uuid> {
        let mut bytes = [0u8; 16];
        self.read_fixed(&mut bytes)?;
        Ok(Uuid::from_bytes(bytes))
    }

    // =========================================================================
    // Provided methods - framing
    // =========================================================================

    /// Reads an element count. Negative counts are malformed.
    fn read_length(&mut self) -> Result<usize> {
        let offset = self.read_position();
        let len = self.read_i32()?;
        usize::try_from(len)
            .map_err(|_| malformed(offset, Malformed::NegativeLength(len)))
    }

    /// Reads a field presence flag. Only `0` and `1` are accepted.
    fn read_presence(&mut self) -> Result<Presence> {
        let offset = self.read_position();
        let byte = self.read_u8()?;
        Presence::from_byte(byte).ok_or_else(|| {
            malformed(offset, Malformed::InvalidPresenceFlag(byte))
        })
    }
}

/// Builds an [`Error::MalformedInput`] at `offset`.
#[must_use]
pub const fn malformed(offset: usize, reason: Malformed) -> Error {
    Error::MalformedInput { offset, reason }
}
