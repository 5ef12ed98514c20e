//! A bounded byte region with independent read and write cursors.
//!
//! [`CursorBuffer`] is the only concrete [`Encoder`] and [`Decoder`] the crate
//! ships. It never grows: the region handed to it at construction is all the
//! space it will ever write to, and every write is bounds-checked against it.
//!
//! # Cursors
//!
//! ```text
//!  0            read_pos          write_pos             capacity
//!  |---- read ----|---- unread ------|------ free ----------|
//! ```
//!
//! The read cursor never passes the write cursor: bytes that have not been
//! written cannot be read, even when the underlying region is larger.

use std::io;

use crate::{Decoder, Encoder, Error, Malformed, Result, decode::malformed};


/// Width of the staging area used by fixed-width writes and reads. Large
/// enough for the widest scalar kind (a UUID).
const SCRATCH_LEN: usize = 16;

/// A fixed-capacity cursor over a caller-supplied byte region.
///
/// `B` is any byte container: `&mut [u8]` or `Vec<u8>` to encode, and
/// `&[u8]` to decode.
///
/// # Example
///
/// ```ignore
/// use tagless::{CursorBuffer, Decoder, Encoder};
///
/// let mut region = [0u8; 32];
/// let mut buffer = CursorBuffer::new(&mut region[..]);
///
/// buffer.emit_str("hi")?;
/// assert_eq!(buffer.write_position(), 6);
///
/// assert_eq!(buffer.read_string()?, "hi");
/// assert_eq!(buffer.remaining(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct CursorBuffer<B> {
    region: B,
    write_pos: usize,
    read_pos: usize,
    scratch: [u8; SCRATCH_LEN],
}

impl<B: AsRef<[u8]>> CursorBuffer<B> {
    /// Creates an empty buffer over `region`; both cursors start at zero.
    pub const fn new(region: B) -> Self {
        Self { region, write_pos: 0, read_pos: 0, scratch: [0; SCRATCH_LEN] }
    }

    /// Creates a buffer whose whole region counts as already written, ready
    /// to be decoded from the start.
    pub fn with_contents(region: B) -> Self {
        let write_pos = region.as_ref().len();
        Self { region, write_pos, read_pos: 0, scratch: [0; SCRATCH_LEN] }
    }

    /// Returns the total size of the region.
    pub fn capacity(&self) -> usize { self.region.as_ref().len() }

    /// Returns the number of bytes written so far.
    pub const fn write_position(&self) -> usize { self.write_pos }

    /// Returns the number of bytes consumed so far.
    pub const fn read_position(&self) -> usize { self.read_pos }

    /// Returns how many more bytes can be written.
    pub fn free_space(&self) -> usize { self.capacity() - self.write_pos }

    /// Returns how many written bytes have not been read yet.
    pub const fn remaining(&self) -> usize { self.write_pos - self.read_pos }

    /// Moves the read cursor. The position must not exceed the write cursor.
    pub fn set_read_position(&mut self, position: usize) -> Result<()> {
        if position > self.write_pos {
            return Err(malformed(self.read_pos, Malformed::InvalidReadPosition {
                position,
                written: self.write_pos,
            }));
        }

        self.read_pos = position;
        Ok(())
    }

    /// Returns the written part of the region.
    pub fn finished(&self) -> &[u8] { &self.region.as_ref()[..self.write_pos] }

    /// Returns the written bytes that have not been read yet.
    pub fn unread(&self) -> &[u8] {
        &self.region.as_ref()[self.read_pos..self.write_pos]
    }

    /// Copies the written part of the region into `writer`.
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.finished())
    }

    /// Consumes the buffer and returns the region.
    pub fn into_inner(self) -> B { self.region }

    /// Moves the read cursor back to `mark`.
    pub(crate) fn rewind_to(&mut self, mark: usize) {
        self.read_pos = self.read_pos.min(mark);
    }

    fn check_readable(&self, len: usize) -> Result<usize> {
        let available = self.remaining();
        match self.read_pos.checked_add(len) {
            Some(end) if end <= self.write_pos => Ok(end),
            _ => Err(malformed(self.read_pos, Malformed::UnexpectedEnd {
                requested: len,
                available,
            })),
        }
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> CursorBuffer<B> {
    /// Moves the write cursor back to `mark`, zeroing everything written
    /// after it. Marks past the write cursor are ignored.
    pub fn rollback_to(&mut self, mark: usize) {
        if mark >= self.write_pos {
            return;
        }

        self.region.as_mut()[mark..self.write_pos].fill(0);
        self.write_pos = mark;
        self.read_pos = self.read_pos.min(mark);
    }

    /// Zeroes the written part of the region and resets both cursors.
    pub fn clear(&mut self) {
        self.rollback_to(0);
        self.read_pos = 0;
        self.scratch.fill(0);
    }

    fn check_writable(&self, len: usize) -> Result<usize> {
        let capacity = self.capacity();
        match self.write_pos.checked_add(len) {
            Some(end) if end <= capacity => Ok(end),
            _ => Err(Error::BufferOverflow {
                offset: self.write_pos,
                requested: len,
                capacity,
            }),
        }
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Encoder for CursorBuffer<B> {
    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.check_writable(bytes.len())?;

        self.region.as_mut()[self.write_pos..end].copy_from_slice(bytes);
        self.write_pos = end;
        Ok(())
    }

    fn write_fixed(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > SCRATCH_LEN {
            return self.write_raw(bytes);
        }

        let end = self.check_writable(bytes.len())?;

        let Self { region, write_pos, scratch, .. } = self;
        scratch.fill(0);
        scratch[..bytes.len()].copy_from_slice(bytes);
        region.as_mut()[*write_pos..end]
            .copy_from_slice(&scratch[..bytes.len()]);

        *write_pos = end;
        Ok(())
    }

    fn write_position(&self) -> usize { self.write_pos }

    fn free_space(&self) -> usize { Self::free_space(self) }
}

impl<B: AsRef<[u8]>> Decoder for CursorBuffer<B> {
    fn read_raw(&mut self, len: usize) -> Result<&[u8]> {
        let end = self.check_readable(len)?;
        let start = self.read_pos;

        self.read_pos = end;
        Ok(&self.region.as_ref()[start..end])
    }

    fn read_fixed(&mut self, out: &mut [u8]) -> Result<()> {
        if out.len() > SCRATCH_LEN {
            let bytes = self.read_raw(out.len())?;
            out.copy_from_slice(bytes);
            return Ok(());
        }

        let end = self.check_readable(out.len())?;

        let Self { region, read_pos, scratch, .. } = self;
        scratch.fill(0);
        scratch[..out.len()].copy_from_slice(&region.as_ref()[*read_pos..end]);
        out.copy_from_slice(&scratch[..out.len()]);

        *read_pos = end;
        Ok(())
    }

    fn read_position(&self) -> usize { self.read_pos }

    fn remaining(&self) -> usize { Self::remaining(self) }
}
