//! Byte-at-a-time sources consumed by the diff scanner.
//!
//! The scanner advances both inputs one byte at a time and occasionally
//! steps a cursor back to the point where the two inputs line up again.
//! [`ByteSource`] captures exactly that access pattern so the same scanner
//! runs over in-memory slices (infallible) and buffered files.

use std::convert::Infallible;
use std::io::{self, BufRead, BufReader, Read, Seek};

/// Sequential byte reader with bounded rewind.
pub trait ByteSource {
    /// Error produced by the underlying storage.
    type Error;

    /// Returns the next byte, or `None` at end of stream.
    fn next_byte(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Returns the offset of the byte the next call to [`Self::next_byte`] yields.
    fn position(&self) -> u64;

    /// Moves the cursor back to `position`, which must not exceed the current one.
    fn rewind_to(&mut self, position: u64) -> Result<(), Self::Error>;

    /// Appends every remaining byte to `out`.
    fn read_remaining(&mut self, out: &mut Vec<u8>) -> Result<(), Self::Error>;
}

/// [`ByteSource`] over a borrowed slice.
#[derive(Clone, Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> SliceSource<'a> {
    /// Creates a source positioned at the start of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    type Error = Infallible;

    fn next_byte(&mut self) -> Result<Option<u8>, Infallible> {
        let byte = self.data.get(self.cursor).copied();
        if byte.is_some() {
            self.cursor += 1;
        }
        Ok(byte)
    }

    fn position(&self) -> u64 {
        self.cursor as u64
    }

    fn rewind_to(&mut self, position: u64) -> Result<(), Infallible> {
        debug_assert!(position <= self.cursor as u64);
        self.cursor = position as usize;
        Ok(())
    }

    fn read_remaining(&mut self, out: &mut Vec<u8>) -> Result<(), Infallible> {
        out.extend_from_slice(&self.data[self.cursor..]);
        self.cursor = self.data.len();
        Ok(())
    }
}

/// [`ByteSource`] over any seekable reader, buffered.
///
/// Positions are relative to wherever the reader stood when the source was
/// created. Rewinds use [`BufReader::seek_relative`], which keeps the buffer
/// when the target is still inside it.
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: BufReader<R>,
    position: u64,
}

impl<R: Read + Seek> ReaderSource<R> {
    /// Wraps `reader` with a buffer of `capacity` bytes.
    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity.max(1), reader),
            position: 0,
        }
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    type Error = io::Error;

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = loop {
            match self.inner.fill_buf() {
                Ok(buf) => break buf.first().copied(),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error),
            }
        };
        if byte.is_some() {
            self.inner.consume(1);
            self.position += 1;
        }
        Ok(byte)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn rewind_to(&mut self, position: u64) -> io::Result<()> {
        let back = self.position.checked_sub(position).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot rewind forward from {} to {position}", self.position),
            )
        })?;
        let back = i64::try_from(back)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "rewind distance overflow"))?;
        self.inner.seek_relative(-back)?;
        self.position = position;
        Ok(())
    }

    fn read_remaining(&mut self, out: &mut Vec<u8>) -> io::Result<()> {
        let read = self.inner.read_to_end(out)?;
        self.position += read as u64;
        Ok(())
    }
}
