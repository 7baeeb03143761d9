//! Byte-level record encoding.
//!
//! Records travel between workers as tagged big-endian byte strings inside
//! length-prefixed frames. The 16-bit reads assemble unsigned bytes into a
//! signed value, so counts and lengths in `128..=255` survive a round trip.

use std::io::{Read, Write};

use crate::error::GraphError;

/// Leading byte of a serialized vertex record.
pub const TAG_VERTEX: u8 = 1;
/// Leading byte of a serialized edge record.
pub const TAG_EDGE: u8 = 2;

/// Append-only big-endian encoder.
#[derive(Debug, Default)]
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub(crate) fn put_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a byte slice; every read reports truncation as `None` so
/// callers can reconstruct as much of a record as is present.
#[derive(Debug)]
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn get_u8(&mut self) -> Option<u8> {
        let b = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    pub(crate) fn get_i16(&mut self) -> Option<i16> {
        let bytes = self.buf.get(self.pos..self.pos + 2)?;
        self.pos += 2;
        Some(((bytes[0] as u16) << 8 | bytes[1] as u16) as i16)
    }

    pub(crate) fn get_i32(&mut self) -> Option<i32> {
        let bytes = self.buf.get(self.pos..self.pos + 4)?;
        self.pos += 4;
        Some(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn get_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        let bytes = self.buf.get(self.pos..self.pos + n)?;
        self.pos += n;
        Some(bytes)
    }
}

/// Writes length-prefixed frames to an output stream.
#[derive(Debug)]
pub struct FrameWriter<W: Write> {
    inner: W,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one frame: 4-byte big-endian length followed by the record
    /// bytes.
    pub fn write_frame(&mut self, record: &[u8]) -> Result<(), GraphError> {
        self.inner.write_all(&(record.len() as u32).to_be_bytes())?;
        self.inner.write_all(record)?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads length-prefixed frames from an input stream.
#[derive(Debug)]
pub struct FrameReader<R: Read> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the next frame, or `None` at a clean end of stream. A stream
    /// that ends inside a frame is a framing error.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, GraphError> {
        let mut len_bytes = [0u8; 4];
        match self.inner.read(&mut len_bytes)? {
            0 => return Ok(None),
            4 => {}
            n => {
                // Partial length prefix: pull whatever remains to confirm.
                let mut got = n;
                while got < 4 {
                    let read = self.inner.read(&mut len_bytes[got..])?;
                    if read == 0 {
                        return Err(GraphError::Framing(
                            "stream ended inside a frame length prefix".into(),
                        ));
                    }
                    got += read;
                }
            }
        }
        let len = u32::from_be_bytes(len_bytes) as usize;
        let mut record = vec![0u8; len];
        self.inner.read_exact(&mut record).map_err(|_| {
            GraphError::Framing(format!("stream ended inside a {len}-byte frame"))
        })?;
        Ok(Some(record))
    }
}
