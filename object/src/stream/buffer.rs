//! In-memory streams and adapters over standard writers.

use super::{InputStream, OutputStream};
use crate::source::LoadValue;
use std::io::{self, BufWriter, Write};

/// An input stream fed incrementally by its owner,
/// such as data arriving from a network connection.
///
/// The stream does not know its future contents,
/// so it never defers values: elements read from it
/// suspend until enough bytes were pushed.
///
/// Bytes already read are released on the next [`push`](Self::push),
/// except those after a pending mark.
/// A mark is released by [`putback`](InputStream::putback).
#[derive(Debug, Default)]
pub struct BufferInputStream {
    data: Vec<u8>,
    /// read position in `data`
    pos: usize,
    mark: Option<usize>,
    /// bytes discarded from the front of `data`
    discarded: u64,
    eos: bool,
}

impl BufferInputStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream with the given contents, already marked as complete.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        BufferInputStream {
            data: bytes.into(),
            eos: true,
            ..Self::default()
        }
    }

    /// Append more bytes to the stream.
    pub fn push(&mut self, bytes: &[u8]) {
        // bytes before the read position or the mark can no longer be read
        let keep_from = self.mark.map_or(self.pos, |mark| mark.min(self.pos));
        if keep_from > 0 {
            self.data.drain(..keep_from);
            self.pos -= keep_from;
            if let Some(mark) = &mut self.mark {
                *mark -= keep_from;
            }
            self.discarded += keep_from as u64;
        }
        self.data.extend_from_slice(bytes);
    }

    /// Declare that no more bytes will be pushed.
    pub fn set_eos(&mut self) {
        self.eos = true;
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl InputStream for BufferInputStream {
    fn status(&self) -> io::Result<()> {
        Ok(())
    }

    fn eos(&self) -> bool {
        self.eos && self.remaining() == 0
    }

    fn avail(&self) -> u64 {
        self.remaining() as u64
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let n = (self.remaining() as u64).min(n);
        self.pos += n as usize;
        Ok(n)
    }

    fn tell(&self) -> u64 {
        self.discarded + self.pos as u64
    }

    fn mark(&mut self) {
        self.mark = Some(self.pos);
    }

    fn putback(&mut self) -> io::Result<()> {
        let mark = self.mark.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no position marked")
        })?;
        self.pos = mark;
        Ok(())
    }

    fn new_factory(&self) -> Option<Box<dyn LoadValue>> {
        None
    }
}

/// An output stream with a fixed capacity,
/// drained by its owner between write calls.
///
/// This models a bounded transport buffer such as a network PDU.
#[derive(Debug)]
pub struct BufferOutputStream {
    data: Vec<u8>,
    capacity: usize,
}

impl BufferOutputStream {
    /// Create a stream accepting at most `capacity` bytes until drained.
    pub fn new(capacity: usize) -> Self {
        BufferOutputStream {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Take the bytes written so far, freeing up the whole capacity.
    pub fn take_data(&mut self) -> Vec<u8> {
        std::mem::replace(&mut self.data, Vec::with_capacity(self.capacity))
    }

    /// The bytes written since the last drain.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl OutputStream for BufferOutputStream {
    fn status(&self) -> io::Result<()> {
        Ok(())
    }

    fn avail(&self) -> u64 {
        (self.capacity - self.data.len()) as u64
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.capacity - self.data.len());
        self.data.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An output stream over any [`std::io::Write`] implementation.
///
/// The writer is assumed to block until it accepts the data,
/// so this stream never refuses bytes.
#[derive(Debug)]
pub struct WriterOutputStream<W: Write> {
    inner: BufWriter<W>,
    error: Option<io::ErrorKind>,
}

impl<W: Write> WriterOutputStream<W> {
    /// Wrap the given writer.
    pub fn new(to: W) -> Self {
        WriterOutputStream {
            inner: BufWriter::new(to),
            error: None,
        }
    }

    /// Flush the stream and retrieve the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write + std::fmt::Debug> OutputStream for WriterOutputStream<W> {
    fn status(&self) -> io::Result<()> {
        match self.error {
            None => Ok(()),
            Some(kind) => Err(kind.into()),
        }
    }

    fn avail(&self) -> u64 {
        u64::MAX
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write_all(buf).map_err(|e| {
            self.error = Some(e.kind());
            e
        })?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(|e| {
            self.error = Some(e.kind());
            e
        })
    }
}
