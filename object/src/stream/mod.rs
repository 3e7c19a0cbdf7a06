//! Byte streams driven by the element engine.
//!
//! Unlike [`std::io::Read`] and [`std::io::Write`],
//! these streams report how much data they can move right now,
//! so that transfers can be suspended and resumed
//! without ever blocking on a bounded transport buffer.

use crate::source::LoadValue;
use std::fmt;
use std::io;

mod buffer;
mod file;

pub use self::buffer::{BufferInputStream, BufferOutputStream, WriterOutputStream};
pub use self::file::FileInputStream;

/// A source of bytes for reading element values.
pub trait InputStream: fmt::Debug {
    /// Check the stream for a previous I/O failure.
    fn status(&self) -> io::Result<()>;

    /// Whether the stream is exhausted:
    /// no bytes are left and none will ever become available.
    fn eos(&self) -> bool;

    /// The number of bytes which can be read right now.
    fn avail(&self) -> u64;

    /// Read up to `buf.len()` bytes, returning how many were read.
    /// Returns fewer bytes than requested
    /// only if the stream cannot provide more at this time.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Skip up to `n` bytes, returning how many were skipped.
    fn skip(&mut self, n: u64) -> io::Result<u64>;

    /// The current position in the stream.
    fn tell(&self) -> u64;

    /// Remember the current position for a later [`putback`](InputStream::putback).
    fn mark(&mut self);

    /// Return to the position of the last [`mark`](InputStream::mark).
    fn putback(&mut self) -> io::Result<()>;

    /// Create a factory which reopens this stream at the current position,
    /// if the backing store supports random access.
    fn new_factory(&self) -> Option<Box<dyn LoadValue>>;
}

/// A sink of bytes for writing elements.
pub trait OutputStream: fmt::Debug {
    /// Check the stream for a previous I/O failure.
    fn status(&self) -> io::Result<()>;

    /// The number of bytes which can be written right now.
    fn avail(&self) -> u64;

    /// Write up to `buf.len()` bytes, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Push buffered bytes to their destination.
    fn flush(&mut self) -> io::Result<()>;
}

/// A [`std::io::Read`] view over an input stream,
/// for consumers such as the element header decoders.
///
/// A read which obtains no bytes from a stream that is not yet exhausted
/// fails with [`io::ErrorKind::WouldBlock`].
#[derive(Debug)]
pub struct StreamReader<'a> {
    inner: &'a mut dyn InputStream,
}

impl<'a> StreamReader<'a> {
    /// Wrap the given input stream.
    pub fn new(inner: &'a mut dyn InputStream) -> Self {
        StreamReader { inner }
    }
}

impl io::Read for StreamReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.status()?;
        if buf.is_empty() || self.inner.eos() {
            return Ok(0);
        }
        match self.inner.read(buf)? {
            0 => Err(io::ErrorKind::WouldBlock.into()),
            n => Ok(n),
        }
    }
}
