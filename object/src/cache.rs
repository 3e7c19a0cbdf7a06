//! Caches which speed up repeated access to deferred values.

use crate::element::DicomElement;
use crate::error::Result;
use crate::stream::{InputStream, OutputStream};
use byteordered::Endianness;
use std::io;
use tracing::trace;

/// The default buffer size of a [`WriteCache`].
pub const DEFAULT_WRITE_CACHE_SIZE: usize = 64 * 1024;

/// Keeps an open stream of a deferred value between partial reads,
/// so that consecutive reads moving forward do not reopen the backing store.
#[derive(Debug, Default)]
pub struct FileCache {
    owner: Option<u64>,
    stream: Option<Box<dyn InputStream>>,
    offset: u64,
}

impl FileCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cache holds a stream of the deferred value with this id.
    pub fn is_user(&self, id: u64) -> bool {
        self.owner == Some(id) && self.stream.is_some()
    }

    /// Take over a freshly opened stream of the deferred value with this id.
    /// The stream's current position is recorded as the start of the value.
    pub fn init(&mut self, id: u64, stream: Box<dyn InputStream>) {
        trace!("file cache taken over by deferred value #{}", id);
        self.offset = stream.tell();
        self.owner = Some(id);
        self.stream = Some(stream);
    }

    /// The stream position of the start of the value.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The position of the cached stream, if any.
    pub fn tell(&self) -> Option<u64> {
        self.stream.as_ref().map(|s| s.tell())
    }

    /// The cached stream, if any.
    pub fn stream_mut(&mut self) -> Option<&mut (dyn InputStream + 'static)> {
        self.stream.as_deref_mut()
    }

    /// Close the cached stream.
    pub fn clear(&mut self) {
        self.owner = None;
        self.stream = None;
        self.offset = 0;
    }
}

/// A buffer for writing deferred values to an output stream
/// block by block, without loading them into the element.
///
/// The cache may be shared by the elements of a data set:
/// it resets itself whenever it is used for a different value.
#[derive(Debug)]
pub struct WriteCache {
    owner: Option<u64>,
    field_length: u32,
    /// offset in the value of the next byte to fetch
    field_offset: u32,
    byte_order: Endianness,
    buffer: Vec<u8>,
    capacity: usize,
    pos: usize,
    filled: usize,
    file_cache: FileCache,
}

impl Default for WriteCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_WRITE_CACHE_SIZE)
    }
}

impl WriteCache {
    /// Create a write cache with the default buffer size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a write cache with the given buffer size.
    /// A size of zero is raised to one byte.
    pub fn with_capacity(capacity: usize) -> Self {
        WriteCache {
            owner: None,
            field_length: 0,
            field_offset: 0,
            byte_order: Endianness::Little,
            buffer: Vec::new(),
            capacity: capacity.max(1),
            pos: 0,
            filled: 0,
            file_cache: FileCache::new(),
        }
    }

    /// Prepare the cache for writing the deferred value `owner`,
    /// of which `bytes_transferred` bytes were already written.
    ///
    /// The buffered content is kept if it continues
    /// exactly where the previous write of the same value stopped.
    pub fn init(
        &mut self,
        owner: u64,
        field_length: u32,
        bytes_transferred: u32,
        byte_order: Endianness,
    ) {
        let next_unsent = self.field_offset - self.content_length() as u32;
        if self.owner != Some(owner)
            || self.field_length != field_length
            || self.byte_order != byte_order
            || next_unsent != bytes_transferred
        {
            self.owner = Some(owner);
            self.field_length = field_length;
            self.field_offset = bytes_transferred;
            self.byte_order = byte_order;
            self.pos = 0;
            self.filled = 0;
        }
    }

    /// Whether all buffered bytes were written out.
    pub fn buffer_is_empty(&self) -> bool {
        self.pos == self.filled
    }

    /// The number of buffered bytes not yet written out.
    pub fn content_length(&self) -> usize {
        self.filled - self.pos
    }

    /// Refill the buffer with the next block of the element's value,
    /// if the buffer is empty and the value has bytes left.
    pub fn fill_buffer(&mut self, elem: &mut DicomElement) -> Result<()> {
        if !self.buffer_is_empty() || self.field_offset >= self.field_length {
            return Ok(());
        }
        let n = (self.field_length - self.field_offset).min(self.capacity as u32) as usize;
        if self.buffer.len() < n {
            self.buffer.resize(n, 0);
        }
        elem.get_partial_value(
            &mut self.buffer[..n],
            self.field_offset,
            Some(&mut self.file_cache),
            self.byte_order,
        )?;
        self.field_offset += n as u32;
        self.pos = 0;
        self.filled = n;
        Ok(())
    }

    /// Write as much of the buffered content as the stream accepts,
    /// returning the number of bytes written.
    pub fn write_buffer(&mut self, out: &mut dyn OutputStream) -> io::Result<usize> {
        if self.buffer_is_empty() {
            return Ok(0);
        }
        let n = out.write(&self.buffer[self.pos..self.filled])?;
        self.pos += n;
        Ok(n)
    }
}
