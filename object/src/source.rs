//! Deferred value sources.
//!
//! An element whose value stays in its backing store
//! keeps a [`DeferredValue`], which knows how to reopen a stream
//! positioned at the start of the value.

use crate::stream::{FileInputStream, InputStream};
use byteordered::Endianness;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// A factory of input streams positioned at the start of a value.
pub trait LoadValue: fmt::Debug {
    /// Open a fresh stream at the start of the value.
    fn create(&self) -> io::Result<Box<dyn InputStream>>;

    /// Clone this factory into a new box.
    fn clone_box(&self) -> Box<dyn LoadValue>;
}

impl Clone for Box<dyn LoadValue> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A value stored in a file at a known byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileValueSource {
    path: PathBuf,
    offset: u64,
}

impl FileValueSource {
    /// Describe a value found in the file at `path`, starting at `offset`.
    pub fn new(path: impl Into<PathBuf>, offset: u64) -> Self {
        FileValueSource {
            path: path.into(),
            offset,
        }
    }

    /// The path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The byte offset of the value in the file.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl LoadValue for FileValueSource {
    fn create(&self) -> io::Result<Box<dyn InputStream>> {
        Ok(Box::new(FileInputStream::open_at(&self.path, self.offset)?))
    }

    fn clone_box(&self) -> Box<dyn LoadValue> {
        Box::new(self.clone())
    }
}

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// The deferred value of an element:
/// a stream factory and the byte order of the data it yields.
///
/// Each deferred value receives a process-unique identifier,
/// which caches use to recognize a stream opened for it.
/// Clones share the identifier, as they read the same bytes.
#[derive(Debug, Clone)]
pub struct DeferredValue {
    loader: Box<dyn LoadValue>,
    byte_order: Endianness,
    id: u64,
}

impl DeferredValue {
    /// Wrap a stream factory yielding data in the given byte order.
    pub fn new(loader: Box<dyn LoadValue>, byte_order: Endianness) -> Self {
        DeferredValue {
            loader,
            byte_order,
            id: NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The stream factory.
    pub fn loader(&self) -> &dyn LoadValue {
        &*self.loader
    }

    /// The byte order of the value in its backing store.
    pub fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    /// The identifier of this deferred value.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Open a fresh stream at the start of the value.
    pub fn create(&self) -> io::Result<Box<dyn InputStream>> {
        self.loader.create()
    }
}

#[cfg(test)]
mod tests {
    use super::{DeferredValue, FileValueSource};
    use byteordered::Endianness;

    #[test]
    fn deferred_values_have_distinct_ids() {
        let a = DeferredValue::new(
            Box::new(FileValueSource::new("a.dcm", 0)),
            Endianness::Little,
        );
        let b = DeferredValue::new(
            Box::new(FileValueSource::new("a.dcm", 0)),
            Endianness::Little,
        );
        assert_ne!(a.id(), b.id());
        let c = a.clone();
        assert_eq!(a.id(), c.id());
        assert_eq!(c.byte_order(), Endianness::Little);
    }

    #[test]
    fn missing_file_fails_to_open() {
        let source = FileValueSource::new("/nonexistent/dicom/file.dcm", 128);
        assert_eq!(source.offset(), 128);
        assert!(super::LoadValue::create(&source).is_err());
    }
}
