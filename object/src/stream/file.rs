//! File backed input stream.

use super::InputStream;
use crate::source::{FileValueSource, LoadValue};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A seekable input stream over a file.
///
/// Values read from this stream can be deferred,
/// since [`new_factory`](InputStream::new_factory)
/// yields a [`FileValueSource`] positioned at the current offset.
#[derive(Debug)]
pub struct FileInputStream {
    path: PathBuf,
    file: BufReader<File>,
    position: u64,
    size: u64,
    mark: u64,
    error: Option<io::Error>,
}

impl FileInputStream {
    /// Open the file at the given path, starting from its beginning.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::open_at(path, 0)
    }

    /// Open the file at the given path,
    /// starting from the given byte offset.
    pub fn open_at<P: AsRef<Path>>(path: P, offset: u64) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let size = file.metadata()?.len();
        let position = file.seek(SeekFrom::Start(offset))?;
        Ok(FileInputStream {
            path,
            file: BufReader::new(file),
            position,
            size,
            mark: position,
            error: None,
        })
    }

    /// The path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fail(&mut self, e: io::Error) -> io::Error {
        let copy = io::Error::new(e.kind(), e.to_string());
        self.error = Some(e);
        copy
    }
}

impl InputStream for FileInputStream {
    fn status(&self) -> io::Result<()> {
        match &self.error {
            None => Ok(()),
            Some(e) => Err(io::Error::new(e.kind(), e.to_string())),
        }
    }

    fn eos(&self) -> bool {
        self.position >= self.size
    }

    fn avail(&self) -> u64 {
        self.size.saturating_sub(self.position)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            match self.file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.fail(e)),
            }
        }
        self.position += total as u64;
        Ok(total)
    }

    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let n = n.min(self.avail());
        if n == 0 {
            return Ok(0);
        }
        let target = self.position + n;
        if let Err(e) = self.file.seek(SeekFrom::Start(target)) {
            return Err(self.fail(e));
        }
        self.position = target;
        Ok(n)
    }

    fn tell(&self) -> u64 {
        self.position
    }

    fn mark(&mut self) {
        self.mark = self.position;
    }

    fn putback(&mut self) -> io::Result<()> {
        if let Err(e) = self.file.seek(SeekFrom::Start(self.mark)) {
            return Err(self.fail(e));
        }
        self.position = self.mark;
        Ok(())
    }

    fn new_factory(&self) -> Option<Box<dyn LoadValue>> {
        Some(Box::new(FileValueSource::new(
            self.path.clone(),
            self.position,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::FileInputStream;
    use crate::stream::InputStream;
    use std::io::Write;

    #[test]
    fn read_skip_and_putback() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        file.flush().unwrap();

        let mut stream = FileInputStream::open(file.path()).unwrap();
        assert_eq!(stream.avail(), 10);
        assert_eq!(stream.skip(2).unwrap(), 2);
        stream.mark();
        let mut buf = [0; 3];
        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(buf, [2, 3, 4]);
        assert_eq!(stream.tell(), 5);
        stream.putback().unwrap();
        assert_eq!(stream.tell(), 2);
        assert_eq!(stream.skip(100).unwrap(), 8);
        assert!(stream.eos());
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn factory_reopens_at_current_position() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"headervalue").unwrap();
        file.flush().unwrap();

        let mut stream = FileInputStream::open(file.path()).unwrap();
        stream.skip(6).unwrap();
        let factory = stream.new_factory().unwrap();
        let mut reopened = factory.create().unwrap();
        let mut buf = [0; 5];
        assert_eq!(reopened.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"value");
    }
}
