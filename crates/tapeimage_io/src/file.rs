//! File-based byte stream.

use crate::error::{StreamError, StreamResult};
use crate::stream::{ByteStream, ReadOutcome, ReadStatus};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A file-based byte stream.
///
/// This stream reads through OS file APIs. The position is tracked on the
/// side so `tell` does not need to touch the file.
///
/// # Example
///
/// ```no_run
/// use tapeimage_io::{ByteStream, FileStream};
/// use std::path::Path;
///
/// let mut stream = FileStream::open(Path::new("data.tif")).unwrap();
/// let mut buf = [0u8; 12];
/// let outcome = stream.read(&mut buf).unwrap();
/// ```
#[derive(Debug)]
pub struct FileStream {
    path: Option<PathBuf>,
    file: Option<File>,
    pos: u64,
}

impl FileStream {
    /// Opens the file at `path` for reading, positioned at the start.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> StreamResult<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            file: Some(file),
            pos: 0,
        })
    }

    /// Wraps an already open file, keeping its current position.
    ///
    /// This is how a stream that starts in the middle of a file is set up:
    /// seek the file first, then wrap it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file position cannot be determined.
    pub fn from_file(mut file: File) -> StreamResult<Self> {
        let pos = file.stream_position()?;
        Ok(Self {
            path: None,
            file: Some(file),
            pos,
        })
    }

    /// Returns the path the stream was opened from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true after [`ByteStream::close`].
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn file_mut(&mut self) -> StreamResult<&mut File> {
        self.file.as_mut().ok_or(StreamError::Closed)
    }
}

impl ByteStream for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<ReadOutcome> {
        let file = self.file_mut()?;

        let mut filled = 0;
        let mut status = ReadStatus::Ok;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => {
                    status = ReadStatus::Eof;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    status = ReadStatus::Incomplete;
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.pos += filled as u64;
        Ok(ReadOutcome::new(filled, status))
    }

    fn seek(&mut self, offset: u64) -> StreamResult<()> {
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        self.pos = offset;
        Ok(())
    }

    fn tell(&self) -> StreamResult<u64> {
        if self.file.is_none() {
            return Err(StreamError::Closed);
        }
        Ok(self.pos)
    }

    fn close(&mut self) -> StreamResult<()> {
        self.file.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(path: &Path, data: &[u8]) {
        let mut file = File::create(path).unwrap();
        file.write_all(data).unwrap();
        file.sync_all().unwrap();
    }

    #[test]
    fn file_read_and_tell() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");
        write_file(&path, b"hello world");

        let mut stream = FileStream::open(&path).unwrap();
        let mut buf = [0u8; 5];

        assert_eq!(stream.read(&mut buf).unwrap(), ReadOutcome::ok(5));
        assert_eq!(&buf, b"hello");
        assert_eq!(stream.tell().unwrap(), 5);
    }

    #[test]
    fn file_read_short_is_eof() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");
        write_file(&path, b"hello");

        let mut stream = FileStream::open(&path).unwrap();
        let mut buf = [0u8; 8];

        assert_eq!(stream.read(&mut buf).unwrap(), ReadOutcome::eof(5));
        assert_eq!(stream.read(&mut buf).unwrap(), ReadOutcome::eof(0));
    }

    #[test]
    fn file_seek_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");
        write_file(&path, b"hello world");

        let mut stream = FileStream::open(&path).unwrap();
        stream.seek(6).unwrap();

        let mut buf = [0u8; 5];
        stream.read(&mut buf).unwrap();
        assert_eq!(&buf, b"world");
        assert_eq!(stream.tell().unwrap(), 11);
    }

    #[test]
    fn file_from_file_keeps_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");
        write_file(&path, b"hello world");

        let mut file = File::open(&path).unwrap();
        file.seek(SeekFrom::Start(6)).unwrap();

        let stream = FileStream::from_file(file).unwrap();
        assert_eq!(stream.tell().unwrap(), 6);
        assert!(stream.path().is_none());
    }

    #[test]
    fn file_closed_stream_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");
        write_file(&path, b"hello");

        let mut stream = FileStream::open(&path).unwrap();
        stream.close().unwrap();
        assert!(stream.is_closed());

        let mut buf = [0u8; 1];
        assert!(matches!(stream.read(&mut buf), Err(StreamError::Closed)));
        assert!(matches!(stream.tell(), Err(StreamError::Closed)));
        assert!(stream.close().is_ok());
    }

    #[test]
    fn file_open_missing_fails() {
        let dir = tempdir().unwrap();
        let result = FileStream::open(&dir.path().join("missing.bin"));
        assert!(matches!(result, Err(StreamError::Io(_))));
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");
        write_file(&path, b"x");

        let stream = FileStream::open(&path).unwrap();
        assert_eq!(stream.path(), Some(path.as_path()));
    }
}
