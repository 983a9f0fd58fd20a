//! In-memory byte stream for testing.

use crate::error::{StreamError, StreamResult};
use crate::stream::{ByteStream, ReadOutcome, ReadStatus};

/// An in-memory byte stream.
///
/// This stream serves bytes from a buffer and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Simulating sources that are blocked or cannot seek
///
/// # Blocked sources
///
/// A stream built with [`InMemoryStream::with_available`] only hands out the
/// first `n` bytes. Reads beyond them return [`ReadStatus::Incomplete`] until
/// more bytes are released with [`InMemoryStream::feed`], like a pipe whose
/// writer has not caught up yet.
///
/// # Instrumentation
///
/// Every call to `read` and `seek` is counted, so tests can assert how much
/// work a stacked adapter pushed down to its source.
///
/// # Example
///
/// ```rust
/// use tapeimage_io::{ByteStream, InMemoryStream, ReadStatus};
///
/// let mut stream = InMemoryStream::new(b"test data".to_vec()).with_available(4);
/// let mut buf = [0u8; 9];
/// let outcome = stream.read(&mut buf).unwrap();
/// assert_eq!(outcome.len, 4);
/// assert_eq!(outcome.status, ReadStatus::Incomplete);
///
/// stream.feed(5);
/// let outcome = stream.read(&mut buf[4..]).unwrap();
/// assert_eq!(outcome.status, ReadStatus::Ok);
/// assert_eq!(&buf, b"test data");
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStream {
    data: Vec<u8>,
    pos: u64,
    available: usize,
    seekable: bool,
    closed: bool,
    seeks: usize,
    reads: usize,
}

impl InMemoryStream {
    /// Creates a seekable stream over `data`, positioned at the start.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        let available = data.len();
        Self {
            data,
            pos: 0,
            available,
            seekable: true,
            closed: false,
            seeks: 0,
            reads: 0,
        }
    }

    /// Makes the stream unable to report its position.
    ///
    /// `tell` fails with [`StreamError::NotSeekable`] and `seek` only succeeds
    /// when it would not move the stream.
    #[must_use]
    pub fn unseekable(mut self) -> Self {
        self.seekable = false;
        self
    }

    /// Limits the readable bytes to the first `n`.
    #[must_use]
    pub fn with_available(mut self, n: usize) -> Self {
        self.available = n.min(self.data.len());
        self
    }

    /// Makes `n` more bytes readable.
    pub fn feed(&mut self, n: usize) {
        self.available = self.available.saturating_add(n).min(self.data.len());
    }

    /// Number of `seek` calls so far, including failed ones.
    #[must_use]
    pub fn seek_count(&self) -> usize {
        self.seeks
    }

    /// Number of `read` calls so far.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads
    }

    /// The current offset, even when the stream pretends it has none.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Returns true after [`ByteStream::close`].
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn ensure_open(&self) -> StreamResult<()> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        Ok(())
    }
}

impl ByteStream for InMemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<ReadOutcome> {
        self.ensure_open()?;
        self.reads += 1;

        if buf.is_empty() {
            return Ok(ReadOutcome::ok(0));
        }

        let blocked = self.available < self.data.len();
        let start = usize::try_from(self.pos).unwrap_or(usize::MAX);
        if start >= self.available {
            let status = if blocked && start < self.data.len() {
                ReadStatus::Incomplete
            } else {
                ReadStatus::Eof
            };
            return Ok(ReadOutcome::new(0, status));
        }

        let n = buf.len().min(self.available - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;

        let status = if n == buf.len() {
            ReadStatus::Ok
        } else if blocked {
            ReadStatus::Incomplete
        } else {
            ReadStatus::Eof
        };
        Ok(ReadOutcome::new(n, status))
    }

    fn seek(&mut self, offset: u64) -> StreamResult<()> {
        self.ensure_open()?;
        self.seeks += 1;

        if !self.seekable && offset != self.pos {
            return Err(StreamError::NotSeekable);
        }
        self.pos = offset;
        Ok(())
    }

    fn tell(&self) -> StreamResult<u64> {
        self.ensure_open()?;
        if !self.seekable {
            return Err(StreamError::NotSeekable);
        }
        Ok(self.pos)
    }

    fn close(&mut self) -> StreamResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn memory_read_fills_buffer() {
        let mut stream = InMemoryStream::new(b"hello world".to_vec());
        let mut buf = [0u8; 5];

        let outcome = stream.read(&mut buf).unwrap();
        assert_eq!(outcome, ReadOutcome::ok(5));
        assert_eq!(&buf, b"hello");
        assert_eq!(stream.tell().unwrap(), 5);
    }

    #[test]
    fn memory_read_short_at_end_is_eof() {
        let mut stream = InMemoryStream::new(b"hello".to_vec());
        let mut buf = [0u8; 8];

        let outcome = stream.read(&mut buf).unwrap();
        assert_eq!(outcome, ReadOutcome::eof(5));
        assert_eq!(&buf[..5], b"hello");

        let outcome = stream.read(&mut buf).unwrap();
        assert_eq!(outcome, ReadOutcome::eof(0));
    }

    #[test]
    fn memory_read_past_end_after_seek() {
        let mut stream = InMemoryStream::new(b"hello".to_vec());
        stream.seek(100).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), ReadOutcome::eof(0));
        assert_eq!(stream.tell().unwrap(), 100);
    }

    #[test]
    fn memory_empty_read() {
        let mut stream = InMemoryStream::new(b"hello".to_vec());
        assert_eq!(stream.read(&mut []).unwrap(), ReadOutcome::ok(0));
    }

    #[test]
    fn memory_blocked_read_is_incomplete() {
        let mut stream = InMemoryStream::new(b"hello world".to_vec()).with_available(3);
        let mut buf = [0u8; 5];

        assert_eq!(stream.read(&mut buf).unwrap(), ReadOutcome::incomplete(3));
        assert_eq!(stream.read(&mut buf).unwrap(), ReadOutcome::incomplete(0));

        stream.feed(100);
        assert_eq!(stream.read(&mut buf).unwrap(), ReadOutcome::ok(5));
        assert_eq!(&buf, b"lo wo");
    }

    #[test]
    fn memory_unseekable_rejects_moves() {
        let mut stream = InMemoryStream::new(b"hello".to_vec()).unseekable();

        assert!(matches!(stream.tell(), Err(StreamError::NotSeekable)));
        assert!(stream.seek(0).is_ok());
        assert!(matches!(stream.seek(3), Err(StreamError::NotSeekable)));
        assert_eq!(stream.seek_count(), 2);
    }

    #[test]
    fn memory_counts_calls() {
        let mut stream = InMemoryStream::new(b"hello".to_vec());
        let mut buf = [0u8; 1];
        stream.read(&mut buf).unwrap();
        stream.read(&mut buf).unwrap();
        stream.seek(0).unwrap();

        assert_eq!(stream.read_count(), 2);
        assert_eq!(stream.seek_count(), 1);
    }

    #[test]
    fn memory_closed_stream_fails() {
        let mut stream = InMemoryStream::new(b"hello".to_vec());
        stream.close().unwrap();
        assert!(stream.is_closed());

        let mut buf = [0u8; 1];
        assert!(matches!(stream.read(&mut buf), Err(StreamError::Closed)));
        assert!(matches!(stream.seek(0), Err(StreamError::Closed)));
        assert!(matches!(stream.tell(), Err(StreamError::Closed)));
        assert!(stream.close().is_ok());
    }

    #[test]
    fn memory_boxed_stream() {
        let mut stream: Box<dyn ByteStream> = Box::new(InMemoryStream::new(b"abc".to_vec()));
        stream.seek(1).unwrap();

        let mut buf = [0u8; 2];
        assert_eq!(stream.read(&mut buf).unwrap(), ReadOutcome::ok(2));
        assert_eq!(&buf, b"bc");
    }

    proptest! {
        #[test]
        fn memory_chunked_reads_reassemble(
            data in prop::collection::vec(any::<u8>(), 0..512),
            chunk in 1usize..64,
        ) {
            let mut stream = InMemoryStream::new(data.clone());
            let mut out = Vec::new();
            let mut buf = vec![0u8; chunk];

            loop {
                let outcome = stream.read(&mut buf).unwrap();
                out.extend_from_slice(&buf[..outcome.len]);
                if outcome.status == ReadStatus::Eof {
                    break;
                }
            }

            prop_assert_eq!(out, data);
        }
    }
}
