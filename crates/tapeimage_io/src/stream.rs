//! Byte stream trait definition.

use crate::error::StreamResult;

/// Why a read returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The buffer was filled completely.
    Ok,
    /// The source could not supply more bytes right now. Retry later.
    Incomplete,
    /// The source ended before the buffer was filled.
    Eof,
}

/// The result of a successful [`ByteStream::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Number of bytes written to the front of the buffer.
    pub len: usize,
    /// Why the read returned.
    pub status: ReadStatus,
    /// Set when the stream patched a framing anomaly earlier in this session.
    ///
    /// The bytes are delivered, but the caller may want to warn that the
    /// source is damaged. Once set, it stays set.
    pub tainted: bool,
}

impl ReadOutcome {
    /// A read that filled the whole buffer.
    #[must_use]
    pub const fn ok(len: usize) -> Self {
        Self::new(len, ReadStatus::Ok)
    }

    /// A read cut short because the source is blocked.
    #[must_use]
    pub const fn incomplete(len: usize) -> Self {
        Self::new(len, ReadStatus::Incomplete)
    }

    /// A read cut short by the end of the source.
    #[must_use]
    pub const fn eof(len: usize) -> Self {
        Self::new(len, ReadStatus::Eof)
    }

    /// Creates an untainted outcome.
    #[must_use]
    pub const fn new(len: usize, status: ReadStatus) -> Self {
        Self {
            len,
            status,
            tainted: false,
        }
    }

    /// Returns the same outcome with the tainted marker set to `tainted`.
    #[must_use]
    pub const fn with_tainted(mut self, tainted: bool) -> Self {
        self.tainted = tainted;
        self
    }
}

/// A positioned, readable byte source.
///
/// Streams are **opaque byte sources**. Offsets are absolute positions in
/// the stream's own address space.
///
/// # Invariants
///
/// - `read` never blocks indefinitely; a source that cannot supply the
///   requested bytes right now returns [`ReadStatus::Incomplete`]
/// - `ReadStatus::Ok` implies the whole buffer was filled
/// - after a successful `seek(n)`, `tell()` reports `n`
///
/// # Implementors
///
/// - [`super::InMemoryStream`] - For testing
/// - [`super::FileStream`] - For OS files
pub trait ByteStream: Send {
    /// Reads up to `buf.len()` bytes into the front of `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or an I/O error occurs.
    /// Short reads are not errors; they are reported through the status.
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<ReadOutcome>;

    /// Moves to the absolute `offset`.
    ///
    /// Seeking past the end is allowed; a following read reports end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be repositioned.
    fn seek(&mut self, offset: u64) -> StreamResult<()>;

    /// Returns the current absolute offset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StreamError::NotSeekable`] if the source has no notion
    /// of position.
    fn tell(&self) -> StreamResult<u64>;

    /// Releases the resources held by the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the stream fails.
    fn close(&mut self) -> StreamResult<()>;
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<ReadOutcome> {
        (**self).read(buf)
    }

    fn seek(&mut self, offset: u64) -> StreamResult<()> {
        (**self).seek(offset)
    }

    fn tell(&self) -> StreamResult<u64> {
        (**self).tell()
    }

    fn close(&mut self) -> StreamResult<()> {
        (**self).close()
    }
}
