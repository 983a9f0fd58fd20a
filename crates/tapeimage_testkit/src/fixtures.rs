//! Tape image fixtures.
//!
//! Builds well-formed tape images in memory and damages them on request, so
//! tests can describe a tape by its records instead of by raw offsets.

use std::path::{Path, PathBuf};
use tapeimage_core::{Header, HeaderType, TapeImage, TapeResult, HEADER_SIZE};
use tapeimage_io::{ByteStream, InMemoryStream, ReadOutcome, ReadStatus};
use tempfile::TempDir;

/// Writes a tape image record by record.
///
/// Every descriptor points back at the one before it and forward at the one
/// after it. [`TapeWriter::finish`] closes the tape with the FILE/FILE
/// sentinel.
#[derive(Debug, Clone, Default)]
pub struct TapeWriter {
    bytes: Vec<u8>,
    base: usize,
    headers: Vec<usize>,
    payload: Vec<u8>,
    prev: u32,
}

impl TapeWriter {
    /// Creates a writer for a tape starting at offset zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer for a tape that starts after `prefix`.
    ///
    /// The prefix stands for whatever precedes the tape in its file.
    #[must_use]
    pub fn with_prefix(prefix: &[u8]) -> Self {
        Self {
            bytes: prefix.to_vec(),
            base: prefix.len(),
            ..Self::default()
        }
    }

    /// Appends a data record.
    #[must_use]
    pub fn record(mut self, payload: &[u8]) -> Self {
        self.push(HeaderType::Record, payload);
        self.payload.extend_from_slice(payload);
        self
    }

    /// Appends one data record per payload.
    #[must_use]
    pub fn records<P: AsRef<[u8]>>(self, payloads: &[P]) -> Self {
        payloads.iter().fold(self, |w, p| w.record(p.as_ref()))
    }

    /// Appends a single, empty file mark.
    #[must_use]
    pub fn file_mark(mut self) -> Self {
        self.push(HeaderType::File, &[]);
        self
    }

    /// Closes the tape with the FILE/FILE sentinel.
    #[must_use]
    pub fn finish(self) -> Fixture {
        self.file_mark().file_mark().finish_without_sentinel()
    }

    /// Returns the tape as written so far, without a sentinel.
    #[must_use]
    pub fn finish_without_sentinel(self) -> Fixture {
        Fixture {
            bytes: self.bytes,
            base: self.base,
            headers: self.headers,
            payload: self.payload,
        }
    }

    fn push(&mut self, kind: HeaderType, payload: &[u8]) {
        let pos = self.bytes.len();
        let next = pos + HEADER_SIZE + payload.len();
        let header = Header::new(kind, self.prev, next as u32);

        self.bytes.extend_from_slice(&header.encode());
        self.bytes.extend_from_slice(payload);
        self.headers.push(pos);
        self.prev = pos as u32;
    }
}

/// A tape image together with what a reader should get out of it.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// The raw bytes, prefix included.
    pub bytes: Vec<u8>,
    /// Physical offset of the first descriptor.
    pub base: usize,
    /// Physical offset of every descriptor, in order.
    pub headers: Vec<usize>,
    /// The logical stream: all data payloads concatenated.
    pub payload: Vec<u8>,
}

impl Fixture {
    /// An in-memory stream over the bytes, positioned at the first descriptor.
    pub fn stream(&self) -> InMemoryStream {
        let mut stream = InMemoryStream::new(self.bytes.clone());
        stream
            .seek(self.base as u64)
            .expect("seek within fixture");
        stream
    }

    /// Opens a tape image over [`Fixture::stream`].
    pub fn open(&self) -> TapeImage<InMemoryStream> {
        TapeImage::open(self.stream()).expect("Failed to open fixture")
    }

    /// Overwrites the type tag of descriptor `ordinal`.
    pub fn set_type(&mut self, ordinal: usize, kind: u32) -> &mut Self {
        self.write_field(ordinal, 0, kind)
    }

    /// Overwrites the back pointer of descriptor `ordinal`.
    pub fn set_prev(&mut self, ordinal: usize, prev: u32) -> &mut Self {
        self.write_field(ordinal, 4, prev)
    }

    /// Overwrites the forward pointer of descriptor `ordinal`.
    pub fn set_next(&mut self, ordinal: usize, next: u32) -> &mut Self {
        self.write_field(ordinal, 8, next)
    }

    /// Cuts the raw bytes down to `len`.
    pub fn truncate(&mut self, len: usize) -> &mut Self {
        self.bytes.truncate(len);
        self
    }

    /// Reads back descriptor `ordinal` from the raw bytes.
    pub fn header(&self, ordinal: usize) -> Header {
        let at = self.headers[ordinal];
        let mut bytes = [0u8; HEADER_SIZE];
        bytes.copy_from_slice(&self.bytes[at..at + HEADER_SIZE]);
        Header::decode(&bytes)
    }

    /// Writes the raw bytes to a file in a fresh temporary directory.
    ///
    /// The directory is removed when the returned [`TempDir`] is dropped.
    pub fn write_temp(&self) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("fixture.tif");
        self.write_to(&path);
        (dir, path)
    }

    /// Writes the raw bytes to `path`.
    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, &self.bytes).expect("Failed to write fixture");
    }

    fn write_field(&mut self, ordinal: usize, offset: usize, value: u32) -> &mut Self {
        let at = self.headers[ordinal] + offset;
        self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
        self
    }
}

/// Everything a sequence of reads returned.
#[derive(Debug, Clone, Default)]
pub struct ReadLog {
    /// The bytes read, concatenated.
    pub data: Vec<u8>,
    /// Every outcome, in order.
    pub outcomes: Vec<ReadOutcome>,
}

impl ReadLog {
    /// Number of reads that came back tainted.
    #[must_use]
    pub fn tainted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.tainted).count()
    }
}

/// Reads `tape` in `chunk`-sized pieces until it reports end of stream.
///
/// # Errors
///
/// Returns the first error a read fails with.
///
/// # Panics
///
/// Panics if a read reports the stream as blocked; fixtures never block.
pub fn read_to_end<S: ByteStream>(tape: &mut TapeImage<S>, chunk: usize) -> TapeResult<ReadLog> {
    let mut log = ReadLog::default();
    let mut buf = vec![0u8; chunk];

    loop {
        let outcome = tape.read(&mut buf)?;
        log.data.extend_from_slice(&buf[..outcome.len]);
        log.outcomes.push(outcome);

        match outcome.status {
            ReadStatus::Eof => return Ok(log),
            ReadStatus::Incomplete => panic!("fixture stream blocked"),
            ReadStatus::Ok => {}
        }
    }
}
