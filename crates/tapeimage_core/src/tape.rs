//! The tape image reader.

use crate::address::AddressMap;
use crate::config::Config;
use crate::cursor::Cursor;
use crate::error::{OpenError, TapeError, TapeResult};
use crate::handle::Handle;
use crate::header::{Header, HEADER_SIZE, MAX_OFFSET};
use crate::index::{Lookup, RecordIndex};
use crate::recovery::{validate_header, RecoveryState};
use std::io;
use tapeimage_io::{ByteStream, ReadOutcome, ReadStatus, StreamError, StreamResult};
use tracing::{debug, trace};

/// A logical byte stream over a tape image, with the record descriptors
/// removed.
///
/// Descriptors are read lazily: opening reads only the first one, and the
/// rest are indexed as reads and seeks move forward. Seeking backwards, or
/// anywhere inside the indexed range, is served from the index without
/// touching descriptor bytes again.
///
/// # Errors and recovery
///
/// A single damaged descriptor (unknown type tag or inconsistent back
/// pointer) is patched in memory and reading continues; every following
/// [`ReadOutcome`] carries `tainted == true`. A second anomaly, or any
/// violation that cannot be patched, fails the operation and poisons the
/// reader: all further `read`, `seek` and `tell` calls return
/// [`TapeError::Poisoned`].
///
/// # Example
///
/// ```rust
/// use tapeimage_core::TapeImage;
/// use tapeimage_io::InMemoryStream;
///
/// // Only the FILE/FILE sentinel: an empty tape.
/// let bytes = [
///     1, 0, 0, 0, 0, 0, 0, 0, 12, 0, 0, 0,
///     1, 0, 0, 0, 0, 0, 0, 0, 24, 0, 0, 0,
/// ];
/// let tape = TapeImage::open(InMemoryStream::new(bytes.to_vec())).unwrap();
/// assert!(tape.end_of_stream());
/// ```
#[derive(Debug)]
pub struct TapeImage<S> {
    stream: Handle<S>,
    index: RecordIndex,
    current: Cursor,
    recovery: RecoveryState,
    config: Config,
    last_lookup: Option<Lookup>,
    poisoned: bool,
}

impl<S: ByteStream> TapeImage<S> {
    /// Opens a tape image whose first descriptor is at the current position
    /// of `stream`.
    ///
    /// # Errors
    ///
    /// Returns an error if the first descriptor cannot be read or is invalid.
    /// The stream is handed back inside the [`OpenError`].
    pub fn open(stream: S) -> Result<Self, OpenError<S>> {
        Self::open_with_config(stream, Config::default())
    }

    /// Opens a tape image with the given configuration.
    ///
    /// If the stream cannot report its position, the tape is assumed to start
    /// at offset zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the first descriptor cannot be read or is invalid.
    /// The stream is handed back inside the [`OpenError`].
    pub fn open_with_config(mut stream: S, config: Config) -> Result<Self, OpenError<S>> {
        let zero = match stream.tell() {
            Ok(pos) if pos <= MAX_OFFSET => pos as i64,
            Ok(pos) => {
                let err = TapeError::invalid_argument(format!(
                    "tape image cannot start at offset {pos}, beyond the 4GB format limit"
                ));
                return Err(OpenError::new(err, stream));
            }
            Err(err) => {
                debug!(%err, "tapeimage: stream has no position, assuming zero");
                0
            }
        };

        let mut index = RecordIndex::new(AddressMap::new(zero));
        let mut recovery = RecoveryState::Clean;
        let current =
            match index_next_header(&mut stream, &mut index, &config, &mut recovery) {
                Ok(cursor) => cursor,
                Err(err) => return Err(OpenError::new(err, stream)),
            };

        Ok(Self {
            stream: Handle::Owned(stream),
            index,
            current,
            recovery,
            config,
            last_lookup: None,
            poisoned: false,
        })
    }

    /// Reads up to `buf.len()` logical bytes into the front of `buf`.
    ///
    /// Record boundaries are crossed transparently. The returned status is
    /// [`ReadStatus::Ok`] when the buffer was filled, [`ReadStatus::Eof`] at
    /// the end of the tape, and [`ReadStatus::Incomplete`] when the underlying
    /// stream is blocked; in that case call `read` again later.
    ///
    /// # Errors
    ///
    /// Returns an error if the framing is broken beyond repair or the
    /// underlying stream fails.
    pub fn read(&mut self, buf: &mut [u8]) -> TapeResult<ReadOutcome> {
        self.ensure_usable()?;
        let result = self.read_records(buf);
        let outcome = self.poison_on_fatal(result)?;
        Ok(outcome.with_tainted(self.recovery.is_recovering()))
    }

    /// Moves to logical offset `n`.
    ///
    /// Seeking past the end of the tape is allowed; the next read reports end
    /// of stream.
    ///
    /// # Errors
    ///
    /// Returns [`TapeError::InvalidArgument`] if `n` cannot be represented in
    /// the format, or an error if descriptors read on the way are broken.
    /// A source that refuses to move fails with
    /// [`StreamError::NotSeekable`]; the tape image stays usable, though a
    /// forward seek may have indexed, and moved past, the descriptors it
    /// could reach.
    pub fn seek(&mut self, n: u64) -> TapeResult<()> {
        self.ensure_usable()?;

        let addr = *self.index.addr();
        if n > MAX_OFFSET || addr.physical(n as i64, 0) > MAX_OFFSET as i64 {
            return Err(TapeError::invalid_argument(format!(
                "too big seek offset {n}. \
                 The tape image format does not support files larger than 4GB"
            )));
        }

        let result = self.seek_logical(n as i64);
        self.poison_on_fatal(result)
    }

    /// Returns the current logical offset.
    ///
    /// After a seek past the end of the tape this is the logical end of the
    /// tape, not the offset that was asked for.
    ///
    /// # Errors
    ///
    /// Returns [`TapeError::Internal`] if `verify_position` is enabled and the
    /// underlying stream disagrees with the reader's bookkeeping.
    pub fn tell(&self) -> TapeResult<u64> {
        self.ensure_usable()?;
        let physical = self.current.physical_position(&self.index)?;

        if self.config.verify_position {
            match self.stream.get()?.tell() {
                Ok(actual) if i64::try_from(actual) == Ok(physical) => {}
                Ok(actual) => {
                    return Err(TapeError::internal(format!(
                        "cursor is at physical offset {physical}, \
                         but the underlying stream reports {actual}"
                    )))
                }
                Err(StreamError::NotSeekable) => {}
                Err(err) => return Err(err.into()),
            }
        }

        let logical = self.index.addr().logical(physical, self.current.position());
        u64::try_from(logical)
            .map_err(|_| TapeError::internal(format!("negative logical offset {logical}")))
    }

    /// True when the current record is a file mark, i.e. the tape has ended.
    #[must_use]
    pub fn end_of_stream(&self) -> bool {
        self.index
            .header(self.current.position())
            .is_ok_and(Header::is_file)
    }

    /// Whether an anomaly has been patched in this session.
    #[must_use]
    pub fn recovery(&self) -> RecoveryState {
        self.recovery
    }

    /// The descriptors indexed so far.
    #[must_use]
    pub fn headers(&self) -> &[Header] {
        self.index.headers()
    }

    /// The index of descriptors read so far.
    #[must_use]
    pub fn index(&self) -> &RecordIndex {
        &self.index
    }

    /// Which path answered the last seek served from the index, if any.
    #[must_use]
    pub fn last_lookup(&self) -> Option<Lookup> {
        self.last_lookup
    }

    /// The current read position.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.current
    }

    /// The configuration the tape was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Hands the underlying stream back to the caller.
    ///
    /// The tape image cannot be used afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`TapeError::Released`] if the stream was already peeled.
    pub fn peel(&mut self) -> TapeResult<S> {
        self.stream.take()
    }

    /// Borrows the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns [`TapeError::Released`] if the stream was peeled.
    pub fn peek(&self) -> TapeResult<&S> {
        self.stream.get()
    }

    /// Mutably borrows the underlying stream.
    ///
    /// Moving the stream's position desynchronizes the reader; use this to
    /// feed a blocked source, not to read from it.
    ///
    /// # Errors
    ///
    /// Returns [`TapeError::Released`] if the stream was peeled.
    pub fn peek_mut(&mut self) -> TapeResult<&mut S> {
        self.stream.get_mut()
    }

    /// Closes the underlying stream, if it is still owned.
    ///
    /// # Errors
    ///
    /// Returns an error if closing the underlying stream fails.
    pub fn close(&mut self) -> TapeResult<()> {
        if !self.stream.is_owned() {
            return Ok(());
        }
        self.stream.get_mut()?.close()?;
        Ok(())
    }

    fn ensure_usable(&self) -> TapeResult<()> {
        if self.poisoned {
            return Err(TapeError::Poisoned);
        }
        Ok(())
    }

    fn poison_on_fatal<T>(&mut self, result: TapeResult<T>) -> TapeResult<T> {
        if let Err(err) = &result {
            if err.is_fatal() {
                self.poisoned = true;
            }
        }
        result
    }

    fn read_records(&mut self, buf: &mut [u8]) -> TapeResult<ReadOutcome> {
        let mut bytes_read = 0;

        loop {
            if self.end_of_stream() {
                return Ok(ReadOutcome::eof(bytes_read));
            }

            if bytes_read == buf.len() {
                return Ok(ReadOutcome::ok(bytes_read));
            }

            if self.current.exhausted() {
                // Might be the end of the tape, or an empty record, so start over.
                self.read_header()?;
                continue;
            }

            let remaining = usize::try_from(self.current.remaining()).unwrap_or(usize::MAX);
            let to_read = (buf.len() - bytes_read).min(remaining);
            let outcome = self
                .stream
                .get_mut()?
                .read(&mut buf[bytes_read..bytes_read + to_read])?;

            self.current.advance(outcome.len as i64)?;
            bytes_read += outcome.len;

            match outcome.status {
                ReadStatus::Incomplete => return Ok(ReadOutcome::incomplete(bytes_read)),
                ReadStatus::Eof if !self.current.exhausted() => {
                    return Err(TapeError::unexpected_eof(format!(
                        "tapeimage: stream ended inside a record - got {bytes_read} bytes, \
                         {} missing",
                        self.current.remaining()
                    )));
                }
                ReadStatus::Eof => return Ok(ReadOutcome::eof(bytes_read)),
                // Either the buffer is full, or the record boundary was hit
                // and the next pass crosses it.
                ReadStatus::Ok => {}
            }
        }
    }

    /// Moves the cursor into the record after the current one.
    fn read_header(&mut self) -> TapeResult<()> {
        if self.current.position() + 1 >= self.index.len() {
            return self.read_header_from_disk();
        }

        // Already indexed, so only the underlying stream has to move.
        let next = self.current.next_record(&self.index)?;
        let offset = to_offset(next.physical_position(&self.index)?)?;
        self.stream.get_mut()?.seek(offset)?;
        trace!(ordinal = next.position(), offset, "tapeimage: crossed into indexed record");
        self.current = next;
        Ok(())
    }

    fn read_header_from_disk(&mut self) -> TapeResult<()> {
        let stream = self.stream.get_mut()?;
        self.current =
            index_next_header(stream, &mut self.index, &self.config, &mut self.recovery)?;
        Ok(())
    }

    fn seek_logical(&mut self, n: i64) -> TapeResult<()> {
        self.last_lookup = None;
        let last = self
            .index
            .len()
            .checked_sub(1)
            .ok_or_else(|| TapeError::internal("seek on an empty index"))?;

        if self.index.logical_end(last).is_some_and(|end| n <= end) {
            return self.seek_with_index(n);
        }

        // The target is beyond what has been indexed, so chase the
        // descriptors and index them on the way.
        let addr = *self.index.addr();
        loop {
            let pos = self.index.len() - 1;
            let last = *self.index.header(pos)?;
            let next = i64::from(last.next);
            let real_offset = addr.physical(n, pos);

            if real_offset <= next {
                self.stream.get_mut()?.seek(to_offset(real_offset)?)?;
                self.current = Cursor::new(pos, next - real_offset);
                return Ok(());
            }

            if last.is_file() {
                // Seeking past the end is allowed, as with files. Park at the
                // end of the tape so the next read reports end of stream.
                trace!(n, "tapeimage: seek past end of tape");
                self.stream.get_mut()?.seek(u64::from(last.next))?;
                self.current = Cursor::new(pos, 0);
                return Ok(());
            }

            self.stream.get_mut()?.seek(u64::from(last.next))?;
            self.read_header_from_disk()?;
        }
    }

    fn seek_with_index(&mut self, n: i64) -> TapeResult<()> {
        let (pos, lookup) = self.index.find(n, &self.current)?;
        let header = *self.index.header(pos)?;
        let real_offset = self.index.addr().physical(n, pos);

        self.stream.get_mut()?.seek(to_offset(real_offset)?)?;
        trace!(n, ordinal = pos, ?lookup, "tapeimage: seek within index");
        self.current = Cursor::new(pos, i64::from(header.next) - real_offset);
        self.last_lookup = Some(lookup);
        Ok(())
    }
}

/// Reads the descriptor at the stream's position, validates it against the
/// chain and appends it to the index.
fn index_next_header<S: ByteStream>(
    stream: &mut S,
    index: &mut RecordIndex,
    config: &Config,
    recovery: &mut RecoveryState,
) -> TapeResult<Cursor> {
    let raw = read_raw_header(stream)?;
    let head = validate_header(raw, index, config, recovery)?;
    let cursor = index.append(head)?;
    debug!(
        ordinal = cursor.position(),
        kind = head.kind,
        prev = head.prev,
        next = head.next,
        "tapeimage: indexed header"
    );
    Ok(cursor)
}

fn read_raw_header<S: ByteStream>(stream: &mut S) -> TapeResult<Header> {
    let mut bytes = [0u8; HEADER_SIZE];
    let outcome = stream.read(&mut bytes)?;

    match outcome.status {
        ReadStatus::Ok => Ok(Header::decode(&bytes)),
        // A paused stream could in principle be resumed later, but a
        // half-read descriptor is not kept around.
        ReadStatus::Incomplete => Err(TapeError::failed_recovery(format!(
            "tapeimage: incomplete read of tapeimage header (got {} bytes), \
             recovery not implemented",
            outcome.len
        ))),
        ReadStatus::Eof => Err(TapeError::unexpected_eof(format!(
            "tapeimage: unexpected EOF when reading header - got {} bytes",
            outcome.len
        ))),
    }
}

fn to_offset(physical: i64) -> TapeResult<u64> {
    u64::try_from(physical)
        .map_err(|_| TapeError::internal(format!("negative physical offset {physical}")))
}

impl From<TapeError> for StreamError {
    fn from(err: TapeError) -> Self {
        match err {
            TapeError::Stream(inner) => inner,
            other => StreamError::protocol(other),
        }
    }
}

impl From<TapeError> for io::Error {
    fn from(err: TapeError) -> Self {
        let kind = match &err {
            TapeError::Stream(StreamError::Io(inner)) => inner.kind(),
            TapeError::UnexpectedEof { .. } => io::ErrorKind::UnexpectedEof,
            TapeError::InvalidArgument { .. } => io::ErrorKind::InvalidInput,
            TapeError::Released | TapeError::Stream(StreamError::Closed) => {
                io::ErrorKind::NotConnected
            }
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

impl<S: ByteStream> ByteStream for TapeImage<S> {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<ReadOutcome> {
        Ok(TapeImage::read(self, buf)?)
    }

    fn seek(&mut self, offset: u64) -> StreamResult<()> {
        Ok(TapeImage::seek(self, offset)?)
    }

    fn tell(&self) -> StreamResult<u64> {
        Ok(TapeImage::tell(self)?)
    }

    fn close(&mut self) -> StreamResult<()> {
        Ok(TapeImage::close(self)?)
    }
}

impl<S: ByteStream> io::Read for TapeImage<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let outcome = TapeImage::read(self, buf)?;
        if outcome.len == 0 && outcome.status == ReadStatus::Incomplete && !buf.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "tapeimage: underlying stream is blocked",
            ));
        }
        Ok(outcome.len)
    }
}

/// Seeking past the end returns the logical end of the tape, as `tell`
/// reports afterwards.
impl<S: ByteStream> io::Seek for TapeImage<S> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let target = match pos {
            io::SeekFrom::Start(n) => n,
            io::SeekFrom::Current(delta) => TapeImage::tell(self)?
                .checked_add_signed(delta)
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative offset")
                })?,
            io::SeekFrom::End(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "tapeimage: logical size is unknown until the tape is read to the end",
                ))
            }
        };
        TapeImage::seek(self, target)?;
        Ok(TapeImage::tell(self)?)
    }
}
