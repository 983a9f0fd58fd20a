//! The read position within the record index.

use crate::error::{TapeError, TapeResult};
use crate::header::HEADER_SIZE;
use crate::index::RecordIndex;

/// Where reading continues: a record ordinal plus the bytes left in it.
///
/// The cursor stores an ordinal rather than a reference into the index, so
/// growing the index never invalidates it. Every operation that needs the
/// record looks it up in the index and fails if it is not there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    position: usize,
    remaining: i64,
}

impl Cursor {
    /// Creates a cursor in record `position` with `remaining` payload bytes
    /// left before the next descriptor.
    #[must_use]
    pub const fn new(position: usize, remaining: i64) -> Self {
        Self {
            position,
            remaining,
        }
    }

    /// Ordinal of the current record.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Payload bytes left in the current record.
    #[must_use]
    pub const fn remaining(&self) -> i64 {
        self.remaining
    }

    /// True if the current record is exhausted.
    #[must_use]
    pub const fn exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Moves the cursor `n` bytes forward within the current record.
    ///
    /// # Errors
    ///
    /// Returns [`TapeError::InvalidArgument`] if `n` is negative or would move
    /// past the end of the record.
    pub fn advance(&mut self, n: i64) -> TapeResult<()> {
        if n < 0 || n > self.remaining {
            return Err(TapeError::invalid_argument(format!(
                "advancing cursor by {n} past end-of-record ({} bytes left)",
                self.remaining
            )));
        }
        self.remaining -= n;
        Ok(())
    }

    /// Returns a cursor at the start of the following record.
    ///
    /// # Errors
    ///
    /// Returns [`TapeError::Internal`] if the following record is not indexed.
    pub fn next_record(&self, index: &RecordIndex) -> TapeResult<Self> {
        let this = index.header(self.position)?;
        let next = index.header(self.position + 1)?;
        let start = i64::from(this.next) + HEADER_SIZE as i64;
        Ok(Self::new(self.position + 1, i64::from(next.next) - start))
    }

    /// The physical offset of the cursor.
    ///
    /// This should correspond to the offset reported by the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns [`TapeError::Internal`] if the cursor's record is not indexed.
    pub fn physical_position(&self, index: &RecordIndex) -> TapeResult<i64> {
        let header = index.header(self.position)?;
        Ok(i64::from(header.next) - self.remaining)
    }
}
