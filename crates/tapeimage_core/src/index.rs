//! Append-only index over the descriptors seen so far.

use crate::address::AddressMap;
use crate::cursor::Cursor;
use crate::error::{TapeError, TapeResult};
use crate::header::{Header, HEADER_SIZE};

/// Which path of [`RecordIndex::find`] answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The offset was inside the hinted record.
    Hint,
    /// The index was searched.
    Search,
}

/// The descriptors read so far, in stream order.
///
/// The ordinal of a descriptor is its position in the index. The index only
/// ever grows at the back, as the stream is traversed forward.
#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    headers: Vec<Header>,
    addr: AddressMap,
}

impl RecordIndex {
    /// Creates an empty index for a tape laid out according to `addr`.
    #[must_use]
    pub fn new(addr: AddressMap) -> Self {
        Self {
            headers: Vec::new(),
            addr,
        }
    }

    /// The address translator of this tape.
    #[must_use]
    pub fn addr(&self) -> &AddressMap {
        &self.addr
    }

    /// Number of indexed descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// True if nothing has been indexed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// All indexed descriptors.
    #[must_use]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// The last indexed descriptor.
    #[must_use]
    pub fn last(&self) -> Option<&Header> {
        self.headers.last()
    }

    /// The descriptor at `ordinal`.
    ///
    /// # Errors
    ///
    /// Returns [`TapeError::Internal`] if `ordinal` is not indexed.
    pub fn header(&self, ordinal: usize) -> TapeResult<&Header> {
        self.headers.get(ordinal).ok_or_else(|| {
            TapeError::internal(format!(
                "record {ordinal} is not indexed ({} records indexed)",
                self.headers.len()
            ))
        })
    }

    /// Logical offset one past the last payload byte of record `ordinal`.
    #[must_use]
    pub fn logical_end(&self, ordinal: usize) -> Option<i64> {
        self.headers
            .get(ordinal)
            .map(|h| self.addr.logical(i64::from(h.next), ordinal))
    }

    /// Appends a validated descriptor and returns a cursor at the start of
    /// its payload.
    ///
    /// # Errors
    ///
    /// Returns [`TapeError::Corrupt`] if the descriptor claims its record ends
    /// before the descriptor itself does.
    pub fn append(&mut self, header: Header) -> TapeResult<Cursor> {
        let start = match self.headers.last() {
            Some(last) => i64::from(last.next),
            None => self.addr.base(),
        } + HEADER_SIZE as i64;

        let remaining = i64::from(header.next) - start;
        if remaining < 0 {
            return Err(TapeError::corrupt(format!(
                "head.next (= {}) points inside its own header, which ends at {start}",
                header.next
            )));
        }

        self.headers.push(header);
        Ok(Cursor::new(self.headers.len() - 1, remaining))
    }

    /// Finds the ordinal of the record containing logical offset `n`.
    ///
    /// A common access pattern is many small seeks within the same record, so
    /// the record under `hint` is checked first. Otherwise the index is
    /// searched in two phases:
    ///
    /// 1. A binary search that pretends logical and physical offsets are the
    ///    same. Since physical >= logical, the result is the right record or
    ///    one before it.
    /// 2. A linear scan from there that accounts for the descriptors, which
    ///    only takes a few hops because of the approximation above.
    ///
    /// # Errors
    ///
    /// Returns [`TapeError::IndexLookup`] if `n` is beyond the indexed range.
    pub fn find(&self, n: i64, hint: &Cursor) -> TapeResult<(usize, Lookup)> {
        if self.in_record(n, hint.position()) {
            return Ok((hint.position(), Lookup::Hint));
        }

        let addr = self.addr;
        let lower = self
            .headers
            .partition_point(|h| addr.logical(i64::from(h.next), 0) < n);

        self.headers[lower..]
            .iter()
            .zip(lower..)
            .find(|(h, pos)| n <= addr.logical(i64::from(h.next), *pos))
            .map(|(_, pos)| (pos, Lookup::Search))
            .ok_or_else(|| TapeError::IndexLookup {
                offset: n,
                last_next: self.headers.last().map_or(0, |h| h.next),
            })
    }

    fn in_record(&self, n: i64, pos: usize) -> bool {
        let Some(end) = self.logical_end(pos) else {
            return false;
        };

        if pos == 0 {
            return end > n;
        }

        match self.logical_end(pos - 1) {
            Some(begin) => n > begin && n <= end,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderType;
    use proptest::prelude::*;

    /// Builds an index of records with the given payload sizes, starting at `zero`.
    fn index_of(zero: i64, sizes: &[u32]) -> RecordIndex {
        let mut index = RecordIndex::new(AddressMap::new(zero));
        let mut pos = zero as u32;
        let mut prev = 0;
        for &size in sizes {
            let next = pos + HEADER_SIZE as u32 + size;
            index
                .append(Header::new(HeaderType::Record, prev, next))
                .unwrap();
            prev = pos;
            pos = next;
        }
        index
    }

    #[test]
    fn index_append_sets_cursor() {
        let mut index = RecordIndex::new(AddressMap::new(4));
        let cursor = index
            .append(Header::new(HeaderType::Record, 0, 4 + 12 + 10))
            .unwrap();
        assert_eq!(cursor, Cursor::new(0, 10));

        let cursor = index
            .append(Header::new(HeaderType::Record, 4, 26 + 12 + 3))
            .unwrap();
        assert_eq!(cursor, Cursor::new(1, 3));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn index_append_rejects_next_inside_header() {
        let mut index = RecordIndex::new(AddressMap::new(0));
        let result = index.append(Header::new(HeaderType::Record, 0, 8));
        assert!(matches!(result, Err(TapeError::Corrupt { .. })));
        assert!(index.is_empty());
    }

    #[test]
    fn index_logical_end() {
        let index = index_of(0, &[10, 20, 0]);
        assert_eq!(index.logical_end(0), Some(10));
        assert_eq!(index.logical_end(1), Some(30));
        assert_eq!(index.logical_end(2), Some(30));
        assert_eq!(index.logical_end(3), None);
    }

    #[test]
    fn index_find_uses_hint() {
        let index = index_of(0, &[10, 20, 30]);

        let hint = Cursor::new(1, 0);
        assert_eq!(index.find(11, &hint).unwrap(), (1, Lookup::Hint));
        assert_eq!(index.find(30, &hint).unwrap(), (1, Lookup::Hint));

        let hint = Cursor::new(0, 0);
        assert_eq!(index.find(0, &hint).unwrap(), (0, Lookup::Hint));
        assert_eq!(index.find(9, &hint).unwrap(), (0, Lookup::Hint));
    }

    #[test]
    fn index_find_searches_outside_hint() {
        let index = index_of(0, &[10, 20, 30]);
        let hint = Cursor::new(0, 0);

        assert_eq!(index.find(10, &hint).unwrap(), (0, Lookup::Search));
        assert_eq!(index.find(11, &hint).unwrap(), (1, Lookup::Search));
        assert_eq!(index.find(31, &hint).unwrap(), (2, Lookup::Search));
        assert_eq!(index.find(60, &hint).unwrap(), (2, Lookup::Search));
    }

    #[test]
    fn index_find_with_nonzero_base() {
        let index = index_of(100, &[5, 5, 5, 5]);
        let hint = Cursor::new(3, 0);

        assert_eq!(index.find(0, &hint).unwrap(), (0, Lookup::Search));
        assert_eq!(index.find(7, &hint).unwrap(), (1, Lookup::Search));
        assert_eq!(index.find(12, &hint).unwrap(), (2, Lookup::Search));
    }

    #[test]
    fn index_find_beyond_indexed_range_fails() {
        let index = index_of(0, &[10, 20]);
        let result = index.find(31, &Cursor::new(0, 0));
        assert!(matches!(
            result,
            Err(TapeError::IndexLookup {
                offset: 31,
                last_next: 54
            })
        ));
    }

    #[test]
    fn index_header_out_of_bounds() {
        let index = index_of(0, &[1]);
        assert!(index.header(0).is_ok());
        assert!(matches!(index.header(1), Err(TapeError::Internal { .. })));
    }

    proptest! {
        #[test]
        fn index_logical_ends_increase(sizes in prop::collection::vec(1u32..4096, 1..64)) {
            let index = index_of(0, &sizes);
            for i in 1..index.len() {
                prop_assert!(index.logical_end(i - 1) < index.logical_end(i));
            }
        }

        #[test]
        fn index_find_matches_linear_scan(
            sizes in prop::collection::vec(0u32..512, 1..64),
            zero in 0i64..1024,
            hint in 0usize..64,
            pick in any::<prop::sample::Index>(),
        ) {
            let index = index_of(zero, &sizes);
            let total = index.logical_end(index.len() - 1).unwrap();
            let n = pick.index(total as usize + 1) as i64;
            let hint = Cursor::new(hint % index.len(), 0);

            let (pos, _) = index.find(n, &hint).unwrap();
            let end = index.logical_end(pos).unwrap();
            prop_assert!(n <= end);
            if pos > 0 {
                prop_assert!(n > index.logical_end(pos - 1).unwrap());
            }
        }
    }
}
