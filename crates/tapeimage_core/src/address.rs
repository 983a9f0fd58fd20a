//! Translation between physical and logical offsets.

use crate::header::HEADER_SIZE;

const HEADER_LEN: i64 = HEADER_SIZE as i64;

/// Address translator between physical offsets (reported by the underlying
/// stream) and logical offsets (presented to the reader).
///
/// Every descriptor consumes [`HEADER_SIZE`] physical bytes, so translating
/// needs the ordinal of the record the offset falls in, i.e. the number of
/// descriptors before it. `zero` is the physical offset of the first
/// descriptor; a tape image may start in the middle of its source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressMap {
    zero: i64,
}

impl AddressMap {
    /// Creates a translator for a tape whose first descriptor is at `zero`.
    #[must_use]
    pub const fn new(zero: i64) -> Self {
        Self { zero }
    }

    /// Logical offset of physical `addr` inside record `ordinal`.
    #[must_use]
    pub const fn logical(&self, addr: i64, ordinal: usize) -> i64 {
        addr - HEADER_LEN * (1 + ordinal as i64) - self.zero
    }

    /// Physical offset of logical `addr`, assuming it falls inside record
    /// `ordinal`.
    #[must_use]
    pub const fn physical(&self, addr: i64, ordinal: usize) -> i64 {
        addr + HEADER_LEN * (1 + ordinal as i64) + self.zero
    }

    /// Physical offset of the first descriptor.
    #[must_use]
    pub const fn base(&self) -> i64 {
        self.zero
    }
}
