//! Property-based test generators using proptest.
//!
//! Provides strategies for generating tape layouts and access patterns.

use crate::fixtures::{Fixture, TapeWriter};
use proptest::prelude::*;

/// Strategy for a single record payload, possibly empty.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

/// Strategy for a list of record payloads, empty records included.
pub fn records_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(payload_strategy(), 0..32)
}

/// Strategy for a list of non-empty record payloads.
pub fn nonempty_records_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 1..256), 1..32)
}

/// Strategy for a prefix that shifts the tape away from offset zero.
pub fn prefix_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// Strategy for a complete fixture.
pub fn fixture_strategy() -> impl Strategy<Value = Fixture> {
    (prefix_strategy(), records_strategy()).prop_map(|(prefix, records)| {
        TapeWriter::with_prefix(&prefix).records(&records).finish()
    })
}

/// Strategy for the buffer size used by a sequence of reads.
pub fn chunk_strategy() -> impl Strategy<Value = usize> {
    1usize..300
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
