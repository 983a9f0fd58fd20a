//! Benchmark utilities.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tapeimage_testkit::{Fixture, TapeWriter};

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Build a tape of `count` records with `size` payload bytes each.
pub fn uniform_tape(count: usize, size: usize) -> Fixture {
    let records: Vec<Vec<u8>> = (0..count).map(|_| random_data(size)).collect();
    TapeWriter::new().records(&records).finish()
}

/// Build a tape of `count` records with sizes drawn from `1..=max_size`.
///
/// The layout only depends on `seed`, so runs are comparable.
pub fn ragged_tape(count: usize, max_size: usize, seed: u64) -> Fixture {
    let mut rng = StdRng::seed_from_u64(seed);
    let records: Vec<Vec<u8>> = (0..count)
        .map(|_| vec![0xab; rng.gen_range(1..=max_size)])
        .collect();
    TapeWriter::new().records(&records).finish()
}

/// Generate `count` logical offsets below `len`.
pub fn random_offsets(count: usize, len: usize, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen_range(0..len) as u64).collect()
}
