//! Seeded key hashing
//!
//! Two candidate slots per key come from the same hash function run with two
//! different seeds. XXH3 is fast and well distributed, and the seeded variant
//! gives decorrelated outputs for distinct seeds.

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Seed for the first (preferred) candidate
pub const FIRST_SEED: u64 = 13;

/// Seed for the second candidate
pub const SECOND_SEED: u64 = 7;

/// 64-bit digest of `key` under `seed`.
///
/// Pure and deterministic for a given `(key, seed)` pair.
#[inline]
pub fn digest(key: &[u8], seed: u64) -> u64 {
    xxh3_64_with_seed(key, seed)
}

/// Map `key` onto `[0, slots)` using the digest under `seed`.
///
/// `slots` must be non-zero.
#[inline]
pub fn candidate(key: &[u8], seed: u64, slots: usize) -> usize {
    (digest(key, seed) % slots as u64) as usize
}
