//! Test fixtures and utilities

use rand::distr::Alphanumeric;
use rand::Rng;

/// Generate a random alphanumeric key of `len` bytes
pub fn random_key(len: usize) -> Vec<u8> {
    rand::rng().sample_iter(Alphanumeric).take(len).collect()
}

/// Generate `count` random 8-byte keys
pub fn random_keys(count: usize) -> Vec<Vec<u8>> {
    (0..count).map(|_| random_key(8)).collect()
}

/// Generate `count` distinct keys of the form `key-{i}`
pub fn sequential_keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("key-{}", i)).collect()
}

/// Assert every slot got between `low` and `high` percent of the items
#[macro_export]
macro_rules! assert_shares_within {
    ($dist:expr, $low:expr, $high:expr) => {
        for (slot, pct) in $dist.percentages().iter().enumerate() {
            assert!(
                *pct >= $low && *pct <= $high,
                "Slot {} has {:.2}% which is outside {}%..{}%",
                slot,
                pct,
                $low,
                $high
            );
        }
    };
}
