//! Shared test helpers.
//!
//! Set `RUST_LOG=offset_forest=trace` to see rotations, allocator events and
//! cursor invalidation while a test runs.

#![allow(dead_code)]

use std::sync::Once;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a test-writer subscriber once per test binary.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("offset_forest=warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Seeded permutation of `0..n` so insertion order is not sorted.
pub fn shuffled(n: u32, seed: u64) -> Vec<u32> {
    let mut out: Vec<u32> = (0..n).collect();
    out.shuffle(&mut Xoshiro256PlusPlus::seed_from_u64(seed));
    out
}
