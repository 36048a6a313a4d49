//! Seeded random number generators for example streams.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Create an RNG that replays the same stream for the same seed
pub fn create_seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Draw a seed from entropy so an unseeded stream can still be replayed
pub fn fresh_seed() -> u64 {
    StdRng::from_entropy().next_u64()
}
