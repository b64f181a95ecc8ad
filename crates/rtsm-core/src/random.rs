//! Deterministic random source.
//!
//! All randomness in a run comes from one [`RandomSource`] seeded with the
//! trial's explicit seed. The ChaCha8 stream is specified independently of
//! platform and word size, and `SliceRandom::shuffle` is a Fisher-Yates
//! shuffle, so a fixed seed and a fixed call order reproduce the list bit
//! for bit.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// In-place permutation of a slice.
pub trait Shuffle {
    fn shuffle<T>(&mut self, items: &mut [T]);
}

#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: ChaCha8Rng,
    shuffles: u64,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            shuffles: 0,
        }
    }

    /// Number of shuffle calls made so far.
    pub fn shuffle_count(&self) -> u64 {
        self.shuffles
    }
}

impl Shuffle for RandomSource {
    fn shuffle<T>(&mut self, items: &mut [T]) {
        self.shuffles += 1;
        items.shuffle(&mut self.rng);
    }
}

/// Leaves every slice in its original order. Used to check assembly
/// against a known, unshuffled layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Shuffle for Identity {
    fn shuffle<T>(&mut self, _items: &mut [T]) {}
}
