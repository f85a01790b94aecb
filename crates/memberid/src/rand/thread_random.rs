use crate::RandSource;
use ::rand::{Rng, rng};

/// A `RandSource` that uses the thread-local RNG (`rand::rng()`).
///
/// This RNG is fast, cryptographically secure (ChaCha-based), and
/// automatically reseeded periodically. Unpredictability of the resulting IDs
/// is a side effect, not a guarantee this crate makes.
///
/// Each OS thread has its own RNG instance, so calls from multiple threads
/// are contention-free. This type does not store the RNG itself; it is a
/// zero-sized handle that may be freely shared across threads.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn rand_below(&self, bound: u32) -> u32 {
        rng().random_range(0..bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_below_bound() {
        for bound in [1, 2, 99, 100] {
            for _ in 0..1000 {
                assert!(ThreadRandom.rand_below(bound) < bound);
            }
        }
    }
}
