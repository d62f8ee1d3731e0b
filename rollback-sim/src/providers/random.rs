//! Random number generation provider abstraction.
//!
//! The simulation RNG is an explicit value owned by the provider rather than
//! thread-local state: whoever holds a [`SimRandomProvider`] clone draws from
//! the same seeded stream, and nothing else does.

use rand::distr::uniform::SampleUniform;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

/// Provider trait for random number generation.
pub trait RandomProvider: Clone {
    /// Generate a random value within a specified range.
    ///
    /// The range is exclusive of the upper bound (start..end) and must not be
    /// empty.
    fn random_range<T>(&self, range: Range<T>) -> T
    where
        T: SampleUniform + PartialOrd;

    /// Generate a random f64 in `[0.0, 1.0)`.
    fn random_ratio(&self) -> f64;

    /// Generate a random bool with the given probability of being true.
    fn random_bool(&self, probability: f64) -> bool;
}

/// Seeded, deterministic random provider for simulation.
///
/// Uses ChaCha8Rng: the same seed always yields the same sequence.
#[derive(Debug, Clone)]
pub struct SimRandomProvider {
    rng: Rc<RefCell<ChaCha8Rng>>,
    seed: u64,
}

impl SimRandomProvider {
    /// Create a provider seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rc::new(RefCell::new(ChaCha8Rng::seed_from_u64(seed))),
            seed,
        }
    }

    /// The seed this provider was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomProvider for SimRandomProvider {
    fn random_range<T>(&self, range: Range<T>) -> T
    where
        T: SampleUniform + PartialOrd,
    {
        self.rng.borrow_mut().random_range(range)
    }

    fn random_ratio(&self) -> f64 {
        self.rng.borrow_mut().random::<f64>()
    }

    fn random_bool(&self, probability: f64) -> bool {
        self.random_ratio() < probability
    }
}
