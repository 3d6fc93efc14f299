//! Randomness behind the queue simulation.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform integer draws. `low <= high` is the caller's responsibility.
pub trait RandomSource: Send {
    fn range_inclusive(&mut self, low: u32, high: u32) -> u32;
}

/// Production source, seeded from the OS.
pub struct ThreadRandom(StdRng);

impl ThreadRandom {
    pub fn new() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Reproducible stream for simulations.
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn range_inclusive(&mut self, low: u32, high: u32) -> u32 {
        self.0.gen_range(low..=high)
    }
}

/// Scripted draws for tests. Each value is clamped into the requested
/// range; once exhausted every draw returns `low`.
#[derive(Debug, Clone, Default)]
pub struct SequenceRandom {
    values: VecDeque<u32>,
}

impl SequenceRandom {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for SequenceRandom {
    fn range_inclusive(&mut self, low: u32, high: u32) -> u32 {
        self.values
            .pop_front()
            .map_or(low, |v| v.clamp(low, high))
    }
}
