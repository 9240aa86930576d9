//! Randomness behind the simulated collaborators.
//!
//! Everything random in the crate (GPS jitter, alert rolls, notification
//! picks, fuel price swings) draws from a [`Sampler`], so tests can swap in
//! a [`ScriptedSampler`] and get deterministic behavior.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform values in `[0, 1)`.
pub trait Sampler: Send + 'static {
    /// Next uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Roll an event that happens with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }

    /// Pick an index in `0..len`. Returns 0 when `len` is 0.
    fn pick(&mut self, len: usize) -> usize {
        let idx = (self.next_unit() * len as f64) as usize;
        idx.min(len.saturating_sub(1))
    }

    /// Uniform value in `[low, high)`.
    fn range(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_unit() * (high - low)
    }
}

/// [`Sampler`] backed by a standard RNG.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    /// Seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

impl Sampler for RandomSampler {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed list of values, starting over when exhausted.
///
/// An empty script yields 0.5 forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSampler {
    values: VecDeque<f64>,
}

impl ScriptedSampler {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Append values to the end of the script.
    pub fn extend(&mut self, values: impl IntoIterator<Item = f64>) {
        self.values.extend(values);
    }
}

impl Sampler for ScriptedSampler {
    fn next_unit(&mut self) -> f64 {
        match self.values.pop_front() {
            Some(value) => {
                self.values.push_back(value);
                value
            }
            None => 0.5,
        }
    }
}
