//! The engine's single seeded random source.
//!
//! Every stochastic operation (neuron placement, weight initialization,
//! synaptogenesis tie-breaks, probabilistic input forcing) draws from one
//! [`EngineRng`] owned by the engine, so that identical seeds reproduce
//! identical trajectories.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Wraps a seeded PRNG. A seed of 0 is resolved to the current wall-clock
/// time in nanoseconds, matching the "0 means non-deterministic" contract
/// in the external interface.
#[derive(Debug, Clone)]
pub struct EngineRng {
    seed: u64,
    inner: StdRng,
}

impl EngineRng {
    /// Create a new RNG from the given seed. `0` resolves to the current
    /// wall-clock time in nanoseconds.
    pub fn new(seed: u64) -> Self {
        let resolved = if seed == 0 {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0xDEFA017)
        } else {
            seed
        };
        Self {
            seed: resolved,
            inner: StdRng::seed_from_u64(resolved),
        }
    }

    /// The resolved seed this generator was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform real in `[0, 1)`.
    pub fn uniform01(&mut self) -> f64 {
        self.inner.gen_range(0.0..1.0)
    }

    /// Uniform real in `[lo, hi)`.
    pub fn uniform_range(&mut self, lo: f64, hi: f64) -> f64 {
        if lo >= hi {
            return lo;
        }
        self.inner.gen_range(lo..hi)
    }

    /// A standard normal deviate.
    pub fn standard_normal(&mut self) -> f64 {
        use rand_distr::{Distribution, StandardNormal};
        StandardNormal.sample(&mut self.inner)
    }

    /// `true` with probability `p` (clamped to `[0, 1]`).
    pub fn bernoulli(&mut self, p: f64) -> bool {
        let p = p.clamp(0.0, 1.0);
        self.inner.gen_bool(p)
    }

    /// Direct access to the underlying [`rand::Rng`] for callers that need
    /// a primitive this wrapper doesn't expose (e.g. shuffling).
    pub fn inner_mut(&mut self) -> &mut StdRng {
        &mut self.inner
    }
}
