// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Funnel Simulation Engine - Random Source

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform random source driving every stochastic choice in a run.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform sample in `[0, 100)`, compared against conversion rates.
    fn percent(&mut self) -> f64 {
        self.next_f64() * 100.0
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        ((self.next_f64() * len as f64) as usize).min(len.saturating_sub(1))
    }

    /// Index drawn proportionally to `weights`; uniform when they sum to zero.
    fn weighted_index(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
        if total <= 0.0 {
            return self.index(weights.len());
        }
        let mut target = self.next_f64() * total;
        for (i, w) in weights.iter().enumerate() {
            let w = w.max(0.0);
            if target < w {
                return i;
            }
            target -= w;
        }
        weights.len() - 1
    }
}

/// ChaCha8-backed source, reproducible from a seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
