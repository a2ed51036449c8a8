// src/rng.rs
//! Random Number Generation for Monte Carlo Simulations
//!
//! # Design
//!
//! 1. **Reproducibility**: the caller's seed is the only source of randomness.
//!    There is no global or thread-local generator.
//! 2. **Parallel safety**: normals are produced in fixed-size batches. Each batch
//!    owns a `StdRng` seeded from `(seed, batch index)`, so the output for a given
//!    seed is bit-identical however many threads rayon uses.
//!
//! # Batch seeding
//!
//! Batch seeds are mixed with a splitmix64 finalizer:
//! ```text
//! z = seed + (batch + 1) * 0x9e3779b97f4a7c15
//! z = (z ⊕ (z >> 30)) * 0xbf58476d1ce4e5b9
//! z = (z ⊕ (z >> 27)) * 0x94d049bb133111eb
//! batch_seed = z ⊕ (z >> 31)
//! ```
//! so that batch 1 of seed `s` does not coincide with batch 0 of seed `s + 1`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;

/// Number of normal draws produced by one batch generator.
pub const BATCH_SIZE: usize = 1 << 14;

fn splitmix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
    z ^ (z >> 31)
}

/// RNG factory for reproducible parallel simulations
#[derive(Debug, Clone, Copy)]
pub struct RngFactory {
    base_seed: u64,
}

impl RngFactory {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Create the generator for one batch of draws
    pub fn create_std_rng(&self, batch_id: u64) -> StdRng {
        let z = self
            .base_seed
            .wrapping_add(batch_id.wrapping_add(1).wrapping_mul(0x9e3779b97f4a7c15u64));
        StdRng::seed_from_u64(splitmix64(z))
    }

    /// Fill `out` with i.i.d. standard normals, batch-parallel.
    pub fn fill_normals(&self, out: &mut [f64]) {
        out.par_chunks_mut(BATCH_SIZE)
            .enumerate()
            .for_each(|(batch, chunk)| {
                let mut rng = self.create_std_rng(batch as u64);
                for v in chunk.iter_mut() {
                    *v = get_normal_draw(&mut rng);
                }
            });
    }

    /// `n` i.i.d. standard normals
    pub fn standard_normals(&self, n: usize) -> Vec<f64> {
        let mut out = vec![0.0; n];
        self.fill_normals(&mut out);
        out
    }
}

pub fn get_normal_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}
