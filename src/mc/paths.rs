//! Terminal-price simulation under GBM
//!
//! # Common Random Numbers
//!
//! [`simulate_terminal`] returns the standard-normal draws alongside the terminal
//! prices. Handing the same [`SimulationDraws`] to [`simulate_from_draws`] under
//! bumped [`MarketParams`] reproduces each path with the identical Z, which is
//! what cancels sampling noise in finite-difference Greeks.
//!
//! # Antithetic layout
//!
//! With antithetic pairing, ⌈n/2⌉ base draws are generated and interleaved
//! with their negations, then truncated to exactly n outcomes:
//! ```text
//! [Z₀, -Z₀, Z₁, -Z₁, ..., Z_{m-1}(, -Z_{m-1})]
//! ```
//! An odd n leaves the final outcome unpaired.

use crate::error::{validation::*, PricerError, PricerResult};
use crate::models::{Gbm, MarketParams};
use crate::rng::RngFactory;
use ndarray::{Array1, ArrayView1};
use tracing::{debug, warn};

/// How consecutive outcomes relate to each other
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pairing {
    Independent,
    /// `draws[2i + 1] == -draws[2i]`
    Antithetic,
}

impl Pairing {
    pub fn from_flag(antithetic: bool) -> Self {
        if antithetic {
            Pairing::Antithetic
        } else {
            Pairing::Independent
        }
    }
}

/// Standard-normal draws owned by the caller and reusable across pricing calls
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationDraws {
    normals: Array1<f64>,
    pairing: Pairing,
    seed: Option<u64>,
}

impl SimulationDraws {
    /// Generate `n_paths` draws from `seed`
    pub fn generate(n_paths: usize, seed: u64, antithetic: bool) -> PricerResult<Self> {
        validate_paths(n_paths)?;
        let factory = RngFactory::new(seed);
        let normals = if antithetic {
            let base = factory.standard_normals((n_paths + 1) / 2);
            Array1::from_shape_fn(n_paths, |j| {
                if j % 2 == 0 {
                    base[j / 2]
                } else {
                    -base[j / 2]
                }
            })
        } else {
            Array1::from_vec(factory.standard_normals(n_paths))
        };
        Ok(SimulationDraws {
            normals,
            pairing: Pairing::from_flag(antithetic),
            seed: Some(seed),
        })
    }

    /// Wrap caller-supplied draws
    pub fn from_normals(normals: Array1<f64>, pairing: Pairing) -> PricerResult<Self> {
        validate_paths(normals.len())?;
        if let Some(bad) = normals.iter().position(|z| !z.is_finite()) {
            return Err(PricerError::value(
                "draws",
                format!("draw {} is not finite: {}", bad, normals[bad]),
            ));
        }
        if pairing == Pairing::Antithetic {
            let n = normals.len();
            if let Some(i) = (0..n / 2).find(|&i| normals[2 * i + 1] != -normals[2 * i]) {
                return Err(PricerError::value(
                    "draws",
                    format!("antithetic pair {} is not mirrored", i),
                ));
            }
        }
        Ok(SimulationDraws {
            normals,
            pairing,
            seed: None,
        })
    }

    pub fn normals(&self) -> ArrayView1<f64> {
        self.normals.view()
    }

    pub fn pairing(&self) -> Pairing {
        self.pairing
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.normals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }
}

/// Terminal prices co-indexed with the draws that produced them
#[derive(Clone, Debug, PartialEq)]
pub struct PathResult {
    terminal_prices: Array1<f64>,
    pairing: Pairing,
}

impl PathResult {
    /// Wrap externally produced terminal prices
    pub fn from_terminal_prices(terminal_prices: Array1<f64>, pairing: Pairing) -> PricerResult<Self> {
        validate_paths(terminal_prices.len())?;
        if let Some(bad) = terminal_prices.iter().position(|s| !(s.is_finite() && *s >= 0.0)) {
            return Err(PricerError::value(
                "terminal_prices",
                format!(
                    "price {} must be finite and non-negative, got {}",
                    bad, terminal_prices[bad]
                ),
            ));
        }
        Ok(PathResult {
            terminal_prices,
            pairing,
        })
    }

    pub fn terminal_prices(&self) -> ArrayView1<f64> {
        self.terminal_prices.view()
    }

    pub fn pairing(&self) -> Pairing {
        self.pairing
    }

    pub fn len(&self) -> usize {
        self.terminal_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminal_prices.is_empty()
    }
}

/// Simulation size and seed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    pub n_paths: usize,
    pub seed: u64,
    pub antithetic: bool,
}

impl SimulationConfig {
    pub fn validate(&self) -> PricerResult<()> {
        validate_paths(self.n_paths)
    }

    pub fn draws(&self) -> PricerResult<SimulationDraws> {
        SimulationDraws::generate(self.n_paths, self.seed, self.antithetic)
    }

    pub fn simulate(&self, market: &MarketParams) -> PricerResult<(SimulationDraws, PathResult)> {
        simulate_terminal(market, self.n_paths, self.seed, self.antithetic)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            n_paths: 200_000,
            seed: 42,
            antithetic: true,
        }
    }
}

/// Simulate `n_paths` terminal prices under GBM, returning the draws for reuse.
///
/// # Errors
///
/// - Domain error for non-positive `s0`, `sigma` or `t`
/// - Value error for `n_paths == 0`
pub fn simulate_terminal(
    market: &MarketParams,
    n_paths: usize,
    seed: u64,
    antithetic: bool,
) -> PricerResult<(SimulationDraws, PathResult)> {
    market.validate()?;
    let draws = SimulationDraws::generate(n_paths, seed, antithetic)?;
    if antithetic && n_paths % 2 == 1 {
        warn!(n_paths, "odd path count under antithetic pairing; last outcome is unpaired");
    }
    let paths = simulate_from_draws(market, &draws)?;
    debug!(n_paths, seed, antithetic, "simulated GBM terminal prices");
    Ok((draws, paths))
}

/// Re-simulate terminal prices from existing draws (the CRN path).
pub fn simulate_from_draws(market: &MarketParams, draws: &SimulationDraws) -> PricerResult<PathResult> {
    market.validate()?;
    if draws.is_empty() {
        return Err(PricerError::value("draws", "no draws supplied"));
    }
    let terminal_prices = Gbm::new(market).terminal_prices(draws.normals());
    Ok(PathResult {
        terminal_prices,
        pairing: draws.pairing(),
    })
}
