//! Option Payoff Functions
//!
//! # Mathematical Definitions
//!
//! - **Call**: max(S_T - K, 0) - right to buy at strike K
//! - **Put**: max(K - S_T, 0) - right to sell at strike K
//!
//! Payoffs depend on the terminal price only and are applied elementwise to
//! the simulated terminal prices.

use crate::error::{validation::*, PricerResult};
use ndarray::{Array1, ArrayView1};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OptionKind {
    Call,
    Put,
}

/// European vanilla option contract
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionSpec {
    pub kind: OptionKind,
    pub strike: f64,
}

impl OptionSpec {
    pub fn new(kind: OptionKind, strike: f64) -> PricerResult<Self> {
        let spec = OptionSpec { kind, strike };
        spec.validate()?;
        Ok(spec)
    }

    pub fn call(strike: f64) -> PricerResult<Self> {
        Self::new(OptionKind::Call, strike)
    }

    pub fn put(strike: f64) -> PricerResult<Self> {
        Self::new(OptionKind::Put, strike)
    }

    pub fn validate(&self) -> PricerResult<()> {
        validate_positive("k", self.strike)
    }

    /// Undiscounted payoff at terminal price `st`
    pub fn payoff(&self, st: f64) -> f64 {
        match self.kind {
            OptionKind::Call => (st - self.strike).max(0.0),
            OptionKind::Put => (self.strike - st).max(0.0),
        }
    }

    /// ∂payoff/∂S_T away from the kink; zero exactly at S_T = K
    pub fn payoff_slope(&self, st: f64) -> f64 {
        match self.kind {
            OptionKind::Call if st > self.strike => 1.0,
            OptionKind::Put if st < self.strike => -1.0,
            _ => 0.0,
        }
    }

    /// Elementwise discounted payoffs
    pub fn discounted_payoffs(&self, terminal: ArrayView1<f64>, discount: f64) -> Array1<f64> {
        let spec = *self;
        let mut out = terminal.to_owned();
        out.par_mapv_inplace(|st| discount * spec.payoff(st));
        out
    }
}
