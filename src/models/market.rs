// src/models/market.rs
use crate::error::{validation::*, PricerResult};

/// Black-Scholes market inputs for a single underlying.
///
/// Fully determines the risk-neutral GBM terminal distribution:
/// ```text
/// ln S_T ~ N(ln S0 + (r - q - σ²/2)T, σ²T)
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketParams {
    pub s0: f64,    // Spot price
    pub r: f64,     // Continuously compounded risk-free rate
    pub q: f64,     // Continuously compounded dividend yield
    pub sigma: f64, // Annualized volatility
    pub t: f64,     // Time to maturity in years
}

impl MarketParams {
    pub fn new(s0: f64, r: f64, q: f64, sigma: f64, t: f64) -> PricerResult<Self> {
        let params = MarketParams { s0, r, q, sigma, t };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> PricerResult<()> {
        validate_positive("s0", self.s0)?;
        validate_finite("r", self.r)?;
        validate_finite("q", self.q)?;
        validate_positive("sigma", self.sigma)?;
        validate_positive("t", self.t)?;
        Ok(())
    }

    /// Risk-neutral expectation of S_T: S0·e^((r-q)T)
    pub fn forward(&self) -> f64 {
        self.s0 * ((self.r - self.q) * self.t).exp()
    }

    /// e^(-rT)
    pub fn discount(&self) -> f64 {
        (-self.r * self.t).exp()
    }

    /// Copy with a different spot, validated
    pub fn with_spot(&self, s0: f64) -> PricerResult<Self> {
        Self::new(s0, self.r, self.q, self.sigma, self.t)
    }

    /// Copy with a different volatility, validated
    pub fn with_sigma(&self, sigma: f64) -> PricerResult<Self> {
        Self::new(self.s0, self.r, self.q, sigma, self.t)
    }
}
