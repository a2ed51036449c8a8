// src/models/gbm.rs
use super::market::MarketParams;
use ndarray::{Array1, ArrayView1};

/// Exact terminal-value map of risk-neutral GBM.
///
/// ```text
/// S_T = S0 · exp((r - q - σ²/2)T + σ√T · Z)
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Gbm {
    pub s0: f64,
    drift: f64,
    vol_sqrt_t: f64,
}

impl Gbm {
    pub fn new(market: &MarketParams) -> Self {
        Gbm {
            s0: market.s0,
            drift: (market.r - market.q - 0.5 * market.sigma * market.sigma) * market.t,
            vol_sqrt_t: market.sigma * market.t.sqrt(),
        }
    }

    pub fn terminal(&self, normal_draw: f64) -> f64 {
        self.s0 * (self.drift + self.vol_sqrt_t * normal_draw).exp()
    }

    /// Elementwise terminal prices, co-indexed with `draws`
    pub fn terminal_prices(&self, draws: ArrayView1<f64>) -> Array1<f64> {
        let gbm = *self;
        let mut out = draws.to_owned();
        out.par_mapv_inplace(|z| gbm.terminal(z));
        out
    }
}
