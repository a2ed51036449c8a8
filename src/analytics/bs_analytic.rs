// src/analytics/bs_analytic.rs
//! Analytical Black-Scholes formulas for European options and Greeks
//!
//! # Mathematical Foundation
//!
//! Under the risk-neutral measure with continuous dividend yield q:
//! ```text
//! dS_t = (r - q) S_t dt + σ S_t dW_t
//! ```
//!
//! European options have closed-form prices in terms of the standard normal
//! CDF Φ:
//! ```text
//! d₁ = [ln(S/K) + (r - q + σ²/2)T] / (σ√T)
//! d₂ = d₁ - σ√T
//! C  = S e^(-qT) Φ(d₁) - K e^(-rT) Φ(d₂)
//! P  = K e^(-rT) Φ(-d₂) - S e^(-qT) Φ(-d₁)
//! ```

use crate::error::PricerResult;
use crate::math_utils::{norm_cdf, norm_pdf};
use crate::mc::payoffs::{OptionKind, OptionSpec};
use crate::models::MarketParams;

/// Closed-form price and first/second-order sensitivities
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClosedFormGreeks {
    pub price: f64,
    /// ∂V/∂S
    pub delta: f64,
    /// ∂V/∂σ
    pub vega: f64,
    /// ∂²V/∂S²
    pub gamma: f64,
    /// ∂V/∂t per year (negative T-derivative)
    pub theta: f64,
    /// ∂V/∂r
    pub rho: f64,
}

/// Intermediate quantities shared by every formula
struct Terms {
    d1: f64,
    d2: f64,
    sqrt_t: f64,
    df_r: f64,
    df_q: f64,
}

fn terms(m: &MarketParams, k: f64) -> Terms {
    let sqrt_t = m.t.sqrt();
    let vol_sqrt_t = m.sigma * sqrt_t;
    let d1 = ((m.s0 / k).ln() + (m.r - m.q + 0.5 * m.sigma * m.sigma) * m.t) / vol_sqrt_t;
    Terms {
        d1,
        d2: d1 - vol_sqrt_t,
        sqrt_t,
        df_r: (-m.r * m.t).exp(),
        df_q: (-m.q * m.t).exp(),
    }
}

fn validated(market: &MarketParams, option: &OptionSpec) -> PricerResult<Terms> {
    market.validate()?;
    option.validate()?;
    Ok(terms(market, option.strike))
}

/// Black-Scholes European price
pub fn bs_price(market: &MarketParams, option: &OptionSpec) -> PricerResult<f64> {
    let x = validated(market, option)?;
    let (s, k) = (market.s0, option.strike);
    let price = match option.kind {
        OptionKind::Call => s * x.df_q * norm_cdf(x.d1) - k * x.df_r * norm_cdf(x.d2),
        OptionKind::Put => k * x.df_r * norm_cdf(-x.d2) - s * x.df_q * norm_cdf(-x.d1),
    };
    // Saturated tails can leave a tiny negative residue
    Ok(price.max(0.0))
}

/// Black-Scholes Delta (∂V/∂S)
///
/// Call e^(-qT)Φ(d₁) in [0, 1]; put e^(-qT)(Φ(d₁) - 1) in [-1, 0].
pub fn bs_delta(market: &MarketParams, option: &OptionSpec) -> PricerResult<f64> {
    let x = validated(market, option)?;
    Ok(match option.kind {
        OptionKind::Call => x.df_q * norm_cdf(x.d1),
        OptionKind::Put => -x.df_q * norm_cdf(-x.d1),
    })
}

/// Black-Scholes Gamma (∂²V/∂S²), identical for calls and puts
///
/// ```text
/// Γ = e^(-qT) φ(d₁) / (S σ √T)
/// ```
pub fn bs_gamma(market: &MarketParams, option: &OptionSpec) -> PricerResult<f64> {
    let x = validated(market, option)?;
    Ok(x.df_q * norm_pdf(x.d1) / (market.s0 * market.sigma * x.sqrt_t))
}

/// Black-Scholes Vega (∂V/∂σ), identical for calls and puts
///
/// ```text
/// ν = S e^(-qT) φ(d₁) √T
/// ```
/// Units: price change per unit (100 vol points) change in σ.
pub fn bs_vega(market: &MarketParams, option: &OptionSpec) -> PricerResult<f64> {
    let x = validated(market, option)?;
    Ok(market.s0 * x.df_q * norm_pdf(x.d1) * x.sqrt_t)
}

/// Black-Scholes Theta (∂V/∂t), per year
///
/// ```text
/// Θ_call = -S e^(-qT) φ(d₁) σ / (2√T) - r K e^(-rT) Φ(d₂) + q S e^(-qT) Φ(d₁)
/// Θ_put  = -S e^(-qT) φ(d₁) σ / (2√T) + r K e^(-rT) Φ(-d₂) - q S e^(-qT) Φ(-d₁)
/// ```
pub fn bs_theta(market: &MarketParams, option: &OptionSpec) -> PricerResult<f64> {
    let x = validated(market, option)?;
    let (s, k, r, q) = (market.s0, option.strike, market.r, market.q);
    let decay = -s * x.df_q * norm_pdf(x.d1) * market.sigma / (2.0 * x.sqrt_t);
    Ok(match option.kind {
        OptionKind::Call => {
            decay - r * k * x.df_r * norm_cdf(x.d2) + q * s * x.df_q * norm_cdf(x.d1)
        }
        OptionKind::Put => {
            decay + r * k * x.df_r * norm_cdf(-x.d2) - q * s * x.df_q * norm_cdf(-x.d1)
        }
    })
}

/// Black-Scholes Rho (∂V/∂r)
///
/// Call K T e^(-rT) Φ(d₂); put -K T e^(-rT) Φ(-d₂).
pub fn bs_rho(market: &MarketParams, option: &OptionSpec) -> PricerResult<f64> {
    let x = validated(market, option)?;
    let kt_df = option.strike * market.t * x.df_r;
    Ok(match option.kind {
        OptionKind::Call => kt_df * norm_cdf(x.d2),
        OptionKind::Put => -kt_df * norm_cdf(-x.d2),
    })
}

/// Analytic price and Greeks in one pass.
///
/// Fails with a domain error when sigma, T, S0 or K is not strictly positive.
pub fn price_closed_form(market: &MarketParams, option: &OptionSpec) -> PricerResult<ClosedFormGreeks> {
    Ok(ClosedFormGreeks {
        price: bs_price(market, option)?,
        delta: bs_delta(market, option)?,
        vega: bs_vega(market, option)?,
        gamma: bs_gamma(market, option)?,
        theta: bs_theta(market, option)?,
        rho: bs_rho(market, option)?,
    })
}

/// C - P - (S e^(-qT) - K e^(-rT)); zero up to rounding
pub fn put_call_parity_gap(market: &MarketParams, strike: f64) -> PricerResult<f64> {
    let call = bs_price(market, &OptionSpec::call(strike)?)?;
    let put = bs_price(market, &OptionSpec::put(strike)?)?;
    let forward_value = market.s0 * (-market.q * market.t).exp() - strike * market.discount();
    Ok(call - put - forward_value)
}
