//! Monte Carlo Greeks
//!
//! # Pathwise delta
//!
//! For vanilla payoffs under GBM, differentiating along each path gives
//! ```text
//! ∂/∂S₀ payoff(S_T) = payoff'(S_T) · ∂S_T/∂S₀ = payoff'(S_T) · S_T/S₀
//! ```
//! with payoff' = 1_{S_T > K} for calls and -1_{S_T < K} for puts. The kink at
//! S_T = K has probability zero and contributes nothing.
//!
//! # Finite differences with common random numbers
//!
//! Bumped scenarios are re-simulated from the *same* standard-normal draws:
//! ```text
//! Δ ≈ [V(S₀(1+h)) - V(S₀(1-h))] / (2 S₀ h)
//! ν ≈ [V(σ+h) - V(σ-h)] / (2h)
//! ```
//! Shared draws make the per-path difference smooth in h, so
//! ```text
//! Var[V⁺ - V⁻] << Var[V⁺] + Var[V⁻]
//! ```
//! [`DrawsSource`] only offers borrowed draws or a config from which one draw
//! set is generated and shared, so independent draws per scenario cannot be
//! requested.

use crate::error::{validation::*, PricerError, PricerResult};
use crate::mc::mc_engine::price_mc;
use crate::mc::paths::{simulate_from_draws, PathResult, SimulationConfig, SimulationDraws};
use crate::mc::payoffs::OptionSpec;
use crate::mc::stats::{confidence_interval, require_samples, to_samples, SampleStats, Z_95};
use crate::models::MarketParams;
use bitflags::bitflags;
use ndarray::Zip;
use std::borrow::Cow;
use tracing::{debug, warn};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GreeksConfig: u32 {
        const NONE           = 0;
        const DELTA_PATHWISE = 1 << 0;
        const DELTA_FD       = 1 << 1;
        const VEGA_FD        = 1 << 2;
    }
}

/// Where the common random numbers come from
#[derive(Clone, Debug)]
pub enum DrawsSource<'a> {
    /// Caller-owned draws, shared by every scenario
    Draws(&'a SimulationDraws),
    /// Generate one draw set from this config and share it
    Simulate(SimulationConfig),
}

impl<'a> DrawsSource<'a> {
    fn resolve(&self) -> PricerResult<Cow<'a, SimulationDraws>> {
        match self {
            DrawsSource::Draws(draws) => {
                if draws.is_empty() {
                    return Err(PricerError::value("draws", "no draws supplied"));
                }
                Ok(Cow::Borrowed(*draws))
            }
            DrawsSource::Simulate(config) => Ok(Cow::Owned(config.draws()?)),
        }
    }
}

impl<'a> From<&'a SimulationDraws> for DrawsSource<'a> {
    fn from(draws: &'a SimulationDraws) -> Self {
        DrawsSource::Draws(draws)
    }
}

impl From<SimulationConfig> for DrawsSource<'_> {
    fn from(config: SimulationConfig) -> Self {
        DrawsSource::Simulate(config)
    }
}

/// Monte Carlo Greek with its sampling error
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GreekEstimate {
    pub value: f64,
    pub stderr: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub n_paths: usize,
}

impl GreekEstimate {
    fn from_stats(value: f64, stats: &SampleStats, n_paths: usize, method: &str) -> PricerResult<Self> {
        let stderr = stats.stderr();
        if !value.is_finite() || !stderr.is_finite() {
            return Err(PricerError::NumericalInstability {
                method: method.to_string(),
                reason: format!("estimate {} ± {} is not finite", value, stderr),
            });
        }
        Ok(GreekEstimate {
            value,
            stderr,
            ci_low: value - Z_95 * stderr,
            ci_high: value + Z_95 * stderr,
            n_paths,
        })
    }

    pub fn ci95(&self) -> (f64, f64) {
        (self.ci_low, self.ci_high)
    }

    pub fn interval(&self, level: f64) -> PricerResult<(f64, f64)> {
        confidence_interval(self.value, self.stderr, level)
    }
}

/// Pathwise delta estimate with standard error
pub fn delta_pathwise_estimate(
    draws: &SimulationDraws,
    paths: &PathResult,
    market: &MarketParams,
    option: &OptionSpec,
) -> PricerResult<GreekEstimate> {
    market.validate()?;
    option.validate()?;
    if draws.is_empty() {
        return Err(PricerError::value("draws", "no draws supplied"));
    }
    validate_same_len("terminal_prices", draws.len(), paths.len())?;
    if draws.pairing() != paths.pairing() {
        return Err(PricerError::value(
            "terminal_prices",
            format!(
                "pairing {:?} does not match the draws' pairing {:?}",
                paths.pairing(),
                draws.pairing()
            ),
        ));
    }

    let discount = market.discount();
    let s0 = market.s0;
    let spec = *option;
    let mut per_path = paths.terminal_prices().to_owned();
    per_path.par_mapv_inplace(|st| discount * spec.payoff_slope(st) * st / s0);

    let samples = to_samples(per_path.view(), paths.pairing());
    require_samples(samples.len())?;
    let stats = SampleStats::summarize(samples.view());
    let estimate = GreekEstimate::from_stats(stats.mean, &stats, paths.len(), "Pathwise Delta")?;
    debug!(delta = estimate.value, stderr = estimate.stderr, "pathwise delta");
    Ok(estimate)
}

/// Pathwise delta: e^(-rT) · mean(payoff'(S_T) · S_T / S₀)
pub fn delta_pathwise(
    draws: &SimulationDraws,
    paths: &PathResult,
    market: &MarketParams,
    option: &OptionSpec,
) -> PricerResult<f64> {
    delta_pathwise_estimate(draws, paths, market, option).map(|e| e.value)
}

/// Central difference over two bumped markets sharing one draw set.
///
/// The value is the difference of the two `price_mc` estimates; the standard
/// error comes from the per-sample CRN differences.
fn central_difference_crn(
    market_up: &MarketParams,
    market_down: &MarketParams,
    option: &OptionSpec,
    draws: &SimulationDraws,
    denominator: f64,
    method: &str,
) -> PricerResult<GreekEstimate> {
    let up = simulate_from_draws(market_up, draws)?;
    let down = simulate_from_draws(market_down, draws)?;
    validate_same_len("bumped_paths", up.len(), down.len())?;
    validate_same_len("bumped_paths", draws.len(), up.len())?;

    let v_up = price_mc(&up, option, market_up.r, market_up.t, None)?;
    let v_down = price_mc(&down, option, market_down.r, market_down.t, None)?;
    let value = (v_up.price - v_down.price) / denominator;

    let payoff_up = option.discounted_payoffs(up.terminal_prices(), market_up.discount());
    let payoff_down = option.discounted_payoffs(down.terminal_prices(), market_down.discount());
    let diff = Zip::from(&payoff_up)
        .and(&payoff_down)
        .map_collect(|&u, &d| (u - d) / denominator);
    let samples = to_samples(diff.view(), draws.pairing());
    require_samples(samples.len())?;
    let stats = SampleStats::summarize(samples.view());

    GreekEstimate::from_stats(value, &stats, draws.len(), method)
}

/// Finite-difference delta with CRN and its standard error
pub fn delta_fd_crn_estimate<'a>(
    market: &MarketParams,
    option: &OptionSpec,
    draws_source: impl Into<DrawsSource<'a>>,
    bump_s0_relative: f64,
) -> PricerResult<GreekEstimate> {
    market.validate()?;
    option.validate()?;
    validate_bump("bump_s0_relative", bump_s0_relative)?;
    if bump_s0_relative > 0.1 {
        warn!(bump_s0_relative, "large relative spot bump; central difference bias grows as h²");
    }
    let draws = draws_source.into().resolve()?;

    let h = bump_s0_relative;
    let up = market.with_spot(market.s0 * (1.0 + h))?;
    let down = market.with_spot(market.s0 * (1.0 - h))?;
    let estimate = central_difference_crn(
        &up,
        &down,
        option,
        &draws,
        2.0 * market.s0 * h,
        "Finite-Difference Delta",
    )?;
    debug!(delta = estimate.value, stderr = estimate.stderr, h, "CRN finite-difference delta");
    Ok(estimate)
}

/// Finite-difference delta with CRN: [V(S₀(1+h)) - V(S₀(1-h))] / (2 S₀ h)
pub fn delta_fd_crn<'a>(
    market: &MarketParams,
    option: &OptionSpec,
    draws_source: impl Into<DrawsSource<'a>>,
    bump_s0_relative: f64,
) -> PricerResult<f64> {
    delta_fd_crn_estimate(market, option, draws_source, bump_s0_relative).map(|e| e.value)
}

/// Finite-difference vega with CRN and its standard error
pub fn vega_fd_crn_estimate<'a>(
    market: &MarketParams,
    option: &OptionSpec,
    draws_source: impl Into<DrawsSource<'a>>,
    bump_sigma_absolute: f64,
) -> PricerResult<GreekEstimate> {
    market.validate()?;
    option.validate()?;
    validate_bump("bump_sigma_absolute", bump_sigma_absolute)?;
    if bump_sigma_absolute > 0.1 * market.sigma {
        warn!(
            bump_sigma_absolute,
            sigma = market.sigma,
            "volatility bump exceeds 10% of sigma"
        );
    }
    let draws = draws_source.into().resolve()?;

    let h = bump_sigma_absolute;
    let up = market.with_sigma(market.sigma + h)?;
    let down = market.with_sigma(market.sigma - h)?;
    let estimate = central_difference_crn(&up, &down, option, &draws, 2.0 * h, "Finite-Difference Vega")?;
    debug!(vega = estimate.value, stderr = estimate.stderr, h, "CRN finite-difference vega");
    Ok(estimate)
}

/// Finite-difference vega with CRN: [V(σ+h) - V(σ-h)] / (2h)
pub fn vega_fd_crn<'a>(
    market: &MarketParams,
    option: &OptionSpec,
    draws_source: impl Into<DrawsSource<'a>>,
    bump_sigma_absolute: f64,
) -> PricerResult<f64> {
    vega_fd_crn_estimate(market, option, draws_source, bump_sigma_absolute).map(|e| e.value)
}

/// Greeks requested through [`GreeksConfig`], all on one draw set
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GreeksReport {
    pub delta_pathwise: Option<GreekEstimate>,
    pub delta_fd: Option<GreekEstimate>,
    pub vega_fd: Option<GreekEstimate>,
}

/// Default relative spot bump for finite-difference delta
pub const DEFAULT_BUMP_S0_RELATIVE: f64 = 1e-4;
/// Default absolute volatility bump for finite-difference vega
pub const DEFAULT_BUMP_SIGMA_ABSOLUTE: f64 = 1e-4;

/// Compute the selected Greeks, sharing `draws` across every scenario
pub fn compute_greeks(
    market: &MarketParams,
    option: &OptionSpec,
    draws: &SimulationDraws,
    greeks: GreeksConfig,
) -> PricerResult<GreeksReport> {
    let mut report = GreeksReport::default();

    if greeks.contains(GreeksConfig::DELTA_PATHWISE) {
        let paths = simulate_from_draws(market, draws)?;
        report.delta_pathwise = Some(delta_pathwise_estimate(draws, &paths, market, option)?);
    }
    if greeks.contains(GreeksConfig::DELTA_FD) {
        report.delta_fd = Some(delta_fd_crn_estimate(
            market,
            option,
            draws,
            DEFAULT_BUMP_S0_RELATIVE,
        )?);
    }
    if greeks.contains(GreeksConfig::VEGA_FD) {
        report.vega_fd = Some(vega_fd_crn_estimate(
            market,
            option,
            draws,
            DEFAULT_BUMP_SIGMA_ABSOLUTE,
        )?);
    }

    Ok(report)
}
