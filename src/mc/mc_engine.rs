// src/mc/mc_engine.rs
use crate::error::{validation::*, PricerError, PricerResult};
use crate::mc::paths::PathResult;
use crate::mc::payoffs::OptionSpec;
use crate::mc::stats::{require_samples, to_samples, CovarianceStats, EstimateResult, SampleStats};
use crate::models::MarketParams;
use ndarray::Array1;
use tracing::debug;

/// Control quantities with an analytically known expectation
#[derive(Clone, Debug, PartialEq)]
pub enum ControlVariate {
    /// The simulated terminal price itself, E[S_T] = S0·e^((r-q)T)
    TerminalPrice { expected: f64 },
    /// Caller-computed control values, co-indexed with the paths
    Custom { values: Array1<f64>, expected: f64 },
}

impl ControlVariate {
    pub fn terminal_price(market: &MarketParams) -> Self {
        ControlVariate::TerminalPrice {
            expected: market.forward(),
        }
    }

    pub fn expected(&self) -> f64 {
        match self {
            ControlVariate::TerminalPrice { expected } => *expected,
            ControlVariate::Custom { expected, .. } => *expected,
        }
    }

    fn values(&self, paths: &PathResult) -> PricerResult<Array1<f64>> {
        match self {
            ControlVariate::TerminalPrice { .. } => Ok(paths.terminal_prices().to_owned()),
            ControlVariate::Custom { values, .. } => {
                validate_same_len("control_values", paths.len(), values.len())?;
                Ok(values.clone())
            }
        }
    }
}

/// Relative threshold under which a control's sample variance counts as zero
const DEGENERATE_CONTROL_TOL: f64 = 1e-14;

/// Monte Carlo price of a European option from simulated terminal prices
///
/// # Estimator
///
/// Each outcome contributes the discounted payoff
/// ```text
/// Y_i = e^(-rT) · payoff(S_T,i)
/// ```
/// Antithetic pairs are averaged into one sample, so mean, variance and the
/// sample count behind `stderr` all refer to independent samples.
///
/// # Control Variate
///
/// With a control C of known expectation E\[C\]:
/// ```text
/// β = Cov(Y, C) / Var(C)
/// Y_i* = Y_i - β (C_i - E[C])
/// ```
/// Price and standard error are both computed from the adjusted samples Y*.
///
/// # Errors
///
/// - Domain error for an invalid strike, non-positive `t`, or a control whose
///   sample variance is numerically zero
/// - Value error for fewer than two independent samples or a custom control of
///   the wrong length
/// - Numerical instability if the estimate is not finite
pub fn price_mc(
    paths: &PathResult,
    option: &OptionSpec,
    r: f64,
    t: f64,
    control: Option<&ControlVariate>,
) -> PricerResult<EstimateResult> {
    option.validate()?;
    validate_finite("r", r)?;
    validate_positive("t", t)?;

    let discount = (-r * t).exp();
    let discounted = option.discounted_payoffs(paths.terminal_prices(), discount);
    let y = to_samples(discounted.view(), paths.pairing());
    require_samples(y.len())?;

    let Some(control) = control else {
        let stats = SampleStats::summarize(y.view());
        let estimate = EstimateResult::from_stats(&stats, paths.len(), None, "Monte Carlo")?;
        debug!(
            price = estimate.price,
            stderr = estimate.stderr,
            n_samples = estimate.n_samples,
            "plain Monte Carlo estimate"
        );
        return Ok(estimate);
    };

    let expected = control.expected();
    validate_finite("control_expectation", expected)?;
    let c = to_samples(control.values(paths)?.view(), paths.pairing());

    let joint = CovarianceStats::summarize(y.view(), c.view());
    let var_c = joint.variance_y();
    let scale = joint.mean_y.abs().max(1.0);
    if !(var_c > DEGENERATE_CONTROL_TOL * scale * scale) {
        return Err(PricerError::DegenerateControl { variance: var_c });
    }
    let beta = joint.covariance() / var_c;

    let adjusted = &y - &((&c - expected) * beta);
    let stats = SampleStats::summarize(adjusted.view());
    let estimate = EstimateResult::from_stats(
        &stats,
        paths.len(),
        Some(beta),
        "Control Variate Monte Carlo",
    )?;
    debug!(
        price = estimate.price,
        stderr = estimate.stderr,
        plain_stderr = (joint.variance_x() / joint.n as f64).sqrt(),
        beta,
        "control variate Monte Carlo estimate"
    );
    Ok(estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mc::paths::{simulate_terminal, Pairing};
    use ndarray::array;

    fn market() -> MarketParams {
        MarketParams::new(100.0, 0.05, 0.0, 0.2, 1.0).unwrap()
    }

    #[test]
    fn test_small_sample_by_hand() {
        // Discount 1 (r = 0), call K = 100 on [90, 110, 120, 100]
        let paths =
            PathResult::from_terminal_prices(array![90.0, 110.0, 120.0, 100.0], Pairing::Independent)
                .unwrap();
        let est = price_mc(&paths, &OptionSpec::call(100.0).unwrap(), 0.0, 1.0, None).unwrap();
        // payoffs [0, 10, 20, 0], mean 7.5, var = 275/3
        approx::assert_relative_eq!(est.price, 7.5, max_relative = 1e-14);
        approx::assert_relative_eq!(est.stderr, (275.0 / 3.0 / 4.0f64).sqrt(), max_relative = 1e-12);
        assert_eq!(est.n_paths, 4);
        assert_eq!(est.n_samples, 4);
        assert!(est.beta.is_none());
    }

    #[test]
    fn test_antithetic_pairs_are_one_sample() {
        let paths = PathResult::from_terminal_prices(
            array![90.0, 110.0, 120.0, 100.0, 130.0],
            Pairing::Antithetic,
        )
        .unwrap();
        let est = price_mc(&paths, &OptionSpec::call(100.0).unwrap(), 0.0, 1.0, None).unwrap();
        // samples [5, 10, 30]
        assert_eq!(est.n_samples, 3);
        assert_eq!(est.n_paths, 5);
        approx::assert_relative_eq!(est.price, 15.0, max_relative = 1e-14);
    }

    #[test]
    fn test_single_sample_rejected() {
        let paths = PathResult::from_terminal_prices(array![105.0], Pairing::Independent).unwrap();
        let err = price_mc(&paths, &OptionSpec::call(100.0).unwrap(), 0.05, 1.0, None).unwrap_err();
        assert!(err.is_value());
    }

    #[test]
    fn test_control_variate_never_increases_stderr() {
        let m = market();
        let (_, paths) = simulate_terminal(&m, 20_000, 5, true).unwrap();
        for option in [OptionSpec::call(100.0).unwrap(), OptionSpec::put(95.0).unwrap()] {
            let plain = price_mc(&paths, &option, m.r, m.t, None).unwrap();
            let cv = ControlVariate::terminal_price(&m);
            let adjusted = price_mc(&paths, &option, m.r, m.t, Some(&cv)).unwrap();
            assert!(adjusted.stderr <= plain.stderr * (1.0 + 1e-12));
            assert!(adjusted.beta.unwrap().is_finite());
        }
    }

    #[test]
    fn test_degenerate_control() {
        let paths = PathResult::from_terminal_prices(Array1::from_elem(10, 100.0), Pairing::Independent)
            .unwrap();
        let cv = ControlVariate::TerminalPrice { expected: 100.0 };
        let err = price_mc(&paths, &OptionSpec::call(90.0).unwrap(), 0.05, 1.0, Some(&cv)).unwrap_err();
        assert!(matches!(err, PricerError::DegenerateControl { .. }));
        assert!(err.is_domain());
    }

    #[test]
    fn test_custom_control_length_mismatch() {
        let (_, paths) = simulate_terminal(&market(), 100, 1, false).unwrap();
        let cv = ControlVariate::Custom {
            values: Array1::zeros(99),
            expected: 0.0,
        };
        let err = price_mc(&paths, &OptionSpec::call(100.0).unwrap(), 0.05, 1.0, Some(&cv)).unwrap_err();
        assert!(err.is_value());
    }

    #[test]
    fn test_custom_control_matches_terminal_price_control() {
        let m = market();
        let (_, paths) = simulate_terminal(&m, 10_000, 11, false).unwrap();
        let option = OptionSpec::call(105.0).unwrap();
        let builtin = price_mc(&paths, &option, m.r, m.t, Some(&ControlVariate::terminal_price(&m))).unwrap();
        let custom = ControlVariate::Custom {
            values: paths.terminal_prices().to_owned(),
            expected: m.forward(),
        };
        let custom = price_mc(&paths, &option, m.r, m.t, Some(&custom)).unwrap();
        assert_eq!(builtin, custom);
    }
}
