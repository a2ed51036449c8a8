// tests/integration_test.rs
use mc_pricer::analytics::bs_analytic;
use mc_pricer::{
    price_closed_form, price_mc, simulate_from_draws, simulate_terminal, ControlVariate,
    MarketParams, OptionSpec, PricerError,
};
use ndarray::Array1;

fn atm_market() -> MarketParams {
    MarketParams::new(100.0, 0.05, 0.0, 0.2, 1.0).expect("Valid market")
}

#[test]
fn test_mc_vs_closed_form() {
    let market = atm_market();
    let call = OptionSpec::call(100.0).expect("Valid option");
    let put = OptionSpec::put(100.0).expect("Valid option");

    let (_, paths) = simulate_terminal(&market, 500_000, 42, true).expect("Valid simulation");

    for option in [call, put] {
        let exact = price_closed_form(&market, &option).expect("Valid inputs").price;
        let plain = price_mc(&paths, &option, market.r, market.t, None).expect("Valid estimate");
        let cv = ControlVariate::terminal_price(&market);
        let adjusted =
            price_mc(&paths, &option, market.r, market.t, Some(&cv)).expect("Valid estimate");

        println!("\n{:?} K=100", option.kind);
        println!("Closed form: {}", exact);
        println!("MC (antithetic): {} ± {}", plain.price, plain.stderr);
        println!("MC (antithetic + CV): {} ± {}", adjusted.price, adjusted.stderr);

        let z_plain = (plain.price - exact).abs() / plain.stderr;
        let z_cv = (adjusted.price - exact).abs() / adjusted.stderr;
        assert!(z_plain < 4.0, "Plain estimate is {:.2} stderr from closed form", z_plain);
        assert!(z_cv < 4.0, "CV estimate is {:.2} stderr from closed form", z_cv);
        assert_eq!(plain.n_paths, 500_000);
        assert_eq!(plain.n_samples, 250_000);
    }
}

#[test]
fn test_stderr_shrinks_with_path_count() {
    let market = atm_market();
    let call = OptionSpec::call(100.0).expect("Valid option");
    let exact = price_closed_form(&market, &call).expect("Valid inputs").price;

    let mut estimates = Vec::new();
    for paths in [5_000, 500_000] {
        let (_, sim) = simulate_terminal(&market, paths, 42, false).expect("Valid simulation");
        let estimate = price_mc(&sim, &call, market.r, market.t, None).expect("Valid estimate");
        println!("\n{} paths: {} ± {} (closed form {})", paths, estimate.price, estimate.stderr, exact);
        assert!(
            (estimate.price - exact).abs() < 4.0 * estimate.stderr,
            "{} paths: estimate {} not within 4 stderr of {}",
            paths,
            estimate.price,
            exact
        );
        estimates.push(estimate);
    }

    // 100x the paths should cut the standard error by about sqrt(100)
    let ratio = estimates[0].stderr / estimates[1].stderr;
    println!("Stderr ratio: {:.3}", ratio);
    assert!((8.5..=11.5).contains(&ratio), "Stderr ratio {} not close to 10", ratio);
}

#[test]
fn test_dividend_yield_convergence() {
    let market = MarketParams::new(100.0, 0.03, 0.02, 0.25, 0.5).expect("Valid market");
    let option = OptionSpec::put(105.0).expect("Valid option");
    let (_, paths) = simulate_terminal(&market, 200_000, 7, false).expect("Valid simulation");
    let estimate = price_mc(&paths, &option, market.r, market.t, None).expect("Valid estimate");
    let exact = bs_analytic::bs_price(&market, &option).expect("Valid inputs");

    println!("\nMC put with dividends: {} ± {}", estimate.price, estimate.stderr);
    println!("Closed form: {}", exact);

    assert!((estimate.price - exact).abs() < 4.0 * estimate.stderr);
}

#[test]
fn test_control_variate_reduces_stderr() {
    let market = atm_market();
    let call = OptionSpec::call(100.0).expect("Valid option");
    let (_, paths) = simulate_terminal(&market, 200_000, 42, false).expect("Valid simulation");

    let plain = price_mc(&paths, &call, market.r, market.t, None).expect("Valid estimate");
    let cv = ControlVariate::terminal_price(&market);
    let adjusted = price_mc(&paths, &call, market.r, market.t, Some(&cv)).expect("Valid estimate");

    let vrf = (plain.stderr / adjusted.stderr).powi(2);
    println!("\nPlain stderr: {}", plain.stderr);
    println!("CV stderr: {}", adjusted.stderr);
    println!("Beta: {:?}", adjusted.beta);
    println!("Variance Reduction Factor: {:.2}", vrf);

    assert!(adjusted.stderr < plain.stderr);
    assert!(vrf > 2.0, "Control variate should at least halve the variance, got {}", vrf);
}

#[test]
fn test_same_seed_is_bit_identical() {
    let market = atm_market();
    let call = OptionSpec::call(110.0).expect("Valid option");

    let (draws_a, paths_a) = simulate_terminal(&market, 100_003, 2024, true).expect("Valid simulation");
    let (draws_b, paths_b) = simulate_terminal(&market, 100_003, 2024, true).expect("Valid simulation");
    assert_eq!(draws_a, draws_b);
    assert_eq!(paths_a, paths_b);

    let a = price_mc(&paths_a, &call, market.r, market.t, None).expect("Valid estimate");
    let b = price_mc(&paths_b, &call, market.r, market.t, None).expect("Valid estimate");
    assert_eq!(a.price.to_bits(), b.price.to_bits());
}

#[test]
fn test_ci_coverage() {
    let market = atm_market();
    let call = OptionSpec::call(100.0).expect("Valid option");
    let exact = price_closed_form(&market, &call).expect("Valid inputs").price;

    let runs = 1000;
    let covered = (0..runs)
        .filter(|&seed| {
            let (_, paths) =
                simulate_terminal(&market, 2000, seed as u64, false).expect("Valid simulation");
            price_mc(&paths, &call, market.r, market.t, None)
                .expect("Valid estimate")
                .contains(exact)
        })
        .count();
    let coverage = covered as f64 / runs as f64;

    println!("\n95% CI coverage over {} runs: {:.3}", runs, coverage);

    assert!(
        (0.90..=0.99).contains(&coverage),
        "Coverage {} outside [0.90, 0.99]",
        coverage
    );
}

#[test]
fn test_put_call_parity_on_shared_paths() {
    let market = MarketParams::new(100.0, 0.04, 0.01, 0.3, 2.0).expect("Valid market");
    let (_, paths) = simulate_terminal(&market, 50_000, 99, true).expect("Valid simulation");
    let k = 95.0;

    let call = price_mc(&paths, &OptionSpec::call(k).unwrap(), market.r, market.t, None).unwrap();
    let put = price_mc(&paths, &OptionSpec::put(k).unwrap(), market.r, market.t, None).unwrap();
    // Per path, call - put = S_T - K exactly
    let mean_st = paths.terminal_prices().mean().unwrap();
    let parity = market.discount() * (mean_st - k);

    println!("\nC - P = {}, e^(-rT)(mean S_T - K) = {}", call.price - put.price, parity);
    assert!((call.price - put.price - parity).abs() < 1e-9);

    let gap = bs_analytic::put_call_parity_gap(&market, k).unwrap();
    assert!(gap.abs() < 1e-10);
}

#[test]
fn test_degenerate_control_is_domain_error() {
    let market = atm_market();
    let (_, paths) = simulate_terminal(&market, 1000, 1, false).unwrap();
    let flat = ControlVariate::Custom {
        values: Array1::from_elem(1000, 3.0),
        expected: 3.0,
    };
    let err = price_mc(&paths, &OptionSpec::call(100.0).unwrap(), market.r, market.t, Some(&flat))
        .unwrap_err();

    println!("\nDegenerate control error: {}", err);
    assert!(matches!(err, PricerError::DegenerateControl { .. }));
    assert!(err.is_domain());
}

#[test]
fn test_crn_resimulation_prices_bumped_market() {
    let market = atm_market();
    let call = OptionSpec::call(100.0).unwrap();
    let (draws, _) = simulate_terminal(&market, 200_000, 5, true).unwrap();

    let bumped = market.with_sigma(0.3).unwrap();
    let paths = simulate_from_draws(&bumped, &draws).unwrap();
    let estimate = price_mc(&paths, &call, bumped.r, bumped.t, None).unwrap();
    let exact = price_closed_form(&bumped, &call).unwrap().price;

    println!("\nBumped sigma MC: {} ± {}, closed form {}", estimate.price, estimate.stderr, exact);
    assert!((estimate.price - exact).abs() < 4.0 * estimate.stderr);
}

#[test]
fn test_invalid_inputs() {
    let market = atm_market();
    assert!(simulate_terminal(&market, 0, 1, false).unwrap_err().is_value());
    assert!(MarketParams::new(100.0, 0.05, 0.0, -0.2, 1.0).unwrap_err().is_domain());
    assert!(MarketParams::new(100.0, 0.05, 0.0, 0.2, 0.0).unwrap_err().is_domain());
    assert!(OptionSpec::call(0.0).unwrap_err().is_domain());

    let (_, paths) = simulate_terminal(&market, 10, 1, false).unwrap();
    let err = price_mc(&paths, &OptionSpec::call(100.0).unwrap(), 0.05, -1.0, None).unwrap_err();
    assert!(err.is_domain());
}
