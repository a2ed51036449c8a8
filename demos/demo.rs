// demos/demo.rs
use mc_pricer::analytics::bs_analytic;
use mc_pricer::math_utils::Timer;
use mc_pricer::mc::greeks::DEFAULT_BUMP_S0_RELATIVE;
use mc_pricer::{
    compute_greeks, delta_fd_crn_estimate, price_mc, simulate_terminal, ControlVariate,
    EstimateResult, GreeksConfig, MarketParams, OptionSpec, PricerResult, SimulationConfig,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = SimulationConfig::default();
    if let Some(n) = args.get(1).and_then(|a| a.parse().ok()) {
        config.n_paths = n;
    }
    if let Some(seed) = args.get(2).and_then(|a| a.parse().ok()) {
        config.seed = seed;
    }

    if let Err(e) = run_demo(config) {
        eprintln!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

fn report(label: &str, estimate: &EstimateResult, exact: f64, elapsed_ms: f64) {
    let (lo, hi) = estimate.ci95();
    println!(
        "{:<22} {:>10.5} ± {:<8.5} [{:.5}, {:.5}]  err {:>+9.5}  ({:.1} ms)",
        label,
        estimate.price,
        estimate.stderr,
        lo,
        hi,
        estimate.price - exact,
        elapsed_ms
    );
}

fn run_demo(config: SimulationConfig) -> PricerResult<()> {
    println!("Running mc-pricer Monte Carlo Demo\n");
    config.validate()?;

    let market = MarketParams::new(100.0, 0.05, 0.0, 0.2, 1.0)?;
    let options = [OptionSpec::call(100.0)?, OptionSpec::put(100.0)?];
    println!(
        "S0={} r={} q={} sigma={} T={}  paths={} seed={}\n",
        market.s0, market.r, market.q, market.sigma, market.t, config.n_paths, config.seed
    );

    let mut timer = Timer::new();
    let (_, plain_paths) = simulate_terminal(&market, config.n_paths, config.seed, false)?;
    let (draws, anti_paths) = simulate_terminal(&market, config.n_paths, config.seed, true)?;
    let cv = ControlVariate::terminal_price(&market);

    for option in &options {
        let exact = bs_analytic::price_closed_form(&market, option)?;
        println!("--- European {:?} K={} ---", option.kind, option.strike);
        println!("Closed form: {:.5}", exact.price);

        timer.start();
        let plain = price_mc(&plain_paths, option, market.r, market.t, None)?;
        report("Plain", &plain, exact.price, timer.elapsed_ms());

        timer.start();
        let anti = price_mc(&anti_paths, option, market.r, market.t, None)?;
        report("Antithetic", &anti, exact.price, timer.elapsed_ms());

        timer.start();
        let both = price_mc(&anti_paths, option, market.r, market.t, Some(&cv))?;
        report("Antithetic + CV", &both, exact.price, timer.elapsed_ms());
        if let Some(beta) = both.beta {
            println!("Control variate beta: {:.5}", beta);
        }

        timer.start();
        let greeks = compute_greeks(&market, option, &draws, GreeksConfig::all())?;
        let greeks_ms = timer.elapsed_ms();
        if let Some(d) = greeks.delta_pathwise {
            println!("Delta (pathwise): {:.5} ± {:.5}  analytic {:.5}", d.value, d.stderr, exact.delta);
        }
        if let Some(d) = greeks.delta_fd {
            println!("Delta (FD, CRN):  {:.5} ± {:.5}  analytic {:.5}", d.value, d.stderr, exact.delta);
        }
        if let Some(v) = greeks.vega_fd {
            println!("Vega (FD, CRN):   {:.5} ± {:.5}  analytic {:.5}", v.value, v.stderr, exact.vega);
        }
        println!("Greeks computed in {:.1} ms\n", greeks_ms);
    }

    // Same FD delta, draws generated from the config and shared by both bumps
    let call = options[0];
    let fd = delta_fd_crn_estimate(&market, &call, config, DEFAULT_BUMP_S0_RELATIVE)?;
    let (lo, hi) = fd.ci95();
    println!("Call delta from config-driven CRN: {:.5} (95% CI [{:.5}, {:.5}])", fd.value, lo, hi);

    Ok(())
}
