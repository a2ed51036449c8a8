// scripts/benchmark.rs
use mc_pricer::analytics::bs_analytic;
use mc_pricer::math_utils::Timer;
use mc_pricer::mc::greeks::{DEFAULT_BUMP_S0_RELATIVE, DEFAULT_BUMP_SIGMA_ABSOLUTE};
use mc_pricer::{
    delta_fd_crn_estimate, delta_pathwise_estimate, price_mc, simulate_terminal,
    vega_fd_crn_estimate, ControlVariate, MarketParams, OptionSpec, PricerResult,
};
use std::env;
use std::fs::File;
use std::io::{self, Write};

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_cores: usize,
    rustc_flags: String,
    rayon_threads: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_cores: num_cpus::get(),
            rustc_flags: env::var("RUSTFLAGS").unwrap_or_else(|_| "default".to_string()),
            rayon_threads: rayon::current_num_threads(),
        }
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    paths: usize,
    time_ms: f64,
    value: f64,
    stderr: f64,
    analytic_value: f64,
}

impl BenchmarkResult {
    fn throughput(&self) -> f64 {
        self.paths as f64 / (self.time_ms / 1000.0)
    }

    fn z_score(&self) -> f64 {
        (self.value - self.analytic_value) / self.stderr
    }
}

fn run_pricing_benchmarks(market: &MarketParams, option: &OptionSpec) -> PricerResult<Vec<BenchmarkResult>> {
    let mut results = Vec::new();
    let analytic = bs_analytic::bs_price(market, option)?;
    let cv = ControlVariate::terminal_price(market);
    let mut timer = Timer::new();

    for &paths in &[10_000, 100_000, 1_000_000] {
        println!("Running pricing benchmarks with {} paths...", paths);

        for (label, antithetic, control) in [
            ("Plain", false, None),
            ("Antithetic", true, None),
            ("Antithetic + CV", true, Some(&cv)),
        ] {
            timer.start();
            let (_, sim) = simulate_terminal(market, paths, 42, antithetic)?;
            let estimate = price_mc(&sim, option, market.r, market.t, control)?;
            results.push(BenchmarkResult {
                name: format!("{} ({}k paths)", label, paths / 1000),
                paths,
                time_ms: timer.elapsed_ms(),
                value: estimate.price,
                stderr: estimate.stderr,
                analytic_value: analytic,
            });
        }
    }

    Ok(results)
}

fn run_greeks_benchmarks(market: &MarketParams, option: &OptionSpec) -> PricerResult<Vec<BenchmarkResult>> {
    let paths = 1_000_000;
    println!("Running Greeks benchmarks with {} paths...", paths);

    let exact = bs_analytic::price_closed_form(market, option)?;
    let mut timer = Timer::new();
    let mut results = Vec::new();

    timer.start();
    let (draws, sim) = simulate_terminal(market, paths, 42, true)?;
    let pathwise = delta_pathwise_estimate(&draws, &sim, market, option)?;
    results.push(BenchmarkResult {
        name: "Delta (pathwise)".to_string(),
        paths,
        time_ms: timer.elapsed_ms(),
        value: pathwise.value,
        stderr: pathwise.stderr,
        analytic_value: exact.delta,
    });

    timer.start();
    let fd = delta_fd_crn_estimate(market, option, &draws, DEFAULT_BUMP_S0_RELATIVE)?;
    results.push(BenchmarkResult {
        name: "Delta (FD, CRN)".to_string(),
        paths,
        time_ms: timer.elapsed_ms(),
        value: fd.value,
        stderr: fd.stderr,
        analytic_value: exact.delta,
    });

    timer.start();
    let vega = vega_fd_crn_estimate(market, option, &draws, DEFAULT_BUMP_SIGMA_ABSOLUTE)?;
    results.push(BenchmarkResult {
        name: "Vega (FD, CRN)".to_string(),
        paths,
        time_ms: timer.elapsed_ms(),
        value: vega.value,
        stderr: vega.stderr,
        analytic_value: exact.vega,
    });

    Ok(results)
}

fn write_results_to_csv(results: &[BenchmarkResult], system_info: &SystemInfo, filename: &str) -> io::Result<()> {
    let mut file = File::create(filename)?;

    writeln!(file, "# OS: {}", system_info.os)?;
    writeln!(file, "# CPU Cores: {}", system_info.cpu_cores)?;
    writeln!(file, "# RUSTFLAGS: {}", system_info.rustc_flags)?;
    writeln!(file, "# Rayon Threads: {}", system_info.rayon_threads)?;
    writeln!(
        file,
        "# Benchmark Date: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(file, "Benchmark,Paths,Time_ms,Throughput_paths_per_sec,Value,Stderr,Analytic_Value")?;

    for r in results {
        writeln!(
            file,
            "{},{},{:.2},{:.0},{:.6},{:.6},{:.6}",
            r.name,
            r.paths,
            r.time_ms,
            r.throughput(),
            r.value,
            r.stderr,
            r.analytic_value
        )?;
    }
    Ok(())
}

fn run() -> PricerResult<Vec<BenchmarkResult>> {
    let market = MarketParams::new(100.0, 0.05, 0.0, 0.2, 1.0)?;
    let call = OptionSpec::call(100.0)?;
    let mut results = run_pricing_benchmarks(&market, &call)?;
    results.extend(run_greeks_benchmarks(&market, &call)?);
    Ok(results)
}

fn main() {
    println!("mc-pricer Benchmark Suite");
    println!("=========================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU Cores: {}", system_info.cpu_cores);
    println!("  RUSTFLAGS: {}", system_info.rustc_flags);
    println!("  Rayon Threads: {}", system_info.rayon_threads);
    println!();

    let results = match run() {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Benchmark failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n{:=<96}", "");
    println!(
        "{:<28} {:>9} {:>11} {:>14} {:>10} {:>10} {:>10} {:>7}",
        "Benchmark", "Paths", "Time (ms)", "Throughput", "Value", "Stderr", "Analytic", "z"
    );
    println!("{:-<96}", "");
    for r in &results {
        println!(
            "{:<28} {:>9} {:>11.2} {:>14.0} {:>10.5} {:>10.5} {:>10.5} {:>7.2}",
            r.name,
            r.paths,
            r.time_ms,
            r.throughput(),
            r.value,
            r.stderr,
            r.analytic_value,
            r.z_score()
        );
    }
    println!("{:=<96}", "");

    let filename = format!("benchmark_results_{}.csv", chrono::Utc::now().format("%Y%m%d_%H%M%S"));
    match write_results_to_csv(&results, &system_info, &filename) {
        Ok(()) => println!("\nResults saved to: {}", filename),
        Err(e) => eprintln!("Error writing {}: {}", filename, e),
    }
}
