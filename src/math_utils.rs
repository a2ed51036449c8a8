// src/math_utils.rs
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::function::erf;
use std::f64::consts::{PI, SQRT_2};

/// Standard normal CDF.
///
/// Evaluated through `erfc` so the lower tail keeps full relative precision
/// instead of cancelling in `1 + erf(x)`. Clamped to [0, 1].
pub fn norm_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return 0.5;
    }
    (0.5 * erf::erfc(-x / SQRT_2)).clamp(0.0, 1.0)
}

/// Standard normal PDF: φ(x) = exp(-x²/2) / √(2π). Underflows to 0 for large |x|.
pub fn norm_pdf(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Inverse standard normal CDF for p in (0, 1).
pub fn norm_quantile(p: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map(|n| n.inverse_cdf(p))
        .unwrap_or(f64::NAN)
}

pub struct Timer {
    start_time: std::time::Instant,
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            start_time: std::time::Instant::now(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = std::time::Instant::now();
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
