//! Sample statistics for Monte Carlo estimators.
//!
//! Accumulators follow Welford's single-pass update and are combined with
//! Chan et al.'s pairwise formula:
//! ```text
//! n   = n_a + n_b
//! δ   = mean_b - mean_a
//! mean = mean_a + δ · n_b / n
//! M2  = M2_a + M2_b + δ² · n_a n_b / n
//! ```
//! Large samples are split into chunks accumulated in parallel with rayon and
//! merged left to right in chunk order, so the merged moments never go through
//! a naive sum-of-squares and are bit-identical across thread counts.

use crate::error::{PricerError, PricerResult};
use crate::math_utils::norm_quantile;
use crate::mc::paths::Pairing;
use ndarray::{Array1, ArrayView1, Zip};
use rayon::prelude::*;

/// Two-sided 95% normal critical value used for reported intervals.
pub const Z_95: f64 = 1.96;

/// Chunk length below which statistics are accumulated sequentially.
const PAR_CHUNK: usize = 1 << 15;

/// Mergeable mean/variance accumulator
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SampleStats {
    pub n: usize,
    pub mean: f64,
    m2: f64,
}

impl SampleStats {
    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn from_slice(xs: &[f64]) -> Self {
        let mut acc = SampleStats::default();
        for &x in xs {
            acc.push(x);
        }
        acc
    }

    pub fn merge(self, other: SampleStats) -> SampleStats {
        if self.n == 0 {
            return other;
        }
        if other.n == 0 {
            return self;
        }
        let n = self.n + other.n;
        let (na, nb, nf) = (self.n as f64, other.n as f64, n as f64);
        let delta = other.mean - self.mean;
        SampleStats {
            n,
            mean: self.mean + delta * nb / nf,
            m2: self.m2 + other.m2 + delta * delta * na * nb / nf,
        }
    }

    /// Accumulate a whole sample, in parallel chunks when it is large
    pub fn summarize(xs: ArrayView1<f64>) -> Self {
        match xs.as_slice() {
            Some(slice) if slice.len() > PAR_CHUNK => slice
                .par_chunks(PAR_CHUNK)
                .map(SampleStats::from_slice)
                .collect::<Vec<_>>()
                .into_iter()
                .fold(SampleStats::default(), SampleStats::merge),
            Some(slice) => SampleStats::from_slice(slice),
            None => {
                let mut acc = SampleStats::default();
                for &x in xs.iter() {
                    acc.push(x);
                }
                acc
            }
        }
    }

    /// Unbiased sample variance (n - 1 denominator)
    pub fn variance(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        (self.m2 / (self.n - 1) as f64).max(0.0)
    }

    /// Standard error of the sample mean
    pub fn stderr(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        (self.variance() / self.n as f64).sqrt()
    }
}

/// Mergeable accumulator for the joint moments of two co-indexed samples
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CovarianceStats {
    pub n: usize,
    pub mean_x: f64,
    pub mean_y: f64,
    m2_x: f64,
    m2_y: f64,
    c_xy: f64,
}

impl CovarianceStats {
    pub fn push(&mut self, x: f64, y: f64) {
        self.n += 1;
        let nf = self.n as f64;
        let dx = x - self.mean_x;
        let dy = y - self.mean_y;
        self.mean_x += dx / nf;
        self.mean_y += dy / nf;
        self.m2_x += dx * (x - self.mean_x);
        self.m2_y += dy * (y - self.mean_y);
        self.c_xy += dx * (y - self.mean_y);
    }

    pub fn from_slices(xs: &[f64], ys: &[f64]) -> Self {
        let mut acc = CovarianceStats::default();
        for (&x, &y) in xs.iter().zip(ys) {
            acc.push(x, y);
        }
        acc
    }

    pub fn merge(self, other: CovarianceStats) -> CovarianceStats {
        if self.n == 0 {
            return other;
        }
        if other.n == 0 {
            return self;
        }
        let n = self.n + other.n;
        let (na, nb, nf) = (self.n as f64, other.n as f64, n as f64);
        let dx = other.mean_x - self.mean_x;
        let dy = other.mean_y - self.mean_y;
        let w = na * nb / nf;
        CovarianceStats {
            n,
            mean_x: self.mean_x + dx * nb / nf,
            mean_y: self.mean_y + dy * nb / nf,
            m2_x: self.m2_x + other.m2_x + dx * dx * w,
            m2_y: self.m2_y + other.m2_y + dy * dy * w,
            c_xy: self.c_xy + other.c_xy + dx * dy * w,
        }
    }

    pub fn summarize(xs: ArrayView1<f64>, ys: ArrayView1<f64>) -> Self {
        match (xs.as_slice(), ys.as_slice()) {
            (Some(x), Some(y)) if x.len() > PAR_CHUNK => x
                .par_chunks(PAR_CHUNK)
                .zip(y.par_chunks(PAR_CHUNK))
                .map(|(cx, cy)| CovarianceStats::from_slices(cx, cy))
                .collect::<Vec<_>>()
                .into_iter()
                .fold(CovarianceStats::default(), CovarianceStats::merge),
            (Some(x), Some(y)) => CovarianceStats::from_slices(x, y),
            _ => {
                let mut acc = CovarianceStats::default();
                Zip::from(xs).and(ys).for_each(|&x, &y| acc.push(x, y));
                acc
            }
        }
    }

    pub fn variance_x(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        (self.m2_x / (self.n - 1) as f64).max(0.0)
    }

    pub fn variance_y(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        (self.m2_y / (self.n - 1) as f64).max(0.0)
    }

    pub fn covariance(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        self.c_xy / (self.n - 1) as f64
    }
}

/// Collapse per-outcome values into independent Monte Carlo samples.
///
/// Independent outcomes pass through unchanged. Antithetic pairs
/// `(v[2i], v[2i+1])` become their average; an unpaired trailing outcome is
/// kept as a sample of its own.
pub fn to_samples(values: ArrayView1<f64>, pairing: Pairing) -> Array1<f64> {
    match pairing {
        Pairing::Independent => values.to_owned(),
        Pairing::Antithetic => {
            let n = values.len();
            Array1::from_shape_fn((n + 1) / 2, |i| {
                let j = 2 * i;
                if j + 1 < n {
                    0.5 * (values[j] + values[j + 1])
                } else {
                    values[j]
                }
            })
        }
    }
}

/// Monte Carlo price estimate with its sampling error
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EstimateResult {
    pub price: f64,
    pub stderr: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    /// Number of simulated outcomes
    pub n_paths: usize,
    /// Number of independent samples behind `stderr`
    pub n_samples: usize,
    /// Fitted control-variate coefficient, if one was applied
    pub beta: Option<f64>,
}

impl EstimateResult {
    pub(crate) fn from_stats(
        stats: &SampleStats,
        n_paths: usize,
        beta: Option<f64>,
        method: &str,
    ) -> PricerResult<Self> {
        let price = stats.mean;
        let stderr = stats.stderr();
        if !price.is_finite() {
            return Err(PricerError::NumericalInstability {
                method: method.to_string(),
                reason: format!("Price estimate is not finite: {}", price),
            });
        }
        if !stderr.is_finite() {
            return Err(PricerError::NumericalInstability {
                method: method.to_string(),
                reason: format!("Standard error is not finite: {}", stderr),
            });
        }
        Ok(EstimateResult {
            price,
            stderr,
            ci_low: price - Z_95 * stderr,
            ci_high: price + Z_95 * stderr,
            n_paths,
            n_samples: stats.n,
            beta,
        })
    }

    /// (ci_low, ci_high)
    pub fn ci95(&self) -> (f64, f64) {
        (self.ci_low, self.ci_high)
    }

    /// Normal-approximation interval at another confidence level in (0, 1)
    pub fn interval(&self, level: f64) -> PricerResult<(f64, f64)> {
        confidence_interval(self.price, self.stderr, level)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.ci_low <= value && value <= self.ci_high
    }
}

/// Fewest independent samples that give a meaningful standard error
pub const MIN_SAMPLES: usize = 2;

/// Value error unless there are enough independent samples for a standard error
pub(crate) fn require_samples(n_samples: usize) -> PricerResult<()> {
    if n_samples < MIN_SAMPLES {
        return Err(PricerError::value(
            "n_paths",
            format!(
                "need at least {} independent samples for a standard error, got {}",
                MIN_SAMPLES, n_samples
            ),
        ));
    }
    Ok(())
}

pub(crate) fn confidence_interval(mean: f64, stderr: f64, level: f64) -> PricerResult<(f64, f64)> {
    if !(level > 0.0 && level < 1.0) {
        return Err(PricerError::value(
            "confidence_level",
            format!("must be in (0, 1), got {}", level),
        ));
    }
    let z = norm_quantile(0.5 + 0.5 * level);
    Ok((mean - z * stderr, mean + z * stderr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn naive_mean_var(xs: &[f64]) -> (f64, f64) {
        let n = xs.len() as f64;
        let mean = xs.iter().sum::<f64>() / n;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var)
    }

    #[test]
    fn test_welford_matches_two_pass() {
        let xs: Vec<f64> = (0..1000).map(|i| ((i * 37) % 101) as f64 * 0.25 + 1e6).collect();
        let acc = SampleStats::from_slice(&xs);
        let (mean, var) = naive_mean_var(&xs);
        assert_relative_eq!(acc.mean, mean, max_relative = 1e-14);
        assert_relative_eq!(acc.variance(), var, max_relative = 1e-9);
    }

    #[test]
    fn test_merge_equals_whole() {
        let xs: Vec<f64> = (0..257).map(|i| (i as f64).sin() * 3.0 + 2.0).collect();
        let whole = SampleStats::from_slice(&xs);
        let merged = SampleStats::from_slice(&xs[..100])
            .merge(SampleStats::from_slice(&xs[100..]))
            .merge(SampleStats::default());
        assert_eq!(merged.n, whole.n);
        assert_relative_eq!(merged.mean, whole.mean, max_relative = 1e-13);
        assert_relative_eq!(merged.variance(), whole.variance(), max_relative = 1e-12);
    }

    #[test]
    fn test_parallel_summarize_matches_sequential() {
        let xs = Array1::from_shape_fn(5 * PAR_CHUNK + 123, |i| ((i % 977) as f64).sqrt());
        let par = SampleStats::summarize(xs.view());
        let seq = SampleStats::from_slice(xs.as_slice().unwrap());
        assert_eq!(par.n, seq.n);
        assert_relative_eq!(par.mean, seq.mean, max_relative = 1e-12);
        assert_relative_eq!(par.variance(), seq.variance(), max_relative = 1e-10);
    }

    #[test]
    fn test_covariance_merge() {
        let xs: Vec<f64> = (0..300).map(|i| i as f64 * 0.1).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + (x * 7.0).cos()).collect();
        let whole = CovarianceStats::from_slices(&xs, &ys);
        let merged = CovarianceStats::from_slices(&xs[..123], &ys[..123])
            .merge(CovarianceStats::from_slices(&xs[123..], &ys[123..]));
        assert_relative_eq!(merged.covariance(), whole.covariance(), max_relative = 1e-12);
        assert_relative_eq!(merged.variance_x(), whole.variance_x(), max_relative = 1e-12);
        assert_relative_eq!(merged.variance_y(), whole.variance_y(), max_relative = 1e-12);
    }

    #[test]
    fn test_require_samples() {
        assert!(require_samples(0).unwrap_err().is_value());
        assert!(require_samples(1).unwrap_err().is_value());
        assert!(require_samples(MIN_SAMPLES).is_ok());
    }

    #[test]
    fn test_antithetic_samples() {
        let v = array![1.0, 3.0, 10.0, 20.0, 7.0];
        assert_eq!(to_samples(v.view(), Pairing::Antithetic), array![2.0, 15.0, 7.0]);
        assert_eq!(to_samples(v.view(), Pairing::Independent), v);
    }

    #[test]
    fn test_estimate_interval_is_symmetric() {
        let stats = SampleStats::from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let est = EstimateResult::from_stats(&stats, 4, None, "test").unwrap();
        assert_relative_eq!(est.price - est.ci_low, est.ci_high - est.price, max_relative = 1e-12);
        assert_relative_eq!(est.ci_high - est.price, Z_95 * est.stderr, max_relative = 1e-12);
        assert!(est.stderr >= 0.0);

        let (lo, hi) = est.interval(0.99).unwrap();
        assert!(lo < est.ci_low && hi > est.ci_high);
        assert!(est.interval(1.0).unwrap_err().is_value());
    }
}
