//! Descriptive statistics over `f64` samples.
//!
//! Every function here is pure. Reported figures go through [`trunc2d`],
//! which floors to two decimals rather than rounding.

pub mod distribution;
pub mod histogram;

pub use distribution::{Distribution, DAILY_ANNUALIZATION, TAIL_NORMALIZATION};
pub use histogram::{Histogram, HistogramBin};

/// Truncate to two decimals with floor semantics: `1.239 → 1.23`, `-1.231 → -1.24`.
///
/// Non-finite inputs report as 0.
pub fn trunc2d(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).floor() / 100.0
}

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around a precomputed mean.
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    let m = mean(values);
    (m, std_dev(values, m))
}

/// Mean and unbiased (n - 1) standard deviation. The deviation is 0 below two samples.
pub fn mean_and_sample_std_dev(values: &[f64]) -> (f64, f64) {
    let m = mean(values);
    if values.len() < 2 {
        return (m, 0.0);
    }
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    (m, variance.sqrt())
}

/// Median with midpoint averaging for even-sized samples.
pub fn median(values: &[f64]) -> f64 {
    Percentile::new(values).median()
}

/// Mean over standard deviation; 0 when the sample has no dispersion.
pub fn sharpe_ratio(mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    mean / std_dev
}

/// Pearson's second skewness coefficient: `3 (mean - median) / stddev`.
pub fn skewness(mean: f64, median: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    3.0 * (mean - median) / std_dev
}

/// System Quality Number: `mean / stddev * sqrt(n)`, 0 when stddev is 0.
pub fn sqn(mean: f64, std_dev: f64, n: usize) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    mean / std_dev * (n as f64).sqrt()
}

/// Percentile estimator over a sorted copy of the sample.
#[derive(Debug, Clone)]
pub struct Percentile {
    sorted: Vec<f64>,
}

impl Percentile {
    pub fn new(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Self { sorted }
    }

    /// Value at rank `p` (0..=100) using linear interpolation between neighbours.
    pub fn get(&self, p: f64) -> f64 {
        let n = self.sorted.len();
        if n == 0 {
            return 0.0;
        }
        if n == 1 {
            return self.sorted[0];
        }
        let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = (lo + 1).min(n - 1);
        let frac = rank - lo as f64;
        self.sorted[lo] * (1.0 - frac) + self.sorted[hi] * frac
    }

    pub fn median(&self) -> f64 {
        self.get(50.0)
    }

    pub fn sorted(&self) -> &[f64] {
        &self.sorted
    }
}
