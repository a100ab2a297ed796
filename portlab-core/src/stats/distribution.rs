//! Distribution snapshot of a numeric sample.

use serde::{Deserialize, Serialize};

use super::{mean, sharpe_ratio, skewness, std_dev, trunc2d, Histogram, Percentile};

/// Divides the percentile tail ratios so that a normal sample scores about 1.
pub const TAIL_NORMALIZATION: f64 = 4.43;

/// Multiplier that annualizes a daily Sharpe ratio or standard deviation.
pub const DAILY_ANNUALIZATION: f64 = 16.0;

/// Shape of a sample. All figures are truncated to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub mean: f64,
    pub median: f64,
    pub standard_dev: f64,
    pub sharpe_ratio: f64,
    /// `(p1 - mean) / (p30 - mean)`, normalized.
    pub lower_tail: f64,
    /// `(p99 - mean) / (p70 - mean)`, normalized.
    pub upper_tail: f64,
    pub skewness: f64,
    pub histogram: Histogram,
}

impl Distribution {
    /// Build the snapshot. An empty sample has no distribution.
    pub fn from_sample(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let m = mean(values);
        let percentile = Percentile::new(values);
        let med = percentile.median();
        let sd = std_dev(values, m);

        let p01 = percentile.get(1.0) - m;
        let p30 = percentile.get(30.0) - m;
        let p70 = percentile.get(70.0) - m;
        let p99 = percentile.get(99.0) - m;

        Some(Self {
            mean: trunc2d(m),
            median: trunc2d(med),
            standard_dev: trunc2d(sd),
            sharpe_ratio: trunc2d(sharpe_ratio(m, sd)),
            lower_tail: trunc2d(tail_ratio(p01, p30) / TAIL_NORMALIZATION),
            upper_tail: trunc2d(tail_ratio(p99, p70) / TAIL_NORMALIZATION),
            skewness: trunc2d(skewness(m, med, sd)),
            histogram: Histogram::from_sample(values),
        })
    }
}

fn tail_ratio(extreme: f64, inner: f64) -> f64 {
    if inner == 0.0 {
        return 0.0;
    }
    extreme / inner
}
